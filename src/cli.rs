//! Minimal argument parsing for the `trash <base_path>` CLI surface — a
//! single positional argument plus a handful of flags, hand-rolled since
//! the surface is this small.

pub struct Args {
    pub base_path: String,
    pub csv: bool,
    pub max_iters: Option<u64>,
    pub timeout_secs: Option<u64>,
}

const USAGE: &str = "usage: trash <base_path> [--csv] [--max-iters N] [--timeout-secs S]";

pub fn parse(mut raw: impl Iterator<Item = String>) -> Result<Args, String> {
    let _program = raw.next();

    let mut base_path = None;
    let mut csv = false;
    let mut max_iters = None;
    let mut timeout_secs = None;

    let mut rest = raw;
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--csv" => csv = true,
            "--max-iters" => {
                let value = rest.next().ok_or_else(|| format!("--max-iters requires a value\n{USAGE}"))?;
                max_iters = Some(value.parse::<u64>().map_err(|_| format!("--max-iters: not a number: {value}"))?);
            }
            "--timeout-secs" => {
                let value = rest.next().ok_or_else(|| format!("--timeout-secs requires a value\n{USAGE}"))?;
                timeout_secs =
                    Some(value.parse::<u64>().map_err(|_| format!("--timeout-secs: not a number: {value}"))?);
            }
            "-h" | "--help" => return Err(USAGE.to_string()),
            other if base_path.is_none() => base_path = Some(other.to_string()),
            other => return Err(format!("unexpected argument: {other}\n{USAGE}")),
        }
    }

    let base_path = base_path.ok_or_else(|| USAGE.to_string())?;
    Ok(Args { base_path, csv, max_iters, timeout_secs })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(words: &[&str]) -> Vec<String> {
        std::iter::once("trash".to_string())
            .chain(words.iter().map(|s| s.to_string()))
            .collect()
    }

    #[test]
    fn parses_base_path_only() {
        let parsed = parse(args(&["instance1"]).into_iter()).unwrap();
        assert_eq!(parsed.base_path, "instance1");
        assert!(!parsed.csv);
        assert!(parsed.max_iters.is_none());
    }

    #[test]
    fn parses_flags_in_any_order() {
        let parsed = parse(args(&["--csv", "instance1", "--max-iters", "500"]).into_iter()).unwrap();
        assert_eq!(parsed.base_path, "instance1");
        assert!(parsed.csv);
        assert_eq!(parsed.max_iters, Some(500));
    }

    #[test]
    fn missing_base_path_is_an_error() {
        assert!(parse(args(&["--csv"]).into_iter()).is_err());
    }

    #[test]
    fn non_numeric_flag_value_is_an_error() {
        assert!(parse(args(&["instance1", "--timeout-secs", "soon"]).into_iter()).is_err());
    }
}
