//! Input Parsers (spec §4.I): reads the four whitespace-separated files
//! that describe an instance and turns them into a [`NodeCatalog`], a
//! vehicle list, and an optional file-provided travel-time matrix.
//!
//! File formats, one record per non-blank, non-`#`-comment line:
//!
//! - `<base>.containers.txt`: `id x y opens closes service demand street_id`
//! - `<base>.otherlocs.txt`: `id x y opens closes` (role resolved from the
//!   vehicle file, not tagged in this file)
//! - `<base>.vehicles.txt`: `vid start_id dump_id end_id capacity max_trips
//!   shift_start shift_end`
//! - `<base>.dmatrix-time.txt` (optional): `from_id to_id cost`

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::distance::oracle::MatrixOracle;
use crate::domain::catalog::NodeCatalog;
use crate::domain::types::{Node, NodeId, NodeKind, Vehicle};
use crate::error::SolverError;

pub struct ParsedInstance {
    pub catalog: NodeCatalog,
    pub vehicles: Vec<Vehicle>,
    pub matrix: Option<MatrixOracle>,
}

/// Parses `<base>.containers.txt`, `<base>.otherlocs.txt`,
/// `<base>.vehicles.txt`, and — if present — `<base>.dmatrix-time.txt`.
pub fn parse_instance(base_path: &str) -> Result<ParsedInstance, SolverError> {
    let containers_path = format!("{base_path}.containers.txt");
    let otherlocs_path = format!("{base_path}.otherlocs.txt");
    let vehicles_path = format!("{base_path}.vehicles.txt");
    let matrix_path = format!("{base_path}.dmatrix-time.txt");

    let mut nodes = parse_containers(&containers_path)?;
    let other_ids: Vec<NodeId> = {
        let mut others = parse_otherlocs(&otherlocs_path)?;
        let ids = others.iter().map(|n| n.id).collect();
        nodes.append(&mut others);
        ids
    };

    let mut catalog = NodeCatalog::build(nodes)?;
    let vehicles = parse_vehicles(&vehicles_path, &other_ids)?;

    for v in &vehicles {
        catalog.mark_kind(v.start_depot_id, NodeKind::Depot)?;
        catalog.mark_kind(v.end_depot_id, NodeKind::Depot)?;
        catalog.mark_kind(v.dump_id, NodeKind::Dump)?;
    }

    let matrix = if Path::new(&matrix_path).exists() {
        Some(parse_matrix(&matrix_path)?)
    } else {
        info!(path = %matrix_path, "no file-provided matrix, expecting OSRM_BASE_URL");
        None
    };

    info!(
        containers = catalog.num_containers(),
        vehicles = vehicles.len(),
        "parsed instance from {base_path}"
    );

    Ok(ParsedInstance { catalog, vehicles, matrix })
}

fn read_lines(path: &str) -> Result<Vec<(usize, String)>, SolverError> {
    let contents = fs::read_to_string(path).map_err(|e| SolverError::InputFormat {
        file: path.to_string(),
        line: 0,
        detail: format!("cannot read file: {e}"),
    })?;
    Ok(contents
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim().to_string()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .collect())
}

fn field<'a>(path: &str, line_no: usize, fields: &[&'a str], idx: usize, name: &str) -> Result<&'a str, SolverError> {
    fields.get(idx).copied().ok_or_else(|| SolverError::InputFormat {
        file: path.to_string(),
        line: line_no,
        detail: format!("missing field {name}"),
    })
}

fn parse_f64(path: &str, line_no: usize, raw: &str, name: &str) -> Result<f64, SolverError> {
    raw.parse::<f64>().map_err(|_| SolverError::InputFormat {
        file: path.to_string(),
        line: line_no,
        detail: format!("field {name} is not a number: {raw:?}"),
    })
}

fn parse_u64(path: &str, line_no: usize, raw: &str, name: &str) -> Result<u64, SolverError> {
    raw.parse::<u64>().map_err(|_| SolverError::InputFormat {
        file: path.to_string(),
        line: line_no,
        detail: format!("field {name} is not an integer: {raw:?}"),
    })
}

fn parse_u32(path: &str, line_no: usize, raw: &str, name: &str) -> Result<u32, SolverError> {
    raw.parse::<u32>().map_err(|_| SolverError::InputFormat {
        file: path.to_string(),
        line: line_no,
        detail: format!("field {name} is not an integer: {raw:?}"),
    })
}

fn parse_containers(path: &str) -> Result<Vec<Node>, SolverError> {
    let mut nodes = Vec::new();
    for (line_no, line) in read_lines(path)? {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let id = parse_u64(path, line_no, field(path, line_no, &fields, 0, "id")?, "id")?;
        let x = parse_f64(path, line_no, field(path, line_no, &fields, 1, "x")?, "x")?;
        let y = parse_f64(path, line_no, field(path, line_no, &fields, 2, "y")?, "y")?;
        let opens = parse_f64(path, line_no, field(path, line_no, &fields, 3, "opens")?, "opens")?;
        let closes = parse_f64(path, line_no, field(path, line_no, &fields, 4, "closes")?, "closes")?;
        let service = parse_f64(path, line_no, field(path, line_no, &fields, 5, "service")?, "service")?;
        let demand = parse_f64(path, line_no, field(path, line_no, &fields, 6, "demand")?, "demand")?;
        // street_id (field 7), if present, is informational only.
        nodes.push(Node::new(id, x, y, opens, closes, service, demand, NodeKind::Container));
    }
    Ok(nodes)
}

fn parse_otherlocs(path: &str) -> Result<Vec<Node>, SolverError> {
    let mut nodes = Vec::new();
    for (line_no, line) in read_lines(path)? {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let id = parse_u64(path, line_no, field(path, line_no, &fields, 0, "id")?, "id")?;
        let x = parse_f64(path, line_no, field(path, line_no, &fields, 1, "x")?, "x")?;
        let y = parse_f64(path, line_no, field(path, line_no, &fields, 2, "y")?, "y")?;
        let opens = parse_f64(path, line_no, field(path, line_no, &fields, 3, "opens")?, "opens")?;
        let closes = parse_f64(path, line_no, field(path, line_no, &fields, 4, "closes")?, "closes")?;
        // Role (dump vs. depot) is unknown until the vehicle file is read;
        // default to Depot, `mark_kind` upgrades it where a vehicle names
        // this id as its dump.
        nodes.push(Node::new(id, x, y, opens, closes, 0.0, 0.0, NodeKind::Depot));
    }
    Ok(nodes)
}

fn parse_vehicles(path: &str, known_other_ids: &[NodeId]) -> Result<Vec<Vehicle>, SolverError> {
    let mut vehicles = Vec::new();
    for (line_no, line) in read_lines(path)? {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let vid = parse_u64(path, line_no, field(path, line_no, &fields, 0, "vid")?, "vid")?;
        let start_id = parse_u64(path, line_no, field(path, line_no, &fields, 1, "start_id")?, "start_id")?;
        let dump_id = parse_u64(path, line_no, field(path, line_no, &fields, 2, "dump_id")?, "dump_id")?;
        let end_id = parse_u64(path, line_no, field(path, line_no, &fields, 3, "end_id")?, "end_id")?;
        let capacity = parse_f64(path, line_no, field(path, line_no, &fields, 4, "capacity")?, "capacity")?;
        let max_trips = parse_u32(path, line_no, field(path, line_no, &fields, 5, "max_trips")?, "max_trips")?;
        let shift_start = parse_f64(path, line_no, field(path, line_no, &fields, 6, "shift_start")?, "shift_start")?;
        let shift_end = parse_f64(path, line_no, field(path, line_no, &fields, 7, "shift_end")?, "shift_end")?;

        for (role, id) in [("start_id", start_id), ("dump_id", dump_id), ("end_id", end_id)] {
            if !known_other_ids.contains(&id) {
                return Err(SolverError::Reference(format!(
                    "vehicle {vid} {role} {id} is not a known otherlocs node"
                )));
            }
        }
        if capacity <= 0.0 {
            return Err(SolverError::Inconsistency(format!("vehicle {vid} has non-positive capacity {capacity}")));
        }
        if max_trips < 1 {
            return Err(SolverError::Inconsistency(format!("vehicle {vid} has max_trips {max_trips} < 1")));
        }
        if shift_start > shift_end {
            return Err(SolverError::Inconsistency(format!(
                "vehicle {vid} has shift_start ({shift_start}) > shift_end ({shift_end})"
            )));
        }

        vehicles.push(Vehicle::new(vid, start_id, dump_id, end_id, capacity, max_trips, shift_start, shift_end));
    }
    if vehicles.is_empty() {
        return Err(SolverError::Inconsistency(format!("{path}: no vehicles defined")));
    }
    Ok(vehicles)
}

fn parse_matrix(path: &str) -> Result<MatrixOracle, SolverError> {
    let mut oracle = MatrixOracle::new();
    let mut count = 0usize;
    for (line_no, line) in read_lines(path)? {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let from = parse_u64(path, line_no, field(path, line_no, &fields, 0, "from_id")?, "from_id")?;
        let to = parse_u64(path, line_no, field(path, line_no, &fields, 1, "to_id")?, "to_id")?;
        let cost = parse_f64(path, line_no, field(path, line_no, &fields, 2, "cost")?, "cost")?;
        if cost < 0.0 {
            warn!(path, line_no, cost, "negative travel cost, skipping entry");
            continue;
        }
        oracle.insert(from, to, cost);
        count += 1;
    }
    info!(path, entries = count, "loaded file-provided travel-time matrix");
    Ok(oracle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, contents: &str) -> String {
        let path = std::env::temp_dir().join(format!("trash_vrp_test_{name}_{}", std::process::id()));
        fs::write(&path, contents).unwrap();
        path.to_str().unwrap().to_string()
    }

    #[test]
    fn parses_a_minimal_instance() {
        let base = std::env::temp_dir()
            .join(format!("trash_vrp_minimal_{}", std::process::id()))
            .to_str()
            .unwrap()
            .to_string();

        fs::write(format!("{base}.containers.txt"), "1 1.0 1.0 0 1000 5 10 900\n# a comment\n").unwrap();
        fs::write(format!("{base}.otherlocs.txt"), "100 0.0 0.0 0 1000\n200 2.0 2.0 0 1000\n").unwrap();
        fs::write(format!("{base}.vehicles.txt"), "1 100 200 100 50 2 0 1000\n").unwrap();

        let parsed = parse_instance(&base).unwrap();
        assert_eq!(parsed.catalog.num_containers(), 1);
        assert_eq!(parsed.vehicles.len(), 1);
        assert!(parsed.matrix.is_none());
        assert!(parsed.catalog.get(200).unwrap().is_dump());
        assert!(parsed.catalog.get(100).unwrap().is_depot());

        for ext in ["containers", "otherlocs", "vehicles"] {
            let _ = fs::remove_file(format!("{base}.{ext}.txt"));
        }
    }

    #[test]
    fn rejects_vehicle_referencing_unknown_depot() {
        let base = std::env::temp_dir()
            .join(format!("trash_vrp_badref_{}", std::process::id()))
            .to_str()
            .unwrap()
            .to_string();

        fs::write(format!("{base}.containers.txt"), "1 1.0 1.0 0 1000 5 10 900\n").unwrap();
        fs::write(format!("{base}.otherlocs.txt"), "100 0.0 0.0 0 1000\n").unwrap();
        fs::write(format!("{base}.vehicles.txt"), "1 100 999 100 50 2 0 1000\n").unwrap();

        assert!(parse_instance(&base).is_err());

        for ext in ["containers", "otherlocs", "vehicles"] {
            let _ = fs::remove_file(format!("{base}.{ext}.txt"));
        }
    }

    #[test]
    fn rejects_shift_start_after_shift_end() {
        let path = write_temp("vehicles_bad_shift", "1 100 200 100 50 2 900 0\n");
        let err = parse_vehicles(&path, &[100, 200]);
        assert!(err.is_err());
        let _ = fs::remove_file(&path);
    }
}
