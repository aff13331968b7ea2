//! Thin CLI entry point: parse arguments, parse the instance, resolve a
//! CostOracle, run the Builder and the Tabu Search Driver, then the Fleet
//! Optimizer, and report the result.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing_subscriber::EnvFilter;

use trash::builder;
use trash::cli;
use trash::distance::matrix::build_osrm_oracle;
use trash::distance::oracle::CostOracle;
use trash::error::SolverError;
use trash::input;
use trash::report;
use trash::solver::driver::StopReason;
use trash::solver::{fleet, TabuConfig, TabuDriver};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = match cli::parse(std::env::args()) {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::from(2);
        }
    };

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

async fn run(args: cli::Args) -> Result<(), SolverError> {
    let parsed = input::parse_instance(&args.base_path)?;
    let catalog = Arc::new(parsed.catalog);

    let oracle: Arc<dyn CostOracle> = match (std::env::var("OSRM_BASE_URL"), parsed.matrix) {
        (Ok(base_url), _) => build_osrm_oracle(&catalog, &base_url).await?,
        (Err(_), Some(matrix)) => Arc::new(matrix),
        (Err(_), None) => {
            return Err(SolverError::Inconsistency(format!(
                "no travel-time data: neither OSRM_BASE_URL nor {}.dmatrix-time.txt is available",
                args.base_path
            )))
        }
    };

    let initial = builder::build(&parsed.vehicles, &catalog, &oracle);
    let num_containers = catalog.num_containers();

    let mut config = TabuConfig::for_instance(num_containers);
    if let Some(max_iters) = args.max_iters {
        config.max_iters = max_iters;
    }
    if let Some(secs) = args.timeout_secs {
        config.deadline = Some(Instant::now() + Duration::from_secs(secs));
    }

    let driver = TabuDriver::new(initial, num_containers);
    let (tabu_result, stop_reason) = driver.run(&catalog, &config);
    let solution = fleet::reduce(tabu_result);

    if args.csv {
        report::write_csv(std::io::stdout(), &solution).map_err(|e| SolverError::Inconsistency(e.to_string()))?;
    } else {
        report::print_text(&solution, &catalog);
    }

    if !solution.is_feasible() {
        return Err(match stop_reason {
            StopReason::Deadline => SolverError::Timeout,
            StopReason::Cancelled => SolverError::Cancelled,
            StopReason::MaxIters | StopReason::Patience => {
                SolverError::Infeasible { unassigned: solution.unassigned.len() }
            }
        });
    }

    Ok(())
}
