//! Builds a fully materialized [`CostOracle`] from the `OSRM_BASE_URL`
//! backend, so the tabu search loop can treat cost lookups as a pure,
//! synchronous function (spec's no-await-in-the-loop rule). Called once
//! with `tokio::runtime::Handle::block_on` before the search starts.

use std::sync::Arc;

use tracing::{error, info};

use crate::distance::oracle::{CostOracle, MatrixOracle};
use crate::distance::providers::osrm;
use crate::domain::catalog::NodeCatalog;
use crate::domain::types::NodeId;
use crate::error::SolverError;

pub async fn build_osrm_oracle(
    catalog: &NodeCatalog,
    base_url: &str,
) -> Result<Arc<dyn CostOracle>, SolverError> {
    let mut ids: Vec<NodeId> = catalog
        .depots()
        .chain(catalog.dumps())
        .chain(catalog.containers())
        .collect();
    ids.sort_unstable();
    ids.dedup();

    let coords: Vec<(f64, f64)> = ids
        .iter()
        .map(|&id| {
            let node = catalog.get(id).expect("id was drawn from this catalog");
            (node.y, node.x)
        })
        .collect();

    info!(
        "requesting {n}x{n} travel-time matrix from OSRM at {base_url}",
        n = coords.len()
    );

    let matrix = osrm::fetch_duration_matrix(base_url, &coords)
        .await
        .ok_or(SolverError::Stuck)?;

    let mut oracle = MatrixOracle::new();
    for (i, &from_id) in ids.iter().enumerate() {
        for (j, &to_id) in ids.iter().enumerate() {
            if i == j {
                continue;
            }
            let minutes = matrix[i][j];
            if minutes.is_finite() {
                oracle.insert(from_id, to_id, minutes);
            } else {
                error!("OSRM returned no route {from_id} -> {to_id}");
            }
        }
    }

    Ok(Arc::new(oracle))
}
