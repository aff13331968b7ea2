//! Constructive Builder (spec §4.E): runs all seven initialization
//! strategies independently and keeps the cheapest result.

pub(crate) mod insertion;
mod strategies;

use std::sync::Arc;

use rayon::prelude::*;
use tracing::{info, info_span};

use crate::distance::oracle::CostOracle;
use crate::domain::catalog::NodeCatalog;
use crate::domain::solution::Solution;
use crate::domain::types::Vehicle;

pub fn build(vehicles: &[Vehicle], catalog: &Arc<NodeCatalog>, oracle: &Arc<dyn CostOracle>) -> Solution {
    let _span = info_span!("build").entered();

    let mut candidates: Vec<Solution> = (0..strategies::STRATEGY_COUNT)
        .into_par_iter()
        .map(|strategy_id| {
            let solution = strategies::run(strategy_id, vehicles.to_vec(), Arc::clone(catalog), Arc::clone(oracle));
            info!(
                strategy_id,
                cost = solution.total_cost(),
                unassigned = solution.unassigned.len(),
                vehicles_used = solution.num_vehicles_used(),
                "strategy finished"
            );
            solution
        })
        .collect();

    candidates.sort_by(|a, b| {
        a.total_cost()
            .partial_cmp(&b.total_cost())
            .expect("solution cost is never NaN")
            .then_with(|| a.num_vehicles_used().cmp(&b.num_vehicles_used()))
            .then_with(|| a.unassigned.len().cmp(&b.unassigned.len()))
    });

    candidates.into_iter().next().expect("STRATEGY_COUNT > 0")
}
