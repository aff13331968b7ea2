//! A Solution is a fleet of [`Route`]s plus the containers the Builder
//! could not assign to any of them (spec §4.D).

use std::sync::Arc;

use crate::config::weights;
use crate::distance::oracle::CostOracle;
use crate::domain::catalog::NodeCatalog;
use crate::domain::route::Route;
use crate::domain::types::{NodeId, Vehicle};

#[derive(Debug, Clone)]
pub struct Solution {
    pub routes: Vec<Route>,
    pub unassigned: Vec<NodeId>,
}

impl Solution {
    pub fn empty(vehicles: Vec<Vehicle>, catalog: Arc<NodeCatalog>, oracle: Arc<dyn CostOracle>) -> Self {
        let routes = vehicles
            .into_iter()
            .map(|v| Route::new(v, Arc::clone(&catalog), Arc::clone(&oracle)))
            .collect();
        Self {
            routes,
            unassigned: Vec::new(),
        }
    }

    /// Sum of every route's cost plus a fixed penalty per unassigned
    /// container, so the search always prefers assigning a container over
    /// leaving it out, however costly the insertion.
    pub fn total_cost(&self) -> f64 {
        let routed: f64 = self.routes.iter().map(Route::cost).sum();
        routed + weights::W_UNASSIGNED * self.unassigned.len() as f64
    }

    /// Number of routes that actually visit at least one container. An
    /// empty depot-to-depot route costs nothing and is not "used".
    pub fn num_vehicles_used(&self) -> usize {
        self.routes.iter().filter(|r| r.has_containers()).count()
    }

    pub fn is_feasible(&self) -> bool {
        self.unassigned.is_empty() && self.routes.iter().all(Route::feasible)
    }

    pub fn total_travel(&self) -> f64 {
        self.routes.iter().map(Route::total_travel).sum()
    }

    pub fn num_containers_served(&self) -> usize {
        self.routes.iter().map(|r| r.containers().count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::oracle::MatrixOracle;
    use crate::domain::types::{Node, NodeKind};

    #[test]
    fn empty_solution_has_zero_cost_and_is_feasible() {
        let nodes = vec![Node::new(0, 0.0, 0.0, 0.0, 1000.0, 0.0, 0.0, NodeKind::Depot)];
        let catalog = Arc::new(NodeCatalog::build(nodes).unwrap());
        let oracle: Arc<dyn CostOracle> = Arc::new(MatrixOracle::new());
        let vehicles = vec![Vehicle::new(1, 0, 0, 0, 10.0, 1, 0.0, 1000.0)];
        let solution = Solution::empty(vehicles, catalog, oracle);
        assert_eq!(solution.total_cost(), 0.0);
        assert!(solution.is_feasible());
        assert_eq!(solution.num_vehicles_used(), 0);
    }

    #[test]
    fn unassigned_containers_are_penalized() {
        let nodes = vec![Node::new(0, 0.0, 0.0, 0.0, 1000.0, 0.0, 0.0, NodeKind::Depot)];
        let catalog = Arc::new(NodeCatalog::build(nodes).unwrap());
        let oracle: Arc<dyn CostOracle> = Arc::new(MatrixOracle::new());
        let vehicles = vec![Vehicle::new(1, 0, 0, 0, 10.0, 1, 0.0, 1000.0)];
        let mut solution = Solution::empty(vehicles, catalog, oracle);
        solution.unassigned.push(42);
        assert_eq!(solution.total_cost(), weights::W_UNASSIGNED);
        assert!(!solution.is_feasible());
    }
}
