//! Fleet Optimizer (spec §4.H): post-tabu pass that tries to empty and
//! retire routes, redistributing their containers to the remaining fleet.

use tracing::{info, info_span};

use crate::builder::insertion::best_insertion;
use crate::config::fleet;
use crate::domain::solution::Solution;
use crate::domain::types::NodeId;

pub fn reduce(mut solution: Solution) -> Solution {
    let _span = info_span!("fleet_optimizer").entered();
    let pre_cost = solution.total_cost();
    let budget = pre_cost * (1.0 + fleet::REDUCTION_SLACK);

    loop {
        let mut order: Vec<usize> = (0..solution.routes.len())
            .filter(|&idx| solution.routes[idx].containers().count() > 0)
            .collect();
        order.sort_by_key(|&idx| solution.routes[idx].containers().count());

        let mut removed_any = false;
        for idx in order.drain(..) {
            let snapshot = solution.clone();
            let containers: Vec<NodeId> = solution.routes[idx].containers().collect();
            solution.routes[idx].reset_empty();

            let all_placed = containers.into_iter().all(|c| reinsert_excluding(&mut solution, c, idx));

            if all_placed && solution.total_cost() <= budget {
                info!(route_idx = idx, "emptied route, cost within reduction slack");
                removed_any = true;
            } else {
                solution = snapshot;
            }
        }

        if !removed_any {
            break;
        }
    }

    solution
}

fn reinsert_excluding(solution: &mut Solution, container_id: NodeId, excluded: usize) -> bool {
    match best_insertion(solution, container_id, Some(excluded)) {
        Some((idx, route)) => {
            solution.routes[idx] = route;
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::distance::oracle::{CostOracle, MatrixOracle};
    use crate::domain::catalog::NodeCatalog;
    use crate::domain::types::{Node, NodeKind, Vehicle};

    #[test]
    fn empties_a_lightly_loaded_route_when_cheaper() {
        let nodes = vec![
            Node::new(0, 0.0, 0.0, 0.0, 1000.0, 0.0, 0.0, NodeKind::Depot),
            Node::new(1, 1.0, 0.0, 0.0, 1000.0, 0.0, 2.0, NodeKind::Container),
            Node::new(2, 0.0, 1.0, 0.0, 1000.0, 0.0, 0.0, NodeKind::Dump),
        ];
        let catalog = Arc::new(NodeCatalog::build(nodes).unwrap());
        let ids = [0u64, 1, 2];
        let mut entries = Vec::new();
        for &a in &ids {
            for &b in &ids {
                if a != b {
                    entries.push((a, b, 1.0));
                }
            }
        }
        let oracle: Arc<dyn CostOracle> = Arc::new(MatrixOracle::from_entries(entries));
        let vehicles = vec![
            Vehicle::new(1, 0, 2, 0, 10.0, 2, 0.0, 1000.0),
            Vehicle::new(2, 0, 2, 0, 10.0, 2, 0.0, 1000.0),
        ];
        let mut solution = Solution::empty(vehicles, catalog, oracle);
        solution.routes[1].insert(1, 1);

        let reduced = reduce(solution.clone());
        assert_eq!(reduced.num_vehicles_used(), 1);
        assert!(reduced.is_feasible());
        assert_eq!(reduced.num_containers_served(), solution.num_containers_served());
    }
}
