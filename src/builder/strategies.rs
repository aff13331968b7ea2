//! The seven greedy selection rules a strategy can use to pick which
//! container to insert next. Every strategy shares the same insertion
//! core (`best_insertion`); they differ only in the order containers are
//! offered to it.

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use super::insertion::{best_insertion, best_insertion_in_route, cheapest_insertion_in_route};
use crate::config::search;
use crate::distance::oracle::CostOracle;
use crate::domain::catalog::NodeCatalog;
use crate::domain::route::Route;
use crate::domain::solution::Solution;
use crate::domain::types::{NodeId, Vehicle};

pub const STRATEGY_COUNT: usize = 7;

pub fn run(
    strategy_id: usize,
    vehicles: Vec<Vehicle>,
    catalog: Arc<NodeCatalog>,
    oracle: Arc<dyn CostOracle>,
) -> Solution {
    let mut solution = Solution::empty(vehicles, Arc::clone(&catalog), Arc::clone(&oracle));
    let mut pool: Vec<NodeId> = catalog.containers().collect();

    match strategy_id {
        0 => {
            order_by(&mut pool, &catalog, |n| n.closes);
            greedy_insert_in_order(&mut solution, &mut pool);
        }
        1 => {
            order_by_desc(&mut pool, &catalog, |n| n.demand);
            greedy_insert_in_order(&mut solution, &mut pool);
        }
        2 => {
            order_farthest_from_dump(&mut pool, &catalog, &oracle);
            greedy_insert_in_order(&mut solution, &mut pool);
        }
        3 => nearest_neighbor_sweep(&mut solution, &mut pool, &oracle),
        4 => {
            shuffle(&mut pool);
            greedy_insert_in_order(&mut solution, &mut pool);
        }
        5 => {
            order_angular_sweep(&mut pool, &catalog);
            greedy_insert_in_order(&mut solution, &mut pool);
        }
        6 => regret_insertion(&mut solution, &mut pool),
        _ => unreachable!("strategy id out of range"),
    }

    solution.unassigned.extend(pool);
    solution
}

fn order_by<F: Fn(&crate::domain::types::Node) -> f64>(pool: &mut [NodeId], catalog: &NodeCatalog, key: F) {
    pool.sort_by(|&a, &b| {
        let na = catalog.get(a).expect("container id is valid");
        let nb = catalog.get(b).expect("container id is valid");
        key(&na).partial_cmp(&key(&nb)).expect("no NaN in input data")
    });
}

fn order_by_desc<F: Fn(&crate::domain::types::Node) -> f64>(pool: &mut [NodeId], catalog: &NodeCatalog, key: F) {
    pool.sort_by(|&a, &b| {
        let na = catalog.get(a).expect("container id is valid");
        let nb = catalog.get(b).expect("container id is valid");
        key(&nb).partial_cmp(&key(&na)).expect("no NaN in input data")
    });
}

fn order_farthest_from_dump(pool: &mut [NodeId], catalog: &NodeCatalog, oracle: &Arc<dyn CostOracle>) {
    let dumps: Vec<NodeId> = catalog.dumps().collect();
    let dist_to_nearest_dump = |id: NodeId| -> f64 {
        dumps
            .iter()
            .map(|&d| oracle.travel(id, d))
            .fold(f64::INFINITY, f64::min)
    };
    pool.sort_by(|&a, &b| {
        dist_to_nearest_dump(b)
            .partial_cmp(&dist_to_nearest_dump(a))
            .expect("oracle never returns NaN")
    });
}

fn order_angular_sweep(pool: &mut [NodeId], catalog: &NodeCatalog) {
    let nodes: Vec<_> = pool.iter().map(|&id| catalog.get(id).expect("valid id")).collect();
    let n = nodes.len().max(1) as f64;
    let cx = nodes.iter().map(|n| n.x).sum::<f64>() / n;
    let cy = nodes.iter().map(|n| n.y).sum::<f64>() / n;
    pool.sort_by(|&a, &b| {
        let na = catalog.get(a).expect("valid id");
        let nb = catalog.get(b).expect("valid id");
        let angle_a = (na.y - cy).atan2(na.x - cx);
        let angle_b = (nb.y - cy).atan2(nb.x - cx);
        angle_a.partial_cmp(&angle_b).expect("atan2 never returns NaN")
    });
}

fn shuffle(pool: &mut [NodeId]) {
    let mut rng = ChaCha8Rng::seed_from_u64(search::SEED);
    pool.shuffle(&mut rng);
}

/// Insert `pool` into `solution` in the given fixed order, each time at
/// the globally cheapest feasible position across every route.
fn greedy_insert_in_order(solution: &mut Solution, pool: &mut Vec<NodeId>) {
    let mut remaining = Vec::new();
    for &container_id in pool.iter() {
        if let Some((route_idx, new_route)) = best_insertion(solution, container_id, None) {
            debug!(container_id, route_idx, "inserted container");
            solution.routes[route_idx] = new_route;
        } else {
            remaining.push(container_id);
        }
    }
    *pool = remaining;
}

/// Strategy 4: at each step, grow the route of a single "active" vehicle
/// by always appending the remaining container nearest (by oracle travel
/// time) to that route's current last stop, advancing to the next vehicle
/// once the active one can take no more.
fn nearest_neighbor_sweep(solution: &mut Solution, pool: &mut Vec<NodeId>, oracle: &Arc<dyn CostOracle>) {
    let num_routes = solution.routes.len();
    if num_routes == 0 {
        return;
    }
    let mut active = 0usize;
    let mut stalled_in_a_row = 0usize;

    while !pool.is_empty() && stalled_in_a_row < num_routes {
        let tail = solution.routes[active].sequence[solution.routes[active].len() - 2];
        let nearest_idx = (0..pool.len())
            .min_by(|&i, &j| {
                oracle
                    .travel(tail, pool[i])
                    .partial_cmp(&oracle.travel(tail, pool[j]))
                    .expect("oracle never returns NaN")
            })
            .expect("pool is non-empty");
        let container_id = pool[nearest_idx];

        if let Some(new_route) = best_insertion_in_route(&solution.routes[active], container_id) {
            solution.routes[active] = new_route;
            pool.remove(nearest_idx);
            stalled_in_a_row = 0;
        } else {
            stalled_in_a_row += 1;
        }
        active = (active + 1) % num_routes;
    }
}

/// Strategy 7: repeatedly insert the container whose best insertion cost
/// is exceeded the most by its second-best option (highest "regret").
fn regret_insertion(solution: &mut Solution, pool: &mut Vec<NodeId>) {
    loop {
        let mut best_choice: Option<(usize, usize, Route, f64)> = None; // (pool_idx, route_idx, route, regret)

        for (pool_idx, &container_id) in pool.iter().enumerate() {
            let mut options: Vec<(usize, Route, f64)> = Vec::new();
            for (route_idx, route) in solution.routes.iter().enumerate() {
                if let Some((delta, candidate)) = cheapest_insertion_in_route(route, container_id) {
                    options.push((route_idx, candidate, delta));
                }
            }
            if options.is_empty() {
                continue;
            }
            options.sort_by(|a, b| a.2.partial_cmp(&b.2).expect("no NaN costs"));
            let best = &options[0];
            let regret = if options.len() > 1 {
                options[1].2 - options[0].2
            } else {
                f64::INFINITY
            };
            let is_better = match &best_choice {
                None => true,
                Some((_, _, _, best_regret)) => regret > *best_regret,
            };
            if is_better {
                best_choice = Some((pool_idx, best.0, best.1.clone(), regret));
            }
        }

        match best_choice {
            Some((pool_idx, route_idx, new_route, _)) => {
                solution.routes[route_idx] = new_route;
                pool.remove(pool_idx);
            }
            None => break,
        }
    }
}
