//! Tabu Search Driver (spec §4.G): the main optimization loop.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rand::seq::SliceRandom;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, info_span};

use crate::config::search;
use crate::domain::catalog::NodeCatalog;
use crate::domain::solution::Solution;
use crate::domain::types::NodeId;
use crate::solver::moves::{self, Candidate, Move, TabuAttribute};

pub struct TabuConfig {
    pub max_iters: u64,
    pub patience: u64,
    pub neighborhood_cap: usize,
    pub deadline: Option<Instant>,
    pub cancel: Arc<AtomicBool>,
}

impl TabuConfig {
    pub fn for_instance(num_containers: usize) -> Self {
        let n = num_containers.max(1) as u64;
        Self {
            max_iters: search::MAX_ITERS_FACTOR * n,
            patience: search::PATIENCE_FACTOR * n,
            neighborhood_cap: search::DEFAULT_NEIGHBORHOOD_CAP,
            deadline: None,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }
}

pub struct TabuDriver {
    current: Solution,
    best: Solution,
    tabu_map: HashMap<TabuAttribute, u64>,
    move_frequency: HashMap<NodeId, u32>,
    iter: u64,
    iters_since_improve: u64,
    tenure: u64,
    rng: ChaCha8Rng,
}

/// Why `TabuDriver::run` stopped, so callers can tell a clean convergence
/// apart from a wall-clock timeout or an external cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    MaxIters,
    Patience,
    Cancelled,
    Deadline,
}

impl TabuDriver {
    pub fn new(initial: Solution, num_containers: usize) -> Self {
        let tenure = (num_containers as f64).sqrt().round() as u64;
        let tenure = tenure.clamp(search::TENURE_MIN, search::TENURE_MAX);
        Self {
            best: initial.clone(),
            current: initial,
            tabu_map: HashMap::new(),
            move_frequency: HashMap::new(),
            iter: 0,
            iters_since_improve: 0,
            tenure,
            rng: ChaCha8Rng::seed_from_u64(search::SEED),
        }
    }

    pub fn run(mut self, catalog: &NodeCatalog, config: &TabuConfig) -> (Solution, StopReason) {
        let _span = info_span!("tabu_search").entered();

        let reason = loop {
            if self.iter >= config.max_iters {
                info!(iter = self.iter, "stopping: max_iters reached");
                break StopReason::MaxIters;
            }
            if self.iters_since_improve >= config.patience {
                info!(iter = self.iter, "stopping: patience exhausted");
                break StopReason::Patience;
            }
            if config.cancel.load(Ordering::Relaxed) {
                info!(iter = self.iter, "stopping: cancelled");
                break StopReason::Cancelled;
            }
            if config.deadline.is_some_and(|d| Instant::now() >= d) {
                info!(iter = self.iter, "stopping: timed out");
                break StopReason::Deadline;
            }

            if self.iters_since_improve > 0
                && self.iters_since_improve as f64 >= config.patience as f64 * search::DIVERSIFICATION_FRACTION
            {
                self.diversify(catalog);
            }

            let candidates = moves::generate_candidates(&self.current, catalog, config.neighborhood_cap, &mut self.rng);
            self.step(candidates);
            self.iter += 1;
        };

        info!(iter = self.iter, best_cost = self.best.total_cost(), "tabu search finished");
        (self.best, reason)
    }

    fn step(&mut self, candidates: Vec<Candidate>) {
        let chosen = candidates
            .iter()
            .filter(|c| self.admissible(c))
            .min_by(|a, b| {
                a.delta_cost
                    .partial_cmp(&b.delta_cost)
                    .expect("cost is never NaN")
                    .then_with(|| family_rank(&a.mv).cmp(&family_rank(&b.mv)))
                    .then_with(|| a.attribute.cmp(&b.attribute))
            })
            .cloned();

        let Some(candidate) = chosen else {
            self.iters_since_improve += 1;
            return;
        };

        moves::apply(&mut self.current, candidate.mv);
        for &node_id in &candidate.touched {
            *self.move_frequency.entry(node_id).or_insert(0) += 1;
        }
        self.tabu_map.insert(candidate.attribute, self.iter + self.tenure);

        if self.current.is_feasible() && self.current.total_cost() < self.best.total_cost() {
            debug!(iter = self.iter, cost = self.current.total_cost(), "new best");
            self.best = self.current.clone();
            self.iters_since_improve = 0;
        } else {
            self.iters_since_improve += 1;
        }
    }

    /// A candidate must leave the route feasible to ever be accepted — an
    /// infeasible `current` is never a valid search state, tabu or not.
    /// Among feasible candidates, a tabu one is admissible only under
    /// aspiration: it would beat the best solution found so far.
    fn admissible(&self, candidate: &Candidate) -> bool {
        if !candidate.feasible_after {
            return false;
        }
        let is_tabu = self
            .tabu_map
            .get(&candidate.attribute)
            .is_some_and(|&expiry| expiry > self.iter);
        if !is_tabu {
            return true;
        }
        (self.current.total_cost() + candidate.delta_cost) < self.best.total_cost()
    }

    /// Forces a random inter-route insertion of the container least
    /// recently touched by an accepted move, without ever leaving
    /// `current` infeasible.
    fn diversify(&mut self, _catalog: &NodeCatalog) {
        let Some((origin_route, origin_pos, container_id)) = self.pick_diversification_target() else {
            return;
        };

        let mut targets: Vec<usize> = (0..self.current.routes.len()).filter(|&r| r != origin_route).collect();
        targets.shuffle(&mut self.rng);

        for target in targets {
            let best = {
                let route = &self.current.routes[target];
                (1..=route.len() - 1)
                    .filter_map(|j| {
                        let (delta, feasible) = route.delta_insert(j, container_id);
                        feasible.then_some((j, delta))
                    })
                    .min_by(|a, b| a.1.partial_cmp(&b.1).expect("cost is never NaN"))
            };

            let Some((j, _)) = best else { continue };

            let mut probe = self.current.routes[origin_route].clone();
            probe.remove(origin_pos);
            if !probe.feasible() {
                continue;
            }

            self.current.routes[origin_route] = probe;
            self.current.routes[target].insert(j, container_id);
            *self.move_frequency.entry(container_id).or_insert(0) += 1;
            info!(container_id, target, "diversification: forced insertion");
            return;
        }
    }

    fn pick_diversification_target(&mut self) -> Option<(usize, usize, NodeId)> {
        let mut candidates: Vec<(usize, usize, NodeId)> = self
            .current
            .routes
            .iter()
            .enumerate()
            .flat_map(|(r, route)| {
                route
                    .containers()
                    .map(move |id| (r, route.sequence.iter().position(|&n| n == id).unwrap(), id))
            })
            .collect();
        if candidates.is_empty() {
            return None;
        }
        let min_freq = candidates
            .iter()
            .map(|(_, _, id)| *self.move_frequency.get(id).unwrap_or(&0))
            .min()
            .expect("candidates is non-empty");
        candidates.retain(|(_, _, id)| *self.move_frequency.get(id).unwrap_or(&0) == min_freq);
        candidates.shuffle(&mut self.rng);
        candidates.into_iter().next()
    }
}

fn family_rank(mv: &Move) -> u8 {
    if moves::is_inter_route(mv) {
        0
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::distance::oracle::{CostOracle, MatrixOracle};
    use crate::domain::types::{Node, NodeKind, Vehicle};

    fn fixture() -> (Solution, NodeCatalog) {
        let nodes = vec![
            Node::new(0, 0.0, 0.0, 0.0, 1000.0, 0.0, 0.0, NodeKind::Depot),
            Node::new(1, 1.0, 0.0, 0.0, 1000.0, 0.0, 3.0, NodeKind::Container),
            Node::new(2, 2.0, 0.0, 0.0, 1000.0, 0.0, 3.0, NodeKind::Container),
            Node::new(3, 3.0, 0.0, 0.0, 1000.0, 0.0, 3.0, NodeKind::Container),
            Node::new(4, 0.0, 1.0, 0.0, 1000.0, 0.0, 0.0, NodeKind::Dump),
        ];
        let catalog_for_oracle = NodeCatalog::build(nodes.clone()).unwrap();
        let ids = [0u64, 1, 2, 3, 4];
        let mut entries = Vec::new();
        for &a in &ids {
            for &b in &ids {
                if a != b {
                    entries.push((a, b, 10.0));
                }
            }
        }
        let oracle: Arc<dyn CostOracle> = Arc::new(MatrixOracle::from_entries(entries));
        let catalog = Arc::new(catalog_for_oracle);
        let vehicles = vec![
            Vehicle::new(1, 0, 4, 0, 10.0, 2, 0.0, 1000.0),
            Vehicle::new(2, 0, 4, 0, 10.0, 2, 0.0, 1000.0),
        ];
        let mut solution = Solution::empty(vehicles, Arc::clone(&catalog), oracle);
        solution.routes[0].insert(1, 1);
        solution.routes[0].insert(2, 2);
        solution.routes[1].insert(1, 3);
        (solution, (*catalog).clone())
    }

    #[test]
    fn best_never_regresses_and_stays_feasible() {
        let (solution, catalog) = fixture();
        let driver = TabuDriver::new(solution, 3);
        let config = TabuConfig::for_instance(3);
        let (best, _reason) = driver.run(&catalog, &config);
        assert!(best.is_feasible());
    }

    #[test]
    fn terminates_within_max_iters() {
        let (solution, catalog) = fixture();
        let driver = TabuDriver::new(solution, 3);
        let mut config = TabuConfig::for_instance(3);
        config.max_iters = 5;
        config.patience = 1_000_000;
        let (best, reason) = driver.run(&catalog, &config);
        assert!(best.total_cost().is_finite());
        assert_eq!(reason, StopReason::MaxIters);
    }

    #[test]
    fn deadline_stop_is_reported_as_such() {
        let (solution, catalog) = fixture();
        let driver = TabuDriver::new(solution, 3);
        let mut config = TabuConfig::for_instance(3);
        config.deadline = Some(std::time::Instant::now());
        let (_best, reason) = driver.run(&catalog, &config);
        assert_eq!(reason, StopReason::Deadline);
    }

    #[test]
    fn never_accepts_an_infeasible_candidate_as_current() {
        let (solution, catalog) = fixture();
        let mut driver = TabuDriver::new(solution, 3);
        let infeasible = Candidate {
            mv: Move::IntraSwap { route: 0, i: 1, j: 2 },
            delta_cost: -1_000.0,
            feasible_after: false,
            attribute: TabuAttribute::NodePair(1, 2),
            touched: vec![1, 2],
        };
        assert!(!driver.admissible(&infeasible));
        driver.step(vec![infeasible]);
        assert!(driver.current.is_feasible());
    }
}
