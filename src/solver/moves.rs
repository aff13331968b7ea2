//! Move Generator & Evaluator (spec §4.F): enumerates candidate
//! intra-route swaps, inter-route swaps, and insertions, and scores each
//! one's delta cost and feasibility without mutating the Solution.

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::domain::catalog::NodeCatalog;
use crate::domain::solution::Solution;
use crate::domain::types::{NodeId, VehicleId};

#[derive(Debug, Clone, Copy)]
pub enum Move {
    IntraSwap { route: usize, i: usize, j: usize },
    InterSwap { route_a: usize, i: usize, route_b: usize, j: usize },
    Insert { from_route: usize, i: usize, to_route: usize, j: usize },
}

/// Identifies a move for tabu-list purposes. An unordered node pair for
/// the two swap families, a (node, target vehicle) pair for insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TabuAttribute {
    NodePair(NodeId, NodeId),
    NodeRoute(NodeId, VehicleId),
}

fn node_pair(a: NodeId, b: NodeId) -> TabuAttribute {
    if a <= b {
        TabuAttribute::NodePair(a, b)
    } else {
        TabuAttribute::NodePair(b, a)
    }
}

#[derive(Debug, Clone)]
pub struct Candidate {
    pub mv: Move,
    pub delta_cost: f64,
    pub feasible_after: bool,
    pub attribute: TabuAttribute,
    /// Node ids touched by this move, for diversification's move-frequency bookkeeping.
    pub touched: Vec<NodeId>,
}

/// True for moves that reassign a container across two distinct vehicles,
/// used for the tabu driver's inter-before-intra tie-break.
pub fn is_inter_route(mv: &Move) -> bool {
    match mv {
        Move::InterSwap { .. } => true,
        Move::Insert { from_route, to_route, .. } => from_route != to_route,
        Move::IntraSwap { .. } => false,
    }
}

fn container_positions(route: &crate::domain::route::Route, catalog: &NodeCatalog) -> Vec<usize> {
    (1..route.len() - 1)
        .filter(|&i| {
            catalog
                .get(route.sequence[i])
                .map(|n| n.is_container())
                .unwrap_or(false)
        })
        .collect()
}

fn enumerate_moves(solution: &Solution, catalog: &NodeCatalog) -> Vec<Move> {
    let positions: Vec<Vec<usize>> = solution
        .routes
        .iter()
        .map(|r| container_positions(r, catalog))
        .collect();

    let mut moves = Vec::new();

    for (r, pos) in positions.iter().enumerate() {
        for a in 0..pos.len() {
            for b in (a + 1)..pos.len() {
                moves.push(Move::IntraSwap { route: r, i: pos[a], j: pos[b] });
            }
        }
    }

    for a in 0..positions.len() {
        for b in (a + 1)..positions.len() {
            for &i in &positions[a] {
                for &j in &positions[b] {
                    moves.push(Move::InterSwap { route_a: a, i, route_b: b, j });
                }
            }
        }
    }

    for a in 0..positions.len() {
        for &i in &positions[a] {
            for b in 0..solution.routes.len() {
                for j in 1..=solution.routes[b].len() - 1 {
                    if a == b && (j == i || j == i + 1) {
                        continue;
                    }
                    moves.push(Move::Insert { from_route: a, i, to_route: b, j });
                }
            }
        }
    }

    moves
}

/// Uniform sample of at most `cap` moves, preserving each family's share
/// of the population since the sample is drawn from the pooled list.
fn sample_capped(mut moves: Vec<Move>, cap: usize, rng: &mut ChaCha8Rng) -> Vec<Move> {
    if moves.len() <= cap {
        return moves;
    }
    moves.shuffle(rng);
    moves.truncate(cap);
    moves
}

pub fn generate_candidates(
    solution: &Solution,
    catalog: &NodeCatalog,
    cap: usize,
    rng: &mut ChaCha8Rng,
) -> Vec<Candidate> {
    let moves = sample_capped(enumerate_moves(solution, catalog), cap, rng);
    moves.into_par_iter().map(|mv| evaluate(solution, mv)).collect()
}

fn evaluate(solution: &Solution, mv: Move) -> Candidate {
    match mv {
        Move::IntraSwap { route, i, j } => {
            let r = &solution.routes[route];
            let (delta_cost, feasible_after) = r.delta_swap(i, j);
            let (node_i, node_j) = (r.sequence[i], r.sequence[j]);
            Candidate {
                mv,
                delta_cost,
                feasible_after,
                attribute: node_pair(node_i, node_j),
                touched: vec![node_i, node_j],
            }
        }
        Move::InterSwap { route_a, i, route_b, j } => {
            let ra = &solution.routes[route_a];
            let rb = &solution.routes[route_b];
            let (delta_cost, feasible_after) = ra.delta_swap_between(i, rb, j);
            let (node_a, node_b) = (ra.sequence[i], rb.sequence[j]);
            Candidate {
                mv,
                delta_cost,
                feasible_after,
                attribute: node_pair(node_a, node_b),
                touched: vec![node_a, node_b],
            }
        }
        Move::Insert { from_route, i, to_route, j } => {
            let node_id = solution.routes[from_route].sequence[i];
            let target_vid = solution.routes[to_route].vehicle.vid;
            let (delta_cost, feasible_after) = if from_route == to_route {
                let mut probe = solution.routes[from_route].clone();
                let before = probe.cost();
                probe.remove(i);
                let insert_at = if j > i { j - 1 } else { j };
                let insert_at = insert_at.clamp(1, probe.len().saturating_sub(1).max(1));
                probe.insert(insert_at, node_id);
                (probe.cost() - before, probe.feasible())
            } else {
                let (delta_remove, feasible_a) = solution.routes[from_route].delta_remove(i);
                let (delta_insert, feasible_b) = solution.routes[to_route].delta_insert(j, node_id);
                (delta_remove + delta_insert, feasible_a && feasible_b)
            };
            Candidate {
                mv,
                delta_cost,
                feasible_after,
                attribute: TabuAttribute::NodeRoute(node_id, target_vid),
                touched: vec![node_id],
            }
        }
    }
}

/// Applies `mv` to `solution` in place, recomputing only the routes the
/// move touches.
pub fn apply(solution: &mut Solution, mv: Move) {
    match mv {
        Move::IntraSwap { route, i, j } => solution.routes[route].swap(i, j),
        Move::InterSwap { route_a, i, route_b, j } => {
            let node_a = solution.routes[route_a].sequence[i];
            let node_b = solution.routes[route_b].sequence[j];
            solution.routes[route_a].remove(i);
            solution.routes[route_a].insert(i, node_b);
            solution.routes[route_b].remove(j);
            solution.routes[route_b].insert(j, node_a);
        }
        Move::Insert { from_route, i, to_route, j } => {
            if from_route == to_route {
                let node_id = solution.routes[from_route].sequence[i];
                let route = &mut solution.routes[from_route];
                route.remove(i);
                let insert_at = if j > i { j - 1 } else { j };
                let insert_at = insert_at.clamp(1, route.len().saturating_sub(1).max(1));
                route.insert(insert_at, node_id);
            } else {
                let node_id = solution.routes[from_route].remove(i);
                solution.routes[to_route].insert(j, node_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rand_chacha::rand_core::SeedableRng;

    use super::*;
    use crate::distance::oracle::{CostOracle, MatrixOracle};
    use crate::domain::catalog::NodeCatalog;
    use crate::domain::types::{Node, NodeKind, Vehicle};

    fn fixture() -> Solution {
        let nodes = vec![
            Node::new(0, 0.0, 0.0, 0.0, 1000.0, 0.0, 0.0, NodeKind::Depot),
            Node::new(1, 1.0, 0.0, 0.0, 1000.0, 0.0, 3.0, NodeKind::Container),
            Node::new(2, 2.0, 0.0, 0.0, 1000.0, 0.0, 3.0, NodeKind::Container),
            Node::new(3, 0.0, 1.0, 0.0, 1000.0, 0.0, 0.0, NodeKind::Dump),
        ];
        let catalog = Arc::new(NodeCatalog::build(nodes).unwrap());
        let ids = [0u64, 1, 2, 3];
        let mut entries = Vec::new();
        for &a in &ids {
            for &b in &ids {
                if a != b {
                    entries.push((a, b, 10.0));
                }
            }
        }
        let oracle: Arc<dyn CostOracle> = Arc::new(MatrixOracle::from_entries(entries));
        let vehicles = vec![
            Vehicle::new(1, 0, 3, 0, 10.0, 2, 0.0, 1000.0),
            Vehicle::new(2, 0, 3, 0, 10.0, 2, 0.0, 1000.0),
        ];
        let mut solution = Solution::empty(vehicles, catalog, oracle);
        solution.routes[0].insert(1, 1);
        solution.routes[1].insert(1, 2);
        solution
    }

    #[test]
    fn inter_swap_delta_matches_applied_cost_change() {
        let solution = fixture();
        let catalog_nodes = vec![
            Node::new(0, 0.0, 0.0, 0.0, 1000.0, 0.0, 0.0, NodeKind::Depot),
            Node::new(1, 1.0, 0.0, 0.0, 1000.0, 0.0, 3.0, NodeKind::Container),
            Node::new(2, 2.0, 0.0, 0.0, 1000.0, 0.0, 3.0, NodeKind::Container),
            Node::new(3, 0.0, 1.0, 0.0, 1000.0, 0.0, 0.0, NodeKind::Dump),
        ];
        let catalog = NodeCatalog::build(catalog_nodes).unwrap();

        let before = solution.total_cost();
        let candidate = evaluate(&solution, Move::InterSwap { route_a: 0, i: 1, route_b: 1, j: 1 });
        let mut mutated = solution.clone();
        apply(&mut mutated, candidate.mv);
        let after = mutated.total_cost();
        assert!((after - before - candidate.delta_cost).abs() < 1e-6);
        let _ = catalog;
    }

    #[test]
    fn generate_candidates_respects_cap() {
        let solution = fixture();
        let catalog_nodes = vec![
            Node::new(0, 0.0, 0.0, 0.0, 1000.0, 0.0, 0.0, NodeKind::Depot),
            Node::new(1, 1.0, 0.0, 0.0, 1000.0, 0.0, 3.0, NodeKind::Container),
            Node::new(2, 2.0, 0.0, 0.0, 1000.0, 0.0, 3.0, NodeKind::Container),
            Node::new(3, 0.0, 1.0, 0.0, 1000.0, 0.0, 0.0, NodeKind::Dump),
        ];
        let catalog = NodeCatalog::build(catalog_nodes).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let candidates = generate_candidates(&solution, &catalog, 1, &mut rng);
        assert_eq!(candidates.len(), 1);
    }
}
