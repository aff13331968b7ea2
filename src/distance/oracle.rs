//! The `CostOracle` contract (spec §4.A). Out of scope to implement "for
//! real" beyond what the pack already gives us (a file-provided matrix, or
//! the teacher's OSRM client) — the core treats it as a pure, synchronous,
//! thread-safe function from a directed node-id pair to travel minutes.

use std::collections::HashMap;

use crate::domain::types::NodeId;

/// Sentinel returned for unreachable/unknown pairs. Large enough that any
/// move relying on it is judged infeasible by the cost weights in
/// [`crate::config::weights`], but finite so arithmetic on it doesn't
/// produce NaNs.
pub const UNREACHABLE: f64 = 1.0e12;

/// Travel-time oracle between two node ids. Implementations must be
/// side-effect-free and safe to call concurrently from multiple threads
/// (the Move Generator scores candidates with `rayon`).
pub trait CostOracle: Send + Sync + std::fmt::Debug {
    fn travel(&self, from_id: NodeId, to_id: NodeId) -> f64;

    fn is_reachable(&self, from_id: NodeId, to_id: NodeId) -> bool {
        self.travel(from_id, to_id) < UNREACHABLE / 2.0
    }
}

/// An oracle backed by a fully materialized `from -> to -> minutes` map,
/// as produced by parsing `<base>.dmatrix-time.txt` or by pre-resolving an
/// OSRM table before the (synchronous) search loop starts.
#[derive(Debug, Clone, Default)]
pub struct MatrixOracle {
    table: HashMap<(NodeId, NodeId), f64>,
}

impl MatrixOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (NodeId, NodeId, f64)>) -> Self {
        let mut table = HashMap::new();
        for (from, to, cost) in entries {
            table.insert((from, to), cost);
        }
        Self { table }
    }

    pub fn insert(&mut self, from: NodeId, to: NodeId, cost: f64) {
        self.table.insert((from, to), cost);
    }
}

impl CostOracle for MatrixOracle {
    fn travel(&self, from_id: NodeId, to_id: NodeId) -> f64 {
        if from_id == to_id {
            return 0.0;
        }
        self.table
            .get(&(from_id, to_id))
            .copied()
            .unwrap_or(UNREACHABLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_pair_is_unreachable() {
        let oracle = MatrixOracle::new();
        assert_eq!(oracle.travel(1, 2), UNREACHABLE);
        assert!(!oracle.is_reachable(1, 2));
    }

    #[test]
    fn same_node_is_zero() {
        let oracle = MatrixOracle::new();
        assert_eq!(oracle.travel(5, 5), 0.0);
    }

    #[test]
    fn directed_lookup_not_assumed_symmetric() {
        let mut oracle = MatrixOracle::new();
        oracle.insert(1, 2, 10.0);
        assert_eq!(oracle.travel(1, 2), 10.0);
        assert_eq!(oracle.travel(2, 1), UNREACHABLE);
    }
}
