//! The Route Model (spec §4.C): a vehicle's ordered visits plus cached
//! per-position state, with O(1)-to-O(n) feasibility queries and
//! incremental updates under edits.

use std::sync::Arc;

use crate::config::weights;
use crate::distance::oracle::CostOracle;
use crate::domain::catalog::NodeCatalog;
use crate::domain::position::PositionState;
use crate::domain::types::{NodeId, Vehicle};

#[derive(Debug, Clone)]
pub struct Route {
    pub vehicle: Vehicle,
    pub sequence: Vec<NodeId>,
    state: Vec<PositionState>,
    catalog: Arc<NodeCatalog>,
    oracle: Arc<dyn CostOracle>,
}

impl Route {
    /// A fresh route `[start, end]` for `vehicle`.
    pub fn new(vehicle: Vehicle, catalog: Arc<NodeCatalog>, oracle: Arc<dyn CostOracle>) -> Self {
        let sequence = vec![vehicle.start_depot_id, vehicle.end_depot_id];
        let mut route = Self {
            vehicle,
            sequence,
            state: Vec::new(),
            catalog,
            oracle,
        };
        route.recompute_state(0);
        route
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// Drops every interior position, returning the route to `[start, end]`
    /// while keeping the same vehicle, catalog, and oracle. Used by the
    /// Fleet Optimizer when trying to empty a route.
    pub fn reset_empty(&mut self) {
        self.sequence = vec![self.vehicle.start_depot_id, self.vehicle.end_depot_id];
        self.recompute_state(0);
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// True if the route visits at least one Container.
    pub fn has_containers(&self) -> bool {
        self.sequence
            .iter()
            .any(|&id| matches!(self.catalog.get(id), Ok(n) if n.is_container()))
    }

    pub fn containers(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.sequence
            .iter()
            .copied()
            .filter(|&id| matches!(self.catalog.get(id), Ok(n) if n.is_container()))
    }

    pub fn state_at(&self, i: usize) -> PositionState {
        self.state[i]
    }

    fn last_state(&self) -> PositionState {
        *self.state.last().expect("route always has >= 2 positions")
    }

    // ---- core forward simulation, shared by mutation and dry-run paths ----

    fn compute_position(&self, seq: &[NodeId], state: &[PositionState], i: usize) -> PositionState {
        let node = self
            .catalog
            .get(seq[i])
            .expect("route may only reference catalog node ids");

        if i == 0 {
            let arrival = self.vehicle.shift_start;
            let departure = arrival.max(node.opens) + node.service;
            let lateness = (arrival - node.closes).max(0.0);
            return PositionState {
                arrival_time: arrival,
                departure_time: departure,
                load_after: 0.0,
                cum_travel_cost: 0.0,
                cum_lateness: lateness,
                cum_cap_overflow: 0.0,
                cum_wait: node.waiting_time(arrival),
                twv_count: (arrival > node.closes) as u32,
                cv_count: 0,
                dump_count: 0,
            };
        }

        let prev = state[i - 1];
        let prev_node_id = seq[i - 1];
        let travel = self.oracle.travel(prev_node_id, node.id);
        let arrival = prev.departure_time + travel;
        let departure = arrival.max(node.opens) + node.service;

        let load_after = if node.is_dump() {
            0.0
        } else {
            prev.load_after + node.demand.max(0.0)
        };
        let overflow = (load_after - self.vehicle.capacity).max(0.0);
        let lateness = (arrival - node.closes).max(0.0);

        PositionState {
            arrival_time: arrival,
            departure_time: departure,
            load_after,
            cum_travel_cost: prev.cum_travel_cost + travel,
            cum_lateness: prev.cum_lateness + lateness,
            cum_cap_overflow: prev.cum_cap_overflow + overflow,
            cum_wait: prev.cum_wait + node.waiting_time(arrival),
            twv_count: prev.twv_count + (arrival > node.closes) as u32,
            cv_count: prev.cv_count + (load_after > self.vehicle.capacity) as u32,
            dump_count: prev.dump_count + node.is_dump() as u32,
        }
    }

    /// Recompute cached state from position `from` to the end, O(n - from).
    pub fn evaluate_from(&mut self, from: usize) {
        self.recompute_state(from);
    }

    fn recompute_state(&mut self, from: usize) {
        let mut state = std::mem::take(&mut self.state);
        state.truncate(from);
        for i in from..self.sequence.len() {
            let ps = self.compute_position(&self.sequence, &state, i);
            state.push(ps);
        }
        self.state = state;
    }

    /// Dry-run a forward simulation over an alternative sequence without
    /// mutating `self`. `changed_from` is the first index whose node or
    /// whose predecessor's node differs from the current route.
    fn simulate(&self, new_sequence: &[NodeId], changed_from: usize) -> (f64, bool) {
        let prefix_len = changed_from.min(self.state.len());
        let mut state: Vec<PositionState> = self.state[..prefix_len].to_vec();
        for i in changed_from..new_sequence.len() {
            let ps = self.compute_position(new_sequence, &state, i);
            state.push(ps);
        }
        let last = *state.last().expect("non-empty sequence");
        let dump_count = last.dump_count;
        let cost = weights::W_DIST * last.cum_travel_cost
            + weights::W_TW * last.cum_lateness
            + weights::W_CAP * last.cum_cap_overflow
            + weights::W_WAIT * last.cum_wait
            + weights::W_TRIPS * dump_count as f64;
        let feasible = last.twv_count == 0
            && last.cv_count == 0
            && last.arrival_time <= self.vehicle.shift_end
            && dump_count <= self.vehicle.max_trips
            && state[0].departure_time >= self.vehicle.shift_start;
        (cost, feasible)
    }

    // ---- mutating operations ----

    /// Insert `node_id` at position `i`. O(n) amortized (recompute from `i`).
    pub fn insert(&mut self, i: usize, node_id: NodeId) {
        self.sequence.insert(i, node_id);
        self.recompute_state(i);
    }

    /// Remove the node at position `i`. O(n).
    pub fn remove(&mut self, i: usize) -> NodeId {
        let removed = self.sequence.remove(i);
        self.recompute_state(i.min(self.sequence.len()));
        removed
    }

    /// Swap the nodes at positions `i` and `j` within this route. O(n).
    pub fn swap(&mut self, i: usize, j: usize) {
        if i == j {
            return;
        }
        self.sequence.swap(i, j);
        self.recompute_state(i.min(j));
    }

    // ---- non-mutating dry runs ----

    pub fn delta_insert(&self, i: usize, node_id: NodeId) -> (f64, bool) {
        let before = self.cost();
        let mut new_sequence = self.sequence.clone();
        new_sequence.insert(i, node_id);
        let (after, feasible) = self.simulate(&new_sequence, i);
        (after - before, feasible)
    }

    pub fn delta_remove(&self, i: usize) -> (f64, bool) {
        let before = self.cost();
        let mut new_sequence = self.sequence.clone();
        new_sequence.remove(i);
        let (after, feasible) = self.simulate(&new_sequence, i.min(new_sequence.len()));
        (after - before, feasible)
    }

    pub fn delta_swap(&self, i: usize, j: usize) -> (f64, bool) {
        if i == j {
            return (0.0, self.feasible());
        }
        let before = self.cost();
        let mut new_sequence = self.sequence.clone();
        new_sequence.swap(i, j);
        let (after, feasible) = self.simulate(&new_sequence, i.min(j));
        (after - before, feasible)
    }

    /// Replace the node at `i` with `new_node_id` without mutating the
    /// route. Used to build inter-route swaps from two single-route dry
    /// runs (spec's `delta_swap_between`).
    pub fn delta_substitute(&self, i: usize, new_node_id: NodeId) -> (f64, bool) {
        let before = self.cost();
        let mut new_sequence = self.sequence.clone();
        new_sequence[i] = new_node_id;
        let (after, feasible) = self.simulate(&new_sequence, i);
        (after - before, feasible)
    }

    /// Combined dry run for an inter-route swap: exchange `self[i]` with
    /// `other[j]`. Returns `(total_delta_cost, feasible_after)` where
    /// feasibility requires both sides to remain feasible.
    pub fn delta_swap_between(&self, i: usize, other: &Route, j: usize) -> (f64, bool) {
        let node_self = self.sequence[i];
        let node_other = other.sequence[j];
        let (delta_self, feasible_self) = self.delta_substitute(i, node_other);
        let (delta_other, feasible_other) = other.delta_substitute(j, node_self);
        (delta_self + delta_other, feasible_self && feasible_other)
    }

    // ---- O(1) queries from cached totals ----

    pub fn feasible(&self) -> bool {
        let last = self.last_state();
        last.twv_count == 0
            && last.cv_count == 0
            && last.arrival_time <= self.vehicle.shift_end
            && last.dump_count <= self.vehicle.max_trips
            && self.state[0].departure_time >= self.vehicle.shift_start
    }

    pub fn cost(&self) -> f64 {
        let last = self.last_state();
        weights::W_DIST * last.cum_travel_cost
            + weights::W_TW * last.cum_lateness
            + weights::W_CAP * last.cum_cap_overflow
            + weights::W_WAIT * last.cum_wait
            + weights::W_TRIPS * last.dump_count as f64
    }

    pub fn total_travel(&self) -> f64 {
        self.last_state().cum_travel_cost
    }

    pub fn dump_count(&self) -> u32 {
        self.last_state().dump_count
    }

    pub fn load_after(&self, i: usize) -> f64 {
        self.state[i].load_after
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::oracle::MatrixOracle;
    use crate::domain::types::{Node, NodeKind};

    fn setup() -> (Arc<NodeCatalog>, Arc<dyn CostOracle>, Vehicle) {
        let nodes = vec![
            Node::new(0, 0.0, 0.0, 0.0, 1000.0, 0.0, 0.0, NodeKind::Depot),
            Node::new(1, 1.0, 0.0, 480.0, 600.0, 5.0, 3.0, NodeKind::Container),
            Node::new(2, 2.0, 0.0, 480.0, 600.0, 5.0, 3.0, NodeKind::Container),
            Node::new(3, 0.0, 1.0, 0.0, 1000.0, 0.0, 0.0, NodeKind::Dump),
        ];
        let catalog = Arc::new(NodeCatalog::build(nodes).unwrap());
        let oracle: Arc<dyn CostOracle> = Arc::new(MatrixOracle::from_entries([
            (0, 1, 10.0),
            (1, 2, 10.0),
            (2, 3, 10.0),
            (3, 0, 10.0),
            (0, 3, 10.0),
            (3, 1, 10.0),
            (1, 0, 10.0),
            (2, 0, 10.0),
            (0, 0, 0.0),
        ]));
        let vehicle = Vehicle::new(1, 0, 3, 0, 10.0, 1, 360.0, 840.0);
        (catalog, oracle, vehicle)
    }

    #[test]
    fn empty_route_cost_is_depot_to_depot_travel() {
        let (catalog, oracle, vehicle) = setup();
        let route = Route::new(vehicle, catalog, oracle);
        assert_eq!(route.sequence, vec![0, 0]);
        assert!(route.feasible());
        assert_eq!(route.cost(), 0.0);
    }

    #[test]
    fn insert_then_remove_round_trip() {
        let (catalog, oracle, vehicle) = setup();
        let mut route = Route::new(vehicle, catalog, oracle);
        let before = route.clone();
        route.insert(1, 1);
        route.remove(1);
        assert_eq!(route.sequence, before.sequence);
        assert_eq!(route.state, before.state);
    }

    #[test]
    fn swap_is_involution() {
        let (catalog, oracle, vehicle) = setup();
        let mut route = Route::new(vehicle, catalog, oracle);
        route.insert(1, 1);
        route.insert(2, 2);
        let before = route.clone();
        route.swap(1, 2);
        route.swap(1, 2);
        assert_eq!(route.sequence, before.sequence);
        assert_eq!(route.state, before.state);
    }

    #[test]
    fn delta_insert_matches_observed_cost_change() {
        let (catalog, oracle, vehicle) = setup();
        let mut route = Route::new(vehicle, catalog, oracle);
        let before = route.cost();
        let (delta, _feasible) = route.delta_insert(1, 1);
        route.insert(1, 1);
        let after = route.cost();
        assert!((after - before - delta).abs() < 1e-6);
    }

    #[test]
    fn delta_remove_matches_observed_cost_change() {
        let (catalog, oracle, vehicle) = setup();
        let mut route = Route::new(vehicle, catalog, oracle);
        route.insert(1, 1);
        route.insert(2, 2);
        let before = route.cost();
        let (delta, _feasible) = route.delta_remove(1);
        route.remove(1);
        let after = route.cost();
        assert!((after - before - delta).abs() < 1e-6);
    }

    #[test]
    fn dump_resets_load() {
        let (catalog, oracle, vehicle) = setup();
        let mut route = Route::new(vehicle, catalog, oracle);
        route.insert(1, 1);
        route.insert(2, 2);
        route.insert(3, 3);
        assert_eq!(route.load_after(3), 0.0);
        assert!(route.feasible());
    }

    #[test]
    fn capacity_overflow_is_infeasible() {
        let (catalog, oracle, vehicle) = setup();
        let mut route = Route::new(vehicle, catalog, oracle);
        route.insert(1, 1);
        route.insert(2, 2);
        // 3 + 3 = 6 <= capacity 10, still feasible; push past capacity.
        route.insert(2, 1);
        assert!(!route.feasible());
    }

    #[test]
    fn unreachable_pair_forces_infeasibility() {
        let nodes = vec![
            Node::new(0, 0.0, 0.0, 0.0, 1000.0, 0.0, 0.0, NodeKind::Depot),
            Node::new(1, 1.0, 0.0, 480.0, 600.0, 5.0, 3.0, NodeKind::Container),
        ];
        let catalog = Arc::new(NodeCatalog::build(nodes).unwrap());
        let oracle: Arc<dyn CostOracle> = Arc::new(MatrixOracle::new());
        let vehicle = Vehicle::new(1, 0, 0, 0, 10.0, 1, 360.0, 840.0);
        let mut route = Route::new(vehicle, catalog, oracle);
        route.insert(1, 1);
        assert!(!route.feasible());
    }
}
