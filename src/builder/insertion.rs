//! Cheapest-feasible-position insertion, shared by every Builder strategy
//! and by the Fleet Optimizer's redistribution pass.

use crate::domain::route::Route;
use crate::domain::solution::Solution;
use crate::domain::types::NodeId;

/// Best route and resulting route state for inserting `container_id`
/// anywhere in `solution`, optionally excluding one route index (the
/// Fleet Optimizer excludes the route it is trying to empty).
pub(crate) fn best_insertion(
    solution: &Solution,
    container_id: NodeId,
    exclude: Option<usize>,
) -> Option<(usize, Route)> {
    solution
        .routes
        .iter()
        .enumerate()
        .filter(|(idx, _)| Some(*idx) != exclude)
        .filter_map(|(idx, route)| cheapest_insertion_in_route(route, container_id).map(|(delta, r)| (idx, r, delta)))
        .min_by(|a, b| a.2.partial_cmp(&b.2).expect("no NaN costs"))
        .map(|(idx, r, _)| (idx, r))
}

pub(crate) fn best_insertion_in_route(route: &Route, container_id: NodeId) -> Option<Route> {
    cheapest_insertion_in_route(route, container_id).map(|(_, r)| r)
}

pub(crate) fn cheapest_insertion_in_route(route: &Route, container_id: NodeId) -> Option<(f64, Route)> {
    let dump_id = route.vehicle.dump_id;
    let mut best: Option<(f64, Route)> = None;

    for i in 1..=route.len() - 1 {
        if let Some(candidate) = try_insert(route, i, container_id) {
            let delta = candidate.cost() - route.cost();
            if best.as_ref().map_or(true, |(d, _)| delta < *d) {
                best = Some((delta, candidate));
            }
        }
        if let Some(candidate) = try_insert_with_dump(route, i, container_id, dump_id) {
            let delta = candidate.cost() - route.cost();
            if best.as_ref().map_or(true, |(d, _)| delta < *d) {
                best = Some((delta, candidate));
            }
        }
    }
    best
}

fn try_insert(route: &Route, i: usize, container_id: NodeId) -> Option<Route> {
    let mut candidate = route.clone();
    candidate.insert(i, container_id);
    candidate.feasible().then_some(candidate)
}

fn try_insert_with_dump(route: &Route, i: usize, container_id: NodeId, dump_id: NodeId) -> Option<Route> {
    let mut candidate = route.clone();
    candidate.insert(i, dump_id);
    candidate.insert(i + 1, container_id);
    candidate.feasible().then_some(candidate)
}
