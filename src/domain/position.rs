//! Cached per-position route state.
//!
//! The source kept these as parallel arrays (one `Vec` per field). Here a
//! single record per position holds everything, which keeps access cache
//! local and makes `delta_*` dry-runs a bounded forward simulation from a
//! cloned prefix rather than several independently-truncated arrays.

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PositionState {
    pub arrival_time: f64,
    pub departure_time: f64,
    pub load_after: f64,
    /// Cumulative travel cost (minutes) from route start through this position.
    pub cum_travel_cost: f64,
    /// Cumulative sum of `max(arrival - closes, 0)` through this position.
    pub cum_lateness: f64,
    /// Cumulative sum of `max(load_after - capacity, 0)` through this position.
    pub cum_cap_overflow: f64,
    /// Cumulative waiting time through this position.
    pub cum_wait: f64,
    /// Count of positions (through this one) where `arrival_time > closes`.
    pub twv_count: u32,
    /// Count of positions (through this one) where `load_after > capacity`.
    pub cv_count: u32,
    /// Count of Dump visits through this position.
    pub dump_count: u32,
}
