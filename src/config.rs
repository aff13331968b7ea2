//! Named constants, mirroring the shape of the teacher's `config::constant`
//! module: tunable weights and search parameters live here instead of being
//! scattered as magic numbers through the solver.

pub mod weights {
    /// Per-unit-minute weight on total travel time.
    pub const W_DIST: f64 = 1.0;
    /// Weight on cumulative time-window lateness. Large enough to dominate
    /// any pure-distance improvement.
    pub const W_TW: f64 = 1.0e4;
    /// Weight on cumulative capacity overflow.
    pub const W_CAP: f64 = 1.0e4;
    /// Weight on total waiting time.
    pub const W_WAIT: f64 = 0.1;
    /// Weight per dump visit (trip count).
    pub const W_TRIPS: f64 = 1.0;
    /// Weight per unassigned container at the solution level.
    pub const W_UNASSIGNED: f64 = 1.0e6;
}

pub mod search {
    /// Default neighborhood sample cap per tabu-search iteration.
    pub const DEFAULT_NEIGHBORHOOD_CAP: usize = 5_000;
    /// Lower clamp on tabu tenure.
    pub const TENURE_MIN: u64 = 7;
    /// Upper clamp on tabu tenure.
    pub const TENURE_MAX: u64 = 30;
    /// Fraction of `patience` after which diversification kicks in.
    pub const DIVERSIFICATION_FRACTION: f64 = 0.5;
    /// Multiplier applied to `N_containers` for the default `max_iters`.
    pub const MAX_ITERS_FACTOR: u64 = 10;
    /// Multiplier applied to `N_containers` for the default `patience`.
    pub const PATIENCE_FACTOR: u64 = 2;
    /// Fixed seed for strategy 5 (random permutation) and diversification.
    pub const SEED: u64 = 42;
}

pub mod fleet {
    /// Maximum allowed cost regression from removing a route, as a
    /// fraction of pre-pass cost.
    pub const REDUCTION_SLACK: f64 = 0.02;
}
