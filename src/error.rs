//! Error kinds for the solver (spec §7). Parser and validator errors are
//! fatal and abort before any search begins; everything that can happen
//! once the search is running is absorbed locally (infeasible candidates
//! are discarded, not propagated).

use std::fmt;

#[derive(Debug, Clone)]
pub enum SolverError {
    /// Malformed line or non-numeric field, reported with file and line.
    InputFormat { file: String, line: usize, detail: String },
    /// Unknown id referenced, or a vehicle references a missing depot/dump.
    Reference(String),
    /// Inverted window, negative demand/capacity, and similar static checks.
    Inconsistency(String),
    /// The Builder exhausted every strategy and containers remain unassigned.
    Infeasible { unassigned: usize },
    /// The oracle had no data for a pair and every candidate move needed it.
    Stuck,
    /// Wall-clock budget exceeded; best-so-far is returned, not an error.
    Timeout,
    /// Cancellation signal observed; best-so-far is returned, not an error.
    Cancelled,
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverError::InputFormat { file, line, detail } => {
                write!(f, "{file}:{line}: malformed input: {detail}")
            }
            SolverError::Reference(msg) => write!(f, "reference error: {msg}"),
            SolverError::Inconsistency(msg) => write!(f, "inconsistent input: {msg}"),
            SolverError::Infeasible { unassigned } => {
                write!(f, "infeasible instance: {unassigned} containers unassigned")
            }
            SolverError::Stuck => write!(f, "search stuck: no oracle data for any candidate move"),
            SolverError::Timeout => write!(f, "timed out before converging"),
            SolverError::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::error::Error for SolverError {}

impl SolverError {
    /// Exit code mapping per spec §6.
    pub fn exit_code(&self) -> i32 {
        match self {
            SolverError::InputFormat { .. }
            | SolverError::Reference(_)
            | SolverError::Inconsistency(_) => 2,
            SolverError::Infeasible { .. } => 3,
            SolverError::Timeout => 4,
            SolverError::Stuck | SolverError::Cancelled => 1,
        }
    }
}
