//! Nonce search worker
//!
//! The search loop lives in [`search`]; this module holds the run summary and
//! the small helpers shared with the binary.

use crate::types::WorkAssignment;
use crate::utils::format_hash_rate;
use std::fmt;
use std::time::Duration;
use tracing::Span;

pub mod search;

pub use search::{NonceSearchLoop, SearchOptions, SearchState};

/// Counters for one completed run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Candidates hashed and classified
    pub evaluated: u64,
    /// Candidates that met the pool difficulty, solutions included
    pub shares: u32,
    /// Candidates that met the target difficulty
    pub solutions: u32,
    /// Reports that could not be delivered
    pub failed_reports: u32,
    /// Wall-clock time of the scan
    pub elapsed: Duration,
}

impl RunSummary {
    /// Average hash rate over the run
    pub fn hash_rate(&self) -> f64 {
        compute_hash_rate(self.evaluated, self.elapsed)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Sub-millisecond precision is noise in a log line
        let elapsed = Duration::from_millis(self.elapsed.as_millis() as u64);
        write!(
            f,
            "{} hashes in {} ({}), {} shares, {} solutions, {} failed reports",
            self.evaluated,
            humantime::format_duration(elapsed),
            format_hash_rate(self.hash_rate()),
            self.shares,
            self.solutions,
            self.failed_reports
        )
    }
}

/// Utility function to compute hash rate over a time period
pub fn compute_hash_rate(hashes: u64, elapsed: Duration) -> f64 {
    if elapsed.as_secs_f64() > 0.0 {
        hashes as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    }
}

/// Create a tracing span for one assignment
pub fn search_span(assignment: &WorkAssignment) -> Span {
    tracing::info_span!(
        "search",
        template_id = assignment.template_id(),
        nonce_from = assignment.nonce_from(),
        nonce_to = assignment.nonce_to(),
        blob_len = assignment.blob().len(),
    )
}
