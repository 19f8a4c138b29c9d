//! Nonce search loop
//!
//! Scans `[nonce_from, nonce_to)` one nonce at a time, in increasing order:
//! write the nonce into the blob, hash, classify, count shares, and report
//! solutions as they are found. A `Done` report closes the run.
//!
//! Finding a solution does not end the scan. One assignment may produce
//! several solutions, and deciding when enough work has been done belongs to
//! the coordinator, so the loop always covers the whole range.

use super::{search_span, RunSummary};
use crate::crypto::PowHasher;
use crate::difficulty::classify;
use crate::report::{ReportClient, ReportMessage};
use crate::types::{SearchOutcome, WorkAssignment, WorkRequest};
use crate::{Error, Result};
use std::fmt;
use std::time::Instant;
use tracing::{debug, error, info, warn, Instrument};

/// Number of candidates between cooperative yields to the runtime
pub const YIELD_INTERVAL: u64 = 4096;

/// Lifecycle of a search loop. There is no pause or cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Idle,
    Running,
    Completed,
}

impl fmt::Display for SearchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchState::Idle => write!(f, "idle"),
            SearchState::Running => write!(f, "running"),
            SearchState::Completed => write!(f, "completed"),
        }
    }
}

/// Runtime options for a search
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Log every candidate's digest and outcome
    pub verbose: bool,
}

/// Drives one assignment from first nonce to `Done`
pub struct NonceSearchLoop<H> {
    hasher: H,
    options: SearchOptions,
    state: SearchState,
}

impl<H: PowHasher> NonceSearchLoop<H> {
    /// Create a search loop with default options
    pub fn new(hasher: H) -> Self {
        Self::with_options(hasher, SearchOptions::default())
    }

    /// Create a search loop with the given options
    pub fn with_options(hasher: H, options: SearchOptions) -> Self {
        Self {
            hasher,
            options,
            state: SearchState::Idle,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> SearchState {
        self.state
    }

    /// Validate a raw request and run it.
    ///
    /// Nothing is hashed and nothing is reported if validation fails.
    pub async fn execute<R>(&mut self, request: WorkRequest, reporter: &R) -> Result<RunSummary>
    where
        R: ReportClient + ?Sized,
    {
        let assignment = WorkAssignment::try_from(request)?;
        self.run(assignment, reporter).await
    }

    /// Scan the whole assigned range and report the results.
    ///
    /// Report delivery failures are logged and counted but never stop the
    /// scan. A hasher failure aborts the run.
    pub async fn run<R>(&mut self, assignment: WorkAssignment, reporter: &R) -> Result<RunSummary>
    where
        R: ReportClient + ?Sized,
    {
        if self.state != SearchState::Idle {
            return Err(Error::invalid_state(format!(
                "search loop is {}, it runs exactly one assignment",
                self.state
            )));
        }

        let span = search_span(&assignment);
        self.scan(assignment, reporter).instrument(span).await
    }

    async fn scan<R>(&mut self, assignment: WorkAssignment, reporter: &R) -> Result<RunSummary>
    where
        R: ReportClient + ?Sized,
    {
        let WorkAssignment {
            template_id,
            nonce_from,
            nonce_to,
            pool_difficulty,
            target_difficulty,
            mut blob,
        } = assignment;

        self.state = SearchState::Running;
        info!(
            hasher = self.hasher.name(),
            transport = reporter.transport(),
            pool_difficulty = %pool_difficulty,
            target_difficulty = %target_difficulty,
            "Starting nonce search over {} candidates",
            nonce_to - nonce_from
        );

        let start = Instant::now();
        let mut summary = RunSummary::default();

        for nonce in nonce_from..nonce_to {
            blob.set_nonce(nonce);
            let digest = self.hasher.digest(blob.as_bytes())?;
            let outcome = classify(&digest, pool_difficulty, target_difficulty);
            summary.evaluated += 1;

            if self.options.verbose {
                debug!(nonce, digest = %digest, %outcome, "Evaluated candidate");
            }

            if outcome.is_share() {
                summary.shares += 1;
            }

            if outcome == SearchOutcome::Solution {
                summary.solutions += 1;
                info!(nonce, digest = %digest, "Found solution");

                let message = ReportMessage::Solution { template_id, nonce };
                if let Err(e) = reporter.send(&message).await {
                    summary.failed_reports += 1;
                    error!(nonce, error = %e, "Failed to report solution, continuing search");
                }
            }

            if summary.evaluated % YIELD_INTERVAL == 0 {
                tokio::task::yield_now().await;
            }
        }

        let done = ReportMessage::Done {
            nonce_from,
            share_count: summary.shares,
        };
        if let Err(e) = reporter.send(&done).await {
            summary.failed_reports += 1;
            warn!(error = %e, "Failed to report completion");
        }

        summary.elapsed = start.elapsed();
        self.state = SearchState::Completed;
        info!("Nonce search completed: {}", summary);

        Ok(summary)
    }
}
