//! Brute-force keypair search loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::info;

use crate::crypto::{KeygenError, Keypair, KeypairSource};

use super::SearchTask;

/// Attempts are published to the shared counter in batches of this size to
/// keep atomic traffic off the hot path.
const STATS_BATCH: u64 = 1000;

/// Default number of attempts between progress reports.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1_000_000;

/// A successful search.
#[derive(Debug, Clone)]
pub struct Match {
    pub keypair: Keypair,
    /// Keypairs generated, including the matching one
    pub attempts: u64,
    pub elapsed: Duration,
}

/// Ways a search can end without a match.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("search cancelled")]
    Cancelled,

    #[error(transparent)]
    Keygen(#[from] KeygenError),

    #[error("search worker panicked: {0}")]
    Panicked(String),

    #[error("search worker exited without a result")]
    WorkerLost,

    #[error("worker pool is shut down")]
    PoolClosed,
}

/// Observer for long-running searches.
pub trait Progress: Send + Sync {
    fn report(&self, task: &SearchTask, attempts: u64);
}

/// Discards progress reports.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn report(&self, _task: &SearchTask, _attempts: u64) {}
}

/// Logs progress reports at `info` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl Progress for LogProgress {
    fn report(&self, task: &SearchTask, attempts: u64) {
        info!(
            task_id = task.id(),
            pattern = %task.pattern(),
            attempts,
            "search in progress"
        );
    }
}

/// Runs the generate-and-test loop for a single task on the calling thread.
#[derive(Clone)]
pub struct SearchEngine {
    progress_interval: u64,
    progress: Arc<dyn Progress>,
}

impl SearchEngine {
    /// `progress_interval` of 0 disables progress reports.
    pub fn new(progress_interval: u64, progress: Arc<dyn Progress>) -> Self {
        Self {
            progress_interval,
            progress,
        }
    }

    /// An engine that never reports progress.
    pub fn silent() -> Self {
        Self::new(0, Arc::new(NoProgress))
    }

    /// Generates keypairs until one matches the task pattern or the task's
    /// cancel signal is raised.
    ///
    /// There is no iteration bound. The signal is checked after every
    /// generated keypair, so cancellation is observed within one iteration.
    pub fn run(&self, task: &SearchTask) -> Result<Match, SearchError> {
        let source = KeypairSource::new();
        let pattern = task.pattern();
        let cancel = task.cancel_signal();
        let start = Instant::now();

        let mut attempts: u64 = 0;
        let mut unpublished: u64 = 0;

        loop {
            let keypair = match source.generate() {
                Ok(keypair) => keypair,
                Err(e) => {
                    task.record_attempts(unpublished);
                    return Err(e.into());
                }
            };
            attempts += 1;
            unpublished += 1;

            if cancel.is_raised() {
                task.record_attempts(unpublished);
                return Err(SearchError::Cancelled);
            }

            if pattern.matches_address(keypair.address()) {
                task.record_attempts(unpublished);
                return Ok(Match {
                    keypair,
                    attempts,
                    elapsed: start.elapsed(),
                });
            }

            if unpublished == STATS_BATCH {
                task.record_attempts(unpublished);
                unpublished = 0;
            }

            if self.progress_interval > 0 && attempts % self.progress_interval == 0 {
                self.progress.report(task, attempts);
            }
        }
    }
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRESS_INTERVAL, Arc::new(LogProgress))
    }
}
