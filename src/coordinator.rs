//! End-to-end handling of one vanity address request.

use std::fmt;
use std::future::{self, Future};
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::crypto::KeygenError;
use crate::matcher::{Pattern, PatternError};
use crate::worker::{Match, SearchEngine, SearchError, SearchTask, WorkerPool};

/// Why a request stopped before finding a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The requester went away.
    Withdrawn,
    /// The request deadline passed.
    TimedOut,
    /// The process is shutting down.
    Shutdown,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Withdrawn => write!(f, "withdrawn"),
            CancelReason::TimedOut => write!(f, "timed out"),
            CancelReason::Shutdown => write!(f, "shutting down"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("invalid pattern: {0}")]
    Validation(#[from] PatternError),

    #[error("search cancelled ({0})")]
    Cancelled(CancelReason),

    #[error("internal error: {0}")]
    Internal(String),

    /// The OS randomness source failed. The process must not keep
    /// generating keys.
    #[error("secure randomness unavailable: {0}")]
    EntropyUnavailable(String),
}

impl RequestError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, RequestError::EntropyUnavailable(_))
    }
}

/// Request-level limits.
#[derive(Debug, Clone, Default)]
pub struct RequestPolicy {
    /// Accept a pattern with neither prefix nor suffix.
    pub allow_empty: bool,
    /// Cancel searches that run longer than this.
    pub timeout: Option<Duration>,
}

/// The work a worker runs for one request.
pub type SearchFn = Arc<dyn Fn(&SearchTask) -> Result<Match, SearchError> + Send + Sync>;

/// Validates requests, hands searches to the worker pool and translates
/// the results.
pub struct RequestCoordinator {
    pool: Arc<WorkerPool>,
    search: SearchFn,
    policy: RequestPolicy,
}

impl RequestCoordinator {
    /// Runs every request through `engine`.
    pub fn new(pool: Arc<WorkerPool>, engine: SearchEngine, policy: RequestPolicy) -> Self {
        Self::with_search(pool, Arc::new(move |task: &SearchTask| engine.run(task)), policy)
    }

    /// Runs every request through an arbitrary search function.
    pub fn with_search(pool: Arc<WorkerPool>, search: SearchFn, policy: RequestPolicy) -> Self {
        Self {
            pool,
            search,
            policy,
        }
    }

    pub fn pool(&self) -> &Arc<WorkerPool> {
        &self.pool
    }

    /// Parses raw user text and applies the empty-pattern policy.
    pub fn validate(&self, raw_prefix: &str, raw_suffix: &str) -> Result<Pattern, RequestError> {
        let pattern = Pattern::parse(raw_prefix, raw_suffix)?;
        if pattern.is_empty() && !self.policy.allow_empty {
            return Err(PatternError::Empty.into());
        }
        Ok(pattern)
    }

    /// Runs a request to completion, bounded only by the policy timeout.
    pub async fn handle(&self, raw_prefix: &str, raw_suffix: &str) -> Result<Match, RequestError> {
        self.handle_until(raw_prefix, raw_suffix, future::pending())
            .await
    }

    /// Like [`handle`](Self::handle), but also gives up when `cancel`
    /// resolves.
    pub async fn handle_until<C>(
        &self,
        raw_prefix: &str,
        raw_suffix: &str,
        cancel: C,
    ) -> Result<Match, RequestError>
    where
        C: Future<Output = CancelReason>,
    {
        let pattern = self.validate(raw_prefix, raw_suffix)?;
        self.search(pattern, cancel).await
    }

    /// Searches for an already validated pattern.
    ///
    /// This is the only await point of a request. Whatever the outcome, the
    /// underlying task is cancelled before returning, so a worker is never
    /// left running for an abandoned request.
    pub async fn search<C>(&self, pattern: Pattern, cancel: C) -> Result<Match, RequestError>
    where
        C: Future<Output = CancelReason>,
    {
        let task = self.pool.new_task(pattern);
        let task_id = task.id();
        let pattern = task.pattern().clone();
        info!(
            task_id,
            pattern = %pattern,
            difficulty = pattern.estimated_difficulty(),
            "search submitted"
        );

        let search = self.search.clone();
        let mut handle = self
            .pool
            .submit(task, move |task| search(task))
            .map_err(|e| {
                error!(task_id, error = %e, "search rejected");
                RequestError::Internal(e.to_string())
            })?;

        let timeout = self.policy.timeout;
        let deadline = async move {
            match timeout {
                Some(limit) => tokio::time::sleep(limit).await,
                None => future::pending::<()>().await,
            }
        };

        let outcome = tokio::select! {
            outcome = &mut handle => outcome,
            reason = cancel => {
                handle.cancel();
                warn!(task_id, attempts = handle.attempts(), %reason, "search cancelled");
                return Err(RequestError::Cancelled(reason));
            }
            _ = deadline => {
                handle.cancel();
                warn!(task_id, attempts = handle.attempts(), "search timed out");
                return Err(RequestError::Cancelled(CancelReason::TimedOut));
            }
        };

        match outcome {
            Ok(found) => {
                info!(
                    task_id,
                    address = %found.keypair.address(),
                    attempts = found.attempts,
                    elapsed_ms = found.elapsed.as_millis() as u64,
                    "match found"
                );
                Ok(found)
            }
            // Only a pool shutdown raises the signal without us having done so
            Err(SearchError::Cancelled) => {
                warn!(task_id, "search cancelled by pool shutdown");
                Err(RequestError::Cancelled(CancelReason::Shutdown))
            }
            Err(SearchError::Keygen(KeygenError::Entropy(message))) => {
                error!(task_id, %message, "secure randomness unavailable");
                Err(RequestError::EntropyUnavailable(message))
            }
            Err(e) => {
                error!(task_id, error = %e, "search failed");
                Err(RequestError::Internal(e.to_string()))
            }
        }
    }
}
