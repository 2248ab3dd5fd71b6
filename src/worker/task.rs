//! Per-request search context.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::matcher::Pattern;

/// Cooperative cancellation flag polled by the search loop.
///
/// A signal created by the pool is also linked to the pool's shutdown flag,
/// so shutting the pool down cancels every task it owns.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    flag: Arc<AtomicBool>,
    shutdown: Option<Arc<AtomicBool>>,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn linked(shutdown: Arc<AtomicBool>) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            shutdown: Some(shutdown),
        }
    }

    /// Requests cancellation. Idempotent.
    pub fn raise(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_raised(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
            || self
                .shutdown
                .as_ref()
                .is_some_and(|s| s.load(Ordering::Relaxed))
    }
}

/// One in-flight search request.
#[derive(Debug)]
pub struct SearchTask {
    id: u64,
    pattern: Pattern,
    cancel: CancelSignal,
    attempts: Arc<AtomicU64>,
}

impl SearchTask {
    /// Creates a standalone task with its own cancel signal.
    pub fn new(id: u64, pattern: Pattern) -> Self {
        Self::with_signal(id, pattern, CancelSignal::new())
    }

    pub(crate) fn with_signal(id: u64, pattern: Pattern, cancel: CancelSignal) -> Self {
        Self {
            id,
            pattern,
            cancel,
            attempts: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn cancel_signal(&self) -> &CancelSignal {
        &self.cancel
    }

    /// Attempts published so far. Diagnostics only; may lag the search loop.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    pub(crate) fn attempts_counter(&self) -> Arc<AtomicU64> {
        self.attempts.clone()
    }

    pub(crate) fn record_attempts(&self, n: u64) {
        self.attempts.fetch_add(n, Ordering::Relaxed);
    }
}
