//! Search execution.
//!
//! This module provides:
//! - The per-request task context and cancel signal
//! - The single-threaded generate-and-test search loop
//! - A fixed-size pool of worker threads that runs searches off the async
//!   control path

mod engine;
mod pool;
mod task;

pub use engine::{
    LogProgress, Match, NoProgress, Progress, SearchEngine, SearchError,
    DEFAULT_PROGRESS_INTERVAL,
};
pub use pool::{SearchHandle, WorkerPool};
pub use task::{CancelSignal, SearchTask};
