//! Runtime configuration for the vanity address bot.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::coordinator::RequestPolicy;
use crate::worker::DEFAULT_PROGRESS_INTERVAL;

/// Upper bound on worker threads; more than this is almost certainly a typo.
pub const MAX_WORKERS: usize = 1024;

/// Ethereum Vanity Address Bot
///
/// Reads chat commands (one per line) from stdin and answers on stdout.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Number of worker threads (default: number of CPU cores)
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Give up on a search after this many seconds (0 = never)
    #[arg(short = 't', long, default_value = "0")]
    pub timeout_secs: u64,

    /// Log search progress every N attempts (0 = off)
    #[arg(short = 'r', long, default_value_t = DEFAULT_PROGRESS_INTERVAL)]
    pub progress_interval: u64,

    /// Accept requests with neither prefix nor suffix
    #[arg(long, default_value = "false")]
    pub allow_empty: bool,

    /// Directory to save found keypairs as JSON records
    #[arg(short = 'o', long)]
    pub save_dir: Option<PathBuf>,
}

impl Config {
    /// Returns the number of workers, defaulting to CPU count
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get)
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    pub fn policy(&self) -> RequestPolicy {
        RequestPolicy {
            allow_empty: self.allow_empty,
            timeout: self.timeout(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.workers {
            Some(0) => Err(ConfigError::InvalidWorkers(
                "worker count must be at least 1".into(),
            )),
            Some(n) if n > MAX_WORKERS => Err(ConfigError::InvalidWorkers(format!(
                "worker count {} exceeds the maximum of {}",
                n, MAX_WORKERS
            ))),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid worker count: {0}")]
    InvalidWorkers(String),
}
