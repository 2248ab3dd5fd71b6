//! User-facing replies. Every request outcome maps to exactly one variant.

use std::fmt;
use std::time::Duration;

use crate::coordinator::{CancelReason, RequestError};
use crate::matcher::{Pattern, PatternError, MAX_COMPONENT_LEN};
use crate::worker::Match;

#[derive(Clone, PartialEq, Eq)]
pub enum Reply {
    Welcome,
    Usage,
    UnknownCommand,
    Searching {
        pattern: String,
        difficulty: &'static str,
    },
    Found {
        address: String,
        private_key: String,
        attempts: u64,
        elapsed: Duration,
    },
    Invalid(PatternError),
    Cancelled(CancelReason),
    Failed,
}

impl Reply {
    pub fn searching(pattern: &Pattern) -> Self {
        Reply::Searching {
            pattern: pattern.to_string(),
            difficulty: pattern.difficulty_description(),
        }
    }

    pub fn found(found: &Match) -> Self {
        Reply::Found {
            address: found.keypair.address().to_hex_prefixed(),
            private_key: found.keypair.private_key_hex(),
            attempts: found.attempts,
            elapsed: found.elapsed,
        }
    }

    pub fn from_error(error: &RequestError) -> Self {
        match error {
            RequestError::Validation(e) => Reply::Invalid(e.clone()),
            RequestError::Cancelled(reason) => Reply::Cancelled(*reason),
            RequestError::Internal(_) | RequestError::EntropyUnavailable(_) => Reply::Failed,
        }
    }

    pub fn from_outcome(outcome: &Result<Match, RequestError>) -> Self {
        match outcome {
            Ok(found) => Reply::found(found),
            Err(e) => Reply::from_error(e),
        }
    }
}

impl fmt::Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Welcome => f.write_str("Welcome"),
            Reply::Usage => f.write_str("Usage"),
            Reply::UnknownCommand => f.write_str("UnknownCommand"),
            Reply::Searching {
                pattern,
                difficulty,
            } => f
                .debug_struct("Searching")
                .field("pattern", pattern)
                .field("difficulty", difficulty)
                .finish(),
            Reply::Found {
                address,
                attempts,
                elapsed,
                ..
            } => f
                .debug_struct("Found")
                .field("address", address)
                .field("private_key", &"<redacted>")
                .field("attempts", attempts)
                .field("elapsed", elapsed)
                .finish(),
            Reply::Invalid(e) => f.debug_tuple("Invalid").field(e).finish(),
            Reply::Cancelled(reason) => f.debug_tuple("Cancelled").field(reason).finish(),
            Reply::Failed => f.write_str("Failed"),
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Welcome => write!(
                f,
                "Hi! Send /generate <prefix> [suffix] to create a vanity Ethereum wallet.\n\
                 Example: /generate abc   or   /generate - ff\n\
                 Use hex characters only, without 0x, at most {} per part. \
                 Use - to leave a part unconstrained.",
                MAX_COMPONENT_LEN
            ),
            Reply::Usage => write!(
                f,
                "Please include a hex prefix. Example: /generate abc"
            ),
            Reply::UnknownCommand => write!(
                f,
                "Unknown command. Use /generate to create a new wallet."
            ),
            Reply::Searching {
                pattern,
                difficulty,
            } => write!(
                f,
                "Searching for an address matching {}. Difficulty: {}. Please wait.",
                pattern, difficulty
            ),
            Reply::Found {
                address,
                private_key,
                attempts,
                elapsed,
            } => write!(
                f,
                "Found after {} attempts ({:.2}s)!\n\n\
                 Address: {}\n\
                 Private Key: {}\n\n\
                 Store this private key safely. Anyone who has it controls the funds.",
                attempts,
                elapsed.as_secs_f64(),
                address,
                private_key
            ),
            Reply::Invalid(e) => write!(f, "Invalid pattern: {}.", e),
            Reply::Cancelled(reason) => write!(
                f,
                "The search was stopped ({}) before a match was found. You can try again.",
                reason
            ),
            Reply::Failed => write!(
                f,
                "Something went wrong while creating the wallet. Please try again later."
            ),
        }
    }
}
