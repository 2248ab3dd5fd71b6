//! # eth_vanity_bot
//!
//! Chat-driven Ethereum vanity address generator.
//!
//! ## Architecture
//!
//! - `crypto`: Key generation and address derivation
//! - `matcher`: Prefix/suffix pattern validation and matching
//! - `worker`: Search loop and the worker pool that runs it
//! - `coordinator`: Request lifecycle, from raw text to outcome
//! - `delivery`: Chat commands, replies and saved records
//! - `config`: Runtime configuration

pub mod config;
pub mod coordinator;
pub mod crypto;
pub mod delivery;
pub mod matcher;
pub mod worker;

pub use config::Config;
pub use coordinator::{CancelReason, RequestCoordinator, RequestError, RequestPolicy};
pub use crypto::{Address, Keypair, KeypairSource};
pub use matcher::{Pattern, PatternError};
pub use worker::{Match, SearchEngine, SearchError, SearchHandle, SearchTask, WorkerPool};
