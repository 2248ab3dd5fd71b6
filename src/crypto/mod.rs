//! Cryptographic operations for Ethereum key and address generation.
//!
//! This module provides:
//! - Secure random key generation using secp256k1 and the OS CSPRNG
//! - Ethereum address derivation using Keccak-256

mod address;
mod keypair;

pub use address::{Address, ADDRESS_HEX_LEN};
pub use keypair::{KeygenError, Keypair, KeypairSource};
