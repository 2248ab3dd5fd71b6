//! Ethereum keypair generation.

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;
use secp256k1::{PublicKey, Secp256k1, SecretKey, SignOnly};

use super::Address;

/// Errors raised while producing key material.
#[derive(Debug, thiserror::Error)]
pub enum KeygenError {
    /// The operating system randomness source failed. Continuing would risk
    /// weak keys, so callers treat this as fatal.
    #[error("secure randomness unavailable: {0}")]
    Entropy(String),

    /// The supplied bytes are not a valid secp256k1 scalar.
    #[error("invalid secret key: {0}")]
    InvalidSecret(String),
}

/// An Ethereum keypair (private key + derived address).
#[derive(Clone)]
pub struct Keypair {
    secret_key: [u8; 32],
    address: Address,
}

impl Keypair {
    /// Builds a keypair from existing secret bytes.
    pub fn from_secret_key(secret_bytes: [u8; 32]) -> Result<Self, KeygenError> {
        KeypairSource::new().from_secret_bytes(secret_bytes)
    }

    /// Returns the private key as a hex string (without 0x prefix).
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_key)
    }

    pub fn private_key_bytes(&self) -> &[u8; 32] {
        &self.secret_key
    }

    #[inline]
    pub fn address(&self) -> &Address {
        &self.address
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("address", &self.address)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Produces fresh random keypairs.
///
/// Holds its own secp256k1 context so the precomputation tables are built
/// once per search instead of once per trial.
pub struct KeypairSource {
    secp: Secp256k1<SignOnly>,
}

impl KeypairSource {
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::signing_only(),
        }
    }

    /// Generates a new random keypair from the OS CSPRNG.
    ///
    /// Draws that fall outside the curve order are redrawn. There is no
    /// fallback generator: if the OS source fails the error is returned.
    #[inline]
    pub fn generate(&self) -> Result<Keypair, KeygenError> {
        let mut secret = [0u8; 32];
        loop {
            OsRng
                .try_fill_bytes(&mut secret)
                .map_err(|e| KeygenError::Entropy(e.to_string()))?;

            match self.from_secret_bytes(secret) {
                Ok(keypair) => return Ok(keypair),
                Err(KeygenError::InvalidSecret(_)) => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn from_secret_bytes(&self, secret_bytes: [u8; 32]) -> Result<Keypair, KeygenError> {
        let secret_key = SecretKey::from_slice(&secret_bytes)
            .map_err(|e| KeygenError::InvalidSecret(e.to_string()))?;
        let public_key = PublicKey::from_secret_key(&self.secp, &secret_key);

        Ok(Keypair {
            secret_key: secret_bytes,
            address: derive_address(&public_key),
        })
    }
}

impl Default for KeypairSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Derives an Ethereum address from a secp256k1 public key.
///
/// Process:
/// 1. Serialize the public key in uncompressed form (65 bytes)
/// 2. Drop the 0x04 tag
/// 3. Keccak-256 the remaining 64 bytes and keep the last 20
#[inline]
fn derive_address(public_key: &PublicKey) -> Address {
    let public_key_bytes = public_key.serialize_uncompressed();
    Address::from_public_key_body(&public_key_bytes[1..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypair_generation() {
        let source = KeypairSource::new();
        let keypair = source.generate().unwrap();
        assert_eq!(keypair.private_key_hex().len(), 64);
        assert_eq!(keypair.address().to_hex().len(), 40);
    }

    #[test]
    fn test_generated_addresses_differ() {
        let source = KeypairSource::new();
        let a = source.generate().unwrap();
        let b = source.generate().unwrap();
        assert_ne!(a.address(), b.address());
        assert_ne!(a.private_key_bytes(), b.private_key_bytes());
    }

    #[test]
    fn test_deterministic_address() {
        let mut secret_bytes = [0u8; 32];
        secret_bytes[31] = 1;
        let keypair = Keypair::from_secret_key(secret_bytes).unwrap();

        // Address for private key = 1 is well-known
        assert_eq!(
            keypair.address().to_hex(),
            "7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn test_zero_secret_rejected() {
        let err = Keypair::from_secret_key([0u8; 32]).unwrap_err();
        assert!(matches!(err, KeygenError::InvalidSecret(_)));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let mut secret_bytes = [0u8; 32];
        secret_bytes[31] = 1;
        let keypair = Keypair::from_secret_key(secret_bytes).unwrap();
        let rendered = format!("{:?}", keypair);
        assert!(rendered.contains("redacted"));
        assert!(!rendered.contains(&keypair.private_key_hex()));
    }
}
