//! Structured keypair records for persistence.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::matcher::Pattern;
use crate::worker::Match;

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A found keypair together with the request that produced it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeypairRecord {
    /// Lowercase, `0x`-prefixed
    pub address: String,
    /// Hex, no `0x`
    pub private_key: String,
    pub prefix: String,
    pub suffix: String,
    pub attempts: u64,
    /// Seconds since the Unix epoch
    pub created_at: u64,
}

impl KeypairRecord {
    pub fn new(pattern: &Pattern, found: &Match) -> Self {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        Self {
            address: found.keypair.address().to_hex_prefixed(),
            private_key: found.keypair.private_key_hex(),
            prefix: pattern.prefix().to_string(),
            suffix: pattern.suffix().to_string(),
            attempts: found.attempts,
            created_at,
        }
    }

    /// Writes the record as `<dir>/<address>.json`, creating `dir` if needed.
    /// On Unix the file is readable by its owner only.
    pub async fn save(&self, dir: &Path) -> Result<PathBuf, RecordError> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(format!("{}.json", self.address));
        let json = serde_json::to_vec_pretty(self)?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&path).await?;
        file.write_all(&json).await?;
        file.flush().await?;
        Ok(path)
    }
}

impl fmt::Debug for KeypairRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeypairRecord")
            .field("address", &self.address)
            .field("private_key", &"<redacted>")
            .field("prefix", &self.prefix)
            .field("suffix", &self.suffix)
            .field("attempts", &self.attempts)
            .field("created_at", &self.created_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::crypto::Keypair;

    fn sample() -> (Pattern, Match) {
        let mut secret = [0u8; 32];
        secret[31] = 1;
        let found = Match {
            keypair: Keypair::from_secret_key(secret).unwrap(),
            attempts: 3,
            elapsed: Duration::from_millis(5),
        };
        (Pattern::parse("7E", "-").unwrap(), found)
    }

    #[test]
    fn test_record_fields() {
        let (pattern, found) = sample();
        let record = KeypairRecord::new(&pattern, &found);

        assert_eq!(record.address, "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf");
        assert_eq!(record.private_key.len(), 64);
        assert_eq!(record.prefix, "7e");
        assert_eq!(record.suffix, "");
        assert_eq!(record.attempts, 3);
        assert!(record.created_at > 0);
        assert!(!format!("{:?}", record).contains(&record.private_key));
    }

    #[tokio::test]
    async fn test_save_writes_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let (pattern, found) = sample();
        let record = KeypairRecord::new(&pattern, &found);

        let path = record.save(&dir.path().join("wallets")).await.unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf.json"
        );

        let loaded: KeypairRecord =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(loaded, record);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_saved_record_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let (pattern, found) = sample();
        let path = KeypairRecord::new(&pattern, &found)
            .save(dir.path())
            .await
            .unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
