//! Registry configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default time before an unconfirmed claim may be retried (24h).
pub const DEFAULT_EXPIRY_TIMEOUT_SECS: u64 = 24 * 60 * 60;

/// Snapshot file name inside the data directory.
pub const DEFAULT_SNAPSHOT_FILE: &str = "nullifiers.json";

/// Nullifier registry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NullifierConfig {
    /// Seconds after which an unconfirmed `Spent` record is considered stuck
    pub expiry_timeout_secs: u64,
    /// File name used by the file-backed store
    pub snapshot_file: String,
}

impl Default for NullifierConfig {
    fn default() -> Self {
        Self {
            expiry_timeout_secs: DEFAULT_EXPIRY_TIMEOUT_SECS,
            snapshot_file: DEFAULT_SNAPSHOT_FILE.to_string(),
        }
    }
}

impl NullifierConfig {
    /// Expiry timeout as a duration
    pub fn expiry_timeout(&self) -> Duration {
        Duration::from_secs(self.expiry_timeout_secs)
    }
}
