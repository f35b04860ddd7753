//! Sink configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default DA namespace, "COLD" right-aligned in 28 bytes.
pub const DEFAULT_NAMESPACE: &str = "000000000000000000000000000000000000000000000000434f4c44";

/// Connection and retry settings for one sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// JSON-RPC endpoint.
    pub rpc_url: String,
    /// Bearer token sent with every request, if any.
    pub auth_token: Option<String>,
    /// Per-call timeout.
    pub timeout_ms: u64,
    /// Attempts per batch including the first.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles each time.
    pub retry_delay_ms: u64,
}

impl SinkConfig {
    /// Defaults pointed at `url`.
    pub fn with_url(url: &str) -> Self {
        Self {
            rpc_url: url.to_string(),
            auth_token: None,
            timeout_ms: 30_000,
            max_attempts: 3,
            retry_delay_ms: 1_000,
        }
    }

    /// Per-call timeout as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Delay before retry number `retry` (1-based).
    pub fn retry_delay(&self, retry: u32) -> Duration {
        let factor = 1u64 << retry.saturating_sub(1).min(16);
        Duration::from_millis(self.retry_delay_ms.saturating_mul(factor))
    }
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self::with_url("http://127.0.0.1:26658")
    }
}

/// Fan-out settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionConfig {
    /// Hex-encoded DA namespace.
    pub namespace: String,
    /// Read the blob back after submission and compare its hash.
    pub verify_da_inclusion: bool,
    /// Records kept in the audit log.
    pub audit_capacity: usize,
    /// Data-availability sink.
    pub da: SinkConfig,
    /// Settlement sink.
    pub settlement: SinkConfig,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            verify_da_inclusion: true,
            audit_capacity: 1024,
            da: SinkConfig::with_url("http://127.0.0.1:26658"),
            settlement: SinkConfig::with_url("http://127.0.0.1:8547"),
        }
    }
}
