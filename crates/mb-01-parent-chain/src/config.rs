//! Configuration types for the parent chain client

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Primary target applied when the node does not report one.
pub const DEFAULT_PRIMARY_TARGET: u64 = 0x0000_0fff;

/// Runtime configuration for parent chain polling
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ParentChainConfig {
    /// JSON-RPC endpoint of the parent chain daemon
    pub rpc_url: String,

    /// Per-request timeout in milliseconds
    pub request_timeout_ms: u64,

    /// Poll interval in seconds (parent block time is 480s)
    pub poll_interval_secs: u64,

    /// Retry behaviour for transient failures
    pub retry: RetryPolicy,

    /// Most blocks yielded by a single poll when catching up
    pub max_catch_up: u64,

    /// Recent (height, hash) pairs kept for reorg detection
    pub reorg_window: usize,

    /// Primary target used when `getblock` omits one
    pub default_primary_target: u64,

    /// Auxiliary target used when `getblock` omits one
    pub default_auxiliary_target: Option<u64>,
}

impl Default for ParentChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:18180/json_rpc".to_string(),
            request_timeout_ms: 10_000,
            poll_interval_secs: 30,
            retry: RetryPolicy::default(),
            max_catch_up: 16,
            reorg_window: 101,
            default_primary_target: DEFAULT_PRIMARY_TARGET,
            default_auxiliary_target: None,
        }
    }
}

impl ParentChainConfig {
    /// Poll interval as a `Duration`.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Request timeout as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Exponential backoff with a hard cap.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Delay before the first retry
    pub base_delay_ms: u64,

    /// Upper bound on any single delay
    pub max_delay_ms: u64,

    /// Attempts per request, including the first
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay_ms: 500,
            max_delay_ms: 10_000,
            max_attempts: 5,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(20);
        let delay = self.base_delay_ms.saturating_mul(1u64 << exp);
        Duration::from_millis(delay.min(self.max_delay_ms))
    }

    /// Worst-case time spent sleeping between attempts.
    pub fn total_backoff(&self) -> Duration {
        (1..self.max_attempts.max(1)).map(|a| self.delay_for(a)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ParentChainConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(30));
        assert_eq!(config.reorg_window, 101);
        assert_eq!(config.default_primary_target, 0x0fff);
    }

    #[test]
    fn test_backoff_is_exponential_and_capped() {
        let policy = RetryPolicy {
            base_delay_ms: 100,
            max_delay_ms: 1_000,
            max_attempts: 8,
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(4), Duration::from_millis(800));
        assert_eq!(policy.delay_for(5), Duration::from_millis(1_000));
        assert_eq!(policy.delay_for(60), Duration::from_millis(1_000));
    }

    #[test]
    fn test_default_backoff_fits_in_poll_interval() {
        let config = ParentChainConfig::default();
        assert!(config.retry.total_backoff() < config.poll_interval());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ParentChainConfig =
            serde_json::from_str(r#"{"rpc_url":"http://node:1234","max_catch_up":4}"#).unwrap();
        assert_eq!(config.rpc_url, "http://node:1234");
        assert_eq!(config.max_catch_up, 4);
        assert_eq!(config.retry.max_attempts, 5);
    }
}
