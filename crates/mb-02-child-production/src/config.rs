//! Configuration types for child block production

use serde::Deserialize;
use shared_types::DEFAULT_GAS_LIMIT;
use std::time::Duration;

/// Runtime configuration for the child block producer
#[derive(Clone, Debug, Deserialize, serde::Serialize)]
#[serde(default)]
pub struct ChildProductionConfig {
    /// Child cadence in seconds (8 to 30)
    pub block_time_secs: u64,

    /// Maximum transactions per block
    pub max_transactions_per_block: usize,

    /// Block gas limit
    pub gas_limit: u64,

    /// Height of the first produced block
    pub start_height: u64,
}

impl Default for ChildProductionConfig {
    fn default() -> Self {
        Self {
            block_time_secs: crate::DEFAULT_CHILD_BLOCK_TIME_SECS,
            max_transactions_per_block: crate::DEFAULT_MAX_TRANSACTIONS,
            gas_limit: DEFAULT_GAS_LIMIT,
            start_height: 1,
        }
    }
}

impl ChildProductionConfig {
    /// Cadence as a `Duration`.
    pub fn block_time(&self) -> Duration {
        Duration::from_secs(self.block_time_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ChildProductionConfig::default();
        assert_eq!(config.block_time(), Duration::from_secs(8));
        assert_eq!(config.gas_limit, 10_000_000);
        assert_eq!(config.start_height, 1);
    }

    #[test]
    fn test_partial_override() {
        let config: ChildProductionConfig =
            serde_json::from_str(r#"{"block_time_secs":30}"#).unwrap();
        assert_eq!(config.block_time_secs, 30);
        assert_eq!(config.max_transactions_per_block, 1000);
    }
}
