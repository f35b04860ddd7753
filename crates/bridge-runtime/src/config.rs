//! # Bridge Configuration
//!
//! One file aggregates every subsystem's settings.
//!
//! Sources, later ones winning:
//!
//! 1. built-in defaults
//! 2. TOML file passed with `--config`
//! 3. `MB_*` environment variables
//! 4. command-line flags

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use mb_01_parent_chain::ParentChainConfig;
use mb_02_child_production::ChildProductionConfig;
use mb_03_pow_verification::PowConfig;
use mb_04_chain_guards::{ReorgConfig, TimingConfig};
use mb_05_nullifier_registry::NullifierConfig;
use mb_07_submission::SubmissionConfig;
use mb_08_finalization::FinalizationConfig;
use serde::{Deserialize, Serialize};
use shared_types::ValidatorStake;
use thiserror::Error;

use crate::cli::Cli;

/// Namespace length accepted by the DA layer.
pub const NAMESPACE_BYTES: usize = 28;

/// Allowed child block cadence, seconds.
pub const CHILD_BLOCK_TIME_RANGE: std::ops::RangeInclusive<u64> = 8..=30;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file unreadable.
    #[error("Failed to read config file {path}: {source}")]
    Read {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`BridgeConfig`].
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: toml::de::Error,
    },

    /// An environment override did not parse.
    #[error("Invalid value for {var}: {value}")]
    InvalidEnv {
        /// Variable name
        var: &'static str,
        /// Offending value
        value: String,
    },

    /// Settings are individually or jointly inconsistent.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Process-level settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Directory for the nullifier snapshot (or RocksDB).
    pub data_dir: PathBuf,
    /// Status HTTP listener; `None` disables it.
    pub status_addr: Option<SocketAddr>,
    /// Hex Ed25519 seed for proof signatures; digest signatures when absent.
    pub signer_seed: Option<String>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            status_addr: Some(SocketAddr::from(([127, 0, 0, 1], 8650))),
            signer_seed: None,
        }
    }
}

/// Complete bridge configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Process settings.
    pub node: NodeConfig,
    /// Parent chain polling.
    pub parent: ParentChainConfig,
    /// Child block production.
    pub child: ChildProductionConfig,
    /// Proof-of-work checks.
    pub pow: PowConfig,
    /// Parent interval scoring.
    pub timing: TimingConfig,
    /// Reorg depth policy.
    pub reorg: ReorgConfig,
    /// Nullifier expiry and snapshot file.
    pub nullifier: NullifierConfig,
    /// DA and settlement sinks.
    pub submission: SubmissionConfig,
    /// Orchestrator channels and shutdown.
    pub finalization: FinalizationConfig,
    /// Initial validator stakes subject to reorg slashing.
    pub validators: Vec<ValidatorStake>,
}

impl BridgeConfig {
    /// Resolve the configuration for this process.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file; missing sections keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `MB_*` overrides read through `lookup`.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(url) = lookup("MB_PARENT_RPC_URL") {
            self.parent.rpc_url = url;
        }
        if let Some(url) = lookup("MB_DA_RPC_URL") {
            self.submission.da.rpc_url = url;
        }
        if let Some(token) = lookup("MB_DA_AUTH_TOKEN") {
            self.submission.da.auth_token = Some(token);
        }
        if let Some(url) = lookup("MB_SETTLEMENT_RPC_URL") {
            self.submission.settlement.rpc_url = url;
        }
        if let Some(dir) = lookup("MB_DATA_DIR") {
            self.node.data_dir = PathBuf::from(dir);
        }
        if let Some(addr) = lookup("MB_STATUS_ADDR") {
            self.node.status_addr = if addr.is_empty() || addr == "off" {
                None
            } else {
                Some(addr.parse().map_err(|_| ConfigError::InvalidEnv {
                    var: "MB_STATUS_ADDR",
                    value: addr.clone(),
                })?)
            };
        }
        if let Some(seed) = lookup("MB_SIGNER_SEED") {
            self.node.signer_seed = Some(seed);
        }
        Ok(())
    }

    /// Apply command-line flags.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(dir) = &cli.data_dir {
            self.node.data_dir = dir.clone();
        }
        if let Some(addr) = cli.status_addr {
            self.node.status_addr = Some(addr);
        }
        if cli.no_status {
            self.node.status_addr = None;
        }
        if let Some(url) = &cli.parent_rpc_url {
            self.parent.rpc_url = url.clone();
        }
        if let Some(url) = &cli.da_rpc_url {
            self.submission.da.rpc_url = url.clone();
        }
        if let Some(url) = &cli.settlement_rpc_url {
            self.submission.settlement.rpc_url = url.clone();
        }
    }

    /// Check every section and the constraints between them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pow
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.timing
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.reorg
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if !CHILD_BLOCK_TIME_RANGE.contains(&self.child.block_time_secs) {
            return Err(ConfigError::Invalid(format!(
                "child.block_time_secs must be within {}..={}, got {}",
                CHILD_BLOCK_TIME_RANGE.start(),
                CHILD_BLOCK_TIME_RANGE.end(),
                self.child.block_time_secs
            )));
        }

        let backoff = self.parent.retry.total_backoff();
        if self.parent.poll_interval() <= backoff {
            return Err(ConfigError::Invalid(format!(
                "parent.poll_interval_secs ({}s) must exceed the worst-case retry backoff ({:?})",
                self.parent.poll_interval_secs, backoff
            )));
        }

        match hex::decode(&self.submission.namespace) {
            Ok(bytes) if bytes.len() == NAMESPACE_BYTES => {}
            _ => {
                return Err(ConfigError::Invalid(format!(
                    "submission.namespace must be {} hex-encoded bytes",
                    NAMESPACE_BYTES
                )))
            }
        }

        if self.submission.da.max_attempts == 0 || self.submission.settlement.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "sink max_attempts must be at least 1".into(),
            ));
        }

        if self.finalization.channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "finalization.channel_capacity must be at least 1".into(),
            ));
        }

        self.signer_seed()?;
        Ok(())
    }

    /// Decoded signer seed, if configured.
    pub fn signer_seed(&self) -> Result<Option<[u8; 32]>, ConfigError> {
        let Some(seed) = &self.node.signer_seed else {
            return Ok(None);
        };
        let bytes = hex::decode(seed.trim_start_matches("0x"))
            .map_err(|e| ConfigError::Invalid(format!("node.signer_seed: {e}")))?;
        let seed: [u8; 32] = bytes.try_into().map_err(|_| {
            ConfigError::Invalid("node.signer_seed must be 32 bytes".into())
        })?;
        Ok(Some(seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config_is_valid() {
        BridgeConfig::default().validate().unwrap();
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: BridgeConfig = toml::from_str(
            r#"
            [parent]
            rpc_url = "http://parent:18180/json_rpc"

            [reorg]
            acceptable_depth = 6

            [[validators]]
            validator_id = "pool-a"
            staked = 50000
            penalties = 0
            last_activity = 0
            "#,
        )
        .unwrap();

        assert_eq!(config.parent.rpc_url, "http://parent:18180/json_rpc");
        assert_eq!(config.parent.poll_interval_secs, 30);
        assert_eq!(config.reorg.acceptable_depth, 6);
        assert_eq!(config.reorg.max_reorg_depth, 100);
        assert_eq!(config.validators.len(), 1);
        assert_eq!(config.child.block_time_secs, 8);
        config.validate().unwrap();
    }

    #[test]
    fn test_env_overrides() {
        let mut config = BridgeConfig::default();
        config
            .apply_env(lookup(&[
                ("MB_PARENT_RPC_URL", "http://p"),
                ("MB_DA_RPC_URL", "http://da"),
                ("MB_SETTLEMENT_RPC_URL", "http://s"),
                ("MB_DATA_DIR", "/var/lib/bridge"),
                ("MB_STATUS_ADDR", "0.0.0.0:9000"),
            ]))
            .unwrap();

        assert_eq!(config.parent.rpc_url, "http://p");
        assert_eq!(config.submission.da.rpc_url, "http://da");
        assert_eq!(config.submission.settlement.rpc_url, "http://s");
        assert_eq!(config.node.data_dir, PathBuf::from("/var/lib/bridge"));
        assert_eq!(
            config.node.status_addr,
            Some("0.0.0.0:9000".parse().unwrap())
        );
    }

    #[test]
    fn test_status_addr_can_be_disabled() {
        let mut config = BridgeConfig::default();
        config.apply_env(lookup(&[("MB_STATUS_ADDR", "off")])).unwrap();
        assert_eq!(config.node.status_addr, None);
    }

    #[test]
    fn test_bad_status_addr_env() {
        let mut config = BridgeConfig::default();
        let err = config
            .apply_env(lookup(&[("MB_STATUS_ADDR", "not-an-addr")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: "MB_STATUS_ADDR", .. }));
    }

    #[test]
    fn test_cli_beats_env() {
        let mut config = BridgeConfig::default();
        config
            .apply_env(lookup(&[("MB_PARENT_RPC_URL", "http://env")]))
            .unwrap();
        config.apply_cli(&Cli {
            parent_rpc_url: Some("http://flag".into()),
            ..Cli::default()
        });
        assert_eq!(config.parent.rpc_url, "http://flag");
    }

    #[test]
    fn test_reorg_depths_must_be_ordered() {
        let mut config = BridgeConfig::default();
        config.reorg.acceptable_depth = 200;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_leading_bytes_range() {
        let mut config = BridgeConfig::default();
        config.pow.leading_bytes = 9;
        assert!(config.validate().is_err());
        config.pow.leading_bytes = 8;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_poll_interval_must_exceed_backoff() {
        let mut config = BridgeConfig::default();
        config.parent.poll_interval_secs = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_child_block_time_range() {
        let mut config = BridgeConfig::default();
        config.child.block_time_secs = 7;
        assert!(config.validate().is_err());
        config.child.block_time_secs = 30;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_namespace_length() {
        let mut config = BridgeConfig::default();
        config.submission.namespace = "434f4c44".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_signer_seed_decoding() {
        let mut config = BridgeConfig::default();
        assert_eq!(config.signer_seed().unwrap(), None);

        config.node.signer_seed = Some(hex::encode([7u8; 32]));
        assert_eq!(config.signer_seed().unwrap(), Some([7u8; 32]));

        config.node.signer_seed = Some("abcd".into());
        assert!(config.validate().is_err());
    }
}
