//! Configuration for proof-of-work verification

use serde::{Deserialize, Serialize};

use crate::error::{PowError, PowResult};

/// Hash function applied to the serialized parent header
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PrimaryHashAlgorithm {
    /// Double SHA-256
    Sha256d,
    /// Memory-hard SHA-256 scratchpad
    Scratchpad {
        /// Scratchpad size in KiB
        memory_kib: usize,
        /// Mixing iterations
        iterations: u32,
    },
}

impl Default for PrimaryHashAlgorithm {
    fn default() -> Self {
        PrimaryHashAlgorithm::Scratchpad {
            memory_kib: 512,
            iterations: 1024,
        }
    }
}

/// Verification settings
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PowConfig {
    /// Leading hash bytes compared against targets (4 to 8)
    pub leading_bytes: usize,

    /// Easiest primary target a parent block may report
    pub max_primary_target: u64,

    /// Easiest auxiliary target a parent block may report
    pub max_auxiliary_target: u64,

    /// Primary header hash
    pub primary_algorithm: PrimaryHashAlgorithm,
}

impl Default for PowConfig {
    fn default() -> Self {
        Self {
            leading_bytes: 4,
            max_primary_target: 0x0000_0fff,
            max_auxiliary_target: 0x0000_ffff,
            primary_algorithm: PrimaryHashAlgorithm::default(),
        }
    }
}

impl PowConfig {
    /// Check ranges that serde cannot express.
    pub fn validate(&self) -> PowResult<()> {
        if !(4..=8).contains(&self.leading_bytes) {
            return Err(PowError::InvalidConfig(format!(
                "leading_bytes must be 4..=8, got {}",
                self.leading_bytes
            )));
        }
        if let PrimaryHashAlgorithm::Scratchpad {
            memory_kib,
            iterations,
        } = self.primary_algorithm
        {
            if memory_kib == 0 || iterations == 0 {
                return Err(PowError::InvalidConfig(
                    "scratchpad memory and iterations must be non-zero".into(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = PowConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_primary_target, 0x0fff);
        assert_eq!(config.max_auxiliary_target, 0xffff);
    }

    #[test]
    fn test_leading_bytes_range() {
        let mut config = PowConfig::default();
        config.leading_bytes = 3;
        assert!(config.validate().is_err());
        config.leading_bytes = 9;
        assert!(config.validate().is_err());
        config.leading_bytes = 8;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_algorithm_deserializes_tagged() {
        let algo: PrimaryHashAlgorithm = serde_json::from_str(r#"{"kind":"sha256d"}"#).unwrap();
        assert_eq!(algo, PrimaryHashAlgorithm::Sha256d);
        let algo: PrimaryHashAlgorithm =
            serde_json::from_str(r#"{"kind":"scratchpad","memory_kib":64,"iterations":16}"#)
                .unwrap();
        assert_eq!(
            algo,
            PrimaryHashAlgorithm::Scratchpad {
                memory_kib: 64,
                iterations: 16
            }
        );
    }
}
