//! The difficulty verifier.

use std::sync::Arc;

use shared_types::{short_hex, Hash, ParentBlockRef};
use tracing::debug;

use crate::config::{PowConfig, PrimaryHashAlgorithm};
use crate::domain::{leading_value, meets_target, serialize_header};
use crate::error::{PowError, PowResult};
use crate::hashers::{AuxiliaryHasher, HeaderHasher, ScratchpadHasher, Sha256dHasher, SquareMixHasher};

/// Hashes and leading values computed for a block that passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowReport {
    /// Primary header hash
    pub primary_hash: Hash,
    /// Leading value of the primary hash
    pub primary_value: u64,
    /// Auxiliary hash when an auxiliary target applies
    pub auxiliary_hash: Option<Hash>,
    /// Leading value of the auxiliary hash
    pub auxiliary_value: Option<u64>,
}

/// Validates parent blocks against their primary and auxiliary targets.
#[derive(Clone)]
pub struct DifficultyVerifier {
    config: PowConfig,
    primary: Arc<dyn HeaderHasher>,
    auxiliary: Arc<dyn AuxiliaryHasher>,
}

impl std::fmt::Debug for DifficultyVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DifficultyVerifier")
            .field("config", &self.config)
            .field("primary", &self.primary.name())
            .field("auxiliary", &self.auxiliary.name())
            .finish()
    }
}

impl DifficultyVerifier {
    /// Build with explicit hash functions.
    pub fn new(
        config: PowConfig,
        primary: Arc<dyn HeaderHasher>,
        auxiliary: Arc<dyn AuxiliaryHasher>,
    ) -> PowResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            primary,
            auxiliary,
        })
    }

    /// Build with the bundled hashers selected by `config.primary_algorithm`.
    pub fn from_config(config: PowConfig) -> PowResult<Self> {
        let primary: Arc<dyn HeaderHasher> = match config.primary_algorithm {
            PrimaryHashAlgorithm::Sha256d => Arc::new(Sha256dHasher),
            PrimaryHashAlgorithm::Scratchpad {
                memory_kib,
                iterations,
            } => Arc::new(ScratchpadHasher::new(memory_kib, iterations)),
        };
        Self::new(config, primary, Arc::new(SquareMixHasher))
    }

    /// Configuration in use.
    pub fn config(&self) -> &PowConfig {
        &self.config
    }

    /// Full check with the reason for any failure.
    pub fn check(&self, parent: &ParentBlockRef, nonce: u32) -> PowResult<PowReport> {
        let width = self.config.leading_bytes;

        if parent.primary_difficulty > self.config.max_primary_target {
            return Err(PowError::TargetTooEasy {
                reported: parent.primary_difficulty,
                ceiling: self.config.max_primary_target,
            });
        }

        let primary_hash = self.primary.hash(&serialize_header(parent, nonce));
        let primary_value = leading_value(&primary_hash, width);
        let primary_ok = meets_target(&primary_hash, parent.primary_difficulty, width);

        let (auxiliary_hash, auxiliary_value, auxiliary_ok) = match parent.auxiliary_difficulty {
            None => (None, None, true),
            Some(target) => {
                if target > self.config.max_auxiliary_target {
                    return Err(PowError::TargetTooEasy {
                        reported: target,
                        ceiling: self.config.max_auxiliary_target,
                    });
                }
                let aux = parent
                    .header
                    .aux_block_hash
                    .ok_or(PowError::MissingAuxiliaryData("aux_block_hash"))?;
                let commitment = parent
                    .header
                    .external_commitment
                    .ok_or(PowError::MissingAuxiliaryData("external_commitment"))?;
                let hash = self.auxiliary.hash(&aux, &commitment);
                (
                    Some(hash),
                    Some(leading_value(&hash, width)),
                    meets_target(&hash, target, width),
                )
            }
        };

        debug!(
            "[mb-03] Parent {} primary {} ({:#x} vs {:#x})",
            parent.height,
            short_hex(&primary_hash),
            primary_value,
            parent.primary_difficulty
        );

        if !primary_ok {
            return Err(PowError::PrimaryTargetMissed {
                value: primary_value,
                target: parent.primary_difficulty,
            });
        }

        if let (Some(value), Some(target)) = (auxiliary_value, parent.auxiliary_difficulty) {
            if !auxiliary_ok {
                return Err(PowError::AuxiliaryTargetMissed { value, target });
            }
        }

        Ok(PowReport {
            primary_hash,
            primary_value,
            auxiliary_hash,
            auxiliary_value,
        })
    }

    /// `true` iff every applicable target is met.
    pub fn verify(&self, parent: &ParentBlockRef, nonce: u32) -> bool {
        self.check(parent, nonce).is_ok()
    }
}
