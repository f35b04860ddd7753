use serde::{Deserialize, Serialize};

use crate::error::{GuardError, GuardResult};

/// Basis points in one whole.
pub(crate) const BASIS_POINTS: u128 = 10_000;

/// Reorg guard thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReorgConfig {
    /// Deepest reorg accepted without consequence.
    pub acceptable_depth: u64,
    /// Deepest reorg accepted at all.
    pub max_reorg_depth: u64,
    /// Share of current stake slashed per implicated validator.
    pub slash_basis_points: u32,
    /// Stake below which a validator is removed.
    pub minimum_stake: u128,
}

impl Default for ReorgConfig {
    fn default() -> Self {
        Self {
            acceptable_depth: 10,
            max_reorg_depth: 100,
            slash_basis_points: 500,
            minimum_stake: 1000,
        }
    }
}

impl ReorgConfig {
    /// Cross-field checks.
    pub fn validate(&self) -> GuardResult<()> {
        if self.acceptable_depth > self.max_reorg_depth {
            return Err(GuardError::InvalidConfig(format!(
                "acceptable_depth {} exceeds max_reorg_depth {}",
                self.acceptable_depth, self.max_reorg_depth
            )));
        }
        if u128::from(self.slash_basis_points) > BASIS_POINTS {
            return Err(GuardError::InvalidConfig(format!(
                "slash_basis_points {} exceeds {}",
                self.slash_basis_points, BASIS_POINTS
            )));
        }
        Ok(())
    }
}
