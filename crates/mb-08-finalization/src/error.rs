//! Error types for the finalization orchestrator.

use mb_04_chain_guards::GuardError;
use mb_05_nullifier_registry::ClaimError;
use thiserror::Error;

/// Why a cycle did not finalize.
#[derive(Debug, Error)]
pub enum FinalizationError {
    /// The parent block failed proof-of-work verification.
    #[error("Parent block {height} failed PoW verification: {reason}")]
    PowInvalid {
        /// Parent height
        height: u64,
        /// Verifier message
        reason: String,
    },

    /// The parent interval was anomalous and policy rejects anomalies.
    #[error("Parent block {height} rejected for timing anomaly (score {score:.2})")]
    TimingAnomaly {
        /// Parent height
        height: u64,
        /// Anomaly score
        score: f64,
    },

    /// A reorg was accepted with slashing.
    #[error("Reorg of depth {depth} accepted with penalty: {slashed} slashed, {removed} removed")]
    ReorgPenalty {
        /// Reorg depth
        depth: u64,
        /// Validators slashed
        slashed: usize,
        /// Validators removed
        removed: usize,
    },

    /// A reorg exceeded the maximum depth; the bridge halted.
    #[error("Emergency halt: reorg of depth {depth}")]
    EmergencyHalt {
        /// Reorg depth
        depth: u64,
    },

    /// The bridge is halted and ignores parent blocks.
    #[error("Bridge halted awaiting operator intervention")]
    Halted,

    /// The parent height was already finalized against.
    #[error("Parent height {height} not above last finalized {last_finalized}")]
    StaleParent {
        /// Parent height
        height: u64,
        /// Last finalized parent height
        last_finalized: u64,
    },

    /// A child block with this hash was already finalized or buffered.
    #[error("Child block at height {height} already finalized or buffered")]
    DuplicateChildBlock {
        /// Child height
        height: u64,
    },

    /// A guard store failed.
    #[error(transparent)]
    Guard(#[from] GuardError),

    /// The nullifier registry failed.
    #[error(transparent)]
    Claim(#[from] ClaimError),

    /// The blocking verification task did not complete.
    #[error("Verification task failed: {0}")]
    VerificationTask(String),

    /// The orchestrator task is gone.
    #[error("Orchestrator channel closed")]
    ChannelClosed,
}

impl FinalizationError {
    /// Whether this stops future cycles.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FinalizationError::EmergencyHalt { .. })
    }

    /// Whether the parent block was discarded as invalid.
    pub fn is_parent_rejection(&self) -> bool {
        matches!(
            self,
            FinalizationError::PowInvalid { .. } | FinalizationError::TimingAnomaly { .. }
        )
    }
}

/// Result type for orchestrator operations.
pub type FinalizationResult<T> = Result<T, FinalizationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_emergency_halt_is_fatal() {
        assert!(FinalizationError::EmergencyHalt { depth: 150 }.is_fatal());
        assert!(!FinalizationError::ReorgPenalty {
            depth: 50,
            slashed: 1,
            removed: 0
        }
        .is_fatal());
        assert!(!FinalizationError::PowInvalid {
            height: 1,
            reason: "x".into()
        }
        .is_fatal());
    }
}
