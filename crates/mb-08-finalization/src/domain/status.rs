//! Status snapshot exposed to operators.

use serde::{Deserialize, Serialize};
use shared_types::ReorgDecision;

use super::state_machine::FinalizationState;

/// Reorgs seen per decision class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorgCounts {
    /// Accepted without penalty.
    pub accepted: u64,
    /// Accepted with slashing.
    pub penalized: u64,
    /// Triggered an emergency halt.
    pub halted: u64,
}

impl ReorgCounts {
    /// Count one reorg of class `decision`.
    pub fn record(&mut self, decision: ReorgDecision) {
        match decision {
            ReorgDecision::Accept => self.accepted += 1,
            ReorgDecision::AcceptWithPenalty => self.penalized += 1,
            ReorgDecision::EmergencyHalt => self.halted += 1,
        }
    }

    /// Total reorgs.
    pub fn total(&self) -> u64 {
        self.accepted + self.penalized + self.halted
    }
}

/// Point-in-time view of the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BridgeStatus {
    /// Current state.
    pub state: FinalizationState,
    /// Child blocks waiting in the buffer.
    pub pending_blocks: usize,
    /// Height of the last parent block finalized against.
    pub last_finalized_parent_height: Option<u64>,
    /// Nullifiers recorded.
    pub nullifier_count: usize,
    /// Reorgs per decision.
    pub reorgs: ReorgCounts,
    /// Child blocks finalized since start.
    pub finalized_child_blocks: u64,
    /// Proofs built since start.
    pub proofs_built: u64,
    /// Parent blocks rejected since start.
    pub rejected_parent_blocks: u64,
    /// Anomalous parent intervals since start.
    pub timing_anomalies: u64,
    /// Claims rejected since start.
    pub rejected_claims: u64,
}

impl BridgeStatus {
    /// Whether the bridge is halted.
    pub fn is_halted(&self) -> bool {
        self.state == FinalizationState::Halted
    }
}
