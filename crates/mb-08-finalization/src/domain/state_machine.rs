//! Finalization state machine
//!
//! ```text
//! [Idle] ──Start──→ [AwaitingParentBlock] ──ParentArrived──→ [Verifying]
//!                          ↑    ↑                                 │
//!                          │    └──────── VerificationFailed ─────┤
//!                          │    └──────── NothingToCommit ──┐     │ Verified
//!                          │                                │     ↓
//!                          │                             [Committing]
//!                          │                                      │ Committed
//!                          └── Start ── [Idle] ←── Submitted ── [Submitting]
//!
//! any ──EmergencyHalt──→ [Halted] ──OperatorClear──→ [AwaitingParentBlock]
//! ```

use serde::{Deserialize, Serialize};

/// Orchestrator state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FinalizationState {
    /// Not started.
    #[default]
    Idle,
    /// Buffering child blocks, waiting for the next parent block.
    AwaitingParentBlock,
    /// Checking the parent block's work and timing.
    Verifying,
    /// Recording claims and building the proof.
    Committing,
    /// Handing the batch to the fan-out.
    Submitting,
    /// Stopped by an emergency reorg until an operator clears it.
    Halted,
}

impl FinalizationState {
    /// Gauge value for metrics.
    pub fn as_gauge(self) -> u8 {
        match self {
            FinalizationState::Idle => 0,
            FinalizationState::AwaitingParentBlock => 1,
            FinalizationState::Verifying => 2,
            FinalizationState::Committing => 3,
            FinalizationState::Submitting => 4,
            FinalizationState::Halted => 5,
        }
    }
}

/// Inputs that drive state transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FinalizationEvent {
    /// Orchestrator started or a cycle ended.
    Start,
    /// A parent block arrived.
    ParentArrived,
    /// Work and timing checks passed.
    Verified,
    /// The parent block was rejected.
    VerificationFailed,
    /// The buffer was empty; nothing to commit.
    NothingToCommit,
    /// Proof built and blocks finalized.
    Committed,
    /// Batch handed to the fan-out.
    Submitted,
    /// Reorg deeper than the maximum.
    EmergencyHalt,
    /// Operator cleared the halt.
    OperatorClear,
}

/// Deterministic transition table for the orchestrator.
#[derive(Debug, Default)]
pub struct StateMachine {
    state: FinalizationState,
    halt_count: u64,
    cycles_completed: u64,
}

impl StateMachine {
    /// Machine in `Idle`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> FinalizationState {
        self.state
    }

    /// Whether the machine is halted.
    pub fn is_halted(&self) -> bool {
        self.state == FinalizationState::Halted
    }

    /// Times the machine entered `Halted`.
    pub fn halt_count(&self) -> u64 {
        self.halt_count
    }

    /// Cycles that reached `Submitted`.
    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed
    }

    /// Apply `event` and return the new state.
    pub fn process_event(&mut self, event: FinalizationEvent) -> FinalizationState {
        let next = self.next_state(event);
        if next == FinalizationState::Halted && self.state != FinalizationState::Halted {
            self.halt_count += 1;
        }
        if event == FinalizationEvent::Submitted && self.state == FinalizationState::Submitting {
            self.cycles_completed += 1;
        }
        self.state = next;
        next
    }

    fn next_state(&self, event: FinalizationEvent) -> FinalizationState {
        use FinalizationEvent as E;
        use FinalizationState as S;

        match (self.state, event) {
            (_, E::EmergencyHalt) => S::Halted,
            (S::Halted, E::OperatorClear) => S::AwaitingParentBlock,
            (S::Halted, _) => S::Halted,

            (S::Idle, E::Start) => S::AwaitingParentBlock,
            (S::AwaitingParentBlock, E::ParentArrived) => S::Verifying,
            (S::Verifying, E::VerificationFailed) => S::AwaitingParentBlock,
            (S::Verifying, E::Verified) => S::Committing,
            (S::Committing, E::NothingToCommit) => S::AwaitingParentBlock,
            (S::Committing, E::Committed) => S::Submitting,
            (S::Submitting, E::Submitted) => S::Idle,

            (state, _) => state,
        }
    }

    #[cfg(test)]
    pub(crate) fn force_state(&mut self, state: FinalizationState) {
        self.state = state;
    }
}
