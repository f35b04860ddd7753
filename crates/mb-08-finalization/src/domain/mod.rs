//! Orchestrator domain: state machine, pending buffer and status.

mod buffer;
mod state_machine;
mod status;

pub use buffer::{FinalizedWatermark, PendingBuffer};
pub use state_machine::{FinalizationEvent, FinalizationState, StateMachine};
pub use status::{BridgeStatus, ReorgCounts};
