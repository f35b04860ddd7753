//! # Finalization Orchestrator (Subsystem 8)
//!
//! Owns the pending buffer and drives the merge-mining cycle.
//!
//! ```text
//!   Idle ──Start──▶ AwaitingParentBlock ◀──────────────────────┐
//!                        │ ParentArrived                        │
//!                        ▼                                      │
//!                    Verifying ──VerificationFailed─────────────┤
//!                        │ Verified                             │
//!                        ▼                                      │
//!                    Committing ──NothingToCommit───────────────┤
//!                        │ Committed                            │
//!                        ▼                                      │
//!                    Submitting ──Submitted──▶ Idle ──Start─────┘
//!
//!   any ──EmergencyHalt──▶ Halted ──OperatorClear──▶ AwaitingParentBlock
//! ```
//!
//! Each valid parent block finalizes every buffered child block at once:
//! claims are recorded, a proof is built, blocks turn `Finalized` and the
//! batch is handed to the submission fan-out on a background task. Child
//! blocks keep buffering while halted; parent blocks do not.

pub mod config;
pub mod domain;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod service;

pub use config::FinalizationConfig;
pub use domain::{
    BridgeStatus, FinalizationEvent, FinalizationState, FinalizedWatermark, PendingBuffer,
    ReorgCounts, StateMachine,
};
pub use error::{FinalizationError, FinalizationResult};
pub use handle::{FinalizationHandle, OrchestratorCommand};
pub use service::{BridgeComponents, CycleOutcome, FinalizationOrchestrator};
