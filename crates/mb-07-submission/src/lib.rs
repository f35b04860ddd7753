//! # Submission Fan-out (Subsystem 7)
//!
//! Delivers each finalized batch to two independent downstream sinks.
//!
//! ```text
//!                       FinalizedBatch
//!                             │
//!              ┌──────────────┴──────────────┐
//!              ▼                             ▼
//!   DataAvailabilitySink              SettlementSink
//!   blob {namespace, proof, blocks}   {state_root, block_count, proof}
//!   timeout + retry                   timeout + retry
//!              │                             │
//!              └──────────────┬──────────────┘
//!                             ▼
//!                   SubmissionAuditLog (one record per batch)
//! ```
//!
//! A failure on one sink never affects the other, and nothing is rolled back:
//! the batch is already final locally. Each outcome is logged, published on
//! the event bus and kept in the audit log together with the highest
//! [`FinalityLevel`](shared_types::FinalityLevel) the batch reached.

#![warn(missing_docs)]

pub mod adapters;
pub mod audit;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::{
    JsonRpcDataAvailabilitySink, JsonRpcSettlementSink, MockDataAvailabilitySink,
    MockSettlementSink,
};
pub use audit::{SinkOutcome, SubmissionAuditLog, SubmissionRecord};
pub use config::{SinkConfig, SubmissionConfig, DEFAULT_NAMESPACE};
pub use domain::{DaBlob, DaReceipt, SettlementReceipt, SettlementRecord};
pub use error::{SubmissionError, SubmissionResult};
pub use ports::{DataAvailabilitySink, SettlementSink};
pub use service::SubmissionFanout;
