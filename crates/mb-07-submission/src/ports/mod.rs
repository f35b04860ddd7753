//! Ports for downstream sinks.

pub mod outbound;

pub use outbound::{DataAvailabilitySink, SettlementSink};
