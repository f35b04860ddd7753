//! Sink adapters.

mod json_rpc;
mod mock;

pub use json_rpc::{JsonRpcDataAvailabilitySink, JsonRpcSettlementSink};
pub use mock::{MockDataAvailabilitySink, MockSettlementSink};
