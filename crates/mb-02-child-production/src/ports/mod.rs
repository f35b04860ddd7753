//! Ports for child block production.

pub mod outbound;

pub use outbound::TransactionPool;
