//! # Child Block Producer (Subsystem 2)
//!
//! Assembles a child block on every tick of the child cadence and hands it
//! to the finalization orchestrator over a bounded channel. The producer
//! never finalizes anything and never touches the pending buffer directly.
//!
//! ## Block Assembly
//!
//! ```text
//! TransactionPool ──▶ select (count + gas limit) ──▶ merkle root ──▶ ChildBlock
//!                                                                     │
//!                                              mpsc::Sender<ChildBlock>
//! ```
//!
//! Transactions are removed from the pool only after the block carrying
//! them has been accepted by the channel. A pool read failure produces an
//! empty block for that tick; the transactions are still in the pool.

#![warn(missing_docs)]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::InMemoryTransactionPool;
pub use config::ChildProductionConfig;
pub use domain::assemble_block;
pub use error::{ProductionError, ProductionResult};
pub use ports::TransactionPool;
pub use service::ChildBlockProducer;

/// Default child cadence in seconds.
pub const DEFAULT_CHILD_BLOCK_TIME_SECS: u64 = 8;

/// Default cap on transactions per child block.
pub const DEFAULT_MAX_TRANSACTIONS: usize = 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(DEFAULT_CHILD_BLOCK_TIME_SECS, 8);
        assert_eq!(DEFAULT_MAX_TRANSACTIONS, 1000);
    }
}
