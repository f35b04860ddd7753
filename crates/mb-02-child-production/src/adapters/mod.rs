//! Adapters for the transaction pool port.

mod memory_pool;

pub use memory_pool::InMemoryTransactionPool;
