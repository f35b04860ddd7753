//! FIFO transaction pool held in memory.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{Hash, Transaction};

use crate::error::{ProductionError, ProductionResult};
use crate::ports::TransactionPool;

/// In-memory pool. Used by the runtime in dev mode and by tests.
#[derive(Default)]
pub struct InMemoryTransactionPool {
    transactions: RwLock<Vec<Transaction>>,
    unavailable: AtomicBool,
}

impl InMemoryTransactionPool {
    /// Empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transaction. Duplicates by hash are ignored.
    pub fn submit(&self, tx: Transaction) -> bool {
        let mut txs = self.transactions.write();
        if txs.iter().any(|t| t.hash == tx.hash) {
            return false;
        }
        txs.push(tx);
        true
    }

    /// Number of pending transactions.
    pub fn len(&self) -> usize {
        self.transactions.read().len()
    }

    /// Whether the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.transactions.read().is_empty()
    }

    /// Make every call fail, simulating an unreachable pool.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> ProductionResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ProductionError::PoolUnavailable("pool offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl TransactionPool for InMemoryTransactionPool {
    async fn pending_transactions(&self, limit: usize) -> ProductionResult<Vec<Transaction>> {
        self.check()?;
        Ok(self.transactions.read().iter().take(limit).cloned().collect())
    }

    async fn remove_included(&self, hashes: &[Hash]) -> ProductionResult<()> {
        self.check()?;
        self.transactions.write().retain(|tx| !hashes.contains(&tx.hash));
        Ok(())
    }
}
