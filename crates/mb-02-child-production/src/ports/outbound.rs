//! Outbound ports (dependencies on the transaction pool)

use async_trait::async_trait;
use shared_types::{Hash, Transaction};

use crate::error::ProductionResult;

/// Source of pending child-chain transactions
#[async_trait]
pub trait TransactionPool: Send + Sync {
    /// Up to `limit` pending transactions, in inclusion order
    async fn pending_transactions(&self, limit: usize) -> ProductionResult<Vec<Transaction>>;

    /// Forget transactions that made it into a handed-off block
    async fn remove_included(&self, hashes: &[Hash]) -> ProductionResult<()>;
}
