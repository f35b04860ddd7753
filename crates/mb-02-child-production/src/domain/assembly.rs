//! Pure block assembly: selection under the gas limit and the tx root.

use shared_crypto::merkle_root;
use shared_types::{ChildBlock, ChildBlockStatus, Hash, Timestamp, Transaction};

/// Take transactions in order until the next one would exceed `gas_limit`.
///
/// Selection stops at the first transaction that does not fit so pool
/// order is preserved.
pub fn select_transactions(candidates: Vec<Transaction>, gas_limit: u64) -> (Vec<Transaction>, u64) {
    let mut gas_used = 0u64;
    let mut selected = Vec::with_capacity(candidates.len());
    for tx in candidates {
        let gas = tx.gas();
        if gas_used.saturating_add(gas) > gas_limit {
            break;
        }
        gas_used += gas;
        selected.push(tx);
    }
    (selected, gas_used)
}

/// Merkle root over transaction hashes.
pub fn transactions_root(transactions: &[Transaction]) -> Hash {
    let leaves: Vec<Hash> = transactions.iter().map(|tx| tx.hash).collect();
    merkle_root(&leaves)
}

/// Build a pending child block.
pub fn assemble_block(
    height: u64,
    timestamp: Timestamp,
    previous_hash: Hash,
    candidates: Vec<Transaction>,
    gas_limit: u64,
) -> ChildBlock {
    let (transactions, gas_used) = select_transactions(candidates, gas_limit);
    ChildBlock {
        height,
        timestamp,
        merkle_root: transactions_root(&transactions),
        transactions,
        previous_hash,
        gas_used,
        gas_limit,
        status: ChildBlockStatus::Pending,
    }
}
