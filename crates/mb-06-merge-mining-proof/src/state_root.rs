//! Settlement state root.

use serde::Serialize;
use shared_crypto::json_content_hash;
use shared_types::{hash_hex, ChildBlock, Hash};

use crate::error::{ProofError, ProofResult};

#[derive(Serialize)]
struct BlockSummary {
    height: u64,
    hash: String,
    tx_count: usize,
    gas_used: u64,
}

/// SHA-256 over the JSON list of `{height, hash, tx_count, gas_used}` for `blocks`.
pub fn settlement_state_root(blocks: &[ChildBlock]) -> ProofResult<Hash> {
    let summaries: Vec<BlockSummary> = blocks
        .iter()
        .map(|b| BlockSummary {
            height: b.height,
            hash: hash_hex(&b.hash()),
            tx_count: b.transactions.len(),
            gas_used: b.gas_used,
        })
        .collect();
    json_content_hash(&summaries).map_err(ProofError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_crypto::sha256;
    use shared_types::{ChildBlockStatus, DEFAULT_GAS_LIMIT, ZERO_HASH};

    #[test]
    fn test_state_root_matches_json_digest() {
        let block = ChildBlock {
            height: 3,
            timestamp: 100,
            transactions: vec![],
            previous_hash: ZERO_HASH,
            merkle_root: ZERO_HASH,
            gas_used: 42,
            gas_limit: DEFAULT_GAS_LIMIT,
            status: ChildBlockStatus::Finalized,
        };
        let expected_json = format!(
            r#"[{{"height":3,"hash":"{}","tx_count":0,"gas_used":42}}]"#,
            hash_hex(&block.hash())
        );
        assert_eq!(
            settlement_state_root(&[block]).unwrap(),
            sha256(expected_json.as_bytes())
        );
    }

    #[test]
    fn test_empty_batch() {
        assert_eq!(settlement_state_root(&[]).unwrap(), sha256(b"[]"));
    }
}
