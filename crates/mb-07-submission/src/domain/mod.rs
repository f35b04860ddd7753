//! Payloads and receipts exchanged with the sinks.

use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};
use shared_crypto::sha256;
use shared_types::{ChildBlock, FinalizedBatch, Hash, MergeMiningProof};

use crate::error::{SubmissionError, SubmissionResult};

/// Blob published to the data-availability layer for one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaBlob {
    /// Hex namespace the blob is filed under.
    pub namespace: String,
    /// Parent height that finalized the batch.
    pub parent_height: u64,
    /// Proof binding the blocks.
    pub proof: MergeMiningProof,
    /// Finalized blocks.
    pub blocks: Vec<ChildBlock>,
}

impl DaBlob {
    /// Blob for `batch` under `namespace`.
    pub fn from_batch(namespace: &str, batch: &FinalizedBatch) -> Self {
        Self {
            namespace: namespace.to_string(),
            parent_height: batch.proof.parent_block_height,
            proof: batch.proof.clone(),
            blocks: batch.blocks.clone(),
        }
    }

    /// JSON bytes as submitted.
    pub fn encode(&self) -> SubmissionResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| SubmissionError::Encoding(e.to_string()))
    }

    /// Parse bytes read back from the DA layer.
    pub fn decode(bytes: &[u8]) -> SubmissionResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| SubmissionError::MalformedResponse(e.to_string()))
    }

    /// Hash compared by inclusion checks.
    pub fn content_hash(bytes: &[u8]) -> Hash {
        sha256(bytes)
    }
}

/// Where the DA layer put a blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaReceipt {
    /// DA block height.
    pub height: u64,
    /// Commitment reported for the blob.
    pub commitment: String,
}

/// What the settlement layer receives for one batch.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRecord {
    /// Digest of the batch's block summaries.
    #[serde_as(as = "Hex")]
    pub state_root: Hash,
    /// Blocks in the batch.
    pub block_count: u64,
    /// Proof anchoring the batch to the parent chain.
    pub parent_proof: MergeMiningProof,
}

/// Settlement acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReceipt {
    /// Settlement transaction id.
    pub tx_id: String,
    /// Settlement block that included it, if known.
    pub settled_height: Option<u64>,
}
