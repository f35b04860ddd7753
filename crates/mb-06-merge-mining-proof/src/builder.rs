//! Proof construction and verification.

use std::sync::Arc;

use shared_crypto::merkle_root;
use shared_types::{
    short_hex, ChildBlock, Hash, MergeMiningProof, ParentBlockRef, MERGE_MINING_PROOF_TYPE,
    MERGE_MINING_PROOF_VERSION,
};
use tracing::debug;

use crate::error::{ProofError, ProofResult};
use crate::signer::{DigestSigner, ProofSigner};

/// Builds signed merge-mining proofs.
#[derive(Clone)]
pub struct ProofBuilder {
    signer: Arc<dyn ProofSigner>,
}

impl Default for ProofBuilder {
    fn default() -> Self {
        Self::new(Arc::new(DigestSigner))
    }
}

impl ProofBuilder {
    /// Builder signing with `signer`.
    pub fn new(signer: Arc<dyn ProofSigner>) -> Self {
        Self { signer }
    }

    /// Signer in use.
    pub fn signer(&self) -> &Arc<dyn ProofSigner> {
        &self.signer
    }

    /// Commit `pending` to `parent`. Block order is preserved.
    pub fn build_proof(&self, parent: &ParentBlockRef, pending: &[ChildBlock]) -> MergeMiningProof {
        let child_block_hashes: Vec<Hash> = pending.iter().map(ChildBlock::hash).collect();
        let root = merkle_root(&child_block_hashes);

        let mut proof = MergeMiningProof {
            proof_type: MERGE_MINING_PROOF_TYPE.to_string(),
            version: MERGE_MINING_PROOF_VERSION,
            parent_block_hash: parent.hash,
            parent_block_height: parent.height,
            parent_timestamp: parent.timestamp,
            parent_difficulty: parent.primary_difficulty,
            child_blocks_merkle_root: root,
            child_block_count: child_block_hashes.len() as u64,
            child_block_hashes,
            signature: Vec::new(),
        };
        proof.signature = self.signer.sign(&proof.signing_payload());

        debug!(
            "[mb-06] Proof for parent {} over {} blocks, root {} ({})",
            parent.height,
            proof.child_block_count,
            short_hex(&root),
            self.signer.scheme()
        );
        proof
    }

    /// Check `proof` against `blocks` with this builder's signer.
    pub fn verify(&self, proof: &MergeMiningProof, blocks: &[ChildBlock]) -> ProofResult<()> {
        verify_proof(proof, blocks, self.signer.as_ref())
    }
}

/// Recompute the commitment over `blocks` and check the signature.
pub fn verify_proof(
    proof: &MergeMiningProof,
    blocks: &[ChildBlock],
    signer: &dyn ProofSigner,
) -> ProofResult<()> {
    if proof.proof_type != MERGE_MINING_PROOF_TYPE || proof.version != MERGE_MINING_PROOF_VERSION {
        return Err(ProofError::UnsupportedProof {
            proof_type: proof.proof_type.clone(),
            version: proof.version,
        });
    }
    if proof.child_block_count != blocks.len() as u64
        || proof.child_block_hashes.len() != blocks.len()
    {
        return Err(ProofError::CountMismatch {
            expected: proof.child_block_count,
            actual: blocks.len(),
        });
    }

    for (index, (block, committed)) in blocks.iter().zip(&proof.child_block_hashes).enumerate() {
        if block.hash() != *committed {
            return Err(ProofError::BlockMismatch { index });
        }
    }

    if merkle_root(&proof.child_block_hashes) != proof.child_blocks_merkle_root {
        return Err(ProofError::RootMismatch);
    }

    if !signer.verify(&proof.signing_payload(), &proof.signature) {
        return Err(ProofError::InvalidSignature);
    }
    Ok(())
}
