//! Error types for proof building and verification

use shared_crypto::CryptoError;
use thiserror::Error;

/// Proof verification and encoding failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProofError {
    /// Proof does not identify as a merge-mining proof
    #[error("Unsupported proof {proof_type} v{version}")]
    UnsupportedProof {
        /// Claimed type
        proof_type: String,
        /// Claimed version
        version: u32,
    },

    /// Block count disagrees with the blocks supplied
    #[error("Proof commits to {expected} blocks, got {actual}")]
    CountMismatch {
        /// Count in the proof
        expected: u64,
        /// Blocks supplied
        actual: usize,
    },

    /// A block hash differs from the committed one
    #[error("Child block {index} does not match the committed hash")]
    BlockMismatch {
        /// Position in the batch
        index: usize,
    },

    /// Recomputed Merkle root differs
    #[error("Merkle root mismatch")]
    RootMismatch,

    /// Signature does not cover the payload
    #[error("Proof signature invalid")]
    InvalidSignature,

    /// Hashing input could not be encoded
    #[error("Encoding failed: {0}")]
    Encoding(String),
}

impl From<CryptoError> for ProofError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::Encoding(msg) => ProofError::Encoding(msg),
            _ => ProofError::InvalidSignature,
        }
    }
}

/// Result type for proof operations
pub type ProofResult<T> = std::result::Result<T, ProofError>;
