//! # SHA-256 Hashing
//!
//! One-shot helpers over `sha2`. Every content hash in the bridge goes
//! through here so the byte layout stays in one place.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::CryptoError;

/// SHA-256 output (256-bit).
pub type Hash = [u8; 32];

/// Hash data with SHA-256 (one-shot).
pub fn sha256(data: &[u8]) -> Hash {
    Sha256::digest(data).into()
}

/// Double SHA-256, as used by proof-of-work headers.
pub fn sha256d(data: &[u8]) -> Hash {
    sha256(&sha256(data))
}

/// Hash the concatenation of several inputs without allocating.
pub fn sha256_concat(inputs: &[&[u8]]) -> Hash {
    let mut hasher = Sha256::new();
    for input in inputs {
        hasher.update(input);
    }
    hasher.finalize().into()
}

/// SHA-256 over the compact JSON encoding of `value`.
///
/// Field order follows the struct declaration, which makes the output
/// stable for derived `Serialize` impls.
pub fn json_content_hash<T: Serialize>(value: &T) -> Result<Hash, CryptoError> {
    let bytes = serde_json::to_vec(value).map_err(|e| CryptoError::Encoding(e.to_string()))?;
    Ok(sha256(&bytes))
}
