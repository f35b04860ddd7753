//! # Shared Crypto - Bridge Cryptographic Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | SHA-256, double SHA-256 | Content hashes, state roots |
//! | `merkle` | Pairwise SHA-256 tree | Transaction roots, proof roots |
//! | `signatures` | Ed25519 | Signing merge-mining proofs |
//!
//! ## Merkle Convention
//!
//! Leaves are already hashes. A level with an odd number of nodes pairs the
//! last node with itself. A single leaf is its own root and an empty
//! sequence has the all-zero root.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod hashing;
pub mod merkle;
pub mod signatures;

// Re-exports
pub use errors::CryptoError;
pub use hashing::{json_content_hash, sha256, sha256_concat, sha256d, Hash};
pub use merkle::{merkle_root, merkle_root_of};
pub use signatures::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
