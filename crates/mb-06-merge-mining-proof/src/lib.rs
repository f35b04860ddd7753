//! # Merge-Mining Proof Builder (Subsystem 6)
//!
//! Commits an ordered buffer of child blocks to the parent block that
//! finalizes them.
//!
//! ```text
//! child_block_hashes = [H(b0), H(b1), H(b2)]
//!
//!            root = sha256(n01 ‖ n22)
//!           /                     \
//!   n01 = sha256(h0 ‖ h1)   n22 = sha256(h2 ‖ h2)
//! ```
//!
//! The proof is signed over its canonical serialization, which covers every
//! field except the signature. [`DigestSigner`] gives tamper evidence only;
//! [`Ed25519ProofSigner`] binds the proof to a key.

#![warn(missing_docs)]

pub mod builder;
pub mod error;
pub mod signer;
pub mod state_root;

pub use builder::{verify_proof, ProofBuilder};
pub use error::{ProofError, ProofResult};
pub use signer::{DigestSigner, Ed25519ProofSigner, ProofSigner};
pub use state_root::settlement_state_root;
