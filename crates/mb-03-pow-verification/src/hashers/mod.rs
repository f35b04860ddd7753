//! Hash function ports and bundled implementations.

mod scratchpad;
mod sha256d;
mod square_mix;

pub use scratchpad::ScratchpadHasher;
pub use sha256d::Sha256dHasher;
pub use square_mix::SquareMixHasher;

use shared_types::Hash;

/// Primary proof-of-work hash over serialized header bytes.
pub trait HeaderHasher: Send + Sync {
    /// Hash the header.
    fn hash(&self, header: &[u8]) -> Hash;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Circuit-friendly hash over the auxiliary block hash and an external commitment.
pub trait AuxiliaryHasher: Send + Sync {
    /// Hash the pair.
    fn hash(&self, aux_block_hash: &Hash, external_commitment: &Hash) -> Hash;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}
