//! Auxiliary hash stand-in with a square S-box and SHA-256 linear layer.

use shared_crypto::{sha256, sha256_concat};
use shared_types::Hash;

use super::AuxiliaryHasher;

const ROUNDS: usize = 8;

/// Eight rounds of byte squaring (mod 256) each followed by SHA-256.
#[derive(Debug, Default, Clone, Copy)]
pub struct SquareMixHasher;

impl AuxiliaryHasher for SquareMixHasher {
    fn hash(&self, aux_block_hash: &Hash, external_commitment: &Hash) -> Hash {
        let mut state = sha256_concat(&[aux_block_hash, external_commitment]);
        for _ in 0..ROUNDS {
            for byte in state.iter_mut() {
                *byte = byte.wrapping_mul(*byte);
            }
            state = sha256(&state);
        }
        state
    }

    fn name(&self) -> &'static str {
        "square-mix"
    }
}
