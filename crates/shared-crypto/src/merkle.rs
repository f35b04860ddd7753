//! # Binary Merkle Tree
//!
//! Pairwise SHA-256 over an ordered leaf sequence. Order matters: the same
//! leaves in a different order give a different root.

use crate::hashing::{sha256, sha256_concat, Hash};

/// Root of the tree over `leaves`.
///
/// An odd node at any level is paired with itself rather than dropped.
pub fn merkle_root(leaves: &[Hash]) -> Hash {
    if leaves.is_empty() {
        return [0u8; 32];
    }

    let mut level: Vec<Hash> = leaves.to_vec();
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| {
                let left = &pair[0];
                let right = pair.get(1).unwrap_or(left);
                sha256_concat(&[left, right])
            })
            .collect();
    }
    level[0]
}

/// Root over raw items, hashing each one into a leaf first.
pub fn merkle_root_of<T: AsRef<[u8]>>(items: &[T]) -> Hash {
    let leaves: Vec<Hash> = items.iter().map(|item| sha256(item.as_ref())).collect();
    merkle_root(&leaves)
}
