use shared_crypto::sha256d;
use shared_types::Hash;

use super::HeaderHasher;

/// Double SHA-256 header hash.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256dHasher;

impl HeaderHasher for Sha256dHasher {
    fn hash(&self, header: &[u8]) -> Hash {
        sha256d(header)
    }

    fn name(&self) -> &'static str {
        "sha256d"
    }
}
