//! Proof signing schemes.

use shared_crypto::{sha256, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};

/// Produces and checks the signature carried by a proof.
pub trait ProofSigner: Send + Sync {
    /// Signature over `payload`.
    fn sign(&self, payload: &[u8]) -> Vec<u8>;

    /// Whether `signature` covers `payload`.
    fn verify(&self, payload: &[u8], signature: &[u8]) -> bool;

    /// Scheme name for logs.
    fn scheme(&self) -> &'static str;
}

/// SHA-256 digest of the payload. Detects tampering, proves nothing about origin.
#[derive(Debug, Default, Clone, Copy)]
pub struct DigestSigner;

impl ProofSigner for DigestSigner {
    fn sign(&self, payload: &[u8]) -> Vec<u8> {
        sha256(payload).to_vec()
    }

    fn verify(&self, payload: &[u8], signature: &[u8]) -> bool {
        sha256(payload).as_slice() == signature
    }

    fn scheme(&self) -> &'static str {
        "sha256-digest"
    }
}

/// Ed25519 signature by the bridge operator key.
pub struct Ed25519ProofSigner {
    keypair: Ed25519KeyPair,
}

impl Ed25519ProofSigner {
    /// Signer from a 32-byte secret seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            keypair: Ed25519KeyPair::from_seed(seed),
        }
    }

    /// Signer with a fresh random key.
    pub fn generate() -> Self {
        Self {
            keypair: Ed25519KeyPair::generate(),
        }
    }

    /// Key that verifies this signer's proofs.
    pub fn public_key(&self) -> Ed25519PublicKey {
        self.keypair.public_key()
    }
}

impl ProofSigner for Ed25519ProofSigner {
    fn sign(&self, payload: &[u8]) -> Vec<u8> {
        self.keypair.sign(payload).as_bytes().to_vec()
    }

    fn verify(&self, payload: &[u8], signature: &[u8]) -> bool {
        Ed25519Signature::from_slice(signature)
            .and_then(|sig| self.public_key().verify(payload, &sig))
            .is_ok()
    }

    fn scheme(&self) -> &'static str {
        "ed25519"
    }
}
