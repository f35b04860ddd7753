//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Child chain**: `Transaction`, `ChildBlock`, `ChildBlockStatus`
//! - **Parent chain**: `ParentBlockRef`, `ParentHeader`, `ChainInfo`
//! - **Finality**: `MergeMiningProof`, `FinalizedBatch`, `FinalityLevel`
//! - **Guards**: `Nullifier`, `ValidatorStake`, `ReorgEvent`, `ReorgDecision`

use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};
use sha2::{Digest, Sha256};

// =============================================================================
// PRIMITIVES
// =============================================================================

/// A 32-byte SHA-256 style hash.
pub type Hash = [u8; 32];

/// Unix time in seconds.
pub type Timestamp = u64;

/// The all-zero hash. Merkle root of an empty sequence.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Gas charged per encoded transaction byte.
pub const GAS_PER_BYTE: u64 = 21;

/// Default child block gas limit.
pub const DEFAULT_GAS_LIMIT: u64 = 10_000_000;

/// Identifier attached to every merge-mining proof.
pub const MERGE_MINING_PROOF_TYPE: &str = "merge_mining";

/// Current merge-mining proof layout version.
pub const MERGE_MINING_PROOF_VERSION: u32 = 1;

/// Lowercase hex rendering of a hash, for logs and JSON keys.
pub fn hash_hex(hash: &Hash) -> String {
    hex::encode(hash)
}

/// Abbreviated hash for log lines.
pub fn short_hex(hash: &Hash) -> String {
    hex::encode(&hash[..4])
}

// =============================================================================
// CLUSTER A: THE CHILD CHAIN
// =============================================================================

/// A one-time claim embedded in a burn-to-mint transfer.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NullifierClaim {
    /// Identifier consumed by this claim.
    #[serde_as(as = "Hex")]
    pub nullifier_id: Hash,
    /// Account credited on the child chain.
    pub recipient: String,
}

/// A child-chain transaction as drained from the pool.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Content hash over every other field.
    #[serde_as(as = "Hex")]
    pub hash: Hash,
    /// Sender account.
    pub from: String,
    /// Recipient account.
    pub to: String,
    /// Transferred amount in base units.
    pub value: u64,
    /// Sender nonce.
    pub nonce: u64,
    /// Opaque payload.
    #[serde_as(as = "Hex")]
    pub data: Vec<u8>,
    /// Cross-chain claim, if this transaction mints against a burn.
    pub claim: Option<NullifierClaim>,
}

impl Transaction {
    /// Build a transaction and compute its hash.
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        value: u64,
        nonce: u64,
        data: Vec<u8>,
        claim: Option<NullifierClaim>,
    ) -> Self {
        let mut tx = Self {
            hash: [0u8; 32],
            from: from.into(),
            to: to.into(),
            value,
            nonce,
            data,
            claim,
        };
        tx.hash = tx.compute_hash();
        tx
    }

    /// Canonical byte encoding used for hashing and gas accounting.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(64 + self.data.len());
        write_bytes(&mut out, self.from.as_bytes());
        write_bytes(&mut out, self.to.as_bytes());
        out.extend_from_slice(&self.value.to_le_bytes());
        out.extend_from_slice(&self.nonce.to_le_bytes());
        write_bytes(&mut out, &self.data);
        match &self.claim {
            Some(claim) => {
                out.push(1);
                out.extend_from_slice(&claim.nullifier_id);
                write_bytes(&mut out, claim.recipient.as_bytes());
            }
            None => out.push(0),
        }
        out
    }

    /// Size of the canonical encoding in bytes.
    pub fn encoded_size(&self) -> usize {
        self.encode().len()
    }

    /// Gas charged for including this transaction.
    pub fn gas(&self) -> u64 {
        self.encoded_size() as u64 * GAS_PER_BYTE
    }

    /// Recompute the content hash from the other fields.
    pub fn compute_hash(&self) -> Hash {
        Sha256::digest(self.encode()).into()
    }
}

fn write_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(bytes);
}

/// Lifecycle of a child block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildBlockStatus {
    /// Buffered, waiting for the next valid parent block.
    Pending,
    /// Bound to a merge-mining proof. Terminal.
    Finalized,
}

/// A block of the fast child chain.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildBlock {
    /// Height in the child chain.
    pub height: u64,
    /// Production time.
    pub timestamp: Timestamp,
    /// Included transactions, in pool order.
    pub transactions: Vec<Transaction>,
    /// Content hash of the previous child block.
    #[serde_as(as = "Hex")]
    pub previous_hash: Hash,
    /// Merkle root over the transaction hashes.
    #[serde_as(as = "Hex")]
    pub merkle_root: Hash,
    /// Sum of per-transaction gas.
    pub gas_used: u64,
    /// Upper bound on `gas_used`.
    pub gas_limit: u64,
    /// Lifecycle status.
    pub status: ChildBlockStatus,
}

impl ChildBlock {
    /// Content hash of the block.
    ///
    /// Covers the header fields and the transaction count. The status is
    /// deliberately absent so the hash is stable across finalization.
    pub fn hash(&self) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update(self.height.to_le_bytes());
        hasher.update(self.timestamp.to_le_bytes());
        hasher.update(self.previous_hash);
        hasher.update(self.merkle_root);
        hasher.update(self.gas_used.to_le_bytes());
        hasher.update(self.gas_limit.to_le_bytes());
        hasher.update((self.transactions.len() as u64).to_le_bytes());
        hasher.finalize().into()
    }

    /// Whether the block is still waiting for a parent block.
    pub fn is_pending(&self) -> bool {
        self.status == ChildBlockStatus::Pending
    }

    /// Transactions that carry a nullifier claim.
    pub fn claims(&self) -> impl Iterator<Item = (&Transaction, &NullifierClaim)> {
        self.transactions
            .iter()
            .filter_map(|tx| tx.claim.as_ref().map(|claim| (tx, claim)))
    }
}

// =============================================================================
// CLUSTER B: THE PARENT CHAIN
// =============================================================================

/// Summary returned by the parent chain's info call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainInfo {
    /// Current tip height.
    pub height: u64,
    /// Current network difficulty.
    pub difficulty: u64,
}

/// Header fields fed to the proof-of-work hash.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentHeader {
    /// Major block version.
    pub major_version: u8,
    /// Minor block version.
    pub minor_version: u8,
    /// Hash of the previous parent block.
    #[serde_as(as = "Hex")]
    pub previous_hash: Hash,
    /// Mined nonce.
    pub nonce: u32,
    /// Auxiliary chain block hash committed by merged mining.
    #[serde_as(as = "Option<Hex>")]
    pub aux_block_hash: Option<Hash>,
    /// External commitment hashed alongside the auxiliary block hash.
    #[serde_as(as = "Option<Hex>")]
    pub external_commitment: Option<Hash>,
}

/// Read-only snapshot of a parent chain block.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentBlockRef {
    /// Block hash as reported by the parent chain.
    #[serde_as(as = "Hex")]
    pub hash: Hash,
    /// Block height.
    pub height: u64,
    /// Block timestamp.
    pub timestamp: Timestamp,
    /// Primary proof-of-work target.
    pub primary_difficulty: u64,
    /// Auxiliary target, present in the dual-hash variant.
    pub auxiliary_difficulty: Option<u64>,
    /// Header fields used to recompute the proof-of-work hash.
    pub header: ParentHeader,
}

// =============================================================================
// CLUSTER C: FINALITY
// =============================================================================

/// Commitment binding a batch of child blocks to one parent block.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeMiningProof {
    /// Always [`MERGE_MINING_PROOF_TYPE`].
    pub proof_type: String,
    /// Layout version.
    pub version: u32,
    #[serde_as(as = "Hex")]
    pub parent_block_hash: Hash,
    pub parent_block_height: u64,
    pub parent_timestamp: Timestamp,
    pub parent_difficulty: u64,
    /// Merkle root over `child_block_hashes`.
    #[serde_as(as = "Hex")]
    pub child_blocks_merkle_root: Hash,
    pub child_block_count: u64,
    /// Content hashes of the finalized blocks, in buffer order.
    #[serde_as(as = "Vec<Hex>")]
    pub child_block_hashes: Vec<Hash>,
    /// Commitment over [`MergeMiningProof::signing_payload`].
    #[serde_as(as = "Hex")]
    pub signature: Vec<u8>,
}

impl MergeMiningProof {
    /// Canonical serialization of every field except the signature.
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(128 + self.child_block_hashes.len() * 32);
        write_bytes(&mut out, self.proof_type.as_bytes());
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&self.parent_block_hash);
        out.extend_from_slice(&self.parent_block_height.to_le_bytes());
        out.extend_from_slice(&self.parent_timestamp.to_le_bytes());
        out.extend_from_slice(&self.parent_difficulty.to_le_bytes());
        out.extend_from_slice(&self.child_blocks_merkle_root);
        out.extend_from_slice(&self.child_block_count.to_le_bytes());
        for hash in &self.child_block_hashes {
            out.extend_from_slice(hash);
        }
        out
    }

    /// Whether this proof commits to the given child block hash.
    pub fn contains(&self, child_hash: &Hash) -> bool {
        self.child_block_hashes.iter().any(|h| h == child_hash)
    }
}

/// A claim refused during commit.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedClaim {
    #[serde_as(as = "Hex")]
    pub nullifier_id: Hash,
    #[serde_as(as = "Hex")]
    pub tx_hash: Hash,
    pub child_height: u64,
    pub reason: String,
}

/// Output of one finalization cycle, handed to the submission sinks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizedBatch {
    pub proof: MergeMiningProof,
    /// Blocks in proof order, all `Finalized`.
    pub blocks: Vec<ChildBlock>,
    pub rejected_claims: Vec<RejectedClaim>,
    pub finalized_at: Timestamp,
}

impl FinalizedBatch {
    /// Nullifier ids whose claims were accepted in this batch.
    pub fn accepted_nullifiers(&self) -> Vec<Hash> {
        self.blocks
            .iter()
            .flat_map(|b| b.claims())
            .filter(|(tx, claim)| {
                !self
                    .rejected_claims
                    .iter()
                    .any(|r| r.tx_hash == tx.hash && r.nullifier_id == claim.nullifier_id)
            })
            .map(|(_, claim)| claim.nullifier_id)
            .collect()
    }
}

/// How settled a batch is, from buffered to settled on the settlement layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum FinalityLevel {
    Pending = 0,
    Soft = 1,
    Hard = 3,
    DaConfirmed = 10,
    SettlementFinalized = 100,
}

impl FinalityLevel {
    /// Numeric weight of the level.
    pub fn weight(self) -> u8 {
        self as u8
    }
}

// =============================================================================
// CLUSTER D: GUARDS
// =============================================================================

/// State of a recorded nullifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullifierStatus {
    Spent,
    Expired,
}

/// A consumed one-time claim identifier.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nullifier {
    #[serde_as(as = "Hex")]
    pub id: Hash,
    pub block_height_recorded: u64,
    pub recorded_at: Timestamp,
    #[serde_as(as = "Hex")]
    pub source_tx_hash: Hash,
    pub recipient: String,
    pub status: NullifierStatus,
    /// Set once downstream settlement confirmed the claim.
    #[serde(default)]
    pub confirmed_at: Option<Timestamp>,
}

/// Identifier of a staked validator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ValidatorId(pub String);

impl std::fmt::Display for ValidatorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ValidatorId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Stake held by a validator subject to reorg slashing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorStake {
    pub validator_id: ValidatorId,
    pub staked: u128,
    /// Total amount slashed so far.
    pub penalties: u128,
    pub last_activity: Timestamp,
}

/// Evidence accompanying a reorg claim.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorgProof {
    #[serde_as(as = "Hex")]
    pub old_tip: Hash,
    #[serde_as(as = "Hex")]
    pub new_tip: Hash,
    /// Last height both branches agree on.
    pub fork_height: u64,
    /// Validators held responsible for the replaced branch. Empty means the
    /// whole active set.
    pub implicated: Vec<ValidatorId>,
}

/// A reorganization of the given depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorgEvent {
    pub depth: u64,
    pub proof: ReorgProof,
}

/// Outcome class of a reorg evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReorgDecision {
    Accept,
    AcceptWithPenalty,
    EmergencyHalt,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(height: u64) -> ChildBlock {
        ChildBlock {
            height,
            timestamp: 1_700_000_000 + height,
            transactions: vec![],
            previous_hash: ZERO_HASH,
            merkle_root: ZERO_HASH,
            gas_used: 0,
            gas_limit: DEFAULT_GAS_LIMIT,
            status: ChildBlockStatus::Pending,
        }
    }

    #[test]
    fn test_child_hash_ignores_status() {
        let mut b = block(7);
        let before = b.hash();
        b.status = ChildBlockStatus::Finalized;
        assert_eq!(before, b.hash());
    }

    #[test]
    fn test_child_hash_depends_on_height() {
        assert_ne!(block(1).hash(), block(2).hash());
    }

    #[test]
    fn test_transaction_hash_covers_claim() {
        let plain = Transaction::new("alice", "bob", 10, 0, vec![], None);
        let claimed = Transaction::new(
            "alice",
            "bob",
            10,
            0,
            vec![],
            Some(NullifierClaim {
                nullifier_id: [9u8; 32],
                recipient: "bob".into(),
            }),
        );
        assert_ne!(plain.hash, claimed.hash);
        assert_eq!(plain.hash, plain.compute_hash());
    }

    #[test]
    fn test_transaction_gas_is_21_per_byte() {
        let tx = Transaction::new("a", "b", 1, 0, vec![0u8; 10], None);
        assert_eq!(tx.gas(), tx.encoded_size() as u64 * 21);
    }

    #[test]
    fn test_hashes_serialize_as_hex() {
        let b = block(3);
        let json = serde_json::to_value(&b).unwrap();
        assert_eq!(json["previous_hash"], "0".repeat(64));
        let back: ChildBlock = serde_json::from_value(json).unwrap();
        assert_eq!(back, b);
    }

    #[test]
    fn test_signing_payload_excludes_signature() {
        let mut proof = MergeMiningProof {
            proof_type: MERGE_MINING_PROOF_TYPE.into(),
            version: MERGE_MINING_PROOF_VERSION,
            parent_block_hash: [1u8; 32],
            parent_block_height: 10,
            parent_timestamp: 100,
            parent_difficulty: 0xfff,
            child_blocks_merkle_root: [2u8; 32],
            child_block_count: 1,
            child_block_hashes: vec![[3u8; 32]],
            signature: vec![],
        };
        let payload = proof.signing_payload();
        proof.signature = vec![0xaa; 32];
        assert_eq!(payload, proof.signing_payload());
        assert!(proof.contains(&[3u8; 32]));
    }

    #[test]
    fn test_finality_level_ordering() {
        assert!(FinalityLevel::Hard < FinalityLevel::DaConfirmed);
        assert_eq!(FinalityLevel::SettlementFinalized.weight(), 100);
    }
}
