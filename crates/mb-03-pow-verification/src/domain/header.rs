//! Parent header byte layout fed to the primary hash.

use shared_types::ParentBlockRef;

/// Serialize the parent header with an explicit nonce.
///
/// Layout: major, minor, timestamp (u64 LE), nonce (u32 LE), previous hash,
/// then the auxiliary block hash and external commitment when present.
pub fn serialize_header(parent: &ParentBlockRef, nonce: u32) -> Vec<u8> {
    let header = &parent.header;
    let mut out = Vec::with_capacity(2 + 8 + 4 + 32 * 3);
    out.push(header.major_version);
    out.push(header.minor_version);
    out.extend_from_slice(&parent.timestamp.to_le_bytes());
    out.extend_from_slice(&nonce.to_le_bytes());
    out.extend_from_slice(&header.previous_hash);
    if let Some(aux) = &header.aux_block_hash {
        out.extend_from_slice(aux);
    }
    if let Some(commitment) = &header.external_commitment {
        out.extend_from_slice(commitment);
    }
    out
}
