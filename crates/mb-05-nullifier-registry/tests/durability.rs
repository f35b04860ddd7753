//! Nullifier state survives a restart of the file-backed store.

use std::sync::Arc;

use mb_05_nullifier_registry::{
    ClaimError, FileNullifierStore, NullifierConfig, NullifierRegistry, NullifierStore,
};
use shared_types::ManualTimeSource;

fn open(dir: &tempfile::TempDir) -> NullifierRegistry {
    let store = FileNullifierStore::open(dir.path().join("nullifiers.json")).unwrap();
    NullifierRegistry::new(Arc::new(store), NullifierConfig::default())
        .with_clock(Arc::new(ManualTimeSource::new(1_700_000_000)))
}

#[test]
fn spent_nullifier_rejected_after_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let id = [0xabu8; 32];

    {
        let registry = open(&dir);
        registry.record_claim(id, [1u8; 32], "alice", 101).unwrap();
        registry.confirm(&id).unwrap();
    }

    let registry = open(&dir);
    assert_eq!(registry.len().unwrap(), 1);
    assert!(registry.is_spent(&id).unwrap());
    assert!(registry.get(&id).unwrap().unwrap().confirmed_at.is_some());
    assert!(matches!(
        registry.record_claim(id, [2u8; 32], "mallory", 102),
        Err(ClaimError::DoubleSpend { .. })
    ));
}

#[test]
fn claims_land_in_journal_then_compact_to_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileNullifierStore::open(dir.path().join("nullifiers.json")).unwrap());
    let registry = NullifierRegistry::new(store.clone(), NullifierConfig::default())
        .with_clock(Arc::new(ManualTimeSource::new(1_700_000_000)));
    registry.record_claim([1u8; 32], [2u8; 32], "alice", 5).unwrap();

    let journal = std::fs::read_to_string(dir.path().join("nullifiers.json.journal")).unwrap();
    assert!(journal.contains(&hex::encode([1u8; 32])));
    assert!(!dir.path().join("nullifiers.json").exists());

    store.compact().unwrap();
    let raw = std::fs::read_to_string(dir.path().join("nullifiers.json")).unwrap();
    assert!(raw.contains(&hex::encode([1u8; 32])));
    assert!(!dir.path().join("nullifiers.tmp").exists());
    assert_eq!(store.journal_entries(), 0);

    drop(registry);
    drop(store);
    let registry = open(&dir);
    assert!(registry.is_spent(&[1u8; 32]).unwrap());
}

#[test]
fn corrupt_snapshot_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nullifiers.json");
    std::fs::write(&path, b"{ not json").unwrap();
    assert!(FileNullifierStore::open(&path).is_err());
}

#[test]
fn missing_snapshot_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileNullifierStore::open(dir.path().join("sub").join("n.json")).unwrap();
    assert!(store.is_empty().unwrap());
}
