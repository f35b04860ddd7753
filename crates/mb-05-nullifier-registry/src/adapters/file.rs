use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use shared_types::{Hash, Nullifier, StoreError};
use tracing::{debug, info, warn};

use crate::ports::NullifierStore;

/// Journal entries folded into the snapshot at once.
pub const DEFAULT_COMPACTION_THRESHOLD: usize = 1024;

/// File-backed store for deployments without RocksDB.
///
/// Two files live side by side:
/// - `<path>` holds a JSON snapshot, replaced through a temp file,
///   `sync_all` and an atomic rename;
/// - `<path>.journal` holds one JSON record per line, appended and
///   `sync_data`'d on every `put`.
///
/// Opening loads the snapshot and replays the journal over it. Once the
/// journal holds `compaction_threshold` entries it is folded into a fresh
/// snapshot and truncated, so a `put` costs one short append rather than
/// a rewrite of every record.
#[derive(Debug)]
pub struct FileNullifierStore {
    state: RwLock<State>,
    path: PathBuf,
    journal_path: PathBuf,
    compaction_threshold: usize,
}

#[derive(Debug)]
struct State {
    records: HashMap<Hash, Nullifier>,
    journal: File,
    journal_len: u64,
    journal_entries: usize,
}

impl FileNullifierStore {
    /// Open the store at `path`, starting empty if nothing exists yet.
    ///
    /// An unreadable or corrupt snapshot or journal is an error rather than
    /// an empty registry, since starting empty would re-admit spent
    /// nullifiers. The one exception is an unterminated last journal line,
    /// which is what a crash mid-append leaves behind; it is dropped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut records: HashMap<Hash, Nullifier> = match std::fs::read(&path) {
            Ok(bytes) => {
                let list: Vec<Nullifier> = serde_json::from_slice(&bytes)?;
                list.into_iter().map(|n| (n.id, n)).collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("[mb-05] 📁 No nullifier snapshot at {}", path.display());
                HashMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        let journal_path = journal_path(&path);
        let (journal_len, journal_entries) = replay(&journal_path, &mut records)?;
        let journal = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&journal_path)?;
        if journal.metadata()?.len() != journal_len {
            warn!(
                "[mb-05] ✂️ Dropping torn journal tail in {}",
                journal_path.display()
            );
            journal.set_len(journal_len)?;
            journal.sync_all()?;
        }

        info!(
            "[mb-05] 💾 Loaded {} nullifiers from {} ({} journal entries)",
            records.len(),
            path.display(),
            journal_entries
        );

        Ok(Self {
            state: RwLock::new(State {
                records,
                journal,
                journal_len,
                journal_entries,
            }),
            path,
            journal_path,
            compaction_threshold: DEFAULT_COMPACTION_THRESHOLD,
        })
    }

    /// Fold the journal into the snapshot after `threshold` entries.
    #[must_use]
    pub fn with_compaction_threshold(mut self, threshold: usize) -> Self {
        self.compaction_threshold = threshold.max(1);
        self
    }

    /// Snapshot location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Journal location.
    pub fn journal_path(&self) -> &Path {
        &self.journal_path
    }

    /// Entries appended since the last compaction.
    pub fn journal_entries(&self) -> usize {
        self.state.read().journal_entries
    }

    /// Write a fresh snapshot and empty the journal.
    pub fn compact(&self) -> Result<(), StoreError> {
        let mut state = self.state.write();
        self.compact_locked(&mut *state)
    }

    fn compact_locked(&self, state: &mut State) -> Result<(), StoreError> {
        let mut list: Vec<&Nullifier> = state.records.values().collect();
        list.sort_by(|a, b| a.id.cmp(&b.id));
        let bytes =
            serde_json::to_vec(&list).map_err(|e| StoreError::Serialization(e.to_string()))?;

        let temp_path = self.path.with_extension("tmp");
        let mut file = File::create(&temp_path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        std::fs::rename(&temp_path, &self.path)?;

        // A crash before this point replays records the snapshot already has.
        state.journal.set_len(0)?;
        state.journal.sync_all()?;
        debug!(
            "[mb-05] Compacted {} journal entries into {}",
            state.journal_entries,
            self.path.display()
        );
        state.journal_len = 0;
        state.journal_entries = 0;
        Ok(())
    }
}

fn journal_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".journal");
    PathBuf::from(name)
}

/// Apply every complete journal line to `records`. Returns the byte length
/// of the complete lines and how many there were.
fn replay(path: &Path, records: &mut HashMap<Hash, Nullifier>) -> Result<(u64, usize), StoreError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok((0, 0)),
        Err(e) => return Err(e.into()),
    };

    let complete = bytes
        .iter()
        .rposition(|b| *b == b'\n')
        .map_or(0, |last| last + 1);

    let mut entries = 0;
    for line in bytes[..complete].split(|b| *b == b'\n') {
        if line.is_empty() {
            continue;
        }
        let nullifier: Nullifier = serde_json::from_slice(line)?;
        records.insert(nullifier.id, nullifier);
        entries += 1;
    }
    Ok((complete as u64, entries))
}

impl NullifierStore for FileNullifierStore {
    fn get(&self, id: &Hash) -> Result<Option<Nullifier>, StoreError> {
        Ok(self.state.read().records.get(id).cloned())
    }

    fn put(&self, nullifier: Nullifier) -> Result<(), StoreError> {
        let mut line =
            serde_json::to_vec(&nullifier).map_err(|e| StoreError::Serialization(e.to_string()))?;
        line.push(b'\n');

        let mut state = self.state.write();
        let appended = match state.journal.write_all(&line) {
            Ok(()) => state.journal.sync_data(),
            Err(e) => Err(e),
        };
        if let Err(e) = appended {
            // Cut any partial line so the next append starts clean.
            let len = state.journal_len;
            if let Err(trim) = state.journal.set_len(len) {
                warn!("[mb-05] Could not trim journal after failed append: {}", trim);
            }
            return Err(e.into());
        }

        state.journal_len += line.len() as u64;
        state.journal_entries += 1;
        state.records.insert(nullifier.id, nullifier);

        if state.journal_entries >= self.compaction_threshold {
            // The record is already durable in the journal.
            if let Err(e) = self.compact_locked(&mut *state) {
                warn!("[mb-05] Journal compaction failed: {}", e);
            }
        }
        Ok(())
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.state.read().records.len())
    }

    fn all(&self) -> Result<Vec<Nullifier>, StoreError> {
        Ok(self.state.read().records.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::NullifierStatus;

    fn nullifier(byte: u8, recipient: &str) -> Nullifier {
        Nullifier {
            id: [byte; 32],
            block_height_recorded: u64::from(byte),
            recorded_at: 1_700_000_000,
            source_tx_hash: [0x11; 32],
            recipient: recipient.into(),
            status: NullifierStatus::Spent,
            confirmed_at: None,
        }
    }

    #[test]
    fn test_reopen_replays_journal_over_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("n.json");
        {
            let store = FileNullifierStore::open(&path).unwrap();
            store.put(nullifier(1, "alice")).unwrap();
            store.compact().unwrap();
            store.put(nullifier(2, "bob")).unwrap();
            store.put(nullifier(1, "alice-updated")).unwrap();
            assert_eq!(store.journal_entries(), 2);
        }

        let store = FileNullifierStore::open(&path).unwrap();
        assert_eq!(store.len().unwrap(), 2);
        assert_eq!(store.journal_entries(), 2);
        assert_eq!(
            store.get(&[1u8; 32]).unwrap().unwrap().recipient,
            "alice-updated"
        );
    }

    #[test]
    fn test_compaction_after_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("n.json");
        let store = FileNullifierStore::open(&path)
            .unwrap()
            .with_compaction_threshold(3);

        store.put(nullifier(1, "a")).unwrap();
        store.put(nullifier(2, "b")).unwrap();
        assert!(!path.exists());
        assert_eq!(store.journal_entries(), 2);

        store.put(nullifier(3, "c")).unwrap();
        assert_eq!(store.journal_entries(), 0);
        assert_eq!(std::fs::metadata(store.journal_path()).unwrap().len(), 0);

        let snapshot: Vec<Nullifier> =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(snapshot.len(), 3);
        // One record per line would mean pretty printing crept back in.
        assert!(!std::fs::read_to_string(&path).unwrap().contains('\n'));
    }

    #[test]
    fn test_torn_tail_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("n.json");
        {
            let store = FileNullifierStore::open(&path).unwrap();
            store.put(nullifier(1, "alice")).unwrap();
        }
        let journal = journal_path(&path);
        let mut file = OpenOptions::new().append(true).open(&journal).unwrap();
        file.write_all(br#"{"id":"0202"#).unwrap();
        drop(file);

        let store = FileNullifierStore::open(&path).unwrap();
        assert_eq!(store.len().unwrap(), 1);
        store.put(nullifier(3, "carol")).unwrap();
        drop(store);

        let store = FileNullifierStore::open(&path).unwrap();
        assert_eq!(store.len().unwrap(), 2);
        assert!(store.get(&[3u8; 32]).unwrap().is_some());
    }

    #[test]
    fn test_corrupt_journal_line_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("n.json");
        std::fs::write(journal_path(&path), b"{ not json\n").unwrap();
        assert!(matches!(
            FileNullifierStore::open(&path),
            Err(StoreError::Corruption(_))
        ));
    }
}
