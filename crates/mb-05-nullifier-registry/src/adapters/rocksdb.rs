//! RocksDB nullifier store.
//!
//! Records live in the `nullifiers` column family keyed by the raw 32-byte id,
//! JSON-encoded. Writes are synced before `put` returns.

use std::path::Path;

use rocksdb::{ColumnFamilyDescriptor, IteratorMode, Options, WriteOptions, DB};
use shared_types::{Hash, Nullifier, StoreError};

use crate::ports::NullifierStore;

/// Column family holding nullifier records.
pub const CF_NULLIFIERS: &str = "nullifiers";

/// RocksDB-backed nullifier store
pub struct RocksDbNullifierStore {
    db: DB,
}

impl RocksDbNullifierStore {
    /// Open or create the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_compression_type(rocksdb::DBCompressionType::Snappy);

        let cf = ColumnFamilyDescriptor::new(CF_NULLIFIERS, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf])
            .map_err(|e| StoreError::Io(e.to_string()))?;
        Ok(Self { db })
    }

    fn cf(&self) -> Result<&rocksdb::ColumnFamily, StoreError> {
        self.db
            .cf_handle(CF_NULLIFIERS)
            .ok_or_else(|| StoreError::Corruption(format!("missing column family {CF_NULLIFIERS}")))
    }
}

impl NullifierStore for RocksDbNullifierStore {
    fn get(&self, id: &Hash) -> Result<Option<Nullifier>, StoreError> {
        let bytes = self
            .db
            .get_cf(self.cf()?, id)
            .map_err(|e| StoreError::Io(e.to_string()))?;
        bytes
            .map(|b| serde_json::from_slice(&b).map_err(StoreError::from))
            .transpose()
    }

    fn put(&self, nullifier: Nullifier) -> Result<(), StoreError> {
        let value = serde_json::to_vec(&nullifier)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(true);
        self.db
            .put_cf_opt(self.cf()?, nullifier.id, value, &write_opts)
            .map_err(|e| StoreError::Io(e.to_string()))
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self
            .db
            .iterator_cf(self.cf()?, IteratorMode::Start)
            .filter(|item| item.is_ok())
            .count())
    }

    fn all(&self) -> Result<Vec<Nullifier>, StoreError> {
        let mut out = Vec::new();
        for item in self.db.iterator_cf(self.cf()?, IteratorMode::Start) {
            let (_, value) = item.map_err(|e| StoreError::Io(e.to_string()))?;
            out.push(serde_json::from_slice(&value)?);
        }
        Ok(out)
    }
}
