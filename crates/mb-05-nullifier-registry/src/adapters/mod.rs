//! Nullifier store adapters.

mod file;
mod memory;
#[cfg(feature = "rocksdb")]
mod rocksdb;

pub use file::FileNullifierStore;
pub use memory::InMemoryNullifierStore;
#[cfg(feature = "rocksdb")]
pub use self::rocksdb::RocksDbNullifierStore;
