//! Abstract key-value storage for the DPoR engine.
//!
//! Snapshots persist through this narrow interface so any backend (LMDB,
//! RocksDB, in-memory for testing) can sit underneath. The rest of the
//! workspace depends only on the trait.

pub mod error;
pub mod memory;

pub use error::StoreError;
pub use memory::MemoryStore;

/// A byte-oriented key-value store.
///
/// `get` distinguishes "key absent" (`Ok(None)`) from backend failure;
/// callers decide whether an absent key is an error. `put` must be atomic
/// per key.
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;
}
