//! Ordered key-value storage abstraction.
//!
//! This module defines the contract the ticket store relies on for persistence:
//! a map from string keys to records that iterates in key order.
//!
//! # Design
//!
//! The trait covers what a keyed table needs:
//!
//! - Point reads (`get`)
//! - Upserts that hand back the previous value (`insert`)
//! - Removals that hand back the removed value (`remove`)
//! - Ordered scans (`values`)
//!
//! Each call is atomic on its own. Read-modify-write sequences spanning several
//! calls must be serialized by the caller (see the ticket store's key locks).
//!
//! # Implementations
//!
//! - [`MemoryStore`] (this crate): `BTreeMap` behind an `RwLock`
//! - `FileStore` (in `ticket-store`): `BTreeMap` mirrored to a snapshot file
//! - `FailingStore` (in `ticket-store-testing`): fault injection for tests

use std::collections::BTreeMap;
use std::sync::RwLock;
use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Reading or writing the backing medium failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// A record could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A thread panicked while holding a storage lock.
    #[error("Storage lock poisoned: {0}")]
    LockPoisoned(String),

    /// Any other backend-specific failure.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Durable ordered map keyed by string id.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so one instance can be shared
/// across threads behind an `Arc`.
pub trait KeyValueStore<V>: Send + Sync {
    /// Fetch the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<V>, StorageError>;

    /// Insert or replace the value under `key`, returning the previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the write fails. The map is unchanged in that case.
    fn insert(&self, key: String, value: V) -> Result<Option<V>, StorageError>;

    /// Remove the value under `key`, returning it if it was present.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the write fails. The map is unchanged in that case.
    fn remove(&self, key: &str) -> Result<Option<V>, StorageError>;

    /// All values in ascending key order.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be read.
    fn values(&self) -> Result<Vec<V>, StorageError>;

    /// Number of stored entries.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be read.
    fn len(&self) -> Result<usize, StorageError>;

    /// Whether the map holds no entries.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be read.
    fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }
}

fn poisoned<T>(err: &std::sync::PoisonError<T>) -> StorageError {
    StorageError::LockPoisoned(err.to_string())
}

/// In-memory ordered map.
///
/// Not durable across restarts; used when persistence is not required and as
/// the default backend in tests.
///
/// # Example
///
/// ```
/// use ticket_store_core::storage::{KeyValueStore, MemoryStore};
///
/// # fn main() -> Result<(), ticket_store_core::storage::StorageError> {
/// let store = MemoryStore::new();
/// store.insert("b".to_string(), 2)?;
/// store.insert("a".to_string(), 1)?;
/// assert_eq!(store.values()?, vec![1, 2]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MemoryStore<V> {
    entries: RwLock<BTreeMap<String, V>>,
}

impl<V> MemoryStore<V> {
    /// Create an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }
}

impl<V> Default for MemoryStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> KeyValueStore<V> for MemoryStore<V>
where
    V: Clone + Send + Sync,
{
    fn get(&self, key: &str) -> Result<Option<V>, StorageError> {
        let entries = self.entries.read().map_err(|e| poisoned(&e))?;
        Ok(entries.get(key).cloned())
    }

    fn insert(&self, key: String, value: V) -> Result<Option<V>, StorageError> {
        let mut entries = self.entries.write().map_err(|e| poisoned(&e))?;
        Ok(entries.insert(key, value))
    }

    fn remove(&self, key: &str) -> Result<Option<V>, StorageError> {
        let mut entries = self.entries.write().map_err(|e| poisoned(&e))?;
        Ok(entries.remove(key))
    }

    fn values(&self) -> Result<Vec<V>, StorageError> {
        let entries = self.entries.read().map_err(|e| poisoned(&e))?;
        Ok(entries.values().cloned().collect())
    }

    fn len(&self) -> Result<usize, StorageError> {
        let entries = self.entries.read().map_err(|e| poisoned(&e))?;
        Ok(entries.len())
    }
}
