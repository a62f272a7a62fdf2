//! Fault injection for storage-level failure tests.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use ticket_store_core::storage::{KeyValueStore, MemoryStore, StorageError};

/// Storage wrapper that fails on demand.
///
/// Delegates to an inner store until a failure mode is switched on. Failing
/// writes never reach the inner store, so the data is left untouched.
///
/// # Example
///
/// ```
/// use ticket_store_testing::FailingStore;
/// use ticket_store_core::storage::KeyValueStore;
///
/// let store: FailingStore<u32> = FailingStore::in_memory();
/// store.fail_writes(true);
/// assert!(store.insert("k".to_string(), 1).is_err());
/// store.fail_writes(false);
/// assert!(store.get("k").unwrap().is_none());
/// ```
#[derive(Debug)]
pub struct FailingStore<V, S = MemoryStore<V>> {
    inner: S,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    _value: PhantomData<fn() -> V>,
}

impl<V> FailingStore<V, MemoryStore<V>> {
    /// Wrap a fresh in-memory store
    #[must_use]
    pub const fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }
}

impl<V, S> FailingStore<V, S> {
    /// Wrap an existing store
    #[must_use]
    pub const fn new(inner: S) -> Self {
        Self {
            inner,
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            _value: PhantomData,
        }
    }

    /// Make every read (`get`, `values`, `len`) fail until switched off
    pub fn fail_reads(&self, enabled: bool) {
        self.fail_reads.store(enabled, Ordering::SeqCst);
    }

    /// Make every write (`insert`, `remove`) fail until switched off
    pub fn fail_writes(&self, enabled: bool) {
        self.fail_writes.store(enabled, Ordering::SeqCst);
    }

    /// Access the wrapped store, bypassing fault injection
    #[must_use]
    pub const fn inner(&self) -> &S {
        &self.inner
    }

    fn check_read(&self) -> Result<(), StorageError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("injected read failure".to_string()));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Io("injected write failure".to_string()));
        }
        Ok(())
    }
}

impl<V, S> KeyValueStore<V> for FailingStore<V, S>
where
    S: KeyValueStore<V>,
{
    fn get(&self, key: &str) -> Result<Option<V>, StorageError> {
        self.check_read()?;
        self.inner.get(key)
    }

    fn insert(&self, key: String, value: V) -> Result<Option<V>, StorageError> {
        self.check_write()?;
        self.inner.insert(key, value)
    }

    fn remove(&self, key: &str) -> Result<Option<V>, StorageError> {
        self.check_write()?;
        self.inner.remove(key)
    }

    fn values(&self) -> Result<Vec<V>, StorageError> {
        self.check_read()?;
        self.inner.values()
    }

    fn len(&self) -> Result<usize, StorageError> {
        self.check_read()?;
        self.inner.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;

    #[test]
    fn failing_reads_do_not_affect_writes() {
        let store: FailingStore<u32> = FailingStore::in_memory();
        store.fail_reads(true);
        store.insert("a".to_string(), 1).unwrap();
        assert!(matches!(store.get("a"), Err(StorageError::Backend(_))));
        store.fail_reads(false);
        assert_eq!(store.get("a").unwrap(), Some(1));
    }

    #[test]
    fn failing_writes_leave_inner_untouched() {
        let store: FailingStore<u32> = FailingStore::in_memory();
        store.insert("a".to_string(), 1).unwrap();
        store.fail_writes(true);
        assert!(store.remove("a").is_err());
        assert_eq!(store.inner().get("a").unwrap(), Some(1));
    }
}
