//! Snapshot-file backed ordered map.
//!
//! The whole table is kept in memory and rewritten to disk on every mutation.
//! Writes go to a uniquely named temporary file in the snapshot's directory
//! which is then renamed over the snapshot, so a crash leaves either the
//! previous or the new table on disk.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tempfile::NamedTempFile;
use ticket_store_core::storage::{KeyValueStore, StorageError};

/// Durable ordered map persisted as a bincode snapshot.
#[derive(Debug)]
pub struct FileStore<V> {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, V>>,
}

fn io_error(err: &io::Error) -> StorageError {
    StorageError::Io(err.to_string())
}

fn poisoned<T>(err: &PoisonError<T>) -> StorageError {
    StorageError::LockPoisoned(err.to_string())
}

impl<V> FileStore<V>
where
    V: Serialize + DeserializeOwned,
{
    /// Open the snapshot at `path`, starting empty if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the file exists but cannot be read, and
    /// [`StorageError::Serialization`] if its contents cannot be decoded.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match fs::read(&path) {
            Ok(bytes) => bincode::deserialize(&bytes)
                .map_err(|e| StorageError::Serialization(e.to_string()))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(io_error(&e)),
        };

        tracing::info!(
            path = %path.display(),
            records = entries.len(),
            "Opened file store"
        );

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Location of the snapshot file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory the snapshot lives in; temporary files are created there so
    /// the final rename never crosses filesystems.
    fn snapshot_dir(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }

    fn persist(&self, entries: &BTreeMap<String, V>) -> Result<(), StorageError> {
        let bytes =
            bincode::serialize(entries).map_err(|e| StorageError::Serialization(e.to_string()))?;

        let dir = self.snapshot_dir();
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| io_error(&e))?;
        tmp.write_all(&bytes).map_err(|e| io_error(&e))?;
        tmp.as_file().sync_all().map_err(|e| io_error(&e))?;
        tmp.persist(&self.path).map_err(|e| io_error(&e.error))?;

        // fsync the directory so the rename itself is durable
        #[cfg(unix)]
        {
            if let Ok(dir) = fs::File::open(dir) {
                let _ = dir.sync_all();
            }
        }

        tracing::trace!(path = %self.path.display(), bytes = bytes.len(), "Snapshot written");
        Ok(())
    }
}

impl<V> KeyValueStore<V> for FileStore<V>
where
    V: Clone + Serialize + DeserializeOwned + Send + Sync,
{
    fn get(&self, key: &str) -> Result<Option<V>, StorageError> {
        let entries = self.entries.read().map_err(|e| poisoned(&e))?;
        Ok(entries.get(key).cloned())
    }

    fn insert(&self, key: String, value: V) -> Result<Option<V>, StorageError> {
        let mut entries = self.entries.write().map_err(|e| poisoned(&e))?;
        let previous = entries.insert(key.clone(), value);

        if let Err(err) = self.persist(&entries) {
            // Roll the in-memory table back to what is on disk.
            match previous {
                Some(old) => {
                    entries.insert(key, old);
                }
                None => {
                    entries.remove(&key);
                }
            }
            return Err(err);
        }

        Ok(previous)
    }

    fn remove(&self, key: &str) -> Result<Option<V>, StorageError> {
        let mut entries = self.entries.write().map_err(|e| poisoned(&e))?;
        let Some(removed) = entries.remove(key) else {
            return Ok(None);
        };

        if let Err(err) = self.persist(&entries) {
            entries.insert(key.to_string(), removed);
            return Err(err);
        }

        Ok(Some(removed))
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

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn missing_file_opens_empty() {
        let dir = TempDir::new().unwrap();
        let store: FileStore<u32> = FileStore::open(dir.path().join("tickets.db")).unwrap();
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn entries_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tickets.db");
        {
            let store = FileStore::open(&path).unwrap();
            store.insert("b".to_string(), 2_u32).unwrap();
            store.insert("a".to_string(), 1_u32).unwrap();
            store.insert("c".to_string(), 3_u32).unwrap();
            assert_eq!(store.remove("c").unwrap(), Some(3));
        }

        let reopened: FileStore<u32> = FileStore::open(&path).unwrap();
        assert_eq!(reopened.values().unwrap(), vec![1, 2]);
        assert_eq!(dir_entries(dir.path()), vec!["tickets.db".to_string()]);
    }

    #[test]
    fn snapshot_with_tmp_extension_is_written_atomically() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tickets.tmp");
        {
            let store = FileStore::open(&path).unwrap();
            store.insert("a".to_string(), 1_u32).unwrap();
            store.insert("b".to_string(), 2_u32).unwrap();
        }

        let reopened: FileStore<u32> = FileStore::open(&path).unwrap();
        assert_eq!(reopened.values().unwrap(), vec![1, 2]);
        assert_eq!(dir_entries(dir.path()), vec!["tickets.tmp".to_string()]);
    }

    #[test]
    fn sibling_snapshots_do_not_share_temp_files() {
        let dir = TempDir::new().unwrap();
        let db = FileStore::open(dir.path().join("a.db")).unwrap();
        let bin = FileStore::open(dir.path().join("a.bin")).unwrap();

        db.insert("k".to_string(), 1_u32).unwrap();
        bin.insert("k".to_string(), 2_u32).unwrap();

        let db: FileStore<u32> = FileStore::open(dir.path().join("a.db")).unwrap();
        let bin: FileStore<u32> = FileStore::open(dir.path().join("a.bin")).unwrap();
        assert_eq!(db.values().unwrap(), vec![1]);
        assert_eq!(bin.values().unwrap(), vec![2]);
        assert_eq!(
            dir_entries(dir.path()),
            vec!["a.bin".to_string(), "a.db".to_string()]
        );
    }

    #[test]
    fn corrupt_snapshot_is_a_serialization_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tickets.db");
        fs::write(&path, [0xff_u8; 3]).unwrap();
        let result: Result<FileStore<String>, _> = FileStore::open(&path);
        assert!(matches!(result, Err(StorageError::Serialization(_))));
    }

    #[test]
    fn failed_write_rolls_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tickets.db");
        let store = FileStore::open(&path).unwrap();
        store.insert("a".to_string(), 1_u32).unwrap();

        // A non-empty directory where the snapshot goes makes the rename fail.
        fs::remove_file(&path).unwrap();
        fs::create_dir_all(path.join("blocker")).unwrap();

        assert!(store.insert("b".to_string(), 2).is_err());
        assert!(store.remove("a").is_err());
        assert_eq!(store.values().unwrap(), vec![1]);

        // Failed writes leave no temporary files behind.
        assert_eq!(dir_entries(dir.path()), vec!["tickets.db".to_string()]);
    }
}
