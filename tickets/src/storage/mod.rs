//! Storage backends for ticket records.
//!
//! - [`MemoryStore`]: process-local, lost on restart
//! - [`FileStore`]: snapshot file on local disk
//!
//! Both implement [`KeyValueStore`] and iterate in key order.

pub mod file;

pub use file::FileStore;
pub use ticket_store_core::storage::{KeyValueStore, MemoryStore, StorageError};

use crate::config::{StorageBackend, StorageConfig};
use crate::types::Ticket;
use std::sync::Arc;

/// Shared handle to the ticket table
pub type TicketStorage = Arc<dyn KeyValueStore<Ticket>>;

/// Open the backend selected by `config`.
///
/// # Errors
///
/// Returns [`StorageError`] if the file backend cannot load its snapshot.
pub fn open(config: &StorageConfig) -> Result<TicketStorage, StorageError> {
    match config.backend {
        StorageBackend::Memory => {
            tracing::info!("Using in-memory ticket storage");
            Ok(Arc::new(MemoryStore::<Ticket>::new()))
        }
        StorageBackend::File => {
            tracing::info!(path = %config.path.display(), "Using file-backed ticket storage");
            Ok(Arc::new(FileStore::<Ticket>::open(config.path.clone())?))
        }
    }
}
