//! # storage-adapters
//!
//! Implementations of the `KeyValueStore` port.

pub mod file;
pub mod memory;

use std::rc::Rc;

use configs::{StorageBackend, StorageConfig};
use domains::{KeyValueStore, StoreError};
use tracing::info;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Builds the store selected by configuration.
pub fn open_store(config: &StorageConfig) -> Result<Rc<dyn KeyValueStore>, StoreError> {
    match config.backend {
        StorageBackend::Memory => {
            info!(quota_bytes = ?config.quota_bytes, "using in-memory store");
            let store = match config.quota_bytes {
                Some(limit) => MemoryStore::with_quota(limit),
                None => MemoryStore::new(),
            };
            Ok(Rc::new(store))
        }
        StorageBackend::File => {
            let path = config.path.as_ref().ok_or_else(|| {
                StoreError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "file backend configured without a path",
                ))
            })?;
            Ok(Rc::new(FileStore::open(path)?))
        }
    }
}
