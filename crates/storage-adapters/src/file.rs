//! # FileStore
//!
//! `KeyValueStore` persisted as a single JSON object on disk, so posts
//! survive restarts the way browser local storage does.
//! Every mutation is written through; a failed write rolls the in-memory
//! map back to its previous state.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use domains::{KeyFilter, KeyValueStore, StorageKey, StoreError};
use tracing::{debug, info};

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RefCell<BTreeMap<String, String>>,
}

impl FileStore {
    /// Opens the store at `path`, starting empty if the file does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let entries = if path.exists() {
            let text = fs::read_to_string(&path)?;
            if text.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&text)
                    .map_err(|e| StoreError::Corrupt(format!("{}: {e}", path.display())))?
            }
        } else {
            BTreeMap::new()
        };

        info!(path = %path.display(), entries = entries.len(), "opened file store");
        Ok(Self {
            path,
            entries: RefCell::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Applies `change` to the map and persists it, undoing the change if
    /// the file cannot be written.
    fn mutate(&self, change: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<(), StoreError> {
        let previous = self.entries.borrow().clone();
        change(&mut *self.entries.borrow_mut());

        if let Err(e) = self.persist() {
            *self.entries.borrow_mut() = previous;
            return Err(e);
        }
        Ok(())
    }

    fn persist(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let text = serde_json::to_string_pretty(&*self.entries.borrow())
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        // Write to a sibling file first so a crash never leaves half a file.
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;

        debug!(path = %self.path.display(), "file store persisted");
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn set_item(&self, key: &StorageKey, value: &str) -> Result<(), StoreError> {
        let raw_key = key.encode();
        let value = value.to_string();
        self.mutate(move |map| {
            map.insert(raw_key, value);
        })
    }

    fn get_item(&self, key: &StorageKey) -> Result<Option<String>, StoreError> {
        Ok(self.entries.borrow().get(&key.encode()).cloned())
    }

    fn remove_item(&self, key: &StorageKey) -> Result<(), StoreError> {
        let raw_key = key.encode();
        if !self.entries.borrow().contains_key(&raw_key) {
            return Ok(());
        }
        self.mutate(move |map| {
            map.remove(&raw_key);
        })
    }

    fn get_all(&self, filter: &KeyFilter) -> Result<Vec<String>, StoreError> {
        Ok(self
            .entries
            .borrow()
            .iter()
            .filter(|(k, _)| StorageKey::decode(k).is_some_and(|k| filter.matches(&k)))
            .map(|(_, v)| v.clone())
            .collect())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.mutate(BTreeMap::clear)
    }
}
