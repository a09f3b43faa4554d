//! # MemoryStore
//!
//! Volatile `KeyValueStore`, optionally capped by a byte quota so callers
//! see the same "quota exceeded" failures a browser store produces.

use dashmap::DashMap;
use domains::{KeyFilter, KeyValueStore, StorageKey, StoreError};

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
    /// Maximum of key + value bytes across all entries
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: DashMap::new(),
            quota_bytes: Some(quota_bytes),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bytes currently counted against the quota.
    pub fn used_bytes(&self) -> usize {
        self.entries
            .iter()
            .map(|e| e.key().len() + e.value().len())
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn set_item(&self, key: &StorageKey, value: &str) -> Result<(), StoreError> {
        let raw_key = key.encode();

        if let Some(limit) = self.quota_bytes {
            let replaced = self
                .entries
                .get(&raw_key)
                .map(|old| raw_key.len() + old.len())
                .unwrap_or(0);
            let used = self.used_bytes() - replaced + raw_key.len() + value.len();
            if used > limit {
                return Err(StoreError::QuotaExceeded { used, limit });
            }
        }

        self.entries.insert(raw_key, value.to_string());
        Ok(())
    }

    fn get_item(&self, key: &StorageKey) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(&key.encode()).map(|v| v.value().clone()))
    }

    fn remove_item(&self, key: &StorageKey) -> Result<(), StoreError> {
        self.entries.remove(&key.encode());
        Ok(())
    }

    fn get_all(&self, filter: &KeyFilter) -> Result<Vec<String>, StoreError> {
        Ok(self
            .entries
            .iter()
            .filter(|e| StorageKey::decode(e.key()).is_some_and(|k| filter.matches(&k)))
            .map(|e| e.value().clone())
            .collect())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.entries.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let store = MemoryStore::new();
        let key = StorageKey::new("post", 1);
        store.set_item(&key, "one").unwrap();
        assert_eq!(store.get_item(&key).unwrap().as_deref(), Some("one"));

        store.remove_item(&key).unwrap();
        assert_eq!(store.get_item(&key).unwrap(), None);
        // removing twice is not an error
        store.remove_item(&key).unwrap();
    }

    #[test]
    fn test_get_all_filters_by_kind() {
        let store = MemoryStore::new();
        store.set_item(&StorageKey::new("post", 1), "a").unwrap();
        store.set_item(&StorageKey::new("post", 2), "b").unwrap();
        store.set_item(&StorageKey::new("id-generator", 0), "3").unwrap();

        let mut posts = store.get_all(&KeyFilter::of_kind("post")).unwrap();
        posts.sort();
        assert_eq!(posts, vec!["a", "b"]);
        assert_eq!(store.get_all(&KeyFilter::default()).unwrap().len(), 3);
    }

    #[test]
    fn test_quota_rejects_oversized_write_and_keeps_old_value() {
        let key = StorageKey::new("post", 1);
        let limit = key.encode().len() + 4;
        let store = MemoryStore::with_quota(limit);

        store.set_item(&key, "1234").unwrap();
        let err = store.set_item(&key, "12345").unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded { limit: l, .. } if l == limit));
        assert_eq!(store.get_item(&key).unwrap().as_deref(), Some("1234"));
    }

    #[test]
    fn test_clear_empties_store() {
        let store = MemoryStore::new();
        store.set_item(&StorageKey::new("post", 1), "a").unwrap();
        store.clear().unwrap();
        assert!(store.is_empty());
    }
}
