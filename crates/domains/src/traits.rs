//! # Core Traits (Ports)
//!
//! Any storage backend must implement these traits to be used by the post
//! repository.

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Record kind under which posts are stored.
pub const POST_KIND: &str = "post";
/// Record kind of the id counter entry.
pub const ID_GENERATOR_KIND: &str = "id-generator";
/// Fixed sub-key of the id counter entry.
pub const ID_GENERATOR_KEY: &str = "0";

/// Composite key of a stored value: record kind plus id.
///
/// Encoded as the JSON text `{"type":"post","id":"3"}` so a key can always be
/// rebuilt from `(kind, id)` and decoded back while enumerating.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageKey {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

impl StorageKey {
    pub fn new(kind: impl Into<String>, id: impl ToString) -> Self {
        Self {
            kind: kind.into(),
            id: id.to_string(),
        }
    }

    /// `type` always precedes `id`; raw keys are compared as text.
    pub fn encode(&self) -> String {
        format!(
            r#"{{"type":{},"id":{}}}"#,
            serde_json::Value::from(self.kind.as_str()),
            serde_json::Value::from(self.id.as_str())
        )
    }

    /// Returns `None` for raw keys that were not written through `encode`.
    pub fn decode(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}

/// Enumeration filter for `KeyValueStore::get_all`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyFilter {
    /// Only keys of this kind; `None` matches every decodable key
    pub kind: Option<String>,
}

impl KeyFilter {
    pub fn of_kind(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
        }
    }

    pub fn matches(&self, key: &StorageKey) -> bool {
        self.kind.as_deref().is_none_or(|kind| kind == key.kind)
    }
}

/// String-keyed persistent store, shaped after the browser's local storage.
///
/// Implementations use interior mutability: the store is a process-wide
/// singleton shared behind `Rc`.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait KeyValueStore {
    fn set_item(&self, key: &StorageKey, value: &str) -> Result<(), StoreError>;
    fn get_item(&self, key: &StorageKey) -> Result<Option<String>, StoreError>;
    fn remove_item(&self, key: &StorageKey) -> Result<(), StoreError>;
    /// Raw values of every entry whose key matches `filter`.
    fn get_all(&self, filter: &KeyFilter) -> Result<Vec<String>, StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}
