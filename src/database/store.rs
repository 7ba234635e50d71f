use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::types::KEY_ATTRIBUTE;

/// An untyped stored record: attribute name → value
pub type Item = Map<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No record with key {0}")]
    NotFound(String),

    #[error("Record {0} already exists")]
    AlreadyExists(String),

    #[error("Record {key} is unreadable: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("{0}")]
    Backend(String),
}

/// Key-value record store holding every entity kind under one primary key.
///
/// Calls are individually blocking from the caller's point of view and are
/// never retried by the core.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Item>, StoreError>;

    /// Create or overwrite the record at the item's key
    async fn put(&self, item: Item) -> Result<(), StoreError>;

    /// Create-only write. Stores with conditional writes must override this;
    /// the default checks then writes, leaving a window in which a concurrent
    /// writer's record is overwritten.
    async fn insert_new(&self, item: Item) -> Result<(), StoreError> {
        let key = item_key(&item)?.to_string();
        if self.get(&key).await?.is_some() {
            return Err(StoreError::AlreadyExists(key));
        }
        self.put(item).await
    }

    /// Merge `changes` into an existing record and return the result.
    /// Fails with [`StoreError::NotFound`] instead of creating the record.
    async fn update(&self, key: &str, changes: Item) -> Result<Item, StoreError>;

    /// Remove the record; removing a missing key is not an error
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Every record in the store, unpaginated
    async fn scan_all(&self) -> Result<Vec<Item>, StoreError>;
}

/// Read the primary key attribute of an item
pub fn item_key(item: &Item) -> Result<&str, StoreError> {
    item.get(KEY_ATTRIBUTE)
        .and_then(Value::as_str)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| StoreError::Corrupt {
            key: String::new(),
            reason: format!("missing '{}' attribute", KEY_ATTRIBUTE),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn item_key_requires_non_empty_string() {
        let ok = json!({"ticket_id": "abc"}).as_object().cloned().unwrap();
        assert_eq!(item_key(&ok).unwrap(), "abc");

        for bad in [json!({}), json!({"ticket_id": ""}), json!({"ticket_id": 7})] {
            let item = bad.as_object().cloned().unwrap();
            assert!(matches!(item_key(&item), Err(StoreError::Corrupt { .. })));
        }
    }
}
