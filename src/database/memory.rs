use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::store::{item_key, Item, RecordStore, StoreError};

/// In-process record store used by the local server and tests.
/// `insert_new` and `update` are atomic under the write lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<BTreeMap<String, Item>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Item>, StoreError> {
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn put(&self, item: Item) -> Result<(), StoreError> {
        let key = item_key(&item)?.to_string();
        self.items.write().await.insert(key, item);
        Ok(())
    }

    async fn insert_new(&self, item: Item) -> Result<(), StoreError> {
        let key = item_key(&item)?.to_string();
        let mut items = self.items.write().await;
        if items.contains_key(&key) {
            return Err(StoreError::AlreadyExists(key));
        }
        items.insert(key, item);
        Ok(())
    }

    async fn update(&self, key: &str, changes: Item) -> Result<Item, StoreError> {
        let mut items = self.items.write().await;
        let existing = items
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        for (field, value) in changes {
            existing.insert(field, value);
        }
        Ok(existing.clone())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.items.write().await.remove(key);
        Ok(())
    }

    async fn scan_all(&self) -> Result<Vec<Item>, StoreError> {
        Ok(self.items.read().await.values().cloned().collect())
    }
}
