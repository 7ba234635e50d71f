use std::marker::PhantomData;
use std::sync::Arc;

use super::record::{Entity, StoredEntity};
use super::store::{Item, RecordStore, StoreError};
use crate::types::EntityKind;

/// Typed view of one entity kind over the shared record store
pub struct Repository<T> {
    store: Arc<dyn RecordStore>,
    _phantom: PhantomData<T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _phantom: PhantomData,
        }
    }
}

impl<T: StoredEntity> Repository<T> {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            _phantom: PhantomData,
        }
    }

    /// Whether `key` can name a record of this kind at all
    fn owns_key(key: &str) -> bool {
        EntityKind::classify(key, None) == T::KIND
    }

    pub async fn select_one(&self, key: &str) -> Result<Option<T>, StoreError> {
        if !Self::owns_key(key) {
            return Ok(None);
        }
        match self.store.get(key).await? {
            Some(item) => Ok(T::from_entity(Entity::from_item(item)?)),
            None => Ok(None),
        }
    }

    pub async fn select_404(&self, key: &str) -> Result<T, StoreError> {
        self.select_one(key)
            .await?
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    /// Every record of this kind. Records that fail to decode are skipped and logged.
    pub async fn select_all(&self) -> Result<Vec<T>, StoreError> {
        let items = self.store.scan_all().await?;
        let mut selected = Vec::new();

        for item in items {
            match Entity::from_item(item) {
                Ok(entity) => {
                    if let Some(record) = T::from_entity(entity) {
                        selected.push(record);
                    }
                }
                Err(e) => tracing::warn!("Skipping unreadable record during scan: {}", e),
            }
        }

        tracing::debug!(kind = T::KIND.tag(), count = selected.len(), "Scanned records");
        Ok(selected)
    }

    pub async fn insert(&self, record: T) -> Result<(), StoreError> {
        self.store.put(record.into_entity().into_item()?).await
    }

    /// Create-only insert; fails with [`StoreError::AlreadyExists`] on a taken key
    pub async fn insert_new(&self, record: T) -> Result<(), StoreError> {
        self.store.insert_new(record.into_entity().into_item()?).await
    }

    /// Partial update of an existing record, returning the merged result
    pub async fn update_fields(&self, key: &str, changes: Item) -> Result<T, StoreError> {
        if !Self::owns_key(key) {
            return Err(StoreError::NotFound(key.to_string()));
        }
        let merged = self.store.update(key, changes).await?;
        T::from_entity(Entity::from_item(merged)?).ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    pub async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.store.delete(key).await
    }
}
