//! In-memory share store

use async_trait::async_trait;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use svalbard_core::{ShareId, ShareStoreEffects, ShareStoreError, ShareValue};
use tokio::sync::RwLock;

/// In-memory share store.
///
/// Contents are lost when the last clone is dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryShareStore {
    shares: Arc<RwLock<HashMap<ShareId, ShareValue>>>,
}

impl MemoryShareStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored shares.
    pub async fn len(&self) -> usize {
        self.shares.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.shares.read().await.is_empty()
    }
}

#[async_trait]
impl ShareStoreEffects for MemoryShareStore {
    async fn store(&self, id: &ShareId, value: ShareValue) -> Result<(), ShareStoreError> {
        let mut shares = self.shares.write().await;
        match shares.entry(id.clone()) {
            Entry::Occupied(_) => Err(ShareStoreError::AlreadyExists),
            Entry::Vacant(slot) => {
                slot.insert(value);
                Ok(())
            }
        }
    }

    async fn retrieve(&self, id: &ShareId) -> Result<ShareValue, ShareStoreError> {
        let shares = self.shares.read().await;
        shares.get(id).cloned().ok_or(ShareStoreError::NotFound)
    }

    async fn delete(&self, id: &ShareId) -> Result<(), ShareStoreError> {
        let mut shares = self.shares.write().await;
        shares
            .remove(id)
            .map(|_| ())
            .ok_or(ShareStoreError::NotFound)
    }

    async fn exists(&self, id: &ShareId) -> Result<bool, ShareStoreError> {
        Ok(self.shares.read().await.contains_key(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_retrieve_delete() {
        let store = MemoryShareStore::new();
        let id = ShareId::new("abc");

        store.store(&id, ShareValue::new("V")).await.unwrap();
        assert!(store.exists(&id).await.unwrap());
        assert_eq!(store.retrieve(&id).await.unwrap().expose(), "V");

        store.delete(&id).await.unwrap();
        assert!(!store.exists(&id).await.unwrap());
        assert_eq!(store.retrieve(&id).await, Err(ShareStoreError::NotFound));
        assert_eq!(store.delete(&id).await, Err(ShareStoreError::NotFound));
    }

    #[tokio::test]
    async fn store_never_overwrites() {
        let store = MemoryShareStore::new();
        let id = ShareId::new("abc");

        store.store(&id, ShareValue::new("first")).await.unwrap();
        assert_eq!(
            store.store(&id, ShareValue::new("second")).await,
            Err(ShareStoreError::AlreadyExists)
        );
        assert_eq!(store.retrieve(&id).await.unwrap().expose(), "first");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_stores_have_one_winner() {
        let store = MemoryShareStore::new();
        let id = ShareId::new("contended");

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                store.store(&id, ShareValue::new(format!("v{i}"))).await
            }));
        }

        let mut winners = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => winners += 1,
                Err(e) => assert_eq!(e, ShareStoreError::AlreadyExists),
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(store.len().await, 1);
    }
}
