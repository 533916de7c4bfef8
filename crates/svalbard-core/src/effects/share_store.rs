//! Share storage effect trait
//!
//! Every implementation must report failures using only the variants below;
//! free-form detail belongs in [`ShareStoreError::Backend`], which is never
//! shown to clients.

use crate::types::{ShareId, ShareValue};
use async_trait::async_trait;
use std::sync::Arc;

/// Share storage errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShareStoreError {
    /// A share is already stored under the identifier
    #[error("share already exists")]
    AlreadyExists,
    /// No share is stored under the identifier
    #[error("share not found")]
    NotFound,
    /// The identifier cannot be used by this backend
    #[error("invalid share id")]
    InvalidShareId,
    /// The value cannot be stored by this backend
    #[error("invalid share value")]
    InvalidShareValue,
    /// Backend failure
    #[error("share store backend failure: {0}")]
    Backend(String),
}

impl ShareStoreError {
    /// Create a backend error
    pub fn backend(reason: impl Into<String>) -> Self {
        Self::Backend(reason.into())
    }
}

/// Storage of share values by identifier.
#[async_trait]
pub trait ShareStoreEffects: Send + Sync {
    /// Store `value` under `id`.
    ///
    /// Fails with [`ShareStoreError::AlreadyExists`] if a share is present.
    /// The existence check and the write must be atomic with respect to
    /// concurrent `store` calls for the same identifier.
    async fn store(&self, id: &ShareId, value: ShareValue) -> Result<(), ShareStoreError>;

    /// Return the share stored under `id`.
    async fn retrieve(&self, id: &ShareId) -> Result<ShareValue, ShareStoreError>;

    /// Remove the share stored under `id`.
    async fn delete(&self, id: &ShareId) -> Result<(), ShareStoreError>;

    /// Whether a share is stored under `id`, without disclosing it.
    ///
    /// The default goes through [`retrieve`](Self::retrieve) and drops the
    /// value; handlers that can answer directly should override it.
    async fn exists(&self, id: &ShareId) -> Result<bool, ShareStoreError> {
        match self.retrieve(id).await {
            Ok(_) => Ok(true),
            Err(ShareStoreError::NotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl<T: ShareStoreEffects + ?Sized> ShareStoreEffects for Arc<T> {
    async fn store(&self, id: &ShareId, value: ShareValue) -> Result<(), ShareStoreError> {
        (**self).store(id, value).await
    }

    async fn retrieve(&self, id: &ShareId) -> Result<ShareValue, ShareStoreError> {
        (**self).retrieve(id).await
    }

    async fn delete(&self, id: &ShareId) -> Result<(), ShareStoreError> {
        (**self).delete(id).await
    }

    async fn exists(&self, id: &ShareId) -> Result<bool, ShareStoreError> {
        (**self).exists(id).await
    }
}
