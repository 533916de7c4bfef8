//! Token store effect trait
//!
//! Token generation, expiry tracking and validity checking live behind this
//! trait. The core never inspects token contents.

use crate::types::{Operation, ShareId, Token};
use async_trait::async_trait;
use std::sync::Arc;

/// Token store errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenStoreError {
    /// The token is unknown to the store
    #[error("token not found")]
    NotFound,
    /// The token's validity window has passed
    #[error("token expired")]
    Expired,
    /// The token is bound to another share or operation, or already used
    #[error("token not valid")]
    NotValid,
    /// A new token could not be issued
    #[error("token issuance failed: {0}")]
    IssuanceFailed(String),
    /// Backend failure
    #[error("token store backend failure: {0}")]
    Backend(String),
}

impl TokenStoreError {
    /// Create an issuance failure
    pub fn issuance_failed(reason: impl Into<String>) -> Self {
        Self::IssuanceFailed(reason.into())
    }

    /// Create a backend error
    pub fn backend(reason: impl Into<String>) -> Self {
        Self::Backend(reason.into())
    }
}

/// Issuance and validation of operation-scoped tokens.
#[async_trait]
pub trait TokenStoreEffects: Send + Sync {
    /// Issue a fresh token valid for `op` on `id` only.
    async fn issue_token(&self, id: &ShareId, op: Operation) -> Result<Token, TokenStoreError>;

    /// Succeeds only if `token` was issued for exactly (`id`, `op`), is within
    /// its validity window and has not been consumed or invalidated.
    async fn check_valid_now(
        &self,
        token: &Token,
        id: &ShareId,
        op: Operation,
    ) -> Result<(), TokenStoreError>;
}

#[async_trait]
impl<T: TokenStoreEffects + ?Sized> TokenStoreEffects for Arc<T> {
    async fn issue_token(&self, id: &ShareId, op: Operation) -> Result<Token, TokenStoreError> {
        (**self).issue_token(id, op).await
    }

    async fn check_valid_now(
        &self,
        token: &Token,
        id: &ShareId,
        op: Operation,
    ) -> Result<(), TokenStoreError> {
        (**self).check_valid_now(token, id, op).await
    }
}
