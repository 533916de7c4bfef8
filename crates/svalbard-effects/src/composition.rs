//! Handler composition
//!
//! Bundles one handler per effect trait behind trait objects so a server can
//! pick backends at startup from configuration while the coordinator stays
//! generic over a single effects type.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use svalbard_core::{
    ChannelError, Operation, Recipient, SecondaryChannelEffects, ShareId, ShareIdEffects,
    ShareIdError, ShareStoreEffects, ShareStoreError, ShareValue, Token, TokenMessage,
    TokenStoreEffects, TokenStoreError,
};

use crate::channel::OutboxChannel;
use crate::share_id::HashedShareIdHandler;
use crate::share_store::MemoryShareStore;
use crate::token_store::MemoryTokenStore;

/// Runtime-selected handlers for every custody effect.
#[derive(Clone)]
pub struct CustodyHandlers {
    share_store: Arc<dyn ShareStoreEffects>,
    token_store: Arc<dyn TokenStoreEffects>,
    channel: Arc<dyn SecondaryChannelEffects>,
    share_ids: Arc<dyn ShareIdEffects>,
}

impl fmt::Debug for CustodyHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustodyHandlers").finish_non_exhaustive()
    }
}

impl CustodyHandlers {
    /// Compose handlers.
    pub fn new(
        share_store: Arc<dyn ShareStoreEffects>,
        token_store: Arc<dyn TokenStoreEffects>,
        channel: Arc<dyn SecondaryChannelEffects>,
        share_ids: Arc<dyn ShareIdEffects>,
    ) -> Self {
        Self {
            share_store,
            token_store,
            channel,
            share_ids,
        }
    }

    /// All-in-memory handlers delivering into `outbox`, with default
    /// token settings and owner id types.
    pub fn in_memory(outbox: OutboxChannel) -> Self {
        Self::new(
            Arc::new(MemoryShareStore::new()),
            Arc::new(MemoryTokenStore::default()),
            Arc::new(outbox),
            Arc::new(HashedShareIdHandler::default()),
        )
    }

    /// Replace the share store.
    pub fn with_share_store(mut self, share_store: Arc<dyn ShareStoreEffects>) -> Self {
        self.share_store = share_store;
        self
    }

    /// Replace the token store.
    pub fn with_token_store(mut self, token_store: Arc<dyn TokenStoreEffects>) -> Self {
        self.token_store = token_store;
        self
    }

    /// Replace the secondary channel.
    pub fn with_channel(mut self, channel: Arc<dyn SecondaryChannelEffects>) -> Self {
        self.channel = channel;
        self
    }

    /// Replace the identifier derivation.
    pub fn with_share_ids(mut self, share_ids: Arc<dyn ShareIdEffects>) -> Self {
        self.share_ids = share_ids;
        self
    }
}

#[async_trait]
impl ShareStoreEffects for CustodyHandlers {
    async fn store(&self, id: &ShareId, value: ShareValue) -> Result<(), ShareStoreError> {
        self.share_store.store(id, value).await
    }

    async fn retrieve(&self, id: &ShareId) -> Result<ShareValue, ShareStoreError> {
        self.share_store.retrieve(id).await
    }

    async fn delete(&self, id: &ShareId) -> Result<(), ShareStoreError> {
        self.share_store.delete(id).await
    }

    async fn exists(&self, id: &ShareId) -> Result<bool, ShareStoreError> {
        self.share_store.exists(id).await
    }
}

#[async_trait]
impl TokenStoreEffects for CustodyHandlers {
    async fn issue_token(&self, id: &ShareId, op: Operation) -> Result<Token, TokenStoreError> {
        self.token_store.issue_token(id, op).await
    }

    async fn check_valid_now(
        &self,
        token: &Token,
        id: &ShareId,
        op: Operation,
    ) -> Result<(), TokenStoreError> {
        self.token_store.check_valid_now(token, id, op).await
    }
}

#[async_trait]
impl SecondaryChannelEffects for CustodyHandlers {
    async fn send(&self, recipient: &Recipient, msg: &TokenMessage) -> Result<(), ChannelError> {
        self.channel.send(recipient, msg).await
    }
}

impl ShareIdEffects for CustodyHandlers {
    fn derive_share_id(
        &self,
        owner_id_type: &str,
        owner_id: &str,
        secret_name: &str,
    ) -> Result<ShareId, ShareIdError> {
        self.share_ids
            .derive_share_id(owner_id_type, owner_id, secret_name)
    }
}
