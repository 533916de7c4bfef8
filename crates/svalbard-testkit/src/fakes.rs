//! Fakes with failure injection and call recording
//!
//! Each fake wraps a real handler and either forwards to it or fails with an
//! injected error. Uses `std::sync::Mutex`; no guard is held across an await.

#![allow(clippy::disallowed_types)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use svalbard_core::{
    ChannelError, Operation, Recipient, SecondaryChannelEffects, ShareId, ShareStoreEffects,
    ShareStoreError, ShareValue, Token, TokenMessage, TokenStoreEffects, TokenStoreError,
};
use svalbard_effects::{MemoryShareStore, MemoryTokenStore, OutboxChannel};

/// One call observed by [`RecordingShareStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareStoreCall {
    /// `store` was called
    Store(ShareId),
    /// `retrieve` was called
    Retrieve(ShareId),
    /// `delete` was called
    Delete(ShareId),
    /// `exists` was called
    Exists(ShareId),
}

impl ShareStoreCall {
    /// Whether the call read or changed share content.
    pub fn touches_content(&self) -> bool {
        !matches!(self, ShareStoreCall::Exists(_))
    }
}

/// Share store spy recording every call before forwarding it.
#[derive(Clone)]
pub struct RecordingShareStore {
    inner: Arc<dyn ShareStoreEffects>,
    calls: Arc<Mutex<Vec<ShareStoreCall>>>,
}

impl Default for RecordingShareStore {
    fn default() -> Self {
        Self::new(Arc::new(MemoryShareStore::new()))
    }
}

impl RecordingShareStore {
    /// Record calls made to `inner`.
    pub fn new(inner: Arc<dyn ShareStoreEffects>) -> Self {
        Self {
            inner,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Calls so far, oldest first.
    pub fn calls(&self) -> Vec<ShareStoreCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls that read or changed share content.
    pub fn content_calls(&self) -> Vec<ShareStoreCall> {
        self.calls()
            .into_iter()
            .filter(ShareStoreCall::touches_content)
            .collect()
    }

    /// Forget recorded calls.
    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: ShareStoreCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ShareStoreEffects for RecordingShareStore {
    async fn store(&self, id: &ShareId, value: ShareValue) -> Result<(), ShareStoreError> {
        self.record(ShareStoreCall::Store(id.clone()));
        self.inner.store(id, value).await
    }

    async fn retrieve(&self, id: &ShareId) -> Result<ShareValue, ShareStoreError> {
        self.record(ShareStoreCall::Retrieve(id.clone()));
        self.inner.retrieve(id).await
    }

    async fn delete(&self, id: &ShareId) -> Result<(), ShareStoreError> {
        self.record(ShareStoreCall::Delete(id.clone()));
        self.inner.delete(id).await
    }

    async fn exists(&self, id: &ShareId) -> Result<bool, ShareStoreError> {
        self.record(ShareStoreCall::Exists(id.clone()));
        self.inner.exists(id).await
    }
}

/// Share store failing every call while a failure is injected.
#[derive(Clone)]
pub struct FailingShareStore {
    inner: Arc<dyn ShareStoreEffects>,
    failure: Arc<Mutex<Option<ShareStoreError>>>,
}

impl Default for FailingShareStore {
    fn default() -> Self {
        Self::new(Arc::new(MemoryShareStore::new()))
    }
}

impl FailingShareStore {
    /// Wrap `inner`, initially healthy.
    pub fn new(inner: Arc<dyn ShareStoreEffects>) -> Self {
        Self {
            inner,
            failure: Arc::new(Mutex::new(None)),
        }
    }

    /// Fail all following calls with `err`.
    pub fn fail_with(&self, err: ShareStoreError) {
        *self.failure.lock().unwrap() = Some(err);
    }

    /// Stop failing.
    pub fn heal(&self) {
        *self.failure.lock().unwrap() = None;
    }

    fn check(&self) -> Result<(), ShareStoreError> {
        match self.failure.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ShareStoreEffects for FailingShareStore {
    async fn store(&self, id: &ShareId, value: ShareValue) -> Result<(), ShareStoreError> {
        self.check()?;
        self.inner.store(id, value).await
    }

    async fn retrieve(&self, id: &ShareId) -> Result<ShareValue, ShareStoreError> {
        self.check()?;
        self.inner.retrieve(id).await
    }

    async fn delete(&self, id: &ShareId) -> Result<(), ShareStoreError> {
        self.check()?;
        self.inner.delete(id).await
    }

    async fn exists(&self, id: &ShareId) -> Result<bool, ShareStoreError> {
        self.check()?;
        self.inner.exists(id).await
    }
}

/// Token store with independently injectable issuance and check failures.
///
/// It can also hand out a fixed token instead of asking the inner store,
/// to model a backend producing tokens the rest of the system cannot carry.
#[derive(Clone)]
pub struct FailingTokenStore {
    inner: Arc<dyn TokenStoreEffects>,
    issue_failure: Arc<Mutex<Option<TokenStoreError>>>,
    check_failure: Arc<Mutex<Option<TokenStoreError>>>,
    fixed_token: Arc<Mutex<Option<Token>>>,
}

impl Default for FailingTokenStore {
    fn default() -> Self {
        Self::new(Arc::new(MemoryTokenStore::default()))
    }
}

impl FailingTokenStore {
    /// Wrap `inner`, initially healthy.
    pub fn new(inner: Arc<dyn TokenStoreEffects>) -> Self {
        Self {
            inner,
            issue_failure: Arc::new(Mutex::new(None)),
            check_failure: Arc::new(Mutex::new(None)),
            fixed_token: Arc::new(Mutex::new(None)),
        }
    }

    /// Issue `token` for every following request, bypassing the inner store.
    pub fn issue_fixed(&self, token: Token) {
        *self.fixed_token.lock().unwrap() = Some(token);
    }

    /// Fail every following `issue_token` with `err`.
    pub fn fail_issuance(&self, err: TokenStoreError) {
        *self.issue_failure.lock().unwrap() = Some(err);
    }

    /// Fail every following `check_valid_now` with `err`.
    pub fn fail_checks(&self, err: TokenStoreError) {
        *self.check_failure.lock().unwrap() = Some(err);
    }

    /// Stop failing.
    pub fn heal(&self) {
        *self.issue_failure.lock().unwrap() = None;
        *self.check_failure.lock().unwrap() = None;
        *self.fixed_token.lock().unwrap() = None;
    }
}

#[async_trait]
impl TokenStoreEffects for FailingTokenStore {
    async fn issue_token(&self, id: &ShareId, op: Operation) -> Result<Token, TokenStoreError> {
        let injected = self.issue_failure.lock().unwrap().clone();
        if let Some(err) = injected {
            return Err(err);
        }
        let fixed = self.fixed_token.lock().unwrap().clone();
        if let Some(token) = fixed {
            return Ok(token);
        }
        self.inner.issue_token(id, op).await
    }

    async fn check_valid_now(
        &self,
        token: &Token,
        id: &ShareId,
        op: Operation,
    ) -> Result<(), TokenStoreError> {
        let injected = self.check_failure.lock().unwrap().clone();
        if let Some(err) = injected {
            return Err(err);
        }
        self.inner.check_valid_now(token, id, op).await
    }
}

/// Channel that drops messages with an injected error, or forwards them to
/// an outbox when healthy.
///
/// Dropped messages are kept so tests can check what happens to a token
/// that was issued but never reached its owner.
#[derive(Clone)]
pub struct FailingChannel {
    outbox: OutboxChannel,
    failure: Arc<Mutex<Option<ChannelError>>>,
    attempts: Arc<AtomicUsize>,
    dropped: Arc<Mutex<Vec<TokenMessage>>>,
}

impl FailingChannel {
    /// Channel delivering into `outbox`, initially healthy.
    pub fn new(outbox: OutboxChannel) -> Self {
        Self {
            outbox,
            failure: Arc::new(Mutex::new(None)),
            attempts: Arc::new(AtomicUsize::new(0)),
            dropped: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Fail every following send with `err`.
    pub fn fail_with(&self, err: ChannelError) {
        *self.failure.lock().unwrap() = Some(err);
    }

    /// Stop failing.
    pub fn heal(&self) {
        *self.failure.lock().unwrap() = None;
    }

    /// Number of send attempts, failed or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Messages that failed delivery, oldest first.
    pub fn dropped(&self) -> Vec<TokenMessage> {
        self.dropped.lock().unwrap().clone()
    }
}

#[async_trait]
impl SecondaryChannelEffects for FailingChannel {
    async fn send(&self, recipient: &Recipient, msg: &TokenMessage) -> Result<(), ChannelError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let injected = self.failure.lock().unwrap().clone();
        if let Some(err) = injected {
            self.dropped.lock().unwrap().push(msg.clone());
            return Err(err);
        }
        self.outbox.send(recipient, msg).await
    }
}
