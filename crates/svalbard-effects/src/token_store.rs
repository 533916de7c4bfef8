//! In-memory token store
//!
//! Tokens are random hex strings bound at issuance to one (share, operation)
//! pair and valid for a fixed window. A successful check consumes the token;
//! any later presentation is rejected as not valid. Presenting a token for
//! the wrong share or operation does not consume it.
//!
//! The number of live tokens is bounded. Expired records are pruned when a
//! new token is issued, so until then an expired token is still reported as
//! expired rather than unknown.

use async_trait::async_trait;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use svalbard_core::{ClockEffects, Operation, ShareId, Token, TokenStoreEffects, TokenStoreError};
use tokio::sync::Mutex;

use crate::time::SystemClock;

/// Token store tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenStoreConfig {
    /// Validity window of a token, in seconds
    pub ttl_secs: u64,
    /// Random bytes per token (hex encoded, so twice as many characters)
    pub token_bytes: usize,
    /// Upper bound on tokens held at once
    pub max_outstanding: usize,
}

impl Default for TokenStoreConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            token_bytes: 16,
            max_outstanding: 10_000,
        }
    }
}

#[derive(Debug)]
struct TokenRecord {
    share_id: ShareId,
    operation: Operation,
    expires_at_ms: u64,
    consumed: bool,
}

/// Token store holding issued tokens in memory.
pub struct MemoryTokenStore {
    config: TokenStoreConfig,
    clock: Arc<dyn ClockEffects>,
    tokens: Mutex<HashMap<Token, TokenRecord>>,
}

impl std::fmt::Debug for MemoryTokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTokenStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for MemoryTokenStore {
    fn default() -> Self {
        Self::new(TokenStoreConfig::default())
    }
}

impl MemoryTokenStore {
    /// Create a store using the system clock.
    pub fn new(config: TokenStoreConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a store reading time from `clock`.
    pub fn with_clock(config: TokenStoreConfig, clock: Arc<dyn ClockEffects>) -> Self {
        Self {
            config,
            clock,
            tokens: Mutex::new(HashMap::new()),
        }
    }

    /// Configuration in effect.
    pub fn config(&self) -> &TokenStoreConfig {
        &self.config
    }

    /// Number of records currently held, including consumed and expired ones.
    pub async fn outstanding(&self) -> usize {
        self.tokens.lock().await.len()
    }

    fn generate(&self) -> Token {
        let mut bytes = vec![0u8; self.config.token_bytes.max(1)];
        rand::thread_rng().fill_bytes(&mut bytes);
        Token::new(hex::encode(bytes))
    }

    fn ttl_ms(&self) -> u64 {
        self.config.ttl_secs.saturating_mul(1000)
    }
}

#[async_trait]
impl TokenStoreEffects for MemoryTokenStore {
    async fn issue_token(&self, id: &ShareId, op: Operation) -> Result<Token, TokenStoreError> {
        let now = self.clock.now_ms();
        let mut tokens = self.tokens.lock().await;

        tokens.retain(|_, record| record.expires_at_ms > now);
        if tokens.len() >= self.config.max_outstanding {
            return Err(TokenStoreError::issuance_failed(format!(
                "{} tokens outstanding, limit {}",
                tokens.len(),
                self.config.max_outstanding
            )));
        }

        let token = loop {
            let candidate = self.generate();
            if !tokens.contains_key(&candidate) {
                break candidate;
            }
        };

        tokens.insert(
            token.clone(),
            TokenRecord {
                share_id: id.clone(),
                operation: op,
                expires_at_ms: now.saturating_add(self.ttl_ms()),
                consumed: false,
            },
        );
        tracing::debug!(operation = %op, outstanding = tokens.len(), "issued token");
        Ok(token)
    }

    async fn check_valid_now(
        &self,
        token: &Token,
        id: &ShareId,
        op: Operation,
    ) -> Result<(), TokenStoreError> {
        let now = self.clock.now_ms();
        let mut tokens = self.tokens.lock().await;
        let record = tokens.get_mut(token).ok_or(TokenStoreError::NotFound)?;

        if record.consumed || record.share_id != *id || record.operation != op {
            return Err(TokenStoreError::NotValid);
        }
        if now >= record.expires_at_ms {
            return Err(TokenStoreError::Expired);
        }

        record.consumed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct StepClock(AtomicU64);

    impl ClockEffects for StepClock {
        fn now_ms(&self) -> u64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn store_at(start_ms: u64, config: TokenStoreConfig) -> (MemoryTokenStore, Arc<StepClock>) {
        let clock = Arc::new(StepClock(AtomicU64::new(start_ms)));
        (MemoryTokenStore::with_clock(config, clock.clone()), clock)
    }

    #[tokio::test]
    async fn token_is_single_use() {
        let store = MemoryTokenStore::default();
        let id = ShareId::new("x");
        let token = store.issue_token(&id, Operation::Store).await.unwrap();

        assert_eq!(token.expose().len(), 32);
        assert!(store.check_valid_now(&token, &id, Operation::Store).await.is_ok());
        assert_eq!(
            store.check_valid_now(&token, &id, Operation::Store).await,
            Err(TokenStoreError::NotValid)
        );
    }

    #[tokio::test]
    async fn token_is_scoped_to_share_and_operation() {
        let store = MemoryTokenStore::default();
        let id = ShareId::new("x");
        let token = store.issue_token(&id, Operation::Store).await.unwrap();

        for op in [Operation::Retrieve, Operation::Delete] {
            assert_eq!(
                store.check_valid_now(&token, &id, op).await,
                Err(TokenStoreError::NotValid)
            );
        }
        assert_eq!(
            store
                .check_valid_now(&token, &ShareId::new("y"), Operation::Store)
                .await,
            Err(TokenStoreError::NotValid)
        );
        // Misdirected presentations leave the token usable.
        assert!(store.check_valid_now(&token, &id, Operation::Store).await.is_ok());
    }

    #[tokio::test]
    async fn unknown_token_is_not_found() {
        let store = MemoryTokenStore::default();
        assert_eq!(
            store
                .check_valid_now(&Token::new("nope"), &ShareId::new("x"), Operation::Delete)
                .await,
            Err(TokenStoreError::NotFound)
        );
    }

    #[tokio::test]
    async fn token_expires_after_ttl() {
        let config = TokenStoreConfig {
            ttl_secs: 60,
            ..TokenStoreConfig::default()
        };
        let (store, clock) = store_at(1_000_000, config);
        let id = ShareId::new("x");
        let token = store.issue_token(&id, Operation::Retrieve).await.unwrap();

        clock.0.store(1_000_000 + 60_000, Ordering::SeqCst);
        assert_eq!(
            store.check_valid_now(&token, &id, Operation::Retrieve).await,
            Err(TokenStoreError::Expired)
        );
    }

    #[tokio::test]
    async fn issuance_is_bounded_and_expired_tokens_free_capacity() {
        let config = TokenStoreConfig {
            ttl_secs: 1,
            max_outstanding: 2,
            ..TokenStoreConfig::default()
        };
        let (store, clock) = store_at(0, config);
        let id = ShareId::new("x");

        store.issue_token(&id, Operation::Store).await.unwrap();
        store.issue_token(&id, Operation::Store).await.unwrap();
        assert!(matches!(
            store.issue_token(&id, Operation::Store).await,
            Err(TokenStoreError::IssuanceFailed(_))
        ));

        clock.0.store(1_000, Ordering::SeqCst);
        assert!(store.issue_token(&id, Operation::Store).await.is_ok());
        assert_eq!(store.outstanding().await, 1);
    }

    #[tokio::test]
    async fn repeated_requests_yield_independent_tokens() {
        let store = MemoryTokenStore::default();
        let id = ShareId::new("x");
        let first = store.issue_token(&id, Operation::Delete).await.unwrap();
        let second = store.issue_token(&id, Operation::Delete).await.unwrap();

        assert_ne!(first, second);
        assert!(store.check_valid_now(&second, &id, Operation::Delete).await.is_ok());
        assert!(store.check_valid_now(&first, &id, Operation::Delete).await.is_ok());
    }
}
