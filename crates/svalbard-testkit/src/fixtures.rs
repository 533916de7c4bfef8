//! Coordinator fixture
//!
//! [`TestCustody`] wires a coordinator to in-memory handlers wrapped in the
//! fakes from [`crate::fakes`], so a test can inject failures, spy on share
//! store calls, move time and read delivered tokens from one place.

use std::sync::Arc;
use std::sync::Once;
use svalbard_core::{
    CustodyCoordinator, Operation, Recipient, ShareRequest, Token, TokenRequest,
};
use svalbard_effects::{
    CustodyHandlers, HashedShareIdHandler, MemoryShareStore, MemoryTokenStore, OutboxChannel,
    TokenStoreConfig, DEFAULT_OWNER_ID_TYPES,
};

use crate::clock::ManualClock;
use crate::fakes::{FailingChannel, FailingShareStore, FailingTokenStore, RecordingShareStore};

/// Owner id type used by the fixture helpers.
pub const TEST_OWNER_TYPE: &str = "email";

/// Owner id used by the fixture helpers.
pub const TEST_OWNER_ID: &str = "owner@example.com";

static TRACING: Once = Once::new();

/// Install a test-friendly tracing subscriber once per process.
///
/// Honors `RUST_LOG`; output is captured by the test harness.
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Coordinator over fully observable handlers.
#[derive(Clone)]
pub struct TestCustody {
    /// Coordinator under test
    pub coordinator: CustodyCoordinator<CustodyHandlers>,
    /// Every delivered token message
    pub outbox: OutboxChannel,
    /// Spy on share store calls made by the coordinator
    pub shares: RecordingShareStore,
    /// Failure switch behind the spy
    pub share_failures: FailingShareStore,
    /// Token store with failure switches
    pub tokens: FailingTokenStore,
    /// Channel with a failure switch, delivering into `outbox`
    pub channel: FailingChannel,
    /// Time seen by the token store
    pub clock: ManualClock,
}

impl Default for TestCustody {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl TestCustody {
    /// Fixture with default token settings and owner id types.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start configuring a fixture.
    pub fn builder() -> TestCustodyBuilder {
        TestCustodyBuilder::default()
    }

    /// Recipient the fixture helpers address.
    pub fn recipient() -> Recipient {
        Recipient::new(TEST_OWNER_TYPE, TEST_OWNER_ID)
    }

    /// Token request for `secret_name` owned by the test owner.
    pub fn token_request(&self, request_id: &str, secret_name: &str) -> TokenRequest {
        TokenRequest::new(request_id, TEST_OWNER_TYPE, TEST_OWNER_ID, secret_name)
    }

    /// Share request for `secret_name` owned by the test owner.
    pub fn share_request(&self, token: &Token, secret_name: &str) -> ShareRequest {
        ShareRequest::new(token.expose(), TEST_OWNER_TYPE, TEST_OWNER_ID, secret_name)
    }

    /// Token most recently delivered to the test owner.
    pub async fn last_token(&self) -> Option<Token> {
        self.outbox.last_token_for(&Self::recipient()).await
    }

    /// Request a token for `op` on `secret_name` and return the delivered
    /// token. Panics if the request is rejected.
    pub async fn obtain_token(&self, op: Operation, secret_name: &str) -> Token {
        let request = self.token_request("fixture", secret_name);
        self.coordinator
            .request_token(op, request)
            .await
            .unwrap_or_else(|rejection| panic!("{op} token request rejected: {rejection}"));
        self.last_token().await.expect("token delivered to outbox")
    }

    /// Store `value` as a share of `secret_name` through the full token flow.
    pub async fn store_share(&self, secret_name: &str, value: &str) {
        let token = self.obtain_token(Operation::Store, secret_name).await;
        let request = self.share_request(&token, secret_name).with_value(value);
        self.coordinator
            .store_share(request)
            .await
            .unwrap_or_else(|rejection| panic!("store rejected: {rejection}"));
    }
}

/// Builder for [`TestCustody`].
#[derive(Debug, Clone)]
pub struct TestCustodyBuilder {
    token_config: TokenStoreConfig,
    owner_id_types: Vec<String>,
    clock: ManualClock,
}

impl Default for TestCustodyBuilder {
    fn default() -> Self {
        Self {
            token_config: TokenStoreConfig::default(),
            owner_id_types: DEFAULT_OWNER_ID_TYPES.iter().map(|t| t.to_string()).collect(),
            clock: ManualClock::default(),
        }
    }
}

impl TestCustodyBuilder {
    /// Token store settings.
    pub fn token_config(mut self, config: TokenStoreConfig) -> Self {
        self.token_config = config;
        self
    }

    /// Accepted owner id types.
    pub fn owner_id_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.owner_id_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Clock driving token expiry.
    pub fn clock(mut self, clock: ManualClock) -> Self {
        self.clock = clock;
        self
    }

    /// Assemble the fixture.
    pub fn build(self) -> TestCustody {
        let outbox = OutboxChannel::new();
        let share_failures = FailingShareStore::new(Arc::new(MemoryShareStore::new()));
        let shares = RecordingShareStore::new(Arc::new(share_failures.clone()));
        let tokens = FailingTokenStore::new(Arc::new(MemoryTokenStore::with_clock(
            self.token_config,
            Arc::new(self.clock.clone()),
        )));
        let channel = FailingChannel::new(outbox.clone());

        let handlers = CustodyHandlers::new(
            Arc::new(shares.clone()),
            Arc::new(tokens.clone()),
            Arc::new(channel.clone()),
            Arc::new(HashedShareIdHandler::new(&self.owner_id_types)),
        );

        TestCustody {
            coordinator: CustodyCoordinator::new(Arc::new(handlers)),
            outbox,
            shares,
            share_failures,
            tokens,
            channel,
            clock: self.clock,
        }
    }
}
