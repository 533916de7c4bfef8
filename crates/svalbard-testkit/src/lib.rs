//! Svalbard Testing Infrastructure
//!
//! Fakes for the custody effect traits and a ready-made fixture wiring them
//! to a [`CustodyCoordinator`](svalbard_core::CustodyCoordinator).
//!
//! Add to your crate's `Cargo.toml` dev-dependencies:
//! ```toml
//! [dev-dependencies]
//! svalbard-testkit = { path = "../svalbard-testkit" }
//! ```
//!
//! Then in your tests:
//! ```rust,no_run
//! use svalbard_testkit::*;
//!
//! # async fn demo() {
//! let custody = TestCustody::new();
//! let request = custody.token_request("r1", "s1");
//! custody.coordinator.request_storage_token(request).await.unwrap();
//! let token = custody.last_token().await.unwrap();
//! # }
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod clock;
pub mod fakes;
pub mod fixtures;

pub use clock::ManualClock;
pub use fakes::{FailingChannel, FailingShareStore, FailingTokenStore, RecordingShareStore, ShareStoreCall};
pub use fixtures::{init_test_tracing, TestCustody, TestCustodyBuilder, TEST_OWNER_ID, TEST_OWNER_TYPE};
