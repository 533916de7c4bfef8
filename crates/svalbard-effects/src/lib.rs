//! # Svalbard Effects
//!
//! Reference handlers for the effect traits defined in `svalbard-core`.
//!
//! - Share stores: [`MemoryShareStore`], [`FilesystemShareStore`]
//! - Token store: [`MemoryTokenStore`]
//! - Secondary channels: [`ConsoleChannel`], [`OutboxChannel`]
//! - Identifier derivation: [`HashedShareIdHandler`]
//! - Time: [`SystemClock`]
//!
//! [`CustodyHandlers`] composes one handler per trait into a value the
//! coordinator can run against.
//!
//! Handlers here make no durability or replication promises. Fakes with
//! failure injection live in `svalbard-testkit`.

#![forbid(unsafe_code)]

pub mod channel;
pub mod composition;
pub mod share_id;
pub mod share_store;
pub mod time;
pub mod token_store;

pub use channel::{ConsoleChannel, Delivery, OutboxChannel};
pub use composition::CustodyHandlers;
pub use share_id::{HashedShareIdHandler, DEFAULT_OWNER_ID_TYPES};
pub use share_store::{FilesystemShareStore, MemoryShareStore};
pub use time::SystemClock;
pub use token_store::{MemoryTokenStore, TokenStoreConfig};
