//! Effect traits for the collaborators the coordinator drives.
//!
//! # Effect Classification
//!
//! - **Category**: Infrastructure Effect
//! - **Implementation**: `svalbard-effects` (reference handlers),
//!   `svalbard-testkit` (fakes)
//! - **Usage**: [`CustodyCoordinator`](crate::CustodyCoordinator)
//!
//! Handlers are the only components holding mutable shared state. Atomic
//! check-and-store, atomic issuance and single redemption are their
//! responsibility; the coordinator adds no locking of its own.

pub mod channel;
pub mod clock;
pub mod share_id;
pub mod share_store;
pub mod supertraits;
pub mod token_store;

pub use channel::{ChannelError, SecondaryChannelEffects};
pub use clock::ClockEffects;
pub use share_id::{ShareIdEffects, ShareIdError};
pub use share_store::{ShareStoreEffects, ShareStoreError};
pub use supertraits::CustodyEffects;
pub use token_store::{TokenStoreEffects, TokenStoreError};
