//! # Svalbard Core
//!
//! Authorization layer of the Svalbard share custody service.
//!
//! Shares are opaque values addressed by a [`ShareId`]. Every store, retrieve
//! and delete is gated behind a short-lived [`Token`] scoped to exactly one
//! [`Operation`] and one identifier. Tokens reach the share owner through a
//! secondary, one-way channel before the guarded operation can run.
//!
//! ## What Belongs Here
//!
//! - Domain types and the token message codec
//! - The error taxonomy and the sanitizer deciding what a client may see
//! - Effect traits for the external collaborators (share store, token store,
//!   secondary channel, share identifier derivation)
//! - [`CustodyCoordinator`], the stateless authorization state machine
//!
//! ## What Does NOT Belong Here
//!
//! - Handler implementations of the effect traits (`svalbard-effects`)
//! - Test fakes (`svalbard-testkit`)
//! - Transport, configuration and process setup (`svalbard-server`)

#![forbid(unsafe_code)]

/// Unified error taxonomy and response classes
pub mod errors;

/// Effect traits for external collaborators
pub mod effects;

/// Token message codec for the secondary channel
pub mod message;

/// Error sanitizer for client-visible failure text
pub mod sanitize;

/// Domain types
pub mod types;

/// Authorization state machine
pub mod coordinator;

pub use coordinator::{
    Confirmation, CustodyCoordinator, OperationOutcome, Rejection, ShareRequest, TokenRequest,
};
pub use effects::{
    ChannelError, ClockEffects, CustodyEffects, SecondaryChannelEffects, ShareIdEffects,
    ShareIdError, ShareStoreEffects, ShareStoreError, TokenStoreEffects, TokenStoreError,
};
pub use errors::{ErrorKind, ResponseClass, Result, SvalbardError};
pub use message::{MessageError, TokenMessage, MESSAGE_PREFIX};
pub use sanitize::{is_disclosable, public_message, UNKNOWN_ERROR_MESSAGE};
pub use types::{AuthorizationStage, Operation, Recipient, RequestId, ShareId, ShareValue, Token};
