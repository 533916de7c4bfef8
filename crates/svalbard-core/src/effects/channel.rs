//! Secondary channel effect trait
//!
//! One-way delivery of token messages from the server to the share owner
//! (SMS, email, push, ...). Implementations must keep errors free of
//! sensitive content: no token values, no share content.

use crate::message::TokenMessage;
use crate::types::Recipient;
use async_trait::async_trait;
use std::sync::Arc;

/// Delivery errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    /// The channel cannot reach this kind of recipient
    #[error("unsupported recipient type: {0}")]
    UnsupportedRecipient(String),
    /// Delivery failed
    #[error("delivery failed: {0}")]
    SendFailed(String),
}

impl ChannelError {
    /// Create a send failure
    pub fn send_failed(reason: impl Into<String>) -> Self {
        Self::SendFailed(reason.into())
    }
}

/// Out-of-band delivery of token messages.
#[async_trait]
pub trait SecondaryChannelEffects: Send + Sync {
    /// Deliver `msg` to `recipient`.
    async fn send(&self, recipient: &Recipient, msg: &TokenMessage) -> Result<(), ChannelError>;
}

#[async_trait]
impl<T: SecondaryChannelEffects + ?Sized> SecondaryChannelEffects for Arc<T> {
    async fn send(&self, recipient: &Recipient, msg: &TokenMessage) -> Result<(), ChannelError> {
        (**self).send(recipient, msg).await
    }
}
