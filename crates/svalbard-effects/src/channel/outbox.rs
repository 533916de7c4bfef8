//! Outbox channel
//!
//! Records every delivery in memory. Used by tests and by embedders that
//! forward messages through their own transport.

use async_trait::async_trait;
use std::sync::Arc;
use svalbard_core::{ChannelError, Recipient, SecondaryChannelEffects, Token, TokenMessage};
use tokio::sync::Mutex;

/// One recorded delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Who the message was addressed to
    pub recipient: Recipient,
    /// Encoded wire form, `SVBD:<request_id>:<token>`
    pub encoded: String,
}

impl Delivery {
    /// Decode the recorded wire form back into a message.
    pub fn message(&self) -> Option<TokenMessage> {
        self.encoded.parse().ok()
    }
}

/// Channel that keeps delivered messages in memory.
#[derive(Debug, Clone, Default)]
pub struct OutboxChannel {
    deliveries: Arc<Mutex<Vec<Delivery>>>,
}

impl OutboxChannel {
    /// Create an empty outbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// All deliveries so far, oldest first.
    pub async fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().await.clone()
    }

    /// Most recent delivery to `recipient`.
    pub async fn last_for(&self, recipient: &Recipient) -> Option<Delivery> {
        self.deliveries
            .lock()
            .await
            .iter()
            .rev()
            .find(|d| &d.recipient == recipient)
            .cloned()
    }

    /// Token from the most recent delivery to `recipient`.
    pub async fn last_token_for(&self, recipient: &Recipient) -> Option<Token> {
        self.last_for(recipient)
            .await
            .and_then(|d| d.message())
            .map(|m| m.token)
    }

    /// Remove and return all deliveries.
    pub async fn drain(&self) -> Vec<Delivery> {
        std::mem::take(&mut *self.deliveries.lock().await)
    }
}

#[async_trait]
impl SecondaryChannelEffects for OutboxChannel {
    async fn send(&self, recipient: &Recipient, msg: &TokenMessage) -> Result<(), ChannelError> {
        let encoded = msg
            .encode()
            .map_err(|_| ChannelError::send_failed("message cannot be encoded"))?;
        self.deliveries.lock().await.push(Delivery {
            recipient: recipient.clone(),
            encoded,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use svalbard_core::RequestId;

    #[tokio::test]
    async fn records_encoded_messages_per_recipient() {
        let outbox = OutboxChannel::new();
        let alice = Recipient::new("email", "a@example.com");
        let bob = Recipient::new("sms", "+15550100");

        for (recipient, request_id, token) in [(&alice, "r1", "t1"), (&bob, "r2", "t2"), (&alice, "r3", "t3")] {
            let msg = TokenMessage::new(RequestId::new(request_id), Token::new(token));
            outbox.send(recipient, &msg).await.unwrap();
        }

        assert_eq!(outbox.deliveries().await.len(), 3);
        assert_eq!(outbox.last_for(&alice).await.unwrap().encoded, "SVBD:r3:t3");
        assert_eq!(outbox.last_token_for(&bob).await, Some(Token::new("t2")));
        assert_eq!(outbox.drain().await.len(), 3);
        assert!(outbox.deliveries().await.is_empty());
    }

    #[tokio::test]
    async fn unencodable_messages_fail_without_content() {
        let outbox = OutboxChannel::new();
        let msg = TokenMessage::new(RequestId::new("r:1"), Token::new("secret-token"));
        let err = outbox
            .send(&Recipient::new("email", "a@example.com"), &msg)
            .await
            .unwrap_err();
        assert!(!err.to_string().contains("secret-token"));
        assert!(outbox.deliveries().await.is_empty());
    }
}
