//! Console channel for development
//!
//! Writes one line per delivery to stdout so an operator can relay tokens by
//! hand. Not meant for production: the token is visible to whoever reads
//! the process output.

use async_trait::async_trait;
use svalbard_core::{ChannelError, Recipient, SecondaryChannelEffects, TokenMessage};
use tokio::io::AsyncWriteExt;

/// Channel printing token messages to stdout.
#[derive(Debug, Clone, Default)]
pub struct ConsoleChannel {
    supported_types: Option<Vec<String>>,
}

impl ConsoleChannel {
    /// Channel accepting every recipient type.
    pub fn new() -> Self {
        Self::default()
    }

    /// Channel accepting only the given recipient types (case-insensitive).
    pub fn restricted_to<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            supported_types: Some(
                types
                    .into_iter()
                    .map(|t| t.as_ref().to_ascii_lowercase())
                    .collect(),
            ),
        }
    }

    fn accepts(&self, recipient: &Recipient) -> bool {
        match &self.supported_types {
            Some(types) => types.contains(&recipient.id_type.to_ascii_lowercase()),
            None => true,
        }
    }
}

#[async_trait]
impl SecondaryChannelEffects for ConsoleChannel {
    async fn send(&self, recipient: &Recipient, msg: &TokenMessage) -> Result<(), ChannelError> {
        if !self.accepts(recipient) {
            return Err(ChannelError::UnsupportedRecipient(recipient.id_type.clone()));
        }
        let encoded = msg
            .encode()
            .map_err(|_| ChannelError::send_failed("message cannot be encoded"))?;

        let line = format!("[svalbard] to {recipient}: {encoded}\n");
        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(line.as_bytes())
            .await
            .map_err(|e| ChannelError::send_failed(format!("stdout: {}", e.kind())))?;
        stdout
            .flush()
            .await
            .map_err(|e| ChannelError::send_failed(format!("stdout: {}", e.kind())))?;
        Ok(())
    }
}
