//! Domain types shared by the coordinator and every effect handler.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Stable identifier of a stored share.
///
/// Produced by a [`ShareIdEffects`](crate::effects::ShareIdEffects) handler
/// and treated as an opaque key everywhere else.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShareId(String);

impl ShareId {
    /// Wrap an already-derived identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShareId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Operations guarded by tokens.
///
/// The discriminants are stable; token store bindings rely on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Operation {
    /// Store a new share
    Store = 0,
    /// Retrieve an existing share
    Retrieve = 1,
    /// Delete an existing share
    Delete = 2,
}

impl Operation {
    /// All operations, in ordinal order.
    pub const ALL: [Operation; 3] = [Operation::Store, Operation::Retrieve, Operation::Delete];

    /// Stable ordinal value.
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// Noun used in token confirmations ("storage token").
    pub fn token_noun(self) -> &'static str {
        match self {
            Operation::Store => "storage",
            Operation::Retrieve => "retrieval",
            Operation::Delete => "deletion",
        }
    }

    /// Verb used in redemption failures ("could not store the share").
    pub fn verb(self) -> &'static str {
        match self {
            Operation::Store => "store",
            Operation::Retrieve => "retrieve",
            Operation::Delete => "delete",
        }
    }
}

impl TryFrom<u8> for Operation {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Operation::Store),
            1 => Ok(Operation::Retrieve),
            2 => Ok(Operation::Delete),
            other => Err(other),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// Short-lived access token bound to one (share, operation) pair.
///
/// The value is never printed by `Debug` and is wiped on drop.
#[derive(Clone, PartialEq, Eq, Hash, Zeroize, ZeroizeOnDrop)]
pub struct Token(String);

impl Token {
    /// Wrap a token value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the raw token value.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the token is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(<redacted>)")
    }
}

/// Client-supplied correlator echoed in the token message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(String);

impl RequestId {
    /// Wrap a request identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a token message is delivered, e.g. `("email", "a@example.com")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Recipient {
    /// Channel type, e.g. "email" or "sms"
    pub id_type: String,
    /// Address within that channel
    pub id: String,
}

impl Recipient {
    /// Create a recipient.
    pub fn new(id_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            id_type: id_type.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id_type, self.id)
    }
}

/// Uninterpreted share content.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct ShareValue(String);

impl ShareValue {
    /// Wrap a share value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the share content.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the value is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Length of the content in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Debug for ShareValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShareValue(<{} bytes>)", self.0.len())
    }
}

/// Progress of one authorization attempt.
///
/// There is no persisted state object: the token store is the durable record
/// of `TokenIssued` and the share store of `Redeemed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthorizationStage {
    /// Request received, nothing issued yet
    Requested,
    /// Token issued but not (successfully) delivered
    TokenIssued,
    /// Token delivered over the secondary channel
    TokenDelivered,
    /// Token redeemed and the guarded operation performed
    Redeemed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_ordinals_are_stable() {
        assert_eq!(Operation::Store.ordinal(), 0);
        assert_eq!(Operation::Retrieve.ordinal(), 1);
        assert_eq!(Operation::Delete.ordinal(), 2);
        for op in Operation::ALL {
            assert_eq!(Operation::try_from(op.ordinal()), Ok(op));
        }
        assert_eq!(Operation::try_from(3), Err(3));
    }

    #[test]
    fn secrets_are_redacted_in_debug() {
        let token = Token::new("abc123");
        let value = ShareValue::new("top secret");
        assert_eq!(format!("{token:?}"), "Token(<redacted>)");
        assert_eq!(format!("{value:?}"), "ShareValue(<10 bytes>)");
        assert_eq!(token.expose(), "abc123");
    }

    #[test]
    fn recipient_display() {
        let recipient = Recipient::new("email", "a@example.com");
        assert_eq!(recipient.to_string(), "email:a@example.com");
    }
}
