//! Token message codec
//!
//! The secondary channel carries a single line of the form
//! `SVBD:<request_id>:<token>`. The prefix is matched case-insensitively on
//! decode; exactly two non-empty colon-separated fields must follow it.

use crate::types::{RequestId, Token};
use std::str::FromStr;

/// Protocol tag opening every token message, including its delimiter.
pub const MESSAGE_PREFIX: &str = "SVBD:";

const DELIMITER: char = ':';

/// Codec failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MessageError {
    /// Request id or token is empty or contains the delimiter
    #[error("invalid parameters for message with token")]
    InvalidMessageParameters,
    /// Input is not a well-formed token message
    #[error("invalid message with token")]
    InvalidMessage,
}

/// A token paired with the request that asked for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMessage {
    /// Correlator supplied by the client
    pub request_id: RequestId,
    /// Token being delivered
    pub token: Token,
}

impl TokenMessage {
    /// Pair a request id with a token.
    pub fn new(request_id: RequestId, token: Token) -> Self {
        Self { request_id, token }
    }

    /// Encode into the wire form. See [`encode`].
    pub fn encode(&self) -> Result<String, MessageError> {
        encode(self)
    }
}

impl FromStr for TokenMessage {
    type Err = MessageError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        decode(raw)
    }
}

fn is_valid_field(field: &str) -> bool {
    !field.is_empty() && !field.contains(DELIMITER)
}

/// Encode a message as `SVBD:<request_id>:<token>`.
pub fn encode(msg: &TokenMessage) -> Result<String, MessageError> {
    let request_id = msg.request_id.as_str();
    let token = msg.token.expose();
    if !is_valid_field(request_id) || !is_valid_field(token) {
        return Err(MessageError::InvalidMessageParameters);
    }

    let mut out = String::with_capacity(MESSAGE_PREFIX.len() + request_id.len() + 1 + token.len());
    out.push_str(MESSAGE_PREFIX);
    out.push_str(request_id);
    out.push(DELIMITER);
    out.push_str(token);
    Ok(out)
}

/// Parse a message produced by [`encode`].
pub fn decode(raw: &str) -> Result<TokenMessage, MessageError> {
    // `get` also rejects a prefix length that splits a multi-byte character.
    let prefix = raw
        .get(..MESSAGE_PREFIX.len())
        .ok_or(MessageError::InvalidMessage)?;
    if !prefix.eq_ignore_ascii_case(MESSAGE_PREFIX) {
        return Err(MessageError::InvalidMessage);
    }

    let mut parts = raw[MESSAGE_PREFIX.len()..].split(DELIMITER);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(request_id), Some(token), None) if !request_id.is_empty() && !token.is_empty() => {
            Ok(TokenMessage::new(RequestId::new(request_id), Token::new(token)))
        }
        _ => Err(MessageError::InvalidMessage),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn message(request_id: &str, token: &str) -> TokenMessage {
        TokenMessage::new(RequestId::new(request_id), Token::new(token))
    }

    #[test]
    fn encode_produces_prefixed_line() {
        assert_eq!(message("r1", "T").encode().unwrap(), "SVBD:r1:T");
    }

    #[test]
    fn encode_rejects_empty_or_delimited_fields() {
        for (request_id, token) in [("", "t"), ("r", ""), ("r:1", "t"), ("r", "t:t"), ("", "")] {
            assert_eq!(
                encode(&message(request_id, token)),
                Err(MessageError::InvalidMessageParameters),
                "request_id={request_id:?} token={token:?}"
            );
        }
    }

    #[test]
    fn decode_accepts_any_prefix_case() {
        let decoded: TokenMessage = "svbd:req-7:abcdef".parse().unwrap();
        assert_eq!(decoded, message("req-7", "abcdef"));
        assert_eq!(decode("SvBd:a:b").unwrap(), message("a", "b"));
    }

    #[test]
    fn decode_rejects_malformed_input() {
        let cases = [
            "",
            "SVBD",
            "SVBD:",
            "XXXX:r:t",
            "r1:T",
            "SVBD:r1",
            "SVBD:r1:T:extra",
            "SVBD::T",
            "SVBD:r1:",
            "SVBD:::",
            "SVB\u{e9}:r:t",
        ];
        for raw in cases {
            assert_eq!(decode(raw), Err(MessageError::InvalidMessage), "input {raw:?}");
        }
    }

    fn field() -> impl Strategy<Value = String> {
        "[^:]{1,32}"
    }

    proptest! {
        /// Decoding inverts encoding for every message encode accepts
        #[test]
        fn decode_inverts_encode(request_id in field(), token in field()) {
            let original = message(&request_id, &token);
            let wire = encode(&original).unwrap();
            prop_assert_eq!(decode(&wire).unwrap(), original);
        }
    }
}
