//! Error sanitizer
//!
//! The only source of error text allowed into client-visible responses.
//! Errors whose kind is on [`DISCLOSABLE_KINDS`] carry fixed, content-free
//! messages and are passed through; everything else collapses to
//! [`UNKNOWN_ERROR_MESSAGE`].

use crate::errors::{ErrorKind, SvalbardError};
use std::borrow::Cow;

/// Text returned in place of any error not on the allow-list.
pub const UNKNOWN_ERROR_MESSAGE: &str = "unknown error";

/// Kinds known to carry no sensitive information.
pub const DISCLOSABLE_KINDS: &[ErrorKind] = &[
    ErrorKind::ExpectedPostRequest,
    ErrorKind::MissingOwnerType,
    ErrorKind::MissingOwnerId,
    ErrorKind::MissingSecretName,
    ErrorKind::MissingToken,
    ErrorKind::MissingShareValue,
    ErrorKind::MissingRequestId,
    ErrorKind::ShareAlreadyExists,
    ErrorKind::ShareNotFound,
    ErrorKind::TokenNotFound,
    ErrorKind::TokenExpired,
    ErrorKind::TokenNotValid,
    ErrorKind::UnsupportedOwnerIdType,
    ErrorKind::InvalidMessageParameters,
    ErrorKind::InvalidMessage,
];

/// Whether errors of this kind may be shown to clients verbatim.
pub fn is_disclosable(kind: ErrorKind) -> bool {
    DISCLOSABLE_KINDS.contains(&kind)
}

/// Client-safe description of `err`.
pub fn public_message(err: &SvalbardError) -> Cow<'static, str> {
    if is_disclosable(err.kind()) {
        Cow::Owned(err.to_string())
    } else {
        Cow::Borrowed(UNKNOWN_ERROR_MESSAGE)
    }
}
