//! Unified error system for Svalbard
//!
//! Per-effect errors convert into [`SvalbardError`]. Each variant maps to a
//! fieldless [`ErrorKind`], which is what the sanitizer and the response
//! class mapping look at. Wrapping or cloning an error never changes its
//! kind, so disclosure decisions cannot be fooled by identity.

use crate::effects::{ChannelError, ShareIdError, ShareStoreError, TokenStoreError};
use crate::message::MessageError;
use serde::{Deserialize, Serialize};

/// Unified error type for all custody operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SvalbardError {
    /// Request arrived with a method other than POST
    #[error("expected POST request")]
    ExpectedPostRequest,

    /// Request id is empty
    #[error("missing request_id")]
    MissingRequestId,

    /// Token is empty
    #[error("missing token")]
    MissingToken,

    /// Share value is absent or empty on store
    #[error("missing share_value")]
    MissingShareValue,

    /// Share identifier could not be derived
    #[error(transparent)]
    ShareId(#[from] ShareIdError),

    /// Token message could not be encoded or decoded
    #[error(transparent)]
    Message(#[from] MessageError),

    /// A share already exists at the identifier
    #[error("share already exists")]
    ShareAlreadyExists,

    /// No share exists at the identifier
    #[error("share not found")]
    ShareNotFound,

    /// The presented token is unknown
    #[error("token not found")]
    TokenNotFound,

    /// The presented token's validity window has passed
    #[error("token expired")]
    TokenExpired,

    /// The presented token does not authorize this operation
    #[error("token not valid")]
    TokenNotValid,

    /// The share store rejected the identifier
    #[error("invalid share id")]
    InvalidShareId,

    /// The share store rejected the value
    #[error("invalid share value")]
    InvalidShareValue,

    /// The token store could not issue a token
    #[error("token issuance failed: {message}")]
    TokenIssuance {
        /// Server-side detail
        message: String,
    },

    /// A backend (share or token store) failed
    #[error("storage error: {message}")]
    Storage {
        /// Server-side detail
        message: String,
    },

    /// The secondary channel failed to deliver
    #[error("delivery failed: {message}")]
    Delivery {
        /// Server-side detail
        message: String,
    },

    /// Internal system error
    #[error("internal error: {message}")]
    Internal {
        /// Server-side detail
        message: String,
    },
}

/// Standard Result type for custody operations
pub type Result<T> = std::result::Result<T, SvalbardError>;

/// Tag identifying what went wrong, independent of any carried detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Non-POST request
    ExpectedPostRequest,
    /// Empty request id
    MissingRequestId,
    /// Empty token
    MissingToken,
    /// Absent or empty share value
    MissingShareValue,
    /// Empty owner id type
    MissingOwnerType,
    /// Empty owner id
    MissingOwnerId,
    /// Empty secret name
    MissingSecretName,
    /// Owner id type not accepted
    UnsupportedOwnerIdType,
    /// Request id or token unusable in a token message
    InvalidMessageParameters,
    /// Malformed token message
    InvalidMessage,
    /// Share present where none was expected
    ShareAlreadyExists,
    /// Share absent where one was expected
    ShareNotFound,
    /// Unknown token
    TokenNotFound,
    /// Token past its validity window
    TokenExpired,
    /// Token consumed or bound elsewhere
    TokenNotValid,
    /// Identifier refused by the share store
    InvalidShareId,
    /// Value refused by the share store
    InvalidShareValue,
    /// Token store could not issue
    TokenIssuance,
    /// Share or token store backend failure
    Storage,
    /// Secondary channel failure
    Delivery,
    /// Anything else
    Internal,
}

/// Severity class of a failure response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseClass {
    /// Malformed or incomplete request
    BadRequest,
    /// Request understood but not authorized
    Forbidden,
    /// The addressed share does not exist
    NotFound,
    /// Server-side failure; detail withheld
    Internal,
}

impl SvalbardError {
    /// Create a token issuance error
    pub fn token_issuance(message: impl Into<String>) -> Self {
        Self::TokenIssuance {
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a delivery error
    pub fn delivery(message: impl Into<String>) -> Self {
        Self::Delivery {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ExpectedPostRequest => ErrorKind::ExpectedPostRequest,
            Self::MissingRequestId => ErrorKind::MissingRequestId,
            Self::MissingToken => ErrorKind::MissingToken,
            Self::MissingShareValue => ErrorKind::MissingShareValue,
            Self::ShareId(ShareIdError::MissingOwnerType) => ErrorKind::MissingOwnerType,
            Self::ShareId(ShareIdError::MissingOwnerId) => ErrorKind::MissingOwnerId,
            Self::ShareId(ShareIdError::MissingSecretName) => ErrorKind::MissingSecretName,
            Self::ShareId(ShareIdError::UnsupportedOwnerIdType) => {
                ErrorKind::UnsupportedOwnerIdType
            }
            Self::Message(MessageError::InvalidMessageParameters) => {
                ErrorKind::InvalidMessageParameters
            }
            Self::Message(MessageError::InvalidMessage) => ErrorKind::InvalidMessage,
            Self::ShareAlreadyExists => ErrorKind::ShareAlreadyExists,
            Self::ShareNotFound => ErrorKind::ShareNotFound,
            Self::TokenNotFound => ErrorKind::TokenNotFound,
            Self::TokenExpired => ErrorKind::TokenExpired,
            Self::TokenNotValid => ErrorKind::TokenNotValid,
            Self::InvalidShareId => ErrorKind::InvalidShareId,
            Self::InvalidShareValue => ErrorKind::InvalidShareValue,
            Self::TokenIssuance { .. } => ErrorKind::TokenIssuance,
            Self::Storage { .. } => ErrorKind::Storage,
            Self::Delivery { .. } => ErrorKind::Delivery,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Response class this error is reported with.
    pub fn class(&self) -> ResponseClass {
        self.kind().class()
    }
}

impl ErrorKind {
    /// Response class for this kind.
    pub fn class(self) -> ResponseClass {
        match self {
            ErrorKind::ExpectedPostRequest
            | ErrorKind::MissingRequestId
            | ErrorKind::MissingToken
            | ErrorKind::MissingShareValue
            | ErrorKind::MissingOwnerType
            | ErrorKind::MissingOwnerId
            | ErrorKind::MissingSecretName
            | ErrorKind::UnsupportedOwnerIdType
            | ErrorKind::InvalidMessageParameters
            | ErrorKind::InvalidMessage => ResponseClass::BadRequest,
            ErrorKind::TokenNotFound
            | ErrorKind::TokenExpired
            | ErrorKind::TokenNotValid
            | ErrorKind::ShareAlreadyExists => ResponseClass::Forbidden,
            ErrorKind::ShareNotFound => ResponseClass::NotFound,
            ErrorKind::InvalidShareId
            | ErrorKind::InvalidShareValue
            | ErrorKind::TokenIssuance
            | ErrorKind::Storage
            | ErrorKind::Delivery
            | ErrorKind::Internal => ResponseClass::Internal,
        }
    }
}

impl From<ShareStoreError> for SvalbardError {
    fn from(err: ShareStoreError) -> Self {
        match err {
            ShareStoreError::AlreadyExists => Self::ShareAlreadyExists,
            ShareStoreError::NotFound => Self::ShareNotFound,
            ShareStoreError::InvalidShareId => Self::InvalidShareId,
            ShareStoreError::InvalidShareValue => Self::InvalidShareValue,
            ShareStoreError::Backend(message) => Self::Storage { message },
        }
    }
}

impl From<TokenStoreError> for SvalbardError {
    fn from(err: TokenStoreError) -> Self {
        match err {
            TokenStoreError::NotFound => Self::TokenNotFound,
            TokenStoreError::Expired => Self::TokenExpired,
            TokenStoreError::NotValid => Self::TokenNotValid,
            TokenStoreError::IssuanceFailed(message) => Self::TokenIssuance { message },
            TokenStoreError::Backend(message) => Self::Storage { message },
        }
    }
}

impl From<ChannelError> for SvalbardError {
    fn from(err: ChannelError) -> Self {
        Self::delivery(err.to_string())
    }
}
