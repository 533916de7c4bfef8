//! Custody coordinator
//!
//! Authorization state machine gating every share operation behind a token
//! delivered out of band:
//!
//! ```text
//! Requested -> TokenIssued -> TokenDelivered -> Redeemed
//!     \             \               \
//!      +-------------+---------------+--> rejected
//! ```
//!
//! Each call advances exactly one hop. The coordinator keeps no state of its
//! own: the token store records `TokenIssued`, the share store records
//! `Redeemed`. It can be shared freely across concurrent request handlers.
//!
//! The share store is never read or mutated before a valid token for the
//! exact (share, operation) pair has been presented. The token-request
//! pre-check only asks whether a share exists.

use crate::effects::CustodyEffects;
use crate::errors::{ErrorKind, ResponseClass, SvalbardError};
use crate::message::{MessageError, TokenMessage};
use crate::sanitize::public_message;
use crate::types::{
    AuthorizationStage, Operation, Recipient, RequestId, ShareId, ShareValue, Token,
};
use std::fmt;
use std::sync::Arc;

/// Request for an operation token.
#[derive(Debug, Clone)]
pub struct TokenRequest {
    /// Correlator echoed in the token message
    pub request_id: RequestId,
    /// Owner id type, e.g. "email"
    pub owner_id_type: String,
    /// Owner id, e.g. "a@example.com"
    pub owner_id: String,
    /// Name of the secret the share belongs to
    pub secret_name: String,
}

impl TokenRequest {
    /// Build a token request.
    pub fn new(
        request_id: impl Into<String>,
        owner_id_type: impl Into<String>,
        owner_id: impl Into<String>,
        secret_name: impl Into<String>,
    ) -> Self {
        Self {
            request_id: RequestId::new(request_id),
            owner_id_type: owner_id_type.into(),
            owner_id: owner_id.into(),
            secret_name: secret_name.into(),
        }
    }

    fn recipient(&self) -> Recipient {
        Recipient::new(self.owner_id_type.clone(), self.owner_id.clone())
    }
}

/// Request to perform a guarded operation with a token.
#[derive(Debug, Clone)]
pub struct ShareRequest {
    /// Token received over the secondary channel
    pub token: Token,
    /// Owner id type, e.g. "email"
    pub owner_id_type: String,
    /// Owner id, e.g. "a@example.com"
    pub owner_id: String,
    /// Name of the secret the share belongs to
    pub secret_name: String,
    /// Value to store; only used by store
    pub share_value: Option<ShareValue>,
}

impl ShareRequest {
    /// Build a request without a share value (retrieve, delete).
    pub fn new(
        token: impl Into<String>,
        owner_id_type: impl Into<String>,
        owner_id: impl Into<String>,
        secret_name: impl Into<String>,
    ) -> Self {
        Self {
            token: Token::new(token),
            owner_id_type: owner_id_type.into(),
            owner_id: owner_id.into(),
            secret_name: secret_name.into(),
            share_value: None,
        }
    }

    /// Attach a share value (store).
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.share_value = Some(ShareValue::new(value));
        self
    }
}

/// Successful response carrying a confirmation text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    /// Operation the confirmation refers to
    pub operation: Operation,
    /// Stage reached by this request
    pub stage: AuthorizationStage,
    /// Client-visible confirmation text
    pub message: String,
}

/// Result of a redeemed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome {
    /// Share stored
    Stored(Confirmation),
    /// Share value disclosed to the token holder
    Retrieved(ShareValue),
    /// Share deleted
    Deleted(Confirmation),
}

impl OperationOutcome {
    /// Client-visible response body.
    pub fn body(&self) -> &str {
        match self {
            OperationOutcome::Stored(c) | OperationOutcome::Deleted(c) => &c.message,
            OperationOutcome::Retrieved(value) => value.expose(),
        }
    }
}

/// Sanitized failure response.
///
/// `message` is built only from sanitizer output and request parameters the
/// client supplied; server-side detail is logged, never stored here.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct Rejection {
    /// Operation being authorized
    pub operation: Operation,
    /// Last stage reached before the rejection; `Redeemed` once the token
    /// has been consumed
    pub stage: AuthorizationStage,
    /// Kind of the underlying error
    pub kind: ErrorKind,
    /// Severity class of the response
    pub class: ResponseClass,
    /// Client-visible failure text
    pub message: String,
}

/// How a rejection message is framed around the sanitized error text.
enum Framing<'a> {
    /// Sanitized text alone
    Plain,
    /// `Req. <id>: <text>.`
    Request(&'a RequestId),
    /// Fixed text, error detail withheld entirely
    Fixed(String),
    /// `could not <verb> the share: <text>`
    Redemption,
}

/// Stateless custody coordinator.
pub struct CustodyCoordinator<E: CustodyEffects> {
    effects: Arc<E>,
}

impl<E: CustodyEffects> Clone for CustodyCoordinator<E> {
    fn clone(&self) -> Self {
        Self {
            effects: Arc::clone(&self.effects),
        }
    }
}

impl<E: CustodyEffects> fmt::Debug for CustodyCoordinator<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustodyCoordinator").finish_non_exhaustive()
    }
}

impl<E: CustodyEffects> CustodyCoordinator<E> {
    /// Create a coordinator over the given effect system.
    pub fn new(effects: Arc<E>) -> Self {
        Self { effects }
    }

    /// Get the effect system.
    pub fn effects(&self) -> &Arc<E> {
        &self.effects
    }

    /// Request a token for storing a new share.
    pub async fn request_storage_token(
        &self,
        request: TokenRequest,
    ) -> Result<Confirmation, Rejection> {
        self.request_token(Operation::Store, request).await
    }

    /// Request a token for retrieving an existing share.
    pub async fn request_retrieval_token(
        &self,
        request: TokenRequest,
    ) -> Result<Confirmation, Rejection> {
        self.request_token(Operation::Retrieve, request).await
    }

    /// Request a token for deleting an existing share.
    pub async fn request_deletion_token(
        &self,
        request: TokenRequest,
    ) -> Result<Confirmation, Rejection> {
        self.request_token(Operation::Delete, request).await
    }

    /// Issue a token for `op` and deliver it to the owner.
    ///
    /// A delivery failure is reported, but the issued token stays valid; the
    /// expected recovery is a fresh token request.
    pub async fn request_token(
        &self,
        op: Operation,
        request: TokenRequest,
    ) -> Result<Confirmation, Rejection> {
        let stage = AuthorizationStage::Requested;
        tracing::debug!(
            operation = %op,
            request_id = %request.request_id,
            owner_id_type = %request.owner_id_type,
            secret_name = %request.secret_name,
            "token requested"
        );

        if request.request_id.is_empty() {
            return Err(reject(op, stage, SvalbardError::MissingRequestId, Framing::Plain));
        }
        // A request id the codec cannot carry must not cost a token.
        if request.request_id.as_str().contains(':') {
            return Err(reject(
                op,
                stage,
                MessageError::InvalidMessageParameters.into(),
                Framing::Plain,
            ));
        }

        let share_id = self
            .derive(&request.owner_id_type, &request.owner_id, &request.secret_name)
            .map_err(|e| reject(op, stage, e, Framing::Plain))?;

        self.check_precondition(op, &share_id)
            .await
            .map_err(|e| reject(op, stage, e, Framing::Request(&request.request_id)))?;

        let token = self
            .effects
            .issue_token(&share_id, op)
            .await
            .map_err(SvalbardError::from)
            .map_err(|e| {
                let text = format!(
                    "Req. {}: could not generate {} token, try later again.",
                    request.request_id,
                    op.token_noun()
                );
                reject(op, stage, e, Framing::Fixed(text))
            })?;
        let stage = AuthorizationStage::TokenIssued;

        let recipient = request.recipient();
        self.deliver(&recipient, &request.request_id, token)
            .await
            .map_err(|e| {
                let text = format!(
                    "Req. {}: error occurred while sending {} token: {}",
                    request.request_id,
                    op.token_noun(),
                    public_message(&e)
                );
                reject(op, stage, e, Framing::Fixed(text))
            })?;

        tracing::info!(
            operation = %op,
            request_id = %request.request_id,
            owner_id_type = %request.owner_id_type,
            secret_name = %request.secret_name,
            "token delivered"
        );
        Ok(Confirmation {
            operation: op,
            stage: AuthorizationStage::TokenDelivered,
            message: format!(
                "Req. {}: {} token for share of [{}] sent to [{}]",
                request.request_id,
                op.token_noun(),
                request.secret_name,
                recipient
            ),
        })
    }

    /// Redeem a token and perform the operation it authorizes.
    pub async fn perform(
        &self,
        op: Operation,
        request: ShareRequest,
    ) -> Result<OperationOutcome, Rejection> {
        match op {
            Operation::Store => self.store_share(request).await.map(OperationOutcome::Stored),
            Operation::Retrieve => self
                .retrieve_share(request)
                .await
                .map(OperationOutcome::Retrieved),
            Operation::Delete => self.delete_share(request).await.map(OperationOutcome::Deleted),
        }
    }

    /// Store a share using a storage token.
    ///
    /// A concurrent store that wins the race surfaces as
    /// `share already exists`; it is never retried.
    pub async fn store_share(&self, mut request: ShareRequest) -> Result<Confirmation, Rejection> {
        let op = Operation::Store;
        let stage = AuthorizationStage::TokenDelivered;
        require_token(op, &request)?;
        let value = match request.share_value.take() {
            Some(value) if !value.is_empty() => value,
            _ => {
                return Err(reject(op, stage, SvalbardError::MissingShareValue, Framing::Plain));
            }
        };

        let share_id = self.redeem(op, &request).await?;
        self.effects
            .store(&share_id, value)
            .await
            .map_err(|e| reject(op, AuthorizationStage::Redeemed, e.into(), Framing::Plain))?;

        tracing::info!(
            owner_id_type = %request.owner_id_type,
            secret_name = %request.secret_name,
            "stored share"
        );
        Ok(Confirmation {
            operation: op,
            stage: AuthorizationStage::Redeemed,
            message: format!(
                "Stored a share of secret [{}] for owner [{}:{}]",
                request.secret_name, request.owner_id_type, request.owner_id
            ),
        })
    }

    /// Retrieve a share using a retrieval token.
    pub async fn retrieve_share(&self, request: ShareRequest) -> Result<ShareValue, Rejection> {
        let op = Operation::Retrieve;
        require_token(op, &request)?;

        let share_id = self.redeem(op, &request).await?;
        let value = self.effects.retrieve(&share_id).await.map_err(|e| {
            reject(op, AuthorizationStage::Redeemed, e.into(), Framing::Redemption)
        })?;

        tracing::info!(
            owner_id_type = %request.owner_id_type,
            secret_name = %request.secret_name,
            "retrieved share"
        );
        Ok(value)
    }

    /// Delete a share using a deletion token.
    pub async fn delete_share(&self, request: ShareRequest) -> Result<Confirmation, Rejection> {
        let op = Operation::Delete;
        require_token(op, &request)?;

        let share_id = self.redeem(op, &request).await?;
        self.effects.delete(&share_id).await.map_err(|e| {
            reject(op, AuthorizationStage::Redeemed, e.into(), Framing::Redemption)
        })?;

        tracing::info!(
            owner_id_type = %request.owner_id_type,
            secret_name = %request.secret_name,
            "deleted share"
        );
        Ok(Confirmation {
            operation: op,
            stage: AuthorizationStage::Redeemed,
            message: format!(
                "Deleted a share of secret [{}] of owner [{}:{}]",
                request.secret_name, request.owner_id_type, request.owner_id
            ),
        })
    }

    fn derive(
        &self,
        owner_id_type: &str,
        owner_id: &str,
        secret_name: &str,
    ) -> Result<ShareId, SvalbardError> {
        Ok(self
            .effects
            .derive_share_id(owner_id_type, owner_id, secret_name)?)
    }

    /// Existence pre-check before issuing a token.
    async fn check_precondition(&self, op: Operation, share_id: &ShareId) -> Result<(), SvalbardError> {
        let exists = self.effects.exists(share_id).await?;
        match (op, exists) {
            (Operation::Store, true) => Err(SvalbardError::ShareAlreadyExists),
            (Operation::Retrieve | Operation::Delete, false) => Err(SvalbardError::ShareNotFound),
            _ => Ok(()),
        }
    }

    async fn deliver(
        &self,
        recipient: &Recipient,
        request_id: &RequestId,
        token: Token,
    ) -> Result<(), SvalbardError> {
        let message = TokenMessage::new(request_id.clone(), token);
        // Request ids are checked up front, so a failure here is the issued token's.
        message
            .encode()
            .map_err(|e| SvalbardError::internal(format!("issued token is not encodable: {e}")))?;
        self.effects.send(recipient, &message).await?;
        Ok(())
    }

    /// Derive the identifier and validate the presented token against it.
    async fn redeem(&self, op: Operation, request: &ShareRequest) -> Result<ShareId, Rejection> {
        let stage = AuthorizationStage::TokenDelivered;
        let share_id = self
            .derive(&request.owner_id_type, &request.owner_id, &request.secret_name)
            .map_err(|e| reject(op, stage, e, Framing::Plain))?;

        self.effects
            .check_valid_now(&request.token, &share_id, op)
            .await
            .map_err(|e| reject(op, stage, e.into(), Framing::Redemption))?;

        tracing::debug!(operation = %op, "token redeemed");
        Ok(share_id)
    }
}

fn require_token(op: Operation, request: &ShareRequest) -> Result<(), Rejection> {
    if request.token.is_empty() {
        return Err(reject(
            op,
            AuthorizationStage::TokenDelivered,
            SvalbardError::MissingToken,
            Framing::Plain,
        ));
    }
    Ok(())
}

/// Turn an error into a sanitized rejection, logging the full detail.
fn reject(
    op: Operation,
    stage: AuthorizationStage,
    err: SvalbardError,
    framing: Framing<'_>,
) -> Rejection {
    let class = err.class();
    if class == ResponseClass::Internal {
        tracing::error!(operation = %op, ?stage, error = %err, "custody request failed");
    } else {
        tracing::debug!(operation = %op, ?stage, error = %err, "custody request rejected");
    }

    let public = public_message(&err);
    let message = match framing {
        Framing::Plain => public.into_owned(),
        Framing::Request(request_id) => format!("Req. {request_id}: {public}."),
        Framing::Fixed(text) => text,
        Framing::Redemption => format!("could not {} the share: {public}", op.verb()),
    };

    Rejection {
        operation: op,
        stage,
        kind: err.kind(),
        class,
        message,
    }
}
