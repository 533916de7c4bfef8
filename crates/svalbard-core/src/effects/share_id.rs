//! Share identifier derivation effect trait

use crate::types::ShareId;
use std::sync::Arc;

/// Identifier derivation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ShareIdError {
    /// Owner id type is empty
    #[error("missing owner id type")]
    MissingOwnerType,
    /// Owner id is empty
    #[error("missing owner id")]
    MissingOwnerId,
    /// Secret name is empty
    #[error("missing secret name")]
    MissingSecretName,
    /// Owner id type is not supported
    #[error("unsupported owner id type")]
    UnsupportedOwnerIdType,
}

/// Deterministic mapping of (owner id type, owner id, secret name) to a
/// [`ShareId`].
///
/// Identical inputs must always yield the identical identifier, and the
/// identifier must not contain `:`.
pub trait ShareIdEffects: Send + Sync {
    /// Derive the identifier of a share.
    fn derive_share_id(
        &self,
        owner_id_type: &str,
        owner_id: &str,
        secret_name: &str,
    ) -> Result<ShareId, ShareIdError>;
}

impl<T: ShareIdEffects + ?Sized> ShareIdEffects for Arc<T> {
    fn derive_share_id(
        &self,
        owner_id_type: &str,
        owner_id: &str,
        secret_name: &str,
    ) -> Result<ShareId, ShareIdError> {
        (**self).derive_share_id(owner_id_type, owner_id, secret_name)
    }
}
