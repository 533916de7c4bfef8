//! Hash-based share identifier derivation
//!
//! The identifier is the lowercase hex SHA-256 of a domain tag followed by
//! the length-prefixed (owner id type, owner id, secret name) triple. Owner
//! id types are matched case-insensitively and normalized to lowercase before
//! hashing, so `EMAIL` and `email` address the same share.

use sha2::{Digest, Sha256};
use svalbard_core::{ShareId, ShareIdEffects, ShareIdError};

/// Owner id types accepted when none are configured.
pub const DEFAULT_OWNER_ID_TYPES: &[&str] = &["email", "sms"];

const DOMAIN_TAG: &[u8] = b"svalbard/share-id/v1";

/// Derives share identifiers by hashing the owner/secret attributes.
#[derive(Debug, Clone)]
pub struct HashedShareIdHandler {
    supported_types: Vec<String>,
}

impl Default for HashedShareIdHandler {
    fn default() -> Self {
        Self::new(DEFAULT_OWNER_ID_TYPES.iter().copied())
    }
}

impl HashedShareIdHandler {
    /// Create a handler accepting the given owner id types.
    pub fn new<I, S>(supported_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            supported_types: supported_types
                .into_iter()
                .map(|t| t.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Owner id types this handler accepts, lowercased.
    pub fn supported_types(&self) -> &[String] {
        &self.supported_types
    }
}

fn absorb(hasher: &mut Sha256, field: &str) {
    hasher.update((field.len() as u64).to_be_bytes());
    hasher.update(field.as_bytes());
}

impl ShareIdEffects for HashedShareIdHandler {
    fn derive_share_id(
        &self,
        owner_id_type: &str,
        owner_id: &str,
        secret_name: &str,
    ) -> Result<ShareId, ShareIdError> {
        if owner_id_type.is_empty() {
            return Err(ShareIdError::MissingOwnerType);
        }
        if owner_id.is_empty() {
            return Err(ShareIdError::MissingOwnerId);
        }
        if secret_name.is_empty() {
            return Err(ShareIdError::MissingSecretName);
        }

        let normalized_type = owner_id_type.to_ascii_lowercase();
        if !self.supported_types.contains(&normalized_type) {
            return Err(ShareIdError::UnsupportedOwnerIdType);
        }

        let mut hasher = Sha256::new();
        hasher.update(DOMAIN_TAG);
        absorb(&mut hasher, &normalized_type);
        absorb(&mut hasher, owner_id);
        absorb(&mut hasher, secret_name);
        Ok(ShareId::new(hex::encode(hasher.finalize())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_deterministic_and_colon_free() {
        let handler = HashedShareIdHandler::default();
        let a = handler
            .derive_share_id("email", "a@example.com", "s1")
            .unwrap();
        let b = handler
            .derive_share_id("EMAIL", "a@example.com", "s1")
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
        assert!(!a.as_str().contains(':'));
    }

    #[test]
    fn distinct_inputs_give_distinct_ids() {
        let handler = HashedShareIdHandler::default();
        let base = handler.derive_share_id("email", "ab", "c").unwrap();
        let shifted = handler.derive_share_id("email", "a", "bc").unwrap();
        let other_secret = handler.derive_share_id("email", "ab", "d").unwrap();
        let other_type = handler.derive_share_id("sms", "ab", "c").unwrap();
        assert_ne!(base, shifted);
        assert_ne!(base, other_secret);
        assert_ne!(base, other_type);
    }

    #[test]
    fn validation_order() {
        let handler = HashedShareIdHandler::default();
        assert_eq!(
            handler.derive_share_id("", "", ""),
            Err(ShareIdError::MissingOwnerType)
        );
        assert_eq!(
            handler.derive_share_id("email", "", ""),
            Err(ShareIdError::MissingOwnerId)
        );
        assert_eq!(
            handler.derive_share_id("email", "a@example.com", ""),
            Err(ShareIdError::MissingSecretName)
        );
        assert_eq!(
            handler.derive_share_id("carrier-pigeon", "a", "s"),
            Err(ShareIdError::UnsupportedOwnerIdType)
        );
    }

    #[test]
    fn configured_types_replace_defaults() {
        let handler = HashedShareIdHandler::new(["Push"]);
        assert_eq!(handler.supported_types(), ["push".to_string()]);
        assert!(handler.derive_share_id("push", "device-1", "s").is_ok());
        assert_eq!(
            handler.derive_share_id("email", "a@example.com", "s"),
            Err(ShareIdError::UnsupportedOwnerIdType)
        );
    }
}
