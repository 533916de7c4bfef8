//! Filesystem share store
//!
//! One file per share under a base directory. Identifiers must be
//! filename-safe (ASCII alphanumerics, `-`, `_`); anything else is rejected
//! with [`ShareStoreError::InvalidShareId`] before touching the disk.
//!
//! A share becomes visible under its final name only after its content is
//! complete and synced, so readers never observe a partial value.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use svalbard_core::{ShareId, ShareStoreEffects, ShareStoreError, ShareValue};
use tokio::fs;
use tokio::io::AsyncWriteExt;

const SHARE_EXTENSION: &str = "share";

/// Filesystem-backed share store.
#[derive(Debug, Clone)]
pub struct FilesystemShareStore {
    base_path: PathBuf,
}

impl FilesystemShareStore {
    /// Create a store rooted at `base_path`. The directory is created lazily.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Directory holding the share files.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn share_path(&self, id: &ShareId) -> Result<PathBuf, ShareStoreError> {
        let raw = id.as_str();
        let safe = !raw.is_empty()
            && raw
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        if !safe {
            return Err(ShareStoreError::InvalidShareId);
        }
        Ok(self
            .base_path
            .join(format!("{raw}.{SHARE_EXTENSION}")))
    }
}

fn backend(action: &str, err: std::io::Error) -> ShareStoreError {
    // io errors can carry paths; they stay server-side via the Backend variant.
    ShareStoreError::backend(format!("failed to {action} share file: {err}"))
}

#[async_trait]
impl ShareStoreEffects for FilesystemShareStore {
    async fn store(&self, id: &ShareId, value: ShareValue) -> Result<(), ShareStoreError> {
        let path = self.share_path(id)?;
        if value.is_empty() {
            return Err(ShareStoreError::InvalidShareValue);
        }

        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| backend("create directory for", e))?;

        // Staged under a dot-prefixed name no identifier can take, then
        // published only once fully written and synced.
        let (file, staged_path) = tempfile::Builder::new()
            .prefix(".staged-")
            .tempfile_in(&self.base_path)
            .map_err(|e| backend("stage", e))?
            .into_parts();
        let mut file = fs::File::from_std(file);
        file.write_all(value.expose().as_bytes())
            .await
            .map_err(|e| backend("write", e))?;
        file.sync_all().await.map_err(|e| backend("sync", e))?;
        drop(file);

        // Linking fails if the target exists, so the existence check and the
        // publish are one step.
        let published = fs::hard_link(&staged_path, &path).await;
        if let Err(e) = staged_path.close() {
            tracing::warn!(error = %e, "failed to remove staged share file");
        }
        match published {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(ShareStoreError::AlreadyExists),
            Err(e) => Err(backend("publish", e)),
        }
    }

    async fn retrieve(&self, id: &ShareId) -> Result<ShareValue, ShareStoreError> {
        let path = self.share_path(id)?;
        match fs::read_to_string(&path).await {
            Ok(content) if content.is_empty() => {
                Err(ShareStoreError::backend("share file is empty"))
            }
            Ok(content) => Ok(ShareValue::new(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(ShareStoreError::NotFound),
            Err(e) => Err(backend("read", e)),
        }
    }

    async fn delete(&self, id: &ShareId) -> Result<(), ShareStoreError> {
        let path = self.share_path(id)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(ShareStoreError::NotFound),
            Err(e) => Err(backend("remove", e)),
        }
    }

    async fn exists(&self, id: &ShareId) -> Result<bool, ShareStoreError> {
        let path = self.share_path(id)?;
        match fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(backend("stat", e)),
        }
    }
}
