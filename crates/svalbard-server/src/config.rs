//! Server configuration
//!
//! Loaded from TOML; every field has a default, so an empty file (or no
//! file) yields a working development setup: in-memory shares, console
//! delivery, loopback bind.
//!
//! ```toml
//! bind_address = "0.0.0.0:8080"
//! request_timeout_secs = 10
//! owner_id_types = ["email", "sms"]
//!
//! [tokens]
//! ttl_secs = 300
//!
//! [share_store]
//! backend = "filesystem"
//! path = "/var/lib/svalbard/shares"
//! ```

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use svalbard_core::{SecondaryChannelEffects, ShareStoreEffects};
use svalbard_effects::{
    ConsoleChannel, CustodyHandlers, FilesystemShareStore, HashedShareIdHandler,
    MemoryShareStore, MemoryTokenStore, TokenStoreConfig, DEFAULT_OWNER_ID_TYPES,
};

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// File that was read
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
    /// The file is not valid TOML for [`ServerConfig`]
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    /// A value is out of range
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Share store backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum ShareStoreConfig {
    /// Volatile in-process map
    Memory,
    /// One file per share under `path`
    Filesystem {
        /// Base directory
        path: PathBuf,
    },
}

/// Secondary channel backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum ChannelConfig {
    /// Print token messages to stdout
    Console,
}

/// Top-level server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to
    pub bind_address: String,
    /// Per-request deadline, in seconds
    pub request_timeout_secs: u64,
    /// Accepted owner id types
    pub owner_id_types: Vec<String>,
    /// Token store tuning
    pub tokens: TokenStoreConfig,
    /// Where shares live
    pub share_store: ShareStoreConfig,
    /// How tokens reach owners
    pub channel: ChannelConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            request_timeout_secs: 30,
            owner_id_types: DEFAULT_OWNER_ID_TYPES.iter().map(|t| t.to_string()).collect(),
            tokens: TokenStoreConfig::default(),
            share_store: ShareStoreConfig::Memory,
            channel: ChannelConfig::Console,
        }
    }
}

impl ServerConfig {
    /// Load and validate a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::invalid("request_timeout_secs", "must be positive"));
        }
        if self.owner_id_types.is_empty() {
            return Err(ConfigError::invalid("owner_id_types", "at least one type is required"));
        }
        if let Some(bad) = self.owner_id_types.iter().find(|t| t.is_empty() || t.contains(':')) {
            return Err(ConfigError::invalid(
                "owner_id_types",
                format!("{bad:?} is not a valid owner id type"),
            ));
        }
        if self.tokens.ttl_secs == 0 {
            return Err(ConfigError::invalid("tokens.ttl_secs", "must be positive"));
        }
        if self.tokens.token_bytes < 8 {
            return Err(ConfigError::invalid("tokens.token_bytes", "must be at least 8"));
        }
        if self.tokens.max_outstanding == 0 {
            return Err(ConfigError::invalid("tokens.max_outstanding", "must be positive"));
        }
        if let ShareStoreConfig::Filesystem { path } = &self.share_store {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::invalid("share_store.path", "must not be empty"));
            }
        }
        Ok(())
    }

    /// Parsed bind address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_address
            .parse()
            .map_err(|e| ConfigError::invalid("bind_address", format!("{e}")))
    }

    /// Instantiate the configured handlers.
    pub fn build_handlers(&self) -> CustodyHandlers {
        let share_store: Arc<dyn ShareStoreEffects> = match &self.share_store {
            ShareStoreConfig::Memory => Arc::new(MemoryShareStore::new()),
            ShareStoreConfig::Filesystem { path } => Arc::new(FilesystemShareStore::new(path)),
        };
        let channel: Arc<dyn SecondaryChannelEffects> = match self.channel {
            ChannelConfig::Console => {
                Arc::new(ConsoleChannel::restricted_to(&self.owner_id_types))
            }
        };

        CustodyHandlers::new(
            share_store,
            Arc::new(MemoryTokenStore::new(self.tokens.clone())),
            channel,
            Arc::new(HashedShareIdHandler::new(&self.owner_id_types)),
        )
    }
}
