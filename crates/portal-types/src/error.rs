//! Error types for PORTAL.

use std::io;

/// Errors produced by the PORTAL shell.
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    /// No usable network, or a probe could not reach the probe host.
    #[error("connectivity error: {0}")]
    Connectivity(String),

    /// The browsing surface failed to load content.
    #[error("content load error: {0}")]
    ContentLoad(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("download error: {0}")]
    Download(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("platform error: {0}")]
    Platform(String),

    /// A callback or receiver was unregistered without being registered.
    #[error("not registered: {0}")]
    NotRegistered(&'static str),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PortalError {
    /// Whether this error only says that a teardown already happened.
    pub fn is_not_registered(&self) -> bool {
        matches!(self, Self::NotRegistered(_))
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, PortalError>;
