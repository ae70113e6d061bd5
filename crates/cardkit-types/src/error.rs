//! Error types for cardkit.

use std::io;

/// Errors produced by the cardkit framework.
#[derive(Debug, thiserror::Error)]
pub enum CardkitError {
    #[error("VFS error: {0}")]
    Vfs(String),

    #[error("manifest error: {0}")]
    Manifest(String),

    #[error("failed to load {path}: {reason}")]
    Load { path: String, reason: String },

    #[error("lifecycle error: {0}")]
    Lifecycle(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CardkitError {
    /// Shorthand for a [`CardkitError::Load`] error.
    pub fn load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Load {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, CardkitError>;
