//! Error types.
//!
//! Only `ConfigError` ever reaches JavaScript. `StorageError` stops at the
//! collection store and `JarError` is turned into a re-render (or the reset
//! rejection notice) by the route handlers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("invalid catalog: {0}")]
    Catalog(String),

    #[error("storage unavailable: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Error)]
pub enum StorageError {
    /// No `window` / `localStorage` in this context (e.g. private mode).
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The backend refused a write (quota exceeded, security error).
    #[error("write rejected for {key}: {reason}")]
    WriteRejected { key: String, reason: String },

    #[error("read failed for {key}: {reason}")]
    ReadFailed { key: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Declined jar transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JarError {
    #[error("jar already spawned")]
    AlreadySpawned,

    #[error("no stars left to wish on")]
    NothingToWish,

    /// The picked star's image filename matches no catalog entry.
    #[error("no catalog entry for image {0}")]
    UnmatchedImage(String),

    #[error("reset secret rejected")]
    ResetDenied,
}
