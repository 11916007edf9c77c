//! Error types for the tutor backend

use thiserror::Error;

/// Result type alias for tutor backend operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the tutor backend
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Input failed validation before reaching storage
    #[error("validation error: {0}")]
    Validation(String),

    /// Request is well-formed but cannot be applied
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Resource not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Resource already exists
    #[error("conflict: {0}")]
    Conflict(String),

    /// Language model call failed
    #[error("tutor error: {0}")]
    Tutor(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// `SQLite` error
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}
