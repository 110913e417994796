//! Error types for Tienda

use thiserror::Error;

/// Result type alias using Tienda Error
pub type Result<T> = std::result::Result<T, Error>;

/// Tienda error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{kind} not found")]
    NotFound { kind: &'static str },

    #[error("{kind} already exists")]
    AlreadyExists { kind: &'static str },

    #[error("{0}")]
    InvalidInput(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Field-level validation failure
    pub fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }
}
