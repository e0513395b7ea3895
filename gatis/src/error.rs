//! Error types for GATIS client operations.

use thiserror::Error;

use crate::storage::StorageError;

/// Result type for GATIS client operations.
pub type Result<T> = std::result::Result<T, GatisError>;

/// Errors surfaced to the page that triggered an operation.
///
/// The three request variants carry the message meant for the user as-is,
/// so `to_string()` on them is what the page shows.
#[derive(Error, Debug)]
pub enum GatisError {
    #[error("{0}")]
    AuthError(String),

    #[error("{0}")]
    SignupError(String),

    #[error("{0}")]
    GenerationError(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

impl GatisError {
    /// The message carried by the error, without any prefix.
    pub fn message(&self) -> String {
        match self {
            GatisError::AuthError(m)
            | GatisError::SignupError(m)
            | GatisError::GenerationError(m)
            | GatisError::ConfigError(m) => m.clone(),
            GatisError::StorageError(e) => e.to_string(),
        }
    }
}
