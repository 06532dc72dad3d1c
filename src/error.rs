//! Error types for Rapport
//!
//! Structured error definitions use thiserror; the binary propagates them
//! through anyhow. The HTTP mapping lives in `api::error`.

use crate::config::ConfigError;
use crate::types::{FriendId, InteractionId};
use thiserror::Error;

/// Main error type for Rapport operations
#[derive(Error, Debug)]
pub enum RapportError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Schema migration failed
    #[error("Migration error: {0}")]
    Migration(String),

    /// Friend not found
    #[error("Friend not found: {0}")]
    FriendNotFound(FriendId),

    /// Interaction not found
    #[error("Interaction not found: {0}")]
    InteractionNotFound(InteractionId),

    /// Request rejected before reaching storage
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl RapportError {
    /// True for the not-found variants
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RapportError::FriendNotFound(_) | RapportError::InteractionNotFound(_)
        )
    }
}

/// Result type alias for Rapport operations
pub type Result<T> = std::result::Result<T, RapportError>;

impl From<libsql::Error> for RapportError {
    fn from(err: libsql::Error) -> Self {
        RapportError::Database(err.to_string())
    }
}

/// Convert anyhow::Error to RapportError
impl From<anyhow::Error> for RapportError {
    fn from(err: anyhow::Error) -> Self {
        RapportError::Other(err.to_string())
    }
}
