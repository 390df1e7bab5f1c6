//! Error types for the storage layer.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database connection error.
    #[error("database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    /// Clio quote not found.
    #[error("Clio quote not found: {0}")]
    ClioQuoteNotFound(Uuid),

    /// Quote not found.
    #[error("quote not found: {0}")]
    QuoteNotFound(Uuid),

    /// A stored value could not be mapped onto a domain type.
    #[error("invalid stored data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    MigrationError(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl From<openeval_core::ParseEnumError> for StoreError {
    fn from(e: openeval_core::ParseEnumError) -> Self {
        Self::InvalidData(e.to_string())
    }
}
