//! Error types for haven-core

use thiserror::Error;

/// Result type alias using haven-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in haven-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// `SQLite` error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record or contact not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Storage slot write rejected because it would exceed the quota
    #[error("Storage quota exceeded: {needed} bytes requested, {quota} bytes allowed")]
    QuotaExceeded { needed: usize, quota: usize },

    /// A notification target could not be reached
    #[error("Delivery failed: {0}")]
    Delivery(String),

    /// A delivery attempt did not finish in time
    #[error("Delivery timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Location could not be determined
    #[error("Geolocation error: {0}")]
    Geolocation(String),
}
