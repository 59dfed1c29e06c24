//! Error types for store access

use thiserror::Error;

/// Result type alias using the store Error
pub type Result<T> = std::result::Result<T, Error>;

/// Failures raised while reading ground truth from the Stylish store
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Record not found: {kind} with key {key}")]
    NotFound { kind: String, key: String },
}

impl Error {
    pub fn not_found(kind: &str, key: impl ToString) -> Self {
        Error::NotFound {
            kind: kind.to_string(),
            key: key.to_string(),
        }
    }

    /// True when a "get exactly one" lookup matched zero rows
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}
