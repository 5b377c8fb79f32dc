//! Error types for Keyforge.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Catalog errors
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    // License errors
    #[error("License not found: {0}")]
    LicenseNotFound(String),

    // Issuance errors
    #[error("Duplicate license key: {0}")]
    DuplicateKey(String),

    #[error("Keyspace exhausted after {attempts} attempts")]
    KeyspaceExhausted { attempts: u32 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Infrastructure errors
    #[error("Database error: {0}")]
    Database(String),

    #[error("{operation} timed out after {millis}ms")]
    Timeout { operation: &'static str, millis: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error came from the persistence layer rather than from
    /// a business rule.
    pub fn is_persistence_failure(&self) -> bool {
        matches!(
            self,
            Error::Database(_) | Error::Timeout { .. } | Error::Io(_) | Error::Serialization(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
