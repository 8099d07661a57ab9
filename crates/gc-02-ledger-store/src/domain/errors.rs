//! # Domain Errors
//!
//! Error types for the ledger store.

use shared_types::IdentityError;
use thiserror::Error;

/// Ledger store error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// I/O error during read/write.
    #[error("KV store I/O error: {message}")]
    Io {
        /// Backend message.
        message: String,
    },

    /// Stored bytes are not what the schema says they should be.
    #[error("KV store corruption: {message}")]
    Corruption {
        /// What was wrong.
        message: String,
    },

    /// Record does not exist.
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Write-once record was already written.
    #[error("Record already exists: {0}")]
    AlreadyExists(String),

    /// Identity could not be rendered into a key.
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),
}

impl StoreError {
    /// True for missing records. Never a failure, just "not yet".
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    /// True when a write-once guard refused the write.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, StoreError::AlreadyExists(_))
    }

    pub(crate) fn codec(key: &str, err: impl std::fmt::Display) -> Self {
        StoreError::Corruption {
            message: format!("{}: {}", key, err),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(StoreError::NotFound("consuls".into()).is_not_found());
        assert!(StoreError::AlreadyExists("commit_x".into()).is_already_exists());
        assert!(!StoreError::Io {
            message: "disk".into()
        }
        .is_not_found());
    }
}
