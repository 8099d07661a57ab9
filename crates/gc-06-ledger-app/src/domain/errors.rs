//! # Domain Errors
//!
//! Error types for the ledger application.
//!
//! Everything except [`AppError::Genesis`], [`AppError::EndBlock`] and
//! [`AppError::Commit`] rejects a single transaction or query. Those
//! three are fatal: continuing would let this validator's state diverge.

use gc_02_ledger_store::StoreError;
use gc_05_rotation_scheduler::SchedulerError;
use shared_types::{IdentityError, TxError};
use thiserror::Error;

/// Ledger application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Transaction bytes or arguments are malformed.
    #[error("Malformed transaction: {0}")]
    Tx(#[from] TxError),

    /// Bad chain, key or id encoding.
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Sender may not submit this transaction.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Transaction is well formed but violates a ledger rule.
    #[error("Rejected: {0}")]
    Rejected(String),

    /// Write-once record already present.
    #[error("Duplicate record: {0}")]
    Duplicate(String),

    /// Store read or staging failed.
    #[error("Store error: {0}")]
    Store(StoreError),

    /// Unknown query path or bad query arguments.
    #[error("Query error: {0}")]
    Query(String),

    /// Genesis document is unusable.
    #[error("Genesis error: {0}")]
    Genesis(String),

    /// Rotation step failed inside `EndBlock`.
    #[error("EndBlock failed: {0}")]
    EndBlock(#[from] SchedulerError),

    /// Pending state could not be persisted.
    #[error("Commit failed: {0}")]
    Commit(StoreError),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        if err.is_already_exists() {
            AppError::Duplicate(err.to_string())
        } else {
            AppError::Store(err)
        }
    }
}

impl AppError {
    /// True when the process must stop rather than carry on.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AppError::Genesis(_) | AppError::EndBlock(_) | AppError::Commit(_)
        )
    }

    /// Result code reported for a rejected transaction. Zero is success.
    pub fn code(&self) -> u32 {
        match self {
            AppError::Tx(TxError::InvalidSignature | TxError::IdMismatch) => 2,
            AppError::Tx(_) | AppError::Identity(_) => 1,
            AppError::Unauthorized(_) => 3,
            AppError::Rejected(_) => 4,
            AppError::Duplicate(_) => 5,
            AppError::Query(_) => 6,
            AppError::Store(_) => 7,
            AppError::Genesis(_) | AppError::EndBlock(_) | AppError::Commit(_) => 8,
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Tx(_) => "malformed",
            AppError::Identity(_) => "identity",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Rejected(_) => "rejected",
            AppError::Duplicate(_) => "duplicate",
            AppError::Store(_) => "store",
            AppError::Query(_) => "query",
            AppError::Genesis(_) => "genesis",
            AppError::EndBlock(_) => "end_block",
            AppError::Commit(_) => "commit",
        }
    }
}

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;
