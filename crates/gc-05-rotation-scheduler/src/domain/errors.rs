//! # Domain Errors
//!
//! Error types for the rotation scheduler.

use gc_01_chain_adaptor::AdaptorError;
use gc_02_ledger_store::StoreError;
use gc_03_trust_score::TrustError;
use shared_types::TxError;
use thiserror::Error;

/// Scheduler error types.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Ledger state could not be read or staged.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Trust recomputation rejected its configuration.
    #[error("Trust error: {0}")]
    Trust(#[from] TrustError),

    /// Target-chain call failed.
    #[error("Adaptor error: {0}")]
    Adaptor(#[from] AdaptorError),

    /// Ledger client failure.
    #[error("Ledger error: {0}")]
    Ledger(String),

    /// Transaction could not be built.
    #[error("Transaction error: {0}")]
    Tx(#[from] TxError),

    /// Invalid scheduler configuration.
    #[error("Invalid config: {0}")]
    Config(String),
}

impl SchedulerError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            SchedulerError::Store(_) => "store",
            SchedulerError::Trust(_) => "trust",
            SchedulerError::Adaptor(_) => "adaptor",
            SchedulerError::Ledger(_) => "ledger",
            SchedulerError::Tx(_) => "tx",
            SchedulerError::Config(_) => "config",
        }
    }
}

/// Result alias for scheduler operations.
pub type SchedulerResult<T> = Result<T, SchedulerError>;
