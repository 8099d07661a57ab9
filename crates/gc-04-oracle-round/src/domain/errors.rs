//! # Domain Errors
//!
//! Every variant is scoped to one (feed, pulse height) unit. The node
//! logs it and retries the unit on its next tick.

use gc_01_chain_adaptor::AdaptorError;
use shared_types::{TxError, ValueError};
use thiserror::Error;

/// Oracle round errors.
#[derive(Debug, Error)]
pub enum OracleError {
    /// Target-chain call failed.
    #[error("Adaptor error: {0}")]
    Adaptor(#[from] AdaptorError),

    /// Coordinating ledger could not be read or did not accept a transaction.
    #[error("Ledger error: {0}")]
    Ledger(String),

    /// Data extraction failed.
    #[error("Extractor error: {0}")]
    Extractor(String),

    /// Extracted value has a different type than the feed declares.
    #[error("Value type mismatch: feed declares {expected}, got {got}")]
    TypeMismatch {
        /// Feed's declared type.
        expected: String,
        /// Extracted type.
        got: String,
    },

    /// No decodable reveal for the pulse.
    #[error("No reveals for pulse {0}")]
    NoReveals(u64),

    /// Transaction could not be built.
    #[error("Transaction error: {0}")]
    Tx(#[from] TxError),

    /// Value codec failure.
    #[error("Value error: {0}")]
    Value(#[from] ValueError),

    /// Invalid node configuration.
    #[error("Invalid config: {0}")]
    Config(String),
}

impl OracleError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            OracleError::Adaptor(_) => "adaptor",
            OracleError::Ledger(_) => "ledger",
            OracleError::Extractor(_) => "extractor",
            OracleError::TypeMismatch { .. } => "type_mismatch",
            OracleError::NoReveals(_) => "no_reveals",
            OracleError::Tx(_) => "tx",
            OracleError::Value(_) => "value",
            OracleError::Config(_) => "config",
        }
    }
}

/// Result alias for oracle operations.
pub type OracleResult<T> = Result<T, OracleError>;
