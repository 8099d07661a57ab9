//! # Domain Errors
//!
//! Error types for target-chain interaction.

use shared_types::{ChainType, IdentityError};
use thiserror::Error;

/// Chain adaptor error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdaptorError {
    /// Node RPC failed or is unreachable.
    #[error("RPC error on {chain}: {reason}")]
    Rpc {
        /// Chain the call was made against.
        chain: ChainType,
        /// Transport message.
        reason: String,
    },

    /// Bounded wait ran out.
    #[error("Timed out after {attempts} attempts waiting for {what}")]
    Timeout {
        /// What was being waited for.
        what: String,
        /// Attempts made.
        attempts: u32,
    },

    /// The target contract refused the call.
    #[error("Rejected by {chain} contract: {reason}")]
    Rejected {
        /// Chain that rejected.
        chain: ChainType,
        /// Contract-side reason.
        reason: String,
    },

    /// Feed contract is not deployed on the chain.
    #[error("Unknown nebula on {chain}: {nebula}")]
    UnknownNebula {
        /// Chain searched.
        chain: ChainType,
        /// Hex of the nebula id.
        nebula: String,
    },

    /// No adaptor configured for the chain.
    #[error("No adaptor for chain {0}")]
    UnsupportedChain(ChainType),

    /// Adaptor registered twice for one chain.
    #[error("Adaptor already registered for chain {0}")]
    DuplicateAdaptor(ChainType),

    /// Local signing failed.
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Bad key, address or id encoding.
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),
}

impl AdaptorError {
    /// True for failures worth retrying on the next tick.
    pub fn is_transient(&self) -> bool {
        matches!(self, AdaptorError::Rpc { .. } | AdaptorError::Timeout { .. })
    }
}

/// Result alias for adaptor operations.
pub type AdaptorResult<T> = Result<T, AdaptorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let rpc = AdaptorError::Rpc {
            chain: ChainType::ETHEREUM,
            reason: "connection reset".into(),
        };
        assert!(rpc.is_transient());
        assert!(AdaptorError::Timeout {
            what: "tx".into(),
            attempts: 3
        }
        .is_transient());
        assert!(!AdaptorError::UnsupportedChain(ChainType::ERGO).is_transient());
    }

    #[test]
    fn test_error_display_names_chain() {
        let err = AdaptorError::Rejected {
            chain: ChainType::WAVES,
            reason: "round exists".into(),
        };
        assert_eq!(err.to_string(), "Rejected by waves contract: round exists");
    }
}
