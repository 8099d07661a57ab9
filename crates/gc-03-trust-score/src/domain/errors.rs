//! # Domain Errors

use thiserror::Error;

/// Trust engine error types.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrustError {
    /// Blend factor outside `[0, 1]`.
    #[error("alpha must be within [0, 1], got {0}")]
    InvalidAlpha(f64),

    /// Convergence threshold not positive.
    #[error("epsilon must be positive, got {0}")]
    InvalidEpsilon(f64),

    /// Zero iteration budget.
    #[error("max_iterations must be at least 1")]
    NoIterations,

    /// Zero fixed-point scale.
    #[error("max_score must be at least 1")]
    ZeroScale,
}

/// Result alias for trust engine operations.
pub type TrustResult<T> = Result<T, TrustError>;
