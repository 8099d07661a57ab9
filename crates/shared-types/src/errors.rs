//! # Error Types
//!
//! Defines error types used across subsystems.

use thiserror::Error;

/// Errors raised while decoding identities or resolving chains.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// Chain code is not registered.
    #[error("Unknown chain code: {0}")]
    UnknownChainCode(u8),

    /// Chain name is not registered.
    #[error("Unknown chain name: {0}")]
    UnknownChainName(String),

    /// Chain code or name registered twice.
    #[error("Chain already registered: {0}")]
    DuplicateChain(String),

    /// The process-wide registry was already installed.
    #[error("Chain registry already installed")]
    RegistryFrozen,

    /// Text could not be decoded for the chain's encoding.
    #[error("Malformed {what}: {reason}")]
    Malformed {
        /// What was being decoded (address, pubkey, nebula id).
        what: &'static str,
        /// Decoder message.
        reason: String,
    },

    /// Decoded byte length does not fit the envelope.
    #[error("Invalid {what} length: got {got}, expected {expected}")]
    InvalidLength {
        /// What was being decoded.
        what: &'static str,
        /// Decoded length.
        got: usize,
        /// Expected length.
        expected: usize,
    },
}

/// Errors related to transaction encoding and authentication.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxError {
    /// Transaction bytes could not be decoded.
    #[error("Malformed transaction: {0}")]
    Malformed(String),

    /// Unknown transaction kind byte.
    #[error("Unknown transaction kind: {0}")]
    UnknownKind(u8),

    /// Id does not match the canonical body.
    #[error("Transaction id mismatch")]
    IdMismatch,

    /// Signature does not verify against the sender key.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Argument missing or of the wrong variant.
    #[error("Bad argument {index}: expected {expected}")]
    BadArgument {
        /// Argument position.
        index: usize,
        /// Expected variant.
        expected: &'static str,
    },
}

/// Errors raised by the feed value codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// Integer payload was not exactly eight bytes.
    #[error("Invalid int64 width: {0} bytes")]
    InvalidIntWidth(usize),

    /// String payload was not UTF-8.
    #[error("Invalid UTF-8 string value")]
    InvalidUtf8,

    /// Unknown value type name.
    #[error("Unknown value type: {0}")]
    UnknownType(String),
}
