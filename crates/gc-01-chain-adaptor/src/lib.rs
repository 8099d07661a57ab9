//! # GC-01 Chain Adaptor
//!
//! The boundary between the coordination core and target blockchains.
//!
//! **Subsystem ID:** 01  
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Every target chain (Ethereum, Waves, Binance, Solana, Ergo) is reached
//! through one [`ChainAdaptor`]: read heights and contract state, sign with
//! the validator's chain key, publish pulses and rotated sets.
//!
//! ## Guarantees
//!
//! | Concern | Handling |
//! |---------|----------|
//! | Missing signers | Zero-filled seats in [`SignatureBatch`] |
//! | Slow chains | [`RetryPolicy`] bounds every confirmation wait |
//! | Chain selection | [`AdaptorSet`] built from configuration |
//!
//! ## Module Structure
//!
//! ```text
//! gc-01-chain-adaptor/
//! ├── domain/     # SignatureBatch, signed messages, RetryPolicy, errors
//! ├── ports/      # ChainAdaptor
//! └── adapters/   # AdaptorSet, SimulatedChain
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::{
    oracle_key, sign_digest, verify_digest, AdaptorSet, NebulaContract, SimulatedAdaptor,
    SimulatedChain, SECP_SIGNATURE_LEN,
};
pub use domain::{
    bft_threshold, consuls_message, oracles_message, AdaptorError, AdaptorResult, RetryPolicy,
    SignatureBatch,
};
pub use ports::{ChainAdaptor, ChainTxId};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
