//! # Adapters Layer
//!
//! Concrete chain adaptors and the per-validator adaptor set.

pub mod set;
pub mod simulated;

pub use set::AdaptorSet;
pub use simulated::{
    oracle_key, sign_digest, verify_digest, NebulaContract, SimulatedAdaptor, SimulatedChain,
    SECP_SIGNATURE_LEN,
};
