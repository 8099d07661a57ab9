//! # Ports Layer
//!
//! Hexagonal boundary towards target chains.

pub mod outbound;

pub use outbound::{ChainAdaptor, ChainTxId};
