//! # Ports Layer
//!
//! Outbound dependencies of the oracle node.

pub mod outbound;

pub use outbound::{DataExtractor, LedgerClient};
