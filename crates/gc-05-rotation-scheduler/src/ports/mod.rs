//! # Ports Layer
//!
//! Outbound dependencies of the sync agent.

pub mod outbound;

pub use outbound::SyncLedger;
