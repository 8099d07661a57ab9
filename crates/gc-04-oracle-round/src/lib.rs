//! # GC-04 Oracle Round
//!
//! The commit-reveal-result protocol that turns independently extracted
//! values into one signed pulse per feed and external height.
//!
//! **Subsystem ID:** 04
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Protocol
//!
//! | Sub-round | Action | Guard |
//! |-----------|--------|-------|
//! | Commit | extract value, send `sha256(value)` | no commit from this oracle |
//! | Reveal | send the raw value behind the commit | commit on ledger, no reveal yet |
//! | Result | aggregate reveals, sign the hash with the chain key | no result from this oracle |
//! | Finalize | submitter publishes once `bft_value` signatures exist | `height % active == self` |
//!
//! The phase comes from the ledger height alone ([`SubRound::at`]), so
//! every oracle agrees on it without coordination.
//!
//! ## Module Structure
//!
//! ```text
//! gc-04-oracle-round/
//! ├── domain/     # SubRound, aggregation, RoundArena, OracleConfig, errors
//! ├── ports/      # LedgerClient, DataExtractor
//! ├── adapters/   # HttpExtractor, FixedExtractor
//! ├── metrics.rs  # Prometheus counters (feature "metrics")
//! └── service.rs  # OracleNode tick/run loop
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;

pub use adapters::{FixedExtractor, HttpExtractor};
pub use domain::{
    aggregate, pulse_round, result_hash, FeedKey, OracleConfig, OracleError, OracleResult,
    RoundArena, RoundState, SubRound,
};
pub use ports::{DataExtractor, LedgerClient};
pub use service::{Feed, OracleNode};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
