//! # Node Runtime Library
//!
//! Configuration, the in-process ledger and the devnet wiring behind the
//! `gravity-node` binary. Exposed as a library for tests.
//!
//! ## Modules
//!
//! - `config/` - TOML `NodeConfig` with `GC_*` overrides
//! - `ledger/` - `LocalLedger`: application, mempool and ledger ports
//! - `node/` - `Node`: oracle loop, sync agent and block timer

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod ledger;
pub mod node;

pub use config::{ConfigError, NodeConfig};
pub use ledger::{BlockSummary, LocalLedger};
pub use node::Node;
