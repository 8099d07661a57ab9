//! # GC-06 Ledger Application
//!
//! The replicated state machine validators run under the ordering engine.
//! Every oracle-protocol step, ballot and rotation signature is a signed
//! transaction; this crate decides which ones are admitted and what they
//! write.
//!
//! **Subsystem ID:** 06
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Lifecycle
//!
//! | Call | Does |
//! |------|------|
//! | `init_chain` | seed scores, keys, feeds and the first consul set |
//! | `begin_block` | record height, snapshot the consul set |
//! | `deliver_tx` | decode, verify, authorize and apply one transaction |
//! | `end_block` | run the rotation step, diff the consul set |
//! | `commit` | persist, return the app hash |
//! | `query` | read committed state as JSON |
//!
//! ## Result Codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | applied |
//! | 1 | malformed transaction or argument |
//! | 2 | bad id or signature |
//! | 3 | sender not authorized |
//! | 4 | rejected by a state rule |
//! | 5 | write-once key already set |
//! | 6 | bad query |
//! | 7 | storage failure |
//! | 8 | fatal |
//!
//! ## Module Structure
//!
//! ```text
//! gc-06-ledger-app/
//! ├── domain/       # genesis, outcomes, query paths, errors
//! ├── handlers.rs   # one handler per transaction kind
//! ├── metrics.rs    # Prometheus counters (feature "metrics")
//! └── service.rs    # GravityApp block lifecycle
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod domain;
pub mod handlers;
pub mod metrics;
pub mod service;

pub use domain::{
    validator_diff, AppError, AppResult, Genesis, GenesisFeed, GenesisValidator, QueryArgs,
    QueryPath, TxResult, ValidatorUpdate,
};
pub use handlers::TxContext;
pub use service::{EndBlockOutcome, GravityApp};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
