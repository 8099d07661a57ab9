//! # Domain Layer
//!
//! Phase function, aggregation rules and in-memory round progress.

pub mod aggregate;
pub mod arena;
pub mod config;
pub mod errors;
pub mod sub_round;

pub use aggregate::{aggregate, result_hash};
pub use arena::{FeedKey, RoundArena, RoundState};
pub use config::OracleConfig;
pub use errors::{OracleError, OracleResult};
pub use sub_round::{pulse_round, SubRound, SUB_ROUNDS};
