//! # Domain Layer
//!
//! Genesis, transaction outcomes, validator-set diffs and query paths.

pub mod errors;
pub mod genesis;
pub mod outcome;
pub mod query;

pub use errors::{AppError, AppResult};
pub use genesis::{Genesis, GenesisFeed, GenesisValidator};
pub use outcome::{validator_diff, TxResult, ValidatorUpdate};
pub use query::{QueryArgs, QueryPath};
