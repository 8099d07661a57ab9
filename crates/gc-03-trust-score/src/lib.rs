//! # GC-03 Trust Score
//!
//! Converts the validator vote graph into per-validator reputation.
//!
//! **Subsystem ID:** 03  
//! **Architecture:** Pure domain (no ports, no I/O)
//!
//! ## Purpose
//!
//! Scores decide who sits in the next consul set. The scheduler calls
//! [`calculate`] every score interval with the persisted scores and the
//! ballots cast since the last recomputation.
//!
//! ## Properties
//!
//! | Property | Holds because |
//! |----------|---------------|
//! | Deterministic | Fixed id order, sequential float sums |
//! | Never negative | Scores are `u64`, trust clamped at 0 |
//! | Uniform ballots converge in one step | Rescale by `max(t0)` |

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod domain;
pub mod engine;

pub use domain::{TrustConfig, TrustError, TrustGraph, TrustResult};
pub use engine::calculate;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
