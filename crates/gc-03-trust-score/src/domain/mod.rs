//! # Domain Layer

pub mod config;
pub mod errors;
pub mod graph;

pub use config::TrustConfig;
pub use errors::{TrustError, TrustResult};
pub use graph::TrustGraph;
