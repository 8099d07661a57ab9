//! # Domain Layer
//!
//! Chain-agnostic pieces of the adaptor boundary.

pub mod batch;
pub mod errors;
pub mod messages;
pub mod retry;

pub use batch::{bft_threshold, SignatureBatch};
pub use errors::{AdaptorError, AdaptorResult};
pub use messages::{consuls_message, oracles_message};
pub use retry::RetryPolicy;
