//! # Domain Layer
//!
//! Key schema, record types and errors of the ledger store.

pub mod errors;
pub mod keys;
pub mod records;

pub use errors::{StoreError, StoreResult};
pub use records::NebulaInfo;
