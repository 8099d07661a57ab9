//! # GC-02 Ledger Store
//!
//! The replicated key space of the coordinating ledger.
//!
//! **Subsystem ID:** 02  
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Holds rounds, commits, reveals, results, scores, votes, validator sets
//! and feed registries under a fixed key schema (see [`domain::keys`]).
//!
//! ## Guarantees
//!
//! | Property | Mechanism |
//! |----------|-----------|
//! | Write-once records | `put_*` helpers refuse existing keys with `AlreadyExists` |
//! | Atomic blocks | Pending overlay flushed by one `atomic_batch_write` |
//! | Deterministic app hash | SHA-256 chain over key-ordered batches |
//! | Stale-but-consistent reads | [`LedgerStore::committed`] view |
//!
//! ## Module Structure
//!
//! ```text
//! gc-02-ledger-store/
//! ├── domain/     # key schema, NebulaInfo, StoreError
//! ├── ports/      # KeyValueStore, BatchOperation
//! ├── adapters/   # InMemoryKVStore, RocksDbStore (feature "rocksdb")
//! └── store.rs    # LedgerStore, LedgerRead, CommittedView
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod store;

pub use adapters::InMemoryKVStore;
#[cfg(feature = "rocksdb")]
pub use adapters::{RocksDbConfig, RocksDbStore};
pub use domain::{keys, NebulaInfo, StoreError, StoreResult};
pub use ports::{BatchOperation, KeyValueStore, ScanResult};
pub use store::{open_kv, CommittedView, LedgerConfig, LedgerRead, LedgerStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
