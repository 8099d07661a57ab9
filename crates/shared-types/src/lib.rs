//! # Shared Types Crate
//!
//! Types every Gravity Core subsystem agrees on.
//!
//! ## Contents
//!
//! - **Chain registry**: stable byte code <-> chain name, plus the key
//!   encoding family each chain uses for addresses and public keys.
//! - **Identities**: `ConsulPubKey` (ledger validator key), `OraclesPubKey`
//!   (33-byte per-chain envelope), `NebulaId` (data-feed contract id).
//! - **Values**: feed value types and the fixed-width value codec.
//! - **Transactions**: the signed ledger transaction wire format.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: key schema strings and wire encodings are
//!   derived from these types only.
//! - **Chain-specific text, chain-agnostic bytes**: identities are stored as
//!   bytes and rendered per chain only when a string is required.

pub mod chain;
pub mod entities;
pub mod errors;
pub mod transaction;
pub mod value;

pub use chain::{ChainRegistry, ChainRegistryBuilder, ChainSpec, ChainType, KeyEncoding};
pub use entities::*;
pub use errors::*;
pub use transaction::{Transaction, TxArg, TxKind};
pub use value::{Value, ValueType};
