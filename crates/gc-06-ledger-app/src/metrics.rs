//! # Application Metrics
//!
//! Enable with the `metrics` feature.
//!
//! ## Metrics Exported
//!
//! - `ledger_txs_total` - Delivered transactions, by kind and result
//! - `ledger_blocks_committed_total` - Committed blocks
//! - `ledger_validator_updates_total` - Validator power changes sent to the engine

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Delivered transactions, labeled by kind and result
    pub static ref TXS_DELIVERED: IntCounterVec = register_int_counter_vec!(
        "ledger_txs_total",
        "Total number of delivered transactions",
        &["kind", "result"]
    )
    .expect("Failed to create TXS_DELIVERED metric");

    /// Committed blocks
    pub static ref BLOCKS_COMMITTED: IntCounter = register_int_counter!(
        "ledger_blocks_committed_total",
        "Total number of committed blocks"
    )
    .expect("Failed to create BLOCKS_COMMITTED metric");

    /// Validator updates
    pub static ref VALIDATOR_UPDATES: IntCounter = register_int_counter!(
        "ledger_validator_updates_total",
        "Total number of validator power changes reported"
    )
    .expect("Failed to create VALIDATOR_UPDATES metric");
}

/// Record a delivered transaction
#[cfg(feature = "metrics")]
pub fn record_tx(kind: &str, result: &str) {
    TXS_DELIVERED.with_label_values(&[kind, result]).inc();
}

/// Record a committed block
#[cfg(feature = "metrics")]
pub fn record_block_committed() {
    BLOCKS_COMMITTED.inc();
}

/// Record validator power changes
#[cfg(feature = "metrics")]
pub fn record_validator_updates(count: usize) {
    VALIDATOR_UPDATES.inc_by(count as u64);
}

// No-op implementations when metrics feature is disabled

#[cfg(not(feature = "metrics"))]
pub fn record_tx(_kind: &str, _result: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_block_committed() {}

#[cfg(not(feature = "metrics"))]
pub fn record_validator_updates(_count: usize) {}
