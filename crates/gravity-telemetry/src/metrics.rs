//! Node-level gauges and Prometheus text rendering.
//!
//! Subsystem crates register their counters in the default registry
//! behind their `metrics` feature; [`encode_metrics`] renders all of them.

use lazy_static::lazy_static;
use prometheus::{register_int_gauge, Encoder, IntGauge, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Last committed ledger height
    pub static ref LEDGER_HEIGHT: IntGauge = register_int_gauge!(
        "gc_ledger_height",
        "Height of the last committed ledger block"
    )
    .expect("metric creation failed");

    /// Size of the current consul set
    pub static ref CONSULS: IntGauge = register_int_gauge!(
        "gc_consuls",
        "Number of validators in the current consul set"
    )
    .expect("metric creation failed");

    /// Transactions waiting for the next block
    pub static ref MEMPOOL_PENDING: IntGauge = register_int_gauge!(
        "gc_mempool_transactions_pending",
        "Number of transactions waiting for the next block"
    )
    .expect("metric creation failed");
}

/// Update the per-block gauges.
pub fn record_block(height: u64, consuls: usize, pending: usize) {
    LEDGER_HEIGHT.set(height as i64);
    CONSULS.set(consuls as i64);
    MEMPOOL_PENDING.set(pending as i64);
}

/// Encode the default registry as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
