//! # Oracle Round Metrics
//!
//! Prometheus counters for the commit-reveal-result loop.
//!
//! Enable with the `metrics` feature:
//! ```toml
//! gc-04-oracle-round = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `oracle_submissions_total` - Ledger records sent, by sub-round
//! - `oracle_pulses_published_total` - Pulses accepted by a target chain
//! - `oracle_round_errors_total` - Per-feed failures, by kind

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Records sent to the ledger, labeled by sub-round
    pub static ref SUBMISSIONS: IntCounterVec = register_int_counter_vec!(
        "oracle_submissions_total",
        "Total number of commit, reveal and result records sent",
        &["sub_round"]
    )
    .expect("Failed to create SUBMISSIONS metric");

    /// Pulses published on target chains
    pub static ref PULSES_PUBLISHED: IntCounter = register_int_counter!(
        "oracle_pulses_published_total",
        "Total number of pulses accepted by target chains"
    )
    .expect("Failed to create PULSES_PUBLISHED metric");

    /// Per-feed failures, labeled by error kind
    pub static ref ROUND_ERRORS: IntCounterVec = register_int_counter_vec!(
        "oracle_round_errors_total",
        "Total number of per-feed round failures",
        &["kind"]
    )
    .expect("Failed to create ROUND_ERRORS metric");
}

/// Record a ledger submission
#[cfg(feature = "metrics")]
pub fn record_submission(sub_round: &str) {
    SUBMISSIONS.with_label_values(&[sub_round]).inc();
}

/// Record a published pulse
#[cfg(feature = "metrics")]
pub fn record_pulse_published() {
    PULSES_PUBLISHED.inc();
}

/// Record a per-feed failure
#[cfg(feature = "metrics")]
pub fn record_round_error(kind: &str) {
    ROUND_ERRORS.with_label_values(&[kind]).inc();
}

// No-op implementations when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub fn record_submission(_sub_round: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_pulse_published() {}

#[cfg(not(feature = "metrics"))]
pub fn record_round_error(_kind: &str) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_callable() {
        record_submission("commit");
        record_pulse_published();
        record_round_error("adaptor");
    }
}
