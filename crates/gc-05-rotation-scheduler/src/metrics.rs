//! # Rotation Metrics
//!
//! Prometheus counters for rotation and cross-chain sync.
//!
//! Enable with the `metrics` feature:
//! ```toml
//! gc-05-rotation-scheduler = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `rotation_steps_total` - Rotation steps run in `EndBlock`
//! - `rotation_promotions_total` - Candidate sets promoted to consuls
//! - `rotation_signatures_total` - Set signatures sent, by kind
//! - `rotation_publications_total` - Chain publications and approvals, by kind
//! - `rotation_sync_errors_total` - Sync failures, by kind

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Rotation steps run
    pub static ref ROTATIONS: IntCounter = register_int_counter!(
        "rotation_steps_total",
        "Total number of rotation steps run at rotation heights"
    )
    .expect("Failed to create ROTATIONS metric");

    /// Candidate promotions
    pub static ref PROMOTIONS: IntCounter = register_int_counter!(
        "rotation_promotions_total",
        "Total number of candidate sets promoted to consuls"
    )
    .expect("Failed to create PROMOTIONS metric");

    /// Signatures sent, labeled by set kind
    pub static ref SIGNATURES: IntCounterVec = register_int_counter_vec!(
        "rotation_signatures_total",
        "Total number of consul and oracle set signatures sent",
        &["kind"]
    )
    .expect("Failed to create SIGNATURES metric");

    /// Publications, labeled by kind
    pub static ref PUBLICATIONS: IntCounterVec = register_int_counter_vec!(
        "rotation_publications_total",
        "Total number of set publications and round approvals",
        &["kind"]
    )
    .expect("Failed to create PUBLICATIONS metric");

    /// Sync failures, labeled by error kind
    pub static ref SYNC_ERRORS: IntCounterVec = register_int_counter_vec!(
        "rotation_sync_errors_total",
        "Total number of sync failures",
        &["kind"]
    )
    .expect("Failed to create SYNC_ERRORS metric");
}

/// Record a rotation step
#[cfg(feature = "metrics")]
pub fn record_rotation() {
    ROTATIONS.inc();
}

/// Record a promotion
#[cfg(feature = "metrics")]
pub fn record_consuls_promoted() {
    PROMOTIONS.inc();
}

/// Record a set signature
#[cfg(feature = "metrics")]
pub fn record_signature(kind: &str) {
    SIGNATURES.with_label_values(&[kind]).inc();
}

/// Record a publication
#[cfg(feature = "metrics")]
pub fn record_publication(kind: &str) {
    PUBLICATIONS.with_label_values(&[kind]).inc();
}

/// Record a sync failure
#[cfg(feature = "metrics")]
pub fn record_sync_error(kind: &str) {
    SYNC_ERRORS.with_label_values(&[kind]).inc();
}

// No-op implementations when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub fn record_rotation() {}

#[cfg(not(feature = "metrics"))]
pub fn record_consuls_promoted() {}

#[cfg(not(feature = "metrics"))]
pub fn record_signature(_kind: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_publication(_kind: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_sync_error(_kind: &str) {}
