//! Scheduler tuning.

use super::errors::{SchedulerError, SchedulerResult};
use gc_01_chain_adaptor::RetryPolicy;
use gc_03_trust_score::TrustConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Rotation and sync configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Ledger blocks per rotation round.
    pub score_interval: u64,
    /// Size of the consul set.
    pub consul_count: usize,
    /// Size of each feed's active oracle window.
    pub oracle_window: usize,
    /// Trust engine constants.
    pub trust: TrustConfig,
    /// Sleep between sync ticks, in milliseconds.
    pub poll_interval_ms: u64,
    /// Confirmation polls for chain transactions.
    pub confirm_attempts: u32,
    /// Sleep between confirmation polls, in milliseconds.
    pub confirm_interval_ms: u64,
    /// Upper bound on one chain call, in milliseconds.
    pub call_timeout_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            score_interval: 20,
            consul_count: 5,
            oracle_window: 5,
            trust: TrustConfig::default(),
            poll_interval_ms: 500,
            confirm_attempts: 10,
            confirm_interval_ms: 1_000,
            call_timeout_ms: 10_000,
        }
    }
}

impl SchedulerConfig {
    /// Reject values rotation cannot run with.
    pub fn validate(&self) -> SchedulerResult<()> {
        if self.score_interval < 2 {
            return Err(SchedulerError::Config("score_interval must be >= 2".into()));
        }
        if self.consul_count == 0 {
            return Err(SchedulerError::Config("consul_count must be > 0".into()));
        }
        if self.oracle_window == 0 {
            return Err(SchedulerError::Config("oracle_window must be > 0".into()));
        }
        if self.confirm_attempts == 0 {
            return Err(SchedulerError::Config("confirm_attempts must be > 0".into()));
        }
        self.trust.validate()?;
        Ok(())
    }

    /// Sync tick interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Retry policy for chain calls.
    pub fn retry(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.confirm_attempts,
            interval: Duration::from_millis(self.confirm_interval_ms),
            call_timeout: Duration::from_millis(self.call_timeout_ms),
        }
    }
}
