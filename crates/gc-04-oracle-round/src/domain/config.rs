//! Oracle node tuning.

use super::errors::{OracleError, OracleResult};
use gc_01_chain_adaptor::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Oracle node configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Ledger blocks per sub-round.
    pub blocks_per_sub_round: u64,
    /// Sleep between ticks, in milliseconds.
    pub poll_interval_ms: u64,
    /// Pulse heights kept behind the newest one per feed.
    pub arena_horizon: u64,
    /// Confirmation polls for chain transactions.
    pub confirm_attempts: u32,
    /// Sleep between confirmation polls, in milliseconds.
    pub confirm_interval_ms: u64,
    /// Upper bound on one chain call, in milliseconds.
    pub call_timeout_ms: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            blocks_per_sub_round: 2,
            poll_interval_ms: 250,
            arena_horizon: 64,
            confirm_attempts: 10,
            confirm_interval_ms: 1_000,
            call_timeout_ms: 10_000,
        }
    }
}

impl OracleConfig {
    /// Reject values the loop cannot run with.
    pub fn validate(&self) -> OracleResult<()> {
        if self.blocks_per_sub_round == 0 {
            return Err(OracleError::Config("blocks_per_sub_round must be > 0".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(OracleError::Config("poll_interval_ms must be > 0".into()));
        }
        if self.confirm_attempts == 0 {
            return Err(OracleError::Config("confirm_attempts must be > 0".into()));
        }
        Ok(())
    }

    /// Tick interval.
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(OracleConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_sub_round_rejected() {
        let config = OracleConfig {
            blocks_per_sub_round: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
