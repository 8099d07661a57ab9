//! # Bounded Waits
//!
//! Chain RPCs are the only place the core applies timeouts. A wait that
//! runs out surfaces as `AdaptorError::Timeout`; the caller retries the
//! whole action on its next tick.

use super::errors::{AdaptorError, AdaptorResult};
use std::future::Future;
use std::time::Duration;

/// Fixed retry count and poll interval for confirmation waits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Polls before giving up.
    pub attempts: u32,
    /// Sleep between polls.
    pub interval: Duration,
    /// Upper bound on a single RPC call.
    pub call_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 10,
            interval: Duration::from_secs(1),
            call_timeout: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Run one RPC future under `call_timeout`.
    pub async fn bounded<T, F>(&self, what: &str, call: F) -> AdaptorResult<T>
    where
        F: Future<Output = AdaptorResult<T>>,
    {
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(AdaptorError::Timeout {
                what: what.to_string(),
                attempts: 1,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bounded_passes_result_through() {
        let policy = RetryPolicy::default();
        let value = policy.bounded("height", async { Ok(7u64) }).await;
        assert_eq!(value, Ok(7));
    }

    #[tokio::test]
    async fn test_bounded_times_out() {
        let policy = RetryPolicy {
            call_timeout: Duration::from_millis(10),
            ..Default::default()
        };
        let result: AdaptorResult<()> = policy
            .bounded("slow call", async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(AdaptorError::Timeout { .. })));
    }
}
