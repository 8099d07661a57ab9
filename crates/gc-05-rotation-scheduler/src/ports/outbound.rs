//! # Outbound Ports
//!
//! The sync agent reads committed ledger state in one snapshot and hands
//! signed transactions back to the ledger.

use crate::domain::{SchedulerResult, SyncSnapshot};
use async_trait::async_trait;
use shared_types::{ChainType, Transaction};

/// Coordinating ledger access - outbound port.
#[async_trait]
pub trait SyncLedger: Send + Sync {
    /// Committed state for the current round, covering `chains`.
    async fn snapshot(
        &self,
        score_interval: u64,
        chains: &[ChainType],
    ) -> SchedulerResult<SyncSnapshot>;

    /// Hand a signed transaction to the ledger.
    async fn broadcast(&self, tx: Transaction) -> SchedulerResult<()>;
}
