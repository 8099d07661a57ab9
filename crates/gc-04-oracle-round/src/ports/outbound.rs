//! # Outbound Ports
//!
//! What the oracle node needs from the coordinating ledger and from the
//! external data source.
//!
//! Ledger reads are served from the last committed block. Every lookup
//! returns `None` for "not yet", never an error.

use crate::domain::OracleResult;
use async_trait::async_trait;
use gc_02_ledger_store::NebulaInfo;
use shared_types::{
    ChainType, Hash, NebulaId, OraclesPubKey, Signature, Transaction, Value, ValueType,
};
use std::collections::BTreeMap;

/// Coordinating ledger access - outbound port.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Last committed ledger height.
    async fn height(&self) -> OracleResult<u64>;

    /// External height bound to a pulse round.
    async fn round_height(&self, chain: ChainType, round: u64) -> OracleResult<Option<u64>>;

    /// Commit hash of one oracle.
    async fn commit_hash(
        &self,
        chain: ChainType,
        nebula: &NebulaId,
        height: u64,
        oracle: &OraclesPubKey,
    ) -> OracleResult<Option<Hash>>;

    /// Reveal of one oracle.
    async fn reveal(
        &self,
        chain: ChainType,
        nebula: &NebulaId,
        height: u64,
        oracle: &OraclesPubKey,
    ) -> OracleResult<Option<Vec<u8>>>;

    /// Every reveal of a pulse.
    async fn reveals(
        &self,
        chain: ChainType,
        nebula: &NebulaId,
        height: u64,
    ) -> OracleResult<Vec<Vec<u8>>>;

    /// Result signature of one oracle.
    async fn result(
        &self,
        chain: ChainType,
        nebula: &NebulaId,
        height: u64,
        oracle: &OraclesPubKey,
    ) -> OracleResult<Option<Signature>>;

    /// Every result signature of a pulse, by signer.
    async fn results(
        &self,
        chain: ChainType,
        nebula: &NebulaId,
        height: u64,
    ) -> OracleResult<BTreeMap<OraclesPubKey, Signature>>;

    /// Active signing window of a feed.
    async fn bft_oracles(
        &self,
        chain: ChainType,
        nebula: &NebulaId,
    ) -> OracleResult<Vec<OraclesPubKey>>;

    /// Feed registration.
    async fn nebula_info(
        &self,
        chain: ChainType,
        nebula: &NebulaId,
    ) -> OracleResult<Option<NebulaInfo>>;

    /// Hand a signed transaction to the ledger.
    async fn broadcast(&self, tx: Transaction) -> OracleResult<()>;
}

/// External data source - outbound port.
#[async_trait]
pub trait DataExtractor: Send + Sync {
    /// Current value for a feed.
    async fn extract(&self, nebula: &NebulaId, value_type: ValueType) -> OracleResult<Value>;
}
