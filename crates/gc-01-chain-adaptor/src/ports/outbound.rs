//! # Outbound Ports
//!
//! The capability set the core requires of every target chain.
//!
//! One implementation per chain family. Implementations are selected at
//! startup from configuration and held in an [`AdaptorSet`](crate::AdaptorSet).

use crate::domain::{AdaptorError, AdaptorResult, RetryPolicy, SignatureBatch};
use async_trait::async_trait;
use shared_types::{ChainType, Hash, NebulaId, OraclesPubKey, Signature, Value, ValueType};
use tracing::debug;

/// Chain-side transaction id.
pub type ChainTxId = String;

/// Target-chain adaptor - outbound port.
#[async_trait]
pub trait ChainAdaptor: Send + Sync {
    /// Chain this adaptor talks to.
    fn chain(&self) -> ChainType;

    /// This validator's key on the chain.
    fn pub_key(&self) -> OraclesPubKey;

    /// Width of one signature slot in batches.
    fn signature_len(&self) -> usize {
        65
    }

    /// Current chain height.
    async fn get_height(&self) -> AdaptorResult<u64>;

    /// Sign a 32-byte digest with the chain key.
    async fn sign(&self, digest: &Hash) -> AdaptorResult<Signature>;

    /// Whether a submitted transaction is confirmed.
    async fn is_confirmed(&self, tx_id: &str) -> AdaptorResult<bool>;

    /// Poll until `tx_id` confirms, at most `policy.attempts` times.
    async fn wait_tx(&self, tx_id: &str, policy: &RetryPolicy) -> AdaptorResult<()> {
        for attempt in 1..=policy.attempts {
            if self.is_confirmed(tx_id).await? {
                return Ok(());
            }
            debug!(
                "[gc-01] {} tx {} unconfirmed (attempt {}/{})",
                self.chain(),
                tx_id,
                attempt,
                policy.attempts
            );
            tokio::time::sleep(policy.interval).await;
        }
        Err(AdaptorError::Timeout {
            what: format!("tx {}", tx_id),
            attempts: policy.attempts,
        })
    }

    /// Declared value type of a feed.
    async fn value_type(&self, nebula: &NebulaId) -> AdaptorResult<ValueType>;

    /// Publish an agreed value hash with its signatures.
    async fn add_pulse(
        &self,
        nebula: &NebulaId,
        pulse_id: u64,
        hash: Hash,
        signatures: &SignatureBatch,
    ) -> AdaptorResult<ChainTxId>;

    /// Push the value behind a published pulse to subscriber contracts.
    async fn send_value_to_subs(
        &self,
        nebula: &NebulaId,
        pulse_id: u64,
        value: &Value,
    ) -> AdaptorResult<()>;

    /// Replace a feed's oracle set, signed by the chain's consuls.
    async fn set_oracles_to_nebula(
        &self,
        nebula: &NebulaId,
        oracles: &[OraclesPubKey],
        signatures: &SignatureBatch,
        round: u64,
    ) -> AdaptorResult<ChainTxId>;

    /// Replace the consul set, signed by the current consuls.
    async fn send_consuls_to_gravity_contract(
        &self,
        consuls: &[OraclesPubKey],
        signatures: &SignatureBatch,
        round: u64,
    ) -> AdaptorResult<ChainTxId>;

    /// Sign a new consul set for `round`.
    async fn sign_consuls(&self, consuls: &[OraclesPubKey], round: u64)
        -> AdaptorResult<Signature>;

    /// Sign a feed's new oracle set for `round`.
    async fn sign_oracles(
        &self,
        nebula: &NebulaId,
        oracles: &[OraclesPubKey],
        round: u64,
    ) -> AdaptorResult<Signature>;

    /// Id of the last published pulse for a feed.
    async fn last_pulse_id(&self, nebula: &NebulaId) -> AdaptorResult<u64>;

    /// Last consul rotation round recorded on chain.
    async fn last_round(&self) -> AdaptorResult<u64>;

    /// Whether the consul rotation for `round` is recorded.
    async fn round_exist(&self, round: u64) -> AdaptorResult<bool>;

    /// Whether a feed's oracle rotation for `round` is recorded.
    async fn oracles_round_exist(&self, nebula: &NebulaId, round: u64) -> AdaptorResult<bool>;
}
