//! Persisted record types that are not plain identities.

use serde::{Deserialize, Serialize};
use shared_types::{ChainType, ConsulPubKey, NebulaId};

/// Registration of one data feed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NebulaInfo {
    /// Target chain.
    pub chain: ChainType,
    /// Feed contract id.
    pub nebula: NebulaId,
    /// Upper bound on pulses per ledger block.
    pub max_pulses_per_block: u64,
    /// Minimum score to join the feed's oracle set.
    pub min_score: u64,
    /// Signatures required per pulse.
    pub bft_value: u64,
    /// Validator that registered the feed.
    pub owner: ConsulPubKey,
}
