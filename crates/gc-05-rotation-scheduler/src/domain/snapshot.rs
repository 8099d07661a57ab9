//! # Sync Snapshot
//!
//! Everything one sync tick needs, read from the committed ledger in one
//! pass. The snapshot may be a block behind in-flight transactions; the
//! agent re-checks chain state before every publish.

use super::errors::SchedulerResult;
use super::rotation::round_id;
use gc_02_ledger_store::{LedgerRead, NebulaInfo};
use shared_types::{ChainType, Consul, ConsulPubKey, NebulaId, OraclesPubKey, Signature};
use std::collections::BTreeMap;

/// A feed and its active oracle window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedSnapshot {
    /// Feed registration.
    pub info: NebulaInfo,
    /// New oracle set to publish this round.
    pub oracles: Vec<OraclesPubKey>,
    /// Consul signatures over that set, this round.
    pub signatures: BTreeMap<ConsulPubKey, Signature>,
}

/// Committed ledger state relevant to one rotation round.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncSnapshot {
    /// Last committed ledger height.
    pub height: u64,
    /// Rotation round at that height.
    pub round: u64,
    /// Highest approved round.
    pub last_round_approved: u64,
    /// Current signers.
    pub consuls: Vec<Consul>,
    /// Set being published this round.
    pub candidate: Vec<Consul>,
    /// Per-chain keys of every consul and candidate.
    pub keys: BTreeMap<ConsulPubKey, BTreeMap<ChainType, OraclesPubKey>>,
    /// Consul signatures over the candidate set, per chain.
    pub consul_signatures: BTreeMap<ChainType, BTreeMap<ConsulPubKey, Signature>>,
    /// Feeds per chain.
    pub feeds: BTreeMap<ChainType, Vec<FeedSnapshot>>,
}

impl SyncSnapshot {
    /// Read the snapshot for `chains` from `view`.
    pub fn read<R: LedgerRead + ?Sized>(
        view: &R,
        score_interval: u64,
        chains: &[ChainType],
    ) -> SchedulerResult<Self> {
        let height = view.last_height()?;
        let round = round_id(height, score_interval);
        let consuls = view.consuls()?;
        let candidate = view.consuls_candidate()?;

        let mut keys = BTreeMap::new();
        for consul in consuls.iter().chain(candidate.iter()) {
            if !keys.contains_key(&consul.pub_key) {
                keys.insert(consul.pub_key, view.oracles_by_validator(&consul.pub_key)?);
            }
        }

        let mut consul_signatures = BTreeMap::new();
        let mut feeds: BTreeMap<ChainType, Vec<FeedSnapshot>> = BTreeMap::new();
        for chain in chains {
            consul_signatures.insert(*chain, view.sign_consuls_all(*chain, round)?);
            feeds.insert(*chain, Vec::new());
        }
        for info in view.nebulae()? {
            let Some(chain_feeds) = feeds.get_mut(&info.chain) else {
                continue;
            };
            let oracles = view.bft_oracles_by_nebula(info.chain, &info.nebula)?;
            let signatures = view.sign_oracles_all(info.chain, &info.nebula, round)?;
            chain_feeds.push(FeedSnapshot {
                info,
                oracles,
                signatures,
            });
        }

        Ok(Self {
            height,
            round,
            last_round_approved: view.last_round_approved()?,
            consuls,
            candidate,
            keys,
            consul_signatures,
            feeds,
        })
    }

    /// A validator's key on `chain`.
    pub fn key_of(&self, consul: &ConsulPubKey, chain: ChainType) -> Option<OraclesPubKey> {
        self.keys.get(consul).and_then(|k| k.get(&chain)).copied()
    }

    /// Candidate set as chain keys. Candidates without a key are left out.
    pub fn candidate_keys(&self, chain: ChainType) -> Vec<OraclesPubKey> {
        self.candidate
            .iter()
            .filter_map(|c| self.key_of(&c.pub_key, chain))
            .collect()
    }

    /// Signer seats on `chain`: current consuls as chain keys, zero for missing keys.
    pub fn signer_seats(&self, chain: ChainType) -> Vec<OraclesPubKey> {
        self.consuls
            .iter()
            .map(|c| self.key_of(&c.pub_key, chain).unwrap_or(OraclesPubKey::ZERO))
            .collect()
    }

    /// Position of a validator among the consuls.
    pub fn consul_index(&self, consul: &ConsulPubKey) -> Option<usize> {
        self.consuls.iter().position(|c| c.pub_key == *consul)
    }

    /// Feed on `chain` by id.
    pub fn feed(&self, chain: ChainType, nebula: &NebulaId) -> Option<&FeedSnapshot> {
        self.feeds
            .get(&chain)
            .and_then(|feeds| feeds.iter().find(|f| f.info.nebula == *nebula))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gc_02_ledger_store::LedgerStore;

    fn consul(i: u8) -> Consul {
        Consul {
            pub_key: ConsulPubKey([i; 32]),
            value: 10,
        }
    }

    #[test]
    fn test_read_collects_round_state() {
        let mut store = LedgerStore::in_memory();
        let chain = ChainType::ETHEREUM;
        store.set_last_height(25).unwrap();
        store.set_consuls(&[consul(1), consul(2)]).unwrap();
        store.set_consuls_candidate(&[consul(2), consul(3)]).unwrap();
        for i in 1..=2u8 {
            let keys = BTreeMap::from([(chain, OraclesPubKey([i; 33]))]);
            store
                .set_oracles_by_validator(&ConsulPubKey([i; 32]), &keys)
                .unwrap();
        }
        store
            .put_sign_consuls(chain, 3, &ConsulPubKey([1; 32]), &Signature(vec![1; 65]))
            .unwrap();
        store.commit().unwrap();

        let snapshot = SyncSnapshot::read(&store.committed(), 10, &[chain]).unwrap();
        assert_eq!(snapshot.round, 3);
        assert_eq!(snapshot.consul_signatures[&chain].len(), 1);
        // Candidate 3 has no Ethereum key yet.
        assert_eq!(snapshot.candidate_keys(chain), vec![OraclesPubKey([2; 33])]);
        assert_eq!(
            snapshot.signer_seats(chain),
            vec![OraclesPubKey([1; 33]), OraclesPubKey([2; 33])]
        );
        assert_eq!(snapshot.consul_index(&ConsulPubKey([2; 32])), Some(1));
    }
}
