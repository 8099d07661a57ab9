//! # Rotation Step
//!
//! The synchronous half of the scheduler. Runs inside `EndBlock`, reads
//! and stages writes on the block's pending state, and never touches a
//! target chain.
//!
//! At every rotation height:
//!
//! 1. Recompute scores from the persisted scores and this interval's
//!    ballots, then clear the ballots.
//! 2. Promote `ConsulsCandidate` to `Consuls` if the previous round was
//!    approved (`LastRoundApproved == round - 1`).
//! 3. Pick the next candidate: top `consul_count` by new score.
//! 4. Slide every feed's active oracle window.

use crate::domain::{
    is_rotation_height, rotate_window, round_id, top_consuls, SchedulerConfig, SchedulerResult,
};
use crate::metrics;
use gc_02_ledger_store::{LedgerRead, LedgerStore};
use gc_03_trust_score::calculate;
use shared_types::Consul;
use tracing::{debug, info};

/// What a rotation step changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RotationOutcome {
    /// Round the step belongs to.
    pub round: u64,
    /// Validators with a recomputed score.
    pub scored: usize,
    /// Set promoted to `Consuls`, if any.
    pub promoted: Option<Vec<Consul>>,
    /// New candidate set.
    pub candidate: Vec<Consul>,
    /// Feeds whose window was recomputed.
    pub feeds: usize,
}

/// Per-block rotation driver, owned by the application shell.
#[derive(Clone, Debug)]
pub struct Scheduler {
    config: SchedulerConfig,
}

impl Scheduler {
    /// Create a scheduler.
    pub fn new(config: SchedulerConfig) -> SchedulerResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Configuration in use.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Rotation round of a ledger height.
    pub fn round_at(&self, height: u64) -> u64 {
        round_id(height, self.config.score_interval)
    }

    /// Run the rotation step if `height` is a rotation height.
    pub fn end_block(
        &self,
        store: &mut LedgerStore,
        height: u64,
    ) -> SchedulerResult<Option<RotationOutcome>> {
        if !is_rotation_height(height, self.config.score_interval) {
            return Ok(None);
        }
        let round = self.round_at(height);

        let scores = store.scores()?;
        let votes = store.votes()?;
        let updated = calculate(&scores, &votes, &self.config.trust)?;
        for (consul, score) in &updated {
            store.set_score(consul, *score)?;
        }
        store.clear_votes()?;
        debug!(
            "[gc-05] round {}: {} scores from {} ballots",
            round,
            updated.len(),
            votes.len()
        );

        let candidate = store.consuls_candidate()?;
        let promoted = if store.last_round_approved()? + 1 == round && !candidate.is_empty() {
            store.set_consuls(&candidate)?;
            metrics::record_consuls_promoted();
            info!("[gc-05] round {}: promoted {} consuls", round, candidate.len());
            Some(candidate)
        } else {
            None
        };

        let next = top_consuls(&updated, self.config.consul_count);
        store.set_consuls_candidate(&next)?;

        let mut feeds = 0;
        for info in store.nebulae()? {
            let oracles = store.oracles_by_nebula(info.chain, &info.nebula)?;
            let index = store.oracles_nebula_index(info.chain, &info.nebula)?;
            let (window, next_index) = rotate_window(&oracles, index, self.config.oracle_window);
            store.set_bft_oracles_by_nebula(info.chain, &info.nebula, &window)?;
            store.set_oracles_nebula_index(info.chain, &info.nebula, next_index)?;
            feeds += 1;
        }

        metrics::record_rotation();
        info!(
            "[gc-05] round {} rotated at height {}: candidate {} consuls, {} feeds",
            round,
            height,
            next.len(),
            feeds
        );
        Ok(Some(RotationOutcome {
            round,
            scored: updated.len(),
            promoted,
            candidate: next,
            feeds,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gc_02_ledger_store::NebulaInfo;
    use shared_types::{ChainType, ConsulPubKey, NebulaId, OraclesPubKey, Vote};

    fn key(i: u8) -> ConsulPubKey {
        ConsulPubKey([i; 32])
    }

    fn consul(i: u8, value: u64) -> Consul {
        Consul {
            pub_key: key(i),
            value,
        }
    }

    fn scheduler() -> Scheduler {
        Scheduler::new(SchedulerConfig {
            score_interval: 10,
            consul_count: 3,
            oracle_window: 5,
            ..Default::default()
        })
        .unwrap()
    }

    fn seeded() -> LedgerStore {
        let mut store = LedgerStore::in_memory();
        for i in 1..=4u8 {
            store.set_score(&key(i), 100).unwrap();
        }
        store
            .set_consuls(&[consul(1, 100), consul(2, 100), consul(3, 100)])
            .unwrap();
        store.commit().unwrap();
        store
    }

    #[test]
    fn test_non_rotation_height_is_noop() {
        let mut store = seeded();
        assert_eq!(scheduler().end_block(&mut store, 7).unwrap(), None);
        assert_eq!(store.pending_len(), 0);
    }

    #[test]
    fn test_first_block_computes_candidate() {
        let mut store = seeded();
        let outcome = scheduler().end_block(&mut store, 1).unwrap().unwrap();
        assert_eq!(outcome.round, 1);
        // Nothing to promote yet.
        assert_eq!(outcome.promoted, None);
        assert_eq!(outcome.candidate.len(), 3);
        assert_eq!(store.consuls_candidate().unwrap(), outcome.candidate);
    }

    #[test]
    fn test_promotion_requires_previous_round_approved() {
        let sched = scheduler();
        let mut store = seeded();
        sched.end_block(&mut store, 1).unwrap();
        store.commit().unwrap();
        let before = store.consuls().unwrap();

        // Round 1 not approved: round 2 must not promote.
        let outcome = sched.end_block(&mut store, 10).unwrap().unwrap();
        assert_eq!(outcome.promoted, None);
        assert_eq!(store.consuls().unwrap(), before);
        store.commit().unwrap();

        // Round 2 approved: round 3 promotes.
        store.set_last_round_approved(2).unwrap();
        let candidate = store.consuls_candidate().unwrap();
        let outcome = sched.end_block(&mut store, 20).unwrap().unwrap();
        assert_eq!(outcome.promoted, Some(candidate.clone()));
        assert_eq!(store.consuls().unwrap(), candidate);
    }

    #[test]
    fn test_votes_change_candidate_and_are_cleared() {
        let sched = scheduler();
        let mut store = seeded();
        // Everybody votes validator 4 down.
        for voter in 1..=3u8 {
            let ballot = vec![Vote {
                target: key(4),
                score: 0,
            }];
            store.put_votes(&key(voter), &ballot).unwrap();
        }
        store.commit().unwrap();

        let outcome = sched.end_block(&mut store, 1).unwrap().unwrap();
        let members: Vec<_> = outcome.candidate.iter().map(|c| c.pub_key).collect();
        assert!(!members.contains(&key(4)));
        assert!(store.votes().unwrap().is_empty());
        assert!(store.score(&key(4)).unwrap().unwrap() < 100);
    }

    #[test]
    fn test_oracle_window_slides() {
        let sched = scheduler();
        let mut store = seeded();
        let chain = ChainType::ETHEREUM;
        let nebula = NebulaId::new(vec![9]);
        let oracles: Vec<_> = (0..7u8).map(|i| OraclesPubKey([i; 33])).collect();
        store
            .set_nebula_info(&NebulaInfo {
                chain,
                nebula: nebula.clone(),
                max_pulses_per_block: 1,
                min_score: 0,
                bft_value: 3,
                owner: key(1),
            })
            .unwrap();
        store.set_oracles_by_nebula(chain, &nebula, &oracles).unwrap();
        store.set_oracles_nebula_index(chain, &nebula, 4).unwrap();

        let outcome = sched.end_block(&mut store, 1).unwrap().unwrap();
        assert_eq!(outcome.feeds, 1);
        let window = store.bft_oracles_by_nebula(chain, &nebula).unwrap();
        let expected: Vec<_> = [4u8, 5, 6, 0, 1].iter().map(|i| oracles[*i as usize]).collect();
        assert_eq!(window, expected);
        assert_eq!(store.oracles_nebula_index(chain, &nebula).unwrap(), 5);
    }
}
