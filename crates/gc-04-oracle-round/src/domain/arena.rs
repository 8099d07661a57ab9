//! # Round Arena
//!
//! In-memory progress of every (feed, pulse height) this node is working
//! on. Nothing here is persisted: after a restart the node re-derives
//! what it can from the ledger and skips what it cannot (a commit whose
//! raw value was lost is never revealed).

use shared_types::{ChainType, Hash, NebulaId, Value};
use std::collections::BTreeMap;

/// One feed on one chain.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeedKey {
    /// Target chain.
    pub chain: ChainType,
    /// Feed contract.
    pub nebula: NebulaId,
}

impl FeedKey {
    /// Build a key.
    pub fn new(chain: ChainType, nebula: NebulaId) -> Self {
        Self { chain, nebula }
    }
}

/// Progress of one pulse.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoundState {
    /// Extracted raw value.
    pub value: Option<Value>,
    /// `sha256(value)` as committed.
    pub commit: Option<Hash>,
    /// Commit is on the ledger.
    pub commit_sent: bool,
    /// Reveal is on the ledger.
    pub reveal_sent: bool,
    /// Aggregated value and its hash.
    pub result: Option<(Value, Hash)>,
    /// Result signature is on the ledger.
    pub result_sent: bool,
    /// Signatures carried by the last pulse the chain refused.
    pub refused_with: Option<usize>,
}

/// Round states keyed by (feed, pulse height).
#[derive(Debug, Default)]
pub struct RoundArena {
    rounds: BTreeMap<(FeedKey, u64), RoundState>,
    newest: BTreeMap<FeedKey, u64>,
    done: BTreeMap<FeedKey, u64>,
}

impl RoundArena {
    /// Empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// State of a pulse, created on first access.
    pub fn entry(&mut self, feed: &FeedKey, height: u64) -> &mut RoundState {
        let newest = self.newest.entry(feed.clone()).or_insert(height);
        *newest = (*newest).max(height);
        self.rounds.entry((feed.clone(), height)).or_default()
    }

    /// State of a pulse, if tracked.
    pub fn get(&self, feed: &FeedKey, height: u64) -> Option<&RoundState> {
        self.rounds.get(&(feed.clone(), height))
    }

    /// Forget a finished pulse. Heights up to it are done for the feed.
    pub fn finalize(&mut self, feed: &FeedKey, height: u64) -> Option<RoundState> {
        let done = self.done.entry(feed.clone()).or_insert(height);
        *done = (*done).max(height);
        self.rounds.remove(&(feed.clone(), height))
    }

    /// True once `height` or a later pulse of the feed was finalized.
    pub fn is_done(&self, feed: &FeedKey, height: u64) -> bool {
        self.done.get(feed).map_or(false, |done| height <= *done)
    }

    /// Drop pulses more than `horizon` heights behind the newest one of their feed.
    /// Returns how many were dropped.
    pub fn evict_stale(&mut self, horizon: u64) -> usize {
        let before = self.rounds.len();
        let newest = &self.newest;
        self.rounds.retain(|(feed, height), _| {
            newest
                .get(feed)
                .map_or(true, |n| height.saturating_add(horizon) >= *n)
        });
        before - self.rounds.len()
    }

    /// Tracked pulses.
    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    /// True when nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }
}
