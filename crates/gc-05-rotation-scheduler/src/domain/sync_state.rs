//! # Sync State
//!
//! Per (round, chain) progress of a rotation:
//!
//! ```text
//! NotStarted ──→ SignaturesCollecting ──→ ThresholdMet ──→ Approved
//! ```
//!
//! Transitions only move forward. Asking to move back is ignored, so a
//! retried action that re-observes an earlier state is a no-op.

use shared_types::ChainType;
use std::collections::BTreeMap;
use std::fmt;

/// Rotation progress on one chain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum SyncState {
    /// Nothing signed yet.
    #[default]
    NotStarted,
    /// Own signature is out, waiting for others.
    SignaturesCollecting,
    /// The new sets are recorded on chain.
    ThresholdMet,
    /// The ledger approved the round.
    Approved,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncState::NotStarted => "not-started",
            SyncState::SignaturesCollecting => "signatures-collecting",
            SyncState::ThresholdMet => "threshold-met",
            SyncState::Approved => "approved",
        };
        f.write_str(name)
    }
}

/// Sync states of recent rounds.
#[derive(Debug, Default)]
pub struct SyncTracker {
    states: BTreeMap<(u64, ChainType), SyncState>,
}

impl SyncTracker {
    /// Empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// State of `round` on `chain`.
    pub fn state(&self, round: u64, chain: ChainType) -> SyncState {
        self.states
            .get(&(round, chain))
            .copied()
            .unwrap_or_default()
    }

    /// Move forward to `to`. Returns true if the state changed.
    pub fn advance(&mut self, round: u64, chain: ChainType, to: SyncState) -> bool {
        let state = self.states.entry((round, chain)).or_default();
        if to > *state {
            *state = to;
            true
        } else {
            false
        }
    }

    /// Forget rounds before `round`.
    pub fn prune_before(&mut self, round: u64) {
        self.states.retain(|(r, _), _| *r >= round);
    }
}
