//! Dense trust graph built from initial scores and ballots.

use super::config::TrustConfig;
use shared_types::{ConsulPubKey, Vote};
use std::collections::HashMap;

/// Validators indexed by id, their seed trust, and a complete edge matrix.
#[derive(Debug, Clone)]
pub struct TrustGraph {
    /// Validator per id.
    pub validators: Vec<ConsulPubKey>,
    /// Seed trust per id, in `[0, 1]`.
    pub initial: Vec<f64>,
    /// `edges[truster][trusted]`, in `[0, 1]`. The diagonal is unused.
    pub edges: Vec<Vec<f64>>,
}

impl TrustGraph {
    /// Build the graph.
    ///
    /// Ids follow first appearance: initial scores in input order, then
    /// voters and vote targets in ballot order. Anyone only seen in ballots
    /// starts at 0. Every validator trusts every other one: explicitly by
    /// vote, otherwise with the target's own initial score.
    pub fn build(
        initial: &[(ConsulPubKey, u64)],
        votes: &[(ConsulPubKey, Vec<Vote>)],
        config: &TrustConfig,
    ) -> Self {
        let mut ids: HashMap<ConsulPubKey, usize> = HashMap::new();
        let mut validators = Vec::new();
        let mut seed = Vec::new();
        let mut intern = |key: ConsulPubKey, score: f64| -> usize {
            *ids.entry(key).or_insert_with(|| {
                validators.push(key);
                seed.push(score);
                validators.len() - 1
            })
        };

        for (key, score) in initial {
            intern(*key, config.normalize(*score));
        }
        let mut explicit = Vec::new();
        for (voter, ballot) in votes {
            let from = intern(*voter, 0.0);
            for vote in ballot {
                let to = intern(vote.target, 0.0);
                explicit.push((from, to, config.normalize(vote.score)));
            }
        }

        let n = validators.len();
        let mut edges: Vec<Vec<f64>> = (0..n).map(|_| seed.clone()).collect();
        for (from, to, trust) in explicit {
            edges[from][to] = trust;
        }

        Self {
            validators,
            initial: seed,
            edges,
        }
    }

    /// Number of validators.
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    /// True when there is nobody to score.
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}
