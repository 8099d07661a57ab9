//! # Trust Propagation
//!
//! EigenTrust-style iteration over a [`TrustGraph`].
//!
//! ```text
//! raw[j]  = Σ_{i≠j} t0[i] · edge[i][j]
//! t1      = raw / max(raw) · max(t0)
//! t1      = α·t1 + (1-α)·t0
//! ```
//!
//! The rescale by `max(t0)` keeps the scale stable across iterations, so a
//! graph where everyone rates everyone else at their current score is a
//! fixed point. Iteration stops when the mean absolute change drops below
//! `epsilon` or after `max_iterations`.

use crate::domain::{TrustConfig, TrustGraph, TrustResult};
use shared_types::{ConsulPubKey, Vote};
use tracing::debug;

/// Recompute scores.
///
/// Pure and deterministic: identical inputs give identical output. Output
/// order is id order (initial scores first, then validators first seen in
/// ballots).
pub fn calculate(
    initial: &[(ConsulPubKey, u64)],
    votes: &[(ConsulPubKey, Vec<Vote>)],
    config: &TrustConfig,
) -> TrustResult<Vec<(ConsulPubKey, u64)>> {
    config.validate()?;
    let graph = TrustGraph::build(initial, votes, config);
    if graph.is_empty() {
        return Ok(Vec::new());
    }

    let (trust, iterations) = propagate(&graph, config);
    debug!(
        "[gc-03] trust converged for {} validators after {} iterations",
        graph.len(),
        iterations
    );

    Ok(graph
        .validators
        .iter()
        .zip(trust)
        .map(|(key, t)| (*key, config.denormalize(t)))
        .collect())
}

fn max_of(values: &[f64]) -> f64 {
    values.iter().copied().fold(0.0, f64::max)
}

/// Run the iteration, returning the final vector and iterations used.
fn propagate(graph: &TrustGraph, config: &TrustConfig) -> (Vec<f64>, usize) {
    let n = graph.len();
    let mut t0 = graph.initial.clone();

    for iteration in 1..=config.max_iterations {
        let mut raw = vec![0.0; n];
        for (truster, row) in graph.edges.iter().enumerate() {
            let weight = t0[truster];
            if weight == 0.0 {
                continue;
            }
            for (trusted, edge) in row.iter().enumerate() {
                if trusted != truster {
                    raw[trusted] += weight * edge;
                }
            }
        }

        let raw_max = max_of(&raw);
        if raw_max == 0.0 {
            // No trust flows between validators: nothing to update.
            return (t0, iteration);
        }
        let scale = max_of(&t0) / raw_max;
        let t1: Vec<f64> = raw
            .iter()
            .zip(&t0)
            .map(|(r, prev)| config.alpha * r * scale + (1.0 - config.alpha) * prev)
            .collect();

        let delta = t1.iter().zip(&t0).map(|(a, b)| (a - b).abs()).sum::<f64>() / n as f64;
        t0 = t1;
        if delta < config.epsilon {
            return (t0, iteration);
        }
    }
    (t0, config.max_iterations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TrustError;

    fn key(i: u8) -> ConsulPubKey {
        ConsulPubKey([i; 32])
    }

    fn vote(target: u8, score: u64) -> Vote {
        Vote {
            target: key(target),
            score,
        }
    }

    fn uniform_ballots(n: u8, score: u64) -> Vec<(ConsulPubKey, Vec<Vote>)> {
        (0..n)
            .map(|voter| {
                let ballot = (0..n)
                    .filter(|t| *t != voter)
                    .map(|t| vote(t, score))
                    .collect();
                (key(voter), ballot)
            })
            .collect()
    }

    #[test]
    fn test_empty_input_gives_empty_output() {
        let scores = calculate(&[], &[], &TrustConfig::default()).unwrap();
        assert!(scores.is_empty());
    }

    #[test]
    fn test_uniform_votes_are_a_fixed_point() {
        for score in [100u64, 60, 1] {
            let initial: Vec<_> = (0..5).map(|i| (key(i), score)).collect();
            let scores = calculate(&initial, &uniform_ballots(5, score), &TrustConfig::default())
                .unwrap();
            assert!(scores.iter().all(|(_, s)| *s == score), "score {}", score);
        }
    }

    #[test]
    fn test_dropped_validator_scenario() {
        // A..D = 0..3 rate E = 4 at zero; E only rates itself.
        let initial: Vec<_> = (0..5).map(|i| (key(i), 100)).collect();
        let mut votes: Vec<_> = (0..4).map(|i| (key(i), vec![vote(4, 0)])).collect();
        votes.push((key(4), vec![vote(4, 100)]));

        let scores = calculate(&initial, &votes, &TrustConfig::default()).unwrap();
        for (k, s) in &scores[..4] {
            assert_eq!(*s, 100, "{:?}", k);
        }
        assert_eq!(scores[4], (key(4), 0));
    }

    #[test]
    fn test_vote_only_validator_is_scored() {
        let initial = vec![(key(0), 100), (key(1), 100)];
        let votes = vec![
            (key(0), vec![vote(2, 100)]),
            (key(1), vec![vote(2, 100)]),
        ];
        let scores = calculate(&initial, &votes, &TrustConfig::default()).unwrap();
        assert_eq!(scores.len(), 3);
        assert_eq!(scores[2].0, key(2));
        assert!(scores[2].1 > 0);
    }

    #[test]
    fn test_unreachable_validator_stays_zero() {
        let initial = vec![(key(0), 100), (key(1), 0)];
        let votes = vec![(key(0), vec![vote(1, 0)])];
        let scores = calculate(&initial, &votes, &TrustConfig::default()).unwrap();
        assert_eq!(scores[1], (key(1), 0));
    }

    #[test]
    fn test_all_zero_stays_zero() {
        let initial: Vec<_> = (0..3).map(|i| (key(i), 0)).collect();
        let scores = calculate(&initial, &[], &TrustConfig::default()).unwrap();
        assert!(scores.iter().all(|(_, s)| *s == 0));
    }

    #[test]
    fn test_lone_validator_keeps_score() {
        let scores = calculate(&[(key(0), 80)], &[], &TrustConfig::default()).unwrap();
        assert_eq!(scores, vec![(key(0), 80)]);
    }

    #[test]
    fn test_deterministic() {
        let initial: Vec<_> = (0..7).map(|i| (key(i), 10 * i as u64 + 30)).collect();
        let votes: Vec<_> = (0..7)
            .map(|i| (key(i), vec![vote((i + 1) % 7, 90), vote((i + 3) % 7, 20)]))
            .collect();
        let config = TrustConfig::default();
        let a = calculate(&initial, &votes, &config).unwrap();
        let b = calculate(&initial, &votes, &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = TrustConfig {
            max_iterations: 0,
            ..Default::default()
        };
        assert_eq!(
            calculate(&[(key(0), 1)], &[], &config),
            Err(TrustError::NoIterations)
        );
    }
}
