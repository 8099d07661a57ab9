//! # Rotation Rules
//!
//! Pure functions behind the per-interval rotation step.
//!
//! ```text
//! height:  1 ........ I-1 | I ....... 2I-1 | 2I ...
//! round:   1              | 2              | 3
//! rotate:  ^              | ^              | ^
//! ```

use shared_types::{Consul, ConsulPubKey, OraclesPubKey};

/// Rotation round of a ledger height.
pub fn round_id(height: u64, score_interval: u64) -> u64 {
    height / score_interval.max(1) + 1
}

/// Whether the rotation step runs at `height`.
pub fn is_rotation_height(height: u64, score_interval: u64) -> bool {
    height == 1 || (height > 0 && height % score_interval.max(1) == 0)
}

/// Validator that publishes `round` to the chains.
pub fn round_sender(round: u64, consuls: &[Consul]) -> Option<&Consul> {
    if consuls.is_empty() {
        return None;
    }
    let index = (round.saturating_sub(1) % consuls.len() as u64) as usize;
    consuls.get(index)
}

/// Top `count` validators by score, highest first.
///
/// The sort is stable, so equal scores keep their input order. Zero
/// scores never make the set.
pub fn top_consuls(scores: &[(ConsulPubKey, u64)], count: usize) -> Vec<Consul> {
    let mut ranked: Vec<Consul> = scores
        .iter()
        .filter(|(_, score)| *score > 0)
        .map(|(pub_key, value)| Consul {
            pub_key: *pub_key,
            value: *value,
        })
        .collect();
    ranked.sort_by(|a, b| b.value.cmp(&a.value));
    ranked.truncate(count);
    ranked
}

/// Active window of `size` oracles starting at `index`, wrapping.
///
/// Returns the window and the index for the next rotation. A feed with
/// no more oracles than the window keeps all of them.
pub fn rotate_window(
    oracles: &[OraclesPubKey],
    index: u64,
    size: usize,
) -> (Vec<OraclesPubKey>, u64) {
    let len = oracles.len();
    if len <= size {
        return (oracles.to_vec(), 0);
    }
    let start = (index % len as u64) as usize;
    let window = (0..size).map(|i| oracles[(start + i) % len]).collect();
    (window, ((start + 1) % len) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oracle(i: u8) -> OraclesPubKey {
        OraclesPubKey([i; 33])
    }

    fn consul(i: u8) -> ConsulPubKey {
        ConsulPubKey([i; 32])
    }

    #[test]
    fn test_rounds_and_rotation_heights() {
        assert_eq!(round_id(1, 10), 1);
        assert_eq!(round_id(9, 10), 1);
        assert_eq!(round_id(10, 10), 2);
        assert!(is_rotation_height(1, 10));
        assert!(is_rotation_height(20, 10));
        assert!(!is_rotation_height(0, 10));
        assert!(!is_rotation_height(11, 10));
    }

    #[test]
    fn test_window_wraps() {
        let oracles: Vec<_> = (0..7).map(oracle).collect();
        let (window, next) = rotate_window(&oracles, 4, 5);
        assert_eq!(
            window,
            vec![oracle(4), oracle(5), oracle(6), oracle(0), oracle(1)]
        );
        assert_eq!(next, 5);
    }

    #[test]
    fn test_small_feed_keeps_everyone() {
        let oracles: Vec<_> = (0..3).map(oracle).collect();
        assert_eq!(rotate_window(&oracles, 2, 5), (oracles.clone(), 0));
        assert_eq!(rotate_window(&[], 0, 5), (vec![], 0));
    }

    #[test]
    fn test_window_is_subset_of_bounded_size() {
        let oracles: Vec<_> = (0..9).map(oracle).collect();
        for index in 0..20 {
            let (window, _) = rotate_window(&oracles, index, 4);
            assert_eq!(window.len(), 4);
            assert!(window.iter().all(|o| oracles.contains(o)));
        }
    }

    #[test]
    fn test_top_consuls_is_stable_and_drops_zero() {
        let scores = vec![
            (consul(1), 50),
            (consul(2), 80),
            (consul(3), 50),
            (consul(4), 0),
            (consul(5), 90),
        ];
        let top: Vec<_> = top_consuls(&scores, 3).iter().map(|c| c.pub_key).collect();
        assert_eq!(top, vec![consul(5), consul(2), consul(1)]);
        assert_eq!(top_consuls(&scores, 10).len(), 4);
    }

    #[test]
    fn test_round_sender_rotates() {
        let consuls: Vec<_> = (1..=3)
            .map(|i| Consul {
                pub_key: consul(i),
                value: 1,
            })
            .collect();
        assert_eq!(round_sender(1, &consuls).unwrap().pub_key, consul(1));
        assert_eq!(round_sender(5, &consuls).unwrap().pub_key, consul(2));
        assert!(round_sender(1, &[]).is_none());
    }
}
