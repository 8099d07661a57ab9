//! # Sub-Rounds
//!
//! A pulse round spans four sub-rounds of `blocks_per_sub_round` ledger
//! blocks each. The phase is a pure function of the ledger height.
//!
//! ```text
//! height:  0  1 | 2  3 | 4  5 | 6  7 | 8 ...     (blocks_per_sub_round = 2)
//! phase:  Commit| Reveal|Result|Finalize| Commit
//! round:  ----------- 0 -----------------| 1
//! ```

use std::fmt;

/// Number of sub-rounds in one pulse round.
pub const SUB_ROUNDS: u64 = 4;

/// Phase of the commit-reveal-result protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SubRound {
    /// Publish `sha256(value)`.
    Commit,
    /// Publish the raw value.
    Reveal,
    /// Aggregate reveals and sign the result.
    Result,
    /// Designated submitter publishes the pulse.
    Finalize,
}

impl SubRound {
    /// Phase at a ledger height. `blocks_per_sub_round` of zero is treated as one.
    pub fn at(height: u64, blocks_per_sub_round: u64) -> Self {
        match (height / blocks_per_sub_round.max(1)) % SUB_ROUNDS {
            0 => SubRound::Commit,
            1 => SubRound::Reveal,
            2 => SubRound::Result,
            _ => SubRound::Finalize,
        }
    }

    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubRound::Commit => "commit",
            SubRound::Reveal => "reveal",
            SubRound::Result => "result",
            SubRound::Finalize => "finalize",
        }
    }
}

impl fmt::Display for SubRound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pulse round id at a ledger height.
pub fn pulse_round(height: u64, blocks_per_sub_round: u64) -> u64 {
    height / (blocks_per_sub_round.max(1) * SUB_ROUNDS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phases_cycle() {
        let phases: Vec<_> = (0..10).map(|h| SubRound::at(h, 2)).collect();
        assert_eq!(
            phases,
            vec![
                SubRound::Commit,
                SubRound::Commit,
                SubRound::Reveal,
                SubRound::Reveal,
                SubRound::Result,
                SubRound::Result,
                SubRound::Finalize,
                SubRound::Finalize,
                SubRound::Commit,
                SubRound::Commit,
            ]
        );
    }

    #[test]
    fn test_pulse_round() {
        assert_eq!(pulse_round(0, 2), 0);
        assert_eq!(pulse_round(7, 2), 0);
        assert_eq!(pulse_round(8, 2), 1);
        assert_eq!(pulse_round(9, 0), 2);
    }
}
