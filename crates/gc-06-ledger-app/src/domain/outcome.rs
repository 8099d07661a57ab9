//! Results handed back to the ordering engine.

use super::errors::AppError;
use serde::{Deserialize, Serialize};
use shared_types::{Consul, ConsulPubKey, Hash};
use std::collections::BTreeMap;

/// Outcome of one `DeliverTx`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxResult {
    /// Zero on success, see [`AppError::code`].
    pub code: u32,
    /// Transaction id, when it decoded.
    pub tx_id: Option<Hash>,
    /// Rejection reason.
    pub log: String,
}

impl TxResult {
    /// Accepted transaction.
    pub fn ok(tx_id: Hash) -> Self {
        Self {
            code: 0,
            tx_id: Some(tx_id),
            log: String::new(),
        }
    }

    /// Rejected transaction.
    pub fn rejected(tx_id: Option<Hash>, err: &AppError) -> Self {
        Self {
            code: err.code(),
            tx_id,
            log: err.to_string(),
        }
    }

    /// True when the transaction was applied.
    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}

/// Voting power change of one validator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorUpdate {
    /// Ledger identity.
    pub pub_key: ConsulPubKey,
    /// New power. Zero removes the validator.
    pub power: u64,
}

/// Power changes between two consul sets.
///
/// Removed validators get power 0; new ones, and ones whose value
/// changed, get their new value. Output is in key order.
pub fn validator_diff(before: &[Consul], after: &[Consul]) -> Vec<ValidatorUpdate> {
    let old: BTreeMap<ConsulPubKey, u64> = before.iter().map(|c| (c.pub_key, c.value)).collect();
    let new: BTreeMap<ConsulPubKey, u64> = after.iter().map(|c| (c.pub_key, c.value)).collect();

    let mut updates = Vec::new();
    for (key, power) in &old {
        if !new.contains_key(key) && *power > 0 {
            updates.push(ValidatorUpdate {
                pub_key: *key,
                power: 0,
            });
        }
    }
    for (key, power) in &new {
        if old.get(key) != Some(power) {
            updates.push(ValidatorUpdate {
                pub_key: *key,
                power: *power,
            });
        }
    }
    updates.sort_by_key(|u| u.pub_key);
    updates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn consul(i: u8, value: u64) -> Consul {
        Consul {
            pub_key: ConsulPubKey([i; 32]),
            value,
        }
    }

    #[test]
    fn test_diff() {
        let before = vec![consul(1, 100), consul(2, 100), consul(3, 100)];
        let after = vec![consul(2, 100), consul(3, 80), consul(4, 90)];
        let diff = validator_diff(&before, &after);
        assert_eq!(
            diff,
            vec![
                ValidatorUpdate {
                    pub_key: ConsulPubKey([1; 32]),
                    power: 0
                },
                ValidatorUpdate {
                    pub_key: ConsulPubKey([3; 32]),
                    power: 80
                },
                ValidatorUpdate {
                    pub_key: ConsulPubKey([4; 32]),
                    power: 90
                },
            ]
        );
        assert!(validator_diff(&after, &after).is_empty());
    }
}
