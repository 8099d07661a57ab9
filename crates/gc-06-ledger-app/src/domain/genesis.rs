//! Genesis document applied by `InitChain`.

use super::errors::{AppError, AppResult};
use gc_02_ledger_store::NebulaInfo;
use serde::{Deserialize, Serialize};
use shared_types::{ChainType, ConsulPubKey, OraclesPubKey};
use std::collections::{BTreeMap, BTreeSet};

/// One validator known at genesis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisValidator {
    /// Ledger identity.
    pub consul: ConsulPubKey,
    /// Initial score.
    pub score: u64,
    /// Per-chain keys.
    #[serde(default)]
    pub oracles: BTreeMap<ChainType, OraclesPubKey>,
}

/// A feed registered at genesis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisFeed {
    /// Registration.
    pub info: NebulaInfo,
    /// Registered oracles.
    #[serde(default)]
    pub oracles: Vec<OraclesPubKey>,
}

/// Initial ledger state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genesis {
    /// Validators in priority order. The first `consul_count` become consuls.
    pub validators: Vec<GenesisValidator>,
    /// Feeds to register.
    #[serde(default)]
    pub feeds: Vec<GenesisFeed>,
}

impl Genesis {
    /// Reject documents the ledger cannot start from.
    pub fn validate(&self) -> AppResult<()> {
        if self.validators.is_empty() {
            return Err(AppError::Genesis("no validators".into()));
        }
        let mut seen = BTreeSet::new();
        for validator in &self.validators {
            if !seen.insert(validator.consul) {
                return Err(AppError::Genesis(format!(
                    "validator {} listed twice",
                    validator.consul
                )));
            }
            if validator.score == 0 {
                return Err(AppError::Genesis(format!(
                    "validator {} has zero score",
                    validator.consul
                )));
            }
        }
        for feed in &self.feeds {
            if feed.info.bft_value == 0 {
                return Err(AppError::Genesis("feed with zero bft value".into()));
            }
            if !seen.contains(&feed.info.owner) {
                return Err(AppError::Genesis("feed owner is not a validator".into()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator(i: u8, score: u64) -> GenesisValidator {
        GenesisValidator {
            consul: ConsulPubKey([i; 32]),
            score,
            oracles: BTreeMap::new(),
        }
    }

    #[test]
    fn test_validate() {
        assert!(Genesis::default().validate().is_err());

        let ok = Genesis {
            validators: vec![validator(1, 100), validator(2, 50)],
            feeds: vec![],
        };
        assert!(ok.validate().is_ok());

        let twice = Genesis {
            validators: vec![validator(1, 100), validator(1, 50)],
            feeds: vec![],
        };
        assert!(matches!(twice.validate(), Err(AppError::Genesis(_))));

        let zero = Genesis {
            validators: vec![validator(1, 0)],
            feeds: vec![],
        };
        assert!(zero.validate().unwrap_err().is_fatal());
    }
}
