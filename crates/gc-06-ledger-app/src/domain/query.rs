//! # Query Paths
//!
//! Read-only access to committed state. The request is a JSON object
//! holding whichever of [`QueryArgs`] the path needs; the response is the
//! JSON encoding of the record (`null` when it does not exist).
//!
//! | Path | Arguments |
//! |------|-----------|
//! | `consuls`, `consulsCandidate`, `lastRoundApproved`, `nebulae`, `scores` | - |
//! | `oraclesByValidator` | consul |
//! | `oraclesByNebula`, `bftOraclesByNebula`, `oraclesNebulaIndex`, `nebulaInfo`, `nebulaCustomParams` | chain, nebula |
//! | `roundHeight` | chain, round |
//! | `commitHash`, `reveal`, `result` | chain, nebula, height, oracle |
//! | `reveals`, `results` | chain, nebula, height |
//! | `signConsuls` | chain, round (consul optional) |
//! | `signOracles` | chain, nebula, round (consul optional) |

use super::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use shared_types::{ChainRegistry, ChainType, ConsulPubKey, NebulaId, OraclesPubKey};
use std::fmt;
use std::str::FromStr;

/// Named query paths.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryPath {
    /// Active consul set.
    Consuls,
    /// Next consul set.
    ConsulsCandidate,
    /// Highest approved round.
    LastRoundApproved,
    /// Every registered feed.
    Nebulae,
    /// Every validator score.
    Scores,
    /// A validator's per-chain keys.
    OraclesByValidator,
    /// Every oracle of a feed.
    OraclesByNebula,
    /// Active window of a feed.
    BftOraclesByNebula,
    /// Rotation index of a feed.
    OraclesNebulaIndex,
    /// Feed registration.
    NebulaInfo,
    /// Opaque feed parameters.
    NebulaCustomParams,
    /// External height of a round.
    RoundHeight,
    /// One oracle's commit.
    CommitHash,
    /// Reveal of one oracle.
    Reveal,
    /// Every reveal of a pulse.
    Reveals,
    /// One oracle's result signature.
    Result,
    /// Every result signature of a pulse.
    Results,
    /// Consul-set signatures of a round.
    SignConsuls,
    /// Oracle-set signatures of a round.
    SignOracles,
}

impl QueryPath {
    /// Every path.
    pub const ALL: [QueryPath; 19] = [
        QueryPath::Consuls,
        QueryPath::ConsulsCandidate,
        QueryPath::LastRoundApproved,
        QueryPath::Nebulae,
        QueryPath::Scores,
        QueryPath::OraclesByValidator,
        QueryPath::OraclesByNebula,
        QueryPath::BftOraclesByNebula,
        QueryPath::OraclesNebulaIndex,
        QueryPath::NebulaInfo,
        QueryPath::NebulaCustomParams,
        QueryPath::RoundHeight,
        QueryPath::CommitHash,
        QueryPath::Reveal,
        QueryPath::Reveals,
        QueryPath::Result,
        QueryPath::Results,
        QueryPath::SignConsuls,
        QueryPath::SignOracles,
    ];

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryPath::Consuls => "consuls",
            QueryPath::ConsulsCandidate => "consulsCandidate",
            QueryPath::LastRoundApproved => "lastRoundApproved",
            QueryPath::Nebulae => "nebulae",
            QueryPath::Scores => "scores",
            QueryPath::OraclesByValidator => "oraclesByValidator",
            QueryPath::OraclesByNebula => "oraclesByNebula",
            QueryPath::BftOraclesByNebula => "bftOraclesByNebula",
            QueryPath::OraclesNebulaIndex => "oraclesNebulaIndex",
            QueryPath::NebulaInfo => "nebulaInfo",
            QueryPath::NebulaCustomParams => "nebulaCustomParams",
            QueryPath::RoundHeight => "roundHeight",
            QueryPath::CommitHash => "commitHash",
            QueryPath::Reveal => "reveal",
            QueryPath::Reveals => "reveals",
            QueryPath::Result => "result",
            QueryPath::Results => "results",
            QueryPath::SignConsuls => "signConsuls",
            QueryPath::SignOracles => "signOracles",
        }
    }
}

impl fmt::Display for QueryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryPath {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let path = s.trim_start_matches('/');
        QueryPath::ALL
            .into_iter()
            .find(|p| p.as_str() == path)
            .ok_or_else(|| AppError::Query(format!("unknown path {}", s)))
    }
}

/// Query arguments. Keys, ids and hashes are hex.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryArgs {
    /// Chain name.
    pub chain: Option<String>,
    /// Feed id.
    pub nebula: Option<String>,
    /// Pulse height.
    pub height: Option<u64>,
    /// Rotation round.
    pub round: Option<u64>,
    /// Validator identity.
    pub consul: Option<String>,
    /// Oracle key.
    pub oracle: Option<String>,
}

fn missing(name: &str) -> AppError {
    AppError::Query(format!("missing argument {}", name))
}

fn unhex(name: &str, value: &str) -> AppResult<Vec<u8>> {
    hex::decode(value.trim_start_matches("0x"))
        .map_err(|e| AppError::Query(format!("{}: {}", name, e)))
}

impl QueryArgs {
    /// Decode a request body. An empty body means no arguments.
    pub fn parse(data: &[u8]) -> AppResult<Self> {
        if data.is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_slice(data).map_err(|e| AppError::Query(e.to_string()))
    }

    /// Chain by registered name.
    pub fn chain(&self) -> AppResult<ChainType> {
        let name = self.chain.as_deref().ok_or_else(|| missing("chain"))?;
        Ok(ChainRegistry::global().chain(name)?)
    }

    /// Feed id.
    pub fn nebula(&self) -> AppResult<NebulaId> {
        let value = self.nebula.as_deref().ok_or_else(|| missing("nebula"))?;
        Ok(NebulaId::new(unhex("nebula", value)?))
    }

    /// Pulse height.
    pub fn height(&self) -> AppResult<u64> {
        self.height.ok_or_else(|| missing("height"))
    }

    /// Rotation round.
    pub fn round(&self) -> AppResult<u64> {
        self.round.ok_or_else(|| missing("round"))
    }

    /// Validator identity, if given.
    pub fn consul_opt(&self) -> AppResult<Option<ConsulPubKey>> {
        match self.consul.as_deref() {
            Some(value) => Ok(Some(ConsulPubKey::from_slice(&unhex("consul", value)?)?)),
            None => Ok(None),
        }
    }

    /// Validator identity.
    pub fn consul(&self) -> AppResult<ConsulPubKey> {
        self.consul_opt()?.ok_or_else(|| missing("consul"))
    }

    /// Oracle key.
    pub fn oracle(&self) -> AppResult<OraclesPubKey> {
        let value = self.oracle.as_deref().ok_or_else(|| missing("oracle"))?;
        Ok(OraclesPubKey::from_slice(&unhex("oracle", value)?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_round_trip_names() {
        for path in QueryPath::ALL {
            assert_eq!(path.as_str().parse::<QueryPath>().unwrap(), path);
        }
        assert_eq!("/consuls".parse::<QueryPath>().unwrap(), QueryPath::Consuls);
        assert!("nope".parse::<QueryPath>().is_err());
    }

    #[test]
    fn test_args_decode() {
        let args = QueryArgs::parse(
            br#"{"chain":"waves","nebula":"0xabcd","height":7,"consul":"0101010101010101010101010101010101010101010101010101010101010101"}"#,
        )
        .unwrap();
        assert_eq!(args.chain().unwrap(), ChainType::WAVES);
        assert_eq!(args.nebula().unwrap(), NebulaId::new(vec![0xab, 0xcd]));
        assert_eq!(args.height().unwrap(), 7);
        assert_eq!(args.consul().unwrap(), ConsulPubKey([1; 32]));
        assert!(matches!(args.round(), Err(AppError::Query(_))));
        assert!(QueryArgs::parse(b"").unwrap().chain.is_none());
    }
}
