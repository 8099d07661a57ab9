//! # Key Schema
//!
//! Every key is a namespace token joined with `_` to one or more parts:
//! chain name, decimal height or round, chain-encoded nebula id, hex key.
//! None of the parts can contain `_` (chain names are validated by the
//! registry; hex and base58 have no underscore), so prefixes are exact.
//!
//! | Key | Value |
//! |-----|-------|
//! | `consuls` | `Vec<Consul>` |
//! | `consulsCandidate` | `Vec<Consul>` |
//! | `lastRoundApproved` | `u64` |
//! | `score_<consul>` | `u64` |
//! | `vote_<consul>` | `Vec<Vote>` |
//! | `oraclesByValidator_<consul>` | `BTreeMap<ChainType, OraclesPubKey>` |
//! | `oraclesByNebula_<chain>_<nebula>` | `Vec<OraclesPubKey>` |
//! | `bftOraclesByNebula_<chain>_<nebula>` | `Vec<OraclesPubKey>` |
//! | `oraclesNebulaIndex_<chain>_<nebula>` | `u64` |
//! | `nebulaInfo_<chain>_<nebula>` | `NebulaInfo` |
//! | `nebulaCustomParams_<chain>_<nebula>` | opaque bytes |
//! | `roundHeight_<chain>_<round>` | `u64` |
//! | `commit_<chain>_<nebula>_<height>_<oracle>` | `Hash` |
//! | `reveal_<chain>_<nebula>_<height>_<oracle>` | raw value bytes |
//! | `signResult_<chain>_<nebula>_<height>_<oracle>` | `Signature` |
//! | `signConsuls_<chain>_<round>_<consul>` | `Signature` |
//! | `signOracles_<chain>_<nebula>_<round>_<consul>` | `Signature` |

use super::errors::StoreResult;
use shared_types::{ChainType, ConsulPubKey, NebulaId, OraclesPubKey};

/// Separator between key parts.
pub const SEPARATOR: &str = "_";

/// Active consul set.
pub const CONSULS: &str = "consuls";
/// Next consul set.
pub const CONSULS_CANDIDATE: &str = "consulsCandidate";
/// Highest round synchronized on every chain.
pub const LAST_ROUND_APPROVED: &str = "lastRoundApproved";
/// Chained digest of every committed batch.
pub const APP_HASH: &str = "appHash";
/// Last committed block height.
pub const LAST_HEIGHT: &str = "lastHeight";

/// Namespace: validator score.
pub const SCORE: &str = "score";
/// Namespace: votes cast by a validator.
pub const VOTE: &str = "vote";
/// Namespace: a validator's per-chain keys.
pub const ORACLES_BY_VALIDATOR: &str = "oraclesByValidator";
/// Namespace: every oracle of a feed.
pub const ORACLES_BY_NEBULA: &str = "oraclesByNebula";
/// Namespace: active signing window of a feed.
pub const BFT_ORACLES_BY_NEBULA: &str = "bftOraclesByNebula";
/// Namespace: rotation index of a feed's window.
pub const ORACLES_NEBULA_INDEX: &str = "oraclesNebulaIndex";
/// Namespace: feed registration.
pub const NEBULA_INFO: &str = "nebulaInfo";
/// Namespace: opaque feed parameters.
pub const NEBULA_CUSTOM_PARAMS: &str = "nebulaCustomParams";
/// Namespace: round to external height binding.
pub const ROUND_HEIGHT: &str = "roundHeight";
/// Namespace: commit hashes.
pub const COMMIT: &str = "commit";
/// Namespace: revealed values.
pub const REVEAL: &str = "reveal";
/// Namespace: result signatures.
pub const SIGN_RESULT: &str = "signResult";
/// Namespace: consul set signatures.
pub const SIGN_CONSULS: &str = "signConsuls";
/// Namespace: oracle set signatures.
pub const SIGN_ORACLES: &str = "signOracles";

fn join(parts: &[&str]) -> String {
    parts.join(SEPARATOR)
}

fn feed(chain: ChainType, nebula: &NebulaId) -> StoreResult<String> {
    Ok(join(&[chain.name()?, &nebula.encode(chain)?]))
}

/// `score_<consul>`
pub fn score(consul: &ConsulPubKey) -> String {
    join(&[SCORE, &consul.to_hex()])
}

/// `vote_<consul>`
pub fn vote(consul: &ConsulPubKey) -> String {
    join(&[VOTE, &consul.to_hex()])
}

/// `oraclesByValidator_<consul>`
pub fn oracles_by_validator(consul: &ConsulPubKey) -> String {
    join(&[ORACLES_BY_VALIDATOR, &consul.to_hex()])
}

/// `oraclesByNebula_<chain>_<nebula>`
pub fn oracles_by_nebula(chain: ChainType, nebula: &NebulaId) -> StoreResult<String> {
    Ok(join(&[ORACLES_BY_NEBULA, &feed(chain, nebula)?]))
}

/// `bftOraclesByNebula_<chain>_<nebula>`
pub fn bft_oracles_by_nebula(chain: ChainType, nebula: &NebulaId) -> StoreResult<String> {
    Ok(join(&[BFT_ORACLES_BY_NEBULA, &feed(chain, nebula)?]))
}

/// `oraclesNebulaIndex_<chain>_<nebula>`
pub fn oracles_nebula_index(chain: ChainType, nebula: &NebulaId) -> StoreResult<String> {
    Ok(join(&[ORACLES_NEBULA_INDEX, &feed(chain, nebula)?]))
}

/// `nebulaInfo_<chain>_<nebula>`
pub fn nebula_info(chain: ChainType, nebula: &NebulaId) -> StoreResult<String> {
    Ok(join(&[NEBULA_INFO, &feed(chain, nebula)?]))
}

/// `nebulaCustomParams_<chain>_<nebula>`
pub fn nebula_custom_params(chain: ChainType, nebula: &NebulaId) -> StoreResult<String> {
    Ok(join(&[NEBULA_CUSTOM_PARAMS, &feed(chain, nebula)?]))
}

/// `roundHeight_<chain>_<round>`
pub fn round_height(chain: ChainType, round: u64) -> StoreResult<String> {
    Ok(join(&[ROUND_HEIGHT, chain.name()?, &round.to_string()]))
}

fn pulse_prefix(ns: &str, chain: ChainType, nebula: &NebulaId, height: u64) -> StoreResult<String> {
    let mut prefix = join(&[ns, &feed(chain, nebula)?, &height.to_string()]);
    prefix.push_str(SEPARATOR);
    Ok(prefix)
}

/// `commit_<chain>_<nebula>_<height>_<oracle>`
pub fn commit(
    chain: ChainType,
    nebula: &NebulaId,
    height: u64,
    oracle: &OraclesPubKey,
) -> StoreResult<String> {
    Ok(pulse_prefix(COMMIT, chain, nebula, height)? + &oracle.to_hex())
}

/// `reveal_<chain>_<nebula>_<height>_` prefix of every reveal of a pulse.
pub fn reveal_prefix(chain: ChainType, nebula: &NebulaId, height: u64) -> StoreResult<String> {
    pulse_prefix(REVEAL, chain, nebula, height)
}

/// `reveal_<chain>_<nebula>_<height>_<oracle>`
pub fn reveal(
    chain: ChainType,
    nebula: &NebulaId,
    height: u64,
    oracle: &OraclesPubKey,
) -> StoreResult<String> {
    Ok(reveal_prefix(chain, nebula, height)? + &oracle.to_hex())
}

/// `signResult_<chain>_<nebula>_<height>_` prefix of every result of a pulse.
pub fn result_prefix(chain: ChainType, nebula: &NebulaId, height: u64) -> StoreResult<String> {
    pulse_prefix(SIGN_RESULT, chain, nebula, height)
}

/// `signResult_<chain>_<nebula>_<height>_<oracle>`
pub fn result(
    chain: ChainType,
    nebula: &NebulaId,
    height: u64,
    oracle: &OraclesPubKey,
) -> StoreResult<String> {
    Ok(result_prefix(chain, nebula, height)? + &oracle.to_hex())
}

/// `signConsuls_<chain>_<round>_` prefix.
pub fn sign_consuls_prefix(chain: ChainType, round: u64) -> StoreResult<String> {
    let mut prefix = join(&[SIGN_CONSULS, chain.name()?, &round.to_string()]);
    prefix.push_str(SEPARATOR);
    Ok(prefix)
}

/// `signConsuls_<chain>_<round>_<consul>`
pub fn sign_consuls(chain: ChainType, round: u64, consul: &ConsulPubKey) -> StoreResult<String> {
    Ok(sign_consuls_prefix(chain, round)? + &consul.to_hex())
}

/// `signOracles_<chain>_<nebula>_<round>_` prefix.
pub fn sign_oracles_prefix(chain: ChainType, nebula: &NebulaId, round: u64) -> StoreResult<String> {
    pulse_prefix(SIGN_ORACLES, chain, nebula, round)
}

/// `signOracles_<chain>_<nebula>_<round>_<consul>`
pub fn sign_oracles(
    chain: ChainType,
    nebula: &NebulaId,
    round: u64,
    consul: &ConsulPubKey,
) -> StoreResult<String> {
    Ok(sign_oracles_prefix(chain, nebula, round)? + &consul.to_hex())
}

/// Text after the last separator (the hex suffix of scanned keys).
pub fn last_part(key: &str) -> &str {
    key.rsplit(SEPARATOR).next().unwrap_or(key)
}
