//! # Transaction Handlers
//!
//! One handler per [`TxKind`]. Every handler validates first and stages
//! its writes last, so a rejected transaction leaves the pending state
//! untouched.
//!
//! ## Authorization
//!
//! | Kind | Sender must |
//! |------|-------------|
//! | `AddOracle`, `Vote`, `SetNebula` | be a known validator (has a score) |
//! | `AddOracleInNebula` | own the key on that chain and score >= feed `min_score` |
//! | `NewRound` | own a key on that chain |
//! | `Commit`, `Reveal`, `Result` | own the oracle key, which is in the feed's active window |
//! | `SignNewConsuls`, `SignNewOracles` | be a consul, for the current round |
//! | `ApproveLastRound` | be the round's sender, `LastRoundApproved < round <= current` |
//! | `DropNebula`, `SetNebulaCustomParams` | own the feed |

use crate::domain::{AppError, AppResult};
use gc_02_ledger_store::{LedgerRead, LedgerStore, NebulaInfo};
use gc_05_rotation_scheduler::round_sender;
use shared_types::{
    sha256, ChainType, ConsulPubKey, Hash, NebulaId, OraclesPubKey, Signature, Transaction,
    TxKind, Vote,
};
use tracing::debug;

/// Block context a transaction is applied in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TxContext {
    /// Height of the block being built.
    pub height: u64,
    /// Rotation round of that height.
    pub round: u64,
}

/// Apply one verified transaction to the pending state.
pub fn apply(store: &mut LedgerStore, ctx: &TxContext, tx: &Transaction) -> AppResult<()> {
    match tx.kind {
        TxKind::AddOracle => add_oracle(store, tx),
        TxKind::AddOracleInNebula => add_oracle_in_nebula(store, tx),
        TxKind::NewRound => new_round(store, tx),
        TxKind::Commit => commit(store, tx),
        TxKind::Reveal => reveal(store, tx),
        TxKind::Result => result(store, tx),
        TxKind::Vote => vote(store, tx),
        TxKind::SignNewConsuls => sign_new_consuls(store, ctx, tx),
        TxKind::SignNewOracles => sign_new_oracles(store, ctx, tx),
        TxKind::ApproveLastRound => approve_last_round(store, ctx, tx),
        TxKind::SetNebula => set_nebula(store, tx),
        TxKind::DropNebula => drop_nebula(store, tx),
        TxKind::SetNebulaCustomParams => set_nebula_custom_params(store, tx),
    }
}

// =============================================================================
// ARGUMENTS
// =============================================================================

fn chain_arg(tx: &Transaction, index: usize) -> AppResult<ChainType> {
    let chain = ChainType(tx.arg_byte(index)?);
    // Unknown codes fail here rather than when rendered into a key.
    chain.name()?;
    Ok(chain)
}

fn nebula_arg(tx: &Transaction, index: usize) -> AppResult<NebulaId> {
    let bytes = tx.arg_bytes(index)?;
    if bytes.is_empty() {
        return Err(AppError::Rejected("empty nebula id".into()));
    }
    Ok(NebulaId::new(bytes))
}

fn oracle_arg(tx: &Transaction, index: usize) -> AppResult<OraclesPubKey> {
    Ok(OraclesPubKey::from_slice(tx.arg_bytes(index)?)?)
}

fn hash_arg(tx: &Transaction, index: usize) -> AppResult<Hash> {
    tx.arg_bytes(index)?
        .try_into()
        .map_err(|_| AppError::Rejected(format!("argument {} is not a 32-byte hash", index)))
}

fn signature_arg(tx: &Transaction, index: usize) -> AppResult<Signature> {
    let bytes = tx.arg_bytes(index)?;
    if bytes.is_empty() {
        return Err(AppError::Rejected("empty signature".into()));
    }
    Ok(Signature(bytes.to_vec()))
}

// =============================================================================
// GUARDS
// =============================================================================

fn require_validator(store: &LedgerStore, sender: &ConsulPubKey) -> AppResult<u64> {
    store
        .score(sender)?
        .ok_or_else(|| AppError::Unauthorized(format!("{} is not a validator", sender)))
}

fn require_consul(store: &LedgerStore, sender: &ConsulPubKey) -> AppResult<()> {
    if store.consuls()?.iter().any(|c| c.pub_key == *sender) {
        Ok(())
    } else {
        Err(AppError::Unauthorized(format!("{} is not a consul", sender)))
    }
}

fn require_round(ctx: &TxContext, round: u64) -> AppResult<()> {
    if round == ctx.round {
        Ok(())
    } else {
        Err(AppError::Rejected(format!(
            "round {} is not the current round {}",
            round, ctx.round
        )))
    }
}

fn require_feed(store: &LedgerStore, chain: ChainType, nebula: &NebulaId) -> AppResult<NebulaInfo> {
    store
        .nebula_info(chain, nebula)?
        .ok_or_else(|| AppError::Rejected(format!("feed {} is not registered", hex::encode(nebula.as_bytes()))))
}

fn require_owner(info: &NebulaInfo, sender: &ConsulPubKey) -> AppResult<()> {
    if info.owner == *sender {
        Ok(())
    } else {
        Err(AppError::Unauthorized(format!("{} does not own the feed", sender)))
    }
}

/// The sender's key on `chain`, which must equal `oracle`.
fn require_own_key(
    store: &LedgerStore,
    sender: &ConsulPubKey,
    chain: ChainType,
    oracle: &OraclesPubKey,
) -> AppResult<()> {
    match store.oracles_by_validator(sender)?.get(&chain) {
        Some(key) if key == oracle => Ok(()),
        _ => Err(AppError::Unauthorized(format!(
            "oracle {} is not registered to {} on {}",
            oracle.to_hex(),
            sender,
            chain
        ))),
    }
}

/// Oracle-protocol submissions: own key, in the active window.
fn require_active_oracle(
    store: &LedgerStore,
    tx: &Transaction,
    chain: ChainType,
    nebula: &NebulaId,
    oracle: &OraclesPubKey,
) -> AppResult<()> {
    require_feed(store, chain, nebula)?;
    require_own_key(store, &tx.sender, chain, oracle)?;
    if store.bft_oracles_by_nebula(chain, nebula)?.contains(oracle) {
        Ok(())
    } else {
        Err(AppError::Unauthorized(format!(
            "oracle {} is not in the active window",
            oracle.to_hex()
        )))
    }
}

// =============================================================================
// ORACLE REGISTRATION
// =============================================================================

fn add_oracle(store: &mut LedgerStore, tx: &Transaction) -> AppResult<()> {
    let chain = chain_arg(tx, 0)?;
    let oracle = oracle_arg(tx, 1)?;
    require_validator(store, &tx.sender)?;

    let mut keys = store.oracles_by_validator(&tx.sender)?;
    keys.insert(chain, oracle);
    store.set_oracles_by_validator(&tx.sender, &keys)?;
    debug!("[gc-06] {} registered {} key {}", tx.sender, chain, oracle.to_hex());
    Ok(())
}

fn add_oracle_in_nebula(store: &mut LedgerStore, tx: &Transaction) -> AppResult<()> {
    let chain = chain_arg(tx, 0)?;
    let nebula = nebula_arg(tx, 1)?;
    let oracle = oracle_arg(tx, 2)?;
    let info = require_feed(store, chain, &nebula)?;
    require_own_key(store, &tx.sender, chain, &oracle)?;
    let score = require_validator(store, &tx.sender)?;
    if score < info.min_score {
        return Err(AppError::Rejected(format!(
            "score {} below feed minimum {}",
            score, info.min_score
        )));
    }

    let mut oracles = store.oracles_by_nebula(chain, &nebula)?;
    if oracles.contains(&oracle) {
        return Err(AppError::Duplicate(format!("oracle {} already in feed", oracle.to_hex())));
    }
    oracles.push(oracle);
    store.set_oracles_by_nebula(chain, &nebula, &oracles)?;
    Ok(())
}

// =============================================================================
// ORACLE PROTOCOL
// =============================================================================

fn new_round(store: &mut LedgerStore, tx: &Transaction) -> AppResult<()> {
    let chain = chain_arg(tx, 0)?;
    let round = tx.arg_int(1)?;
    let external = tx.arg_int(2)?;
    if !store.oracles_by_validator(&tx.sender)?.contains_key(&chain) {
        return Err(AppError::Unauthorized(format!(
            "{} has no key on {}",
            tx.sender, chain
        )));
    }
    // First binding wins; later ones are accepted as no-ops.
    if store.round_height(chain, round)?.is_some() {
        debug!("[gc-06] {} round {} already bound", chain, round);
        return Ok(());
    }
    store.put_round_height(chain, round, external)?;
    debug!("[gc-06] {} round {} bound to height {}", chain, round, external);
    Ok(())
}

fn commit(store: &mut LedgerStore, tx: &Transaction) -> AppResult<()> {
    let chain = chain_arg(tx, 0)?;
    let nebula = nebula_arg(tx, 1)?;
    let height = tx.arg_int(2)?;
    let commit = hash_arg(tx, 3)?;
    let oracle = oracle_arg(tx, 4)?;
    require_active_oracle(store, tx, chain, &nebula, &oracle)?;
    store.put_commit(chain, &nebula, height, &oracle, &commit)?;
    Ok(())
}

fn reveal(store: &mut LedgerStore, tx: &Transaction) -> AppResult<()> {
    let chain = chain_arg(tx, 0)?;
    let nebula = nebula_arg(tx, 1)?;
    let height = tx.arg_int(2)?;
    let commit = hash_arg(tx, 3)?;
    let value = tx.arg_bytes(4)?.to_vec();
    let oracle = oracle_arg(tx, 5)?;
    require_active_oracle(store, tx, chain, &nebula, &oracle)?;

    match store.commit_hash(chain, &nebula, height, &oracle)? {
        Some(recorded) if recorded == commit => {}
        Some(_) => return Err(AppError::Rejected("reveal does not match the oracle's commit".into())),
        None => return Err(AppError::Rejected(format!("no commit for pulse {}", height))),
    }
    if sha256(&value) != commit {
        return Err(AppError::Rejected("revealed value does not hash to the commit".into()));
    }
    store.put_reveal(chain, &nebula, height, &oracle, value)?;
    Ok(())
}

fn result(store: &mut LedgerStore, tx: &Transaction) -> AppResult<()> {
    let chain = chain_arg(tx, 0)?;
    let nebula = nebula_arg(tx, 1)?;
    let height = tx.arg_int(2)?;
    let signature = signature_arg(tx, 3)?;
    let oracle = oracle_arg(tx, 4)?;
    require_active_oracle(store, tx, chain, &nebula, &oracle)?;
    store.put_result(chain, &nebula, height, &oracle, &signature)?;
    Ok(())
}

// =============================================================================
// REPUTATION AND ROTATION
// =============================================================================

fn vote(store: &mut LedgerStore, tx: &Transaction) -> AppResult<()> {
    require_validator(store, &tx.sender)?;
    if tx.args.len() % 2 != 0 {
        return Err(AppError::Rejected("votes come in (target, score) pairs".into()));
    }
    let mut ballot = Vec::with_capacity(tx.args.len() / 2);
    for pair in 0..tx.args.len() / 2 {
        let target = ConsulPubKey::from_slice(tx.arg_bytes(2 * pair)?)?;
        let score = tx.arg_int(2 * pair + 1)?;
        ballot.push(Vote { target, score });
    }
    store.put_votes(&tx.sender, &ballot)?;
    Ok(())
}

fn sign_new_consuls(store: &mut LedgerStore, ctx: &TxContext, tx: &Transaction) -> AppResult<()> {
    let chain = chain_arg(tx, 0)?;
    let round = tx.arg_int(1)?;
    let signature = signature_arg(tx, 2)?;
    require_consul(store, &tx.sender)?;
    require_round(ctx, round)?;
    store.put_sign_consuls(chain, round, &tx.sender, &signature)?;
    Ok(())
}

fn sign_new_oracles(store: &mut LedgerStore, ctx: &TxContext, tx: &Transaction) -> AppResult<()> {
    let chain = chain_arg(tx, 0)?;
    let nebula = nebula_arg(tx, 1)?;
    let round = tx.arg_int(2)?;
    let signature = signature_arg(tx, 3)?;
    require_consul(store, &tx.sender)?;
    require_round(ctx, round)?;
    require_feed(store, chain, &nebula)?;
    store.put_sign_oracles(chain, &nebula, round, &tx.sender, &signature)?;
    Ok(())
}

fn approve_last_round(store: &mut LedgerStore, ctx: &TxContext, tx: &Transaction) -> AppResult<()> {
    let round = tx.arg_int(0)?;
    let consuls = store.consuls()?;
    match round_sender(round, &consuls) {
        Some(sender) if sender.pub_key == tx.sender => {}
        _ => {
            return Err(AppError::Unauthorized(format!(
                "{} is not the sender of round {}",
                tx.sender, round
            )))
        }
    }
    let last = store.last_round_approved()?;
    if round <= last || round > ctx.round {
        return Err(AppError::Rejected(format!(
            "round {} outside ({}, {}]",
            round, last, ctx.round
        )));
    }
    store.set_last_round_approved(round)?;
    debug!("[gc-06] round {} approved", round);
    Ok(())
}

// =============================================================================
// FEED REGISTRY
// =============================================================================

fn set_nebula(store: &mut LedgerStore, tx: &Transaction) -> AppResult<()> {
    let chain = chain_arg(tx, 0)?;
    let nebula = nebula_arg(tx, 1)?;
    let max_pulses_per_block = tx.arg_int(2)?;
    let min_score = tx.arg_int(3)?;
    let bft_value = tx.arg_int(4)?;
    require_validator(store, &tx.sender)?;
    if bft_value == 0 {
        return Err(AppError::Rejected("bft value must be > 0".into()));
    }
    if let Some(existing) = store.nebula_info(chain, &nebula)? {
        require_owner(&existing, &tx.sender)?;
    }
    store.set_nebula_info(&NebulaInfo {
        chain,
        nebula,
        max_pulses_per_block,
        min_score,
        bft_value,
        owner: tx.sender,
    })?;
    Ok(())
}

fn drop_nebula(store: &mut LedgerStore, tx: &Transaction) -> AppResult<()> {
    let chain = chain_arg(tx, 0)?;
    let nebula = nebula_arg(tx, 1)?;
    let info = require_feed(store, chain, &nebula)?;
    require_owner(&info, &tx.sender)?;
    store.drop_nebula(chain, &nebula)?;
    Ok(())
}

fn set_nebula_custom_params(store: &mut LedgerStore, tx: &Transaction) -> AppResult<()> {
    let chain = chain_arg(tx, 0)?;
    let nebula = nebula_arg(tx, 1)?;
    let params = tx.arg_bytes(2)?.to_vec();
    let info = require_feed(store, chain, &nebula)?;
    require_owner(&info, &tx.sender)?;
    store.set_nebula_custom_params(chain, &nebula, params)?;
    Ok(())
}
