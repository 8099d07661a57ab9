//! # Gravity Application
//!
//! The state machine behind the ordering engine. The engine drives it
//! through the block lifecycle; the application owns the store and the
//! rotation scheduler and hands both to each call explicitly.
//!
//! ```text
//! InitChain ──→ BeginBlock(h) ──→ DeliverTx* ──→ EndBlock(h) ──→ Commit ──┐
//!                    ↑                                                     │
//!                    └─────────────────────────────────────────────────────┘
//! ```
//!
//! Writes stay pending until `Commit`. A failed `Commit` is fatal.

use crate::domain::{
    validator_diff, AppError, AppResult, Genesis, QueryArgs, QueryPath, TxResult, ValidatorUpdate,
};
use crate::handlers::{self, TxContext};
use crate::metrics;
use gc_02_ledger_store::{LedgerRead, LedgerStore};
use gc_05_rotation_scheduler::{top_consuls, RotationOutcome, Scheduler};
use serde::Serialize;
use shared_types::{Consul, Hash, Transaction};
use tracing::{debug, error, info, warn};

/// What `EndBlock` reports.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EndBlockOutcome {
    /// Rotation step, at rotation heights.
    pub rotation: Option<RotationOutcome>,
    /// Power changes if `Consuls` changed in this block.
    pub validator_updates: Vec<ValidatorUpdate>,
}

/// Replicated application shell.
pub struct GravityApp {
    store: LedgerStore,
    scheduler: Scheduler,
    height: u64,
    block_consuls: Vec<Consul>,
}

impl GravityApp {
    /// Wrap a store. Resumes from the store's last committed height.
    pub fn new(store: LedgerStore, scheduler: Scheduler) -> AppResult<Self> {
        let height = store.committed().last_height()?;
        Ok(Self {
            store,
            scheduler,
            height,
            block_consuls: Vec::new(),
        })
    }

    /// Committed and pending state.
    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    /// Height of the current or last block.
    pub fn height(&self) -> u64 {
        self.height
    }

    /// Rotation scheduler.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Chained digest of committed state.
    pub fn app_hash(&self) -> Hash {
        self.store.app_hash()
    }

    /// Seed the ledger. Returns the initial validator set.
    pub fn init_chain(&mut self, genesis: &Genesis) -> AppResult<Vec<ValidatorUpdate>> {
        genesis.validate()?;
        let scores: Vec<_> = genesis
            .validators
            .iter()
            .map(|v| (v.consul, v.score))
            .collect();
        let consuls = top_consuls(&scores, self.scheduler.config().consul_count);

        for validator in &genesis.validators {
            self.store.set_score(&validator.consul, validator.score)?;
            if !validator.oracles.is_empty() {
                self.store
                    .set_oracles_by_validator(&validator.consul, &validator.oracles)?;
            }
        }
        for feed in &genesis.feeds {
            self.store.set_nebula_info(&feed.info)?;
            self.store
                .set_oracles_by_nebula(feed.info.chain, &feed.info.nebula, &feed.oracles)?;
        }
        self.store.set_consuls(&consuls)?;
        self.store.set_last_round_approved(0)?;
        self.store.set_last_height(0)?;
        let hash = self.store.commit().map_err(AppError::Commit)?;

        info!(
            "[gc-06] genesis: {} validators, {} consuls, {} feeds, app hash {}",
            genesis.validators.len(),
            consuls.len(),
            genesis.feeds.len(),
            hex::encode(hash)
        );
        Ok(validator_diff(&[], &consuls))
    }

    /// Start block `height`.
    pub fn begin_block(&mut self, height: u64) -> AppResult<()> {
        if self.store.pending_len() > 0 {
            warn!("[gc-06] discarding {} uncommitted writes", self.store.pending_len());
            self.store.discard();
        }
        self.height = height;
        self.block_consuls = self.store.consuls()?;
        debug!("[gc-06] begin block {}", height);
        Ok(())
    }

    /// Apply one transaction. Never fails; rejections carry a code.
    pub fn deliver_tx(&mut self, bytes: &[u8]) -> TxResult {
        let tx = match Transaction::from_bytes(bytes) {
            Ok(tx) => tx,
            Err(e) => return self.reject(None, "unknown", AppError::from(e)),
        };
        let kind = format!("{:?}", tx.kind);
        if let Err(e) = tx.verify() {
            return self.reject(Some(tx.id), &kind, AppError::from(e));
        }

        let ctx = TxContext {
            height: self.height,
            round: self.scheduler.round_at(self.height),
        };
        match handlers::apply(&mut self.store, &ctx, &tx) {
            Ok(()) => {
                metrics::record_tx(&kind, "ok");
                debug!("[gc-06] {} {} applied", kind, hex::encode(tx.id));
                TxResult::ok(tx.id)
            }
            Err(e) => self.reject(Some(tx.id), &kind, e),
        }
    }

    fn reject(&self, id: Option<Hash>, kind: &str, err: AppError) -> TxResult {
        metrics::record_tx(kind, err.kind());
        debug!("[gc-06] {} rejected at height {}: {}", kind, self.height, err);
        TxResult::rejected(id, &err)
    }

    /// Close block `height`: run rotation and report validator changes.
    pub fn end_block(&mut self, height: u64) -> AppResult<EndBlockOutcome> {
        self.store.set_last_height(height)?;
        let rotation = self.scheduler.end_block(&mut self.store, height)?;
        let consuls = self.store.consuls()?;
        let validator_updates = validator_diff(&self.block_consuls, &consuls);
        if !validator_updates.is_empty() {
            metrics::record_validator_updates(validator_updates.len());
            info!(
                "[gc-06] block {}: {} validator power changes",
                height,
                validator_updates.len()
            );
        }
        Ok(EndBlockOutcome {
            rotation,
            validator_updates,
        })
    }

    /// Persist the block. Errors here are fatal.
    pub fn commit(&mut self) -> AppResult<Hash> {
        match self.store.commit() {
            Ok(hash) => {
                metrics::record_block_committed();
                debug!("[gc-06] block {} committed, app hash {}", self.height, hex::encode(hash));
                Ok(hash)
            }
            Err(e) => {
                error!("[gc-06] commit of block {} failed: {}", self.height, e);
                Err(AppError::Commit(e))
            }
        }
    }

    /// Read committed state under `path`.
    pub fn query(&self, path: &str, data: &[u8]) -> AppResult<Vec<u8>> {
        let path: QueryPath = path.parse()?;
        let args = QueryArgs::parse(data)?;
        let view = self.store.committed();
        match path {
            QueryPath::Consuls => json(&view.consuls()?),
            QueryPath::ConsulsCandidate => json(&view.consuls_candidate()?),
            QueryPath::LastRoundApproved => json(&view.last_round_approved()?),
            QueryPath::Nebulae => json(&view.nebulae()?),
            QueryPath::Scores => json(&view.scores()?),
            QueryPath::OraclesByValidator => json(&view.oracles_by_validator(&args.consul()?)?),
            QueryPath::OraclesByNebula => {
                json(&view.oracles_by_nebula(args.chain()?, &args.nebula()?)?)
            }
            QueryPath::BftOraclesByNebula => {
                json(&view.bft_oracles_by_nebula(args.chain()?, &args.nebula()?)?)
            }
            QueryPath::OraclesNebulaIndex => {
                json(&view.oracles_nebula_index(args.chain()?, &args.nebula()?)?)
            }
            QueryPath::NebulaInfo => json(&view.nebula_info(args.chain()?, &args.nebula()?)?),
            QueryPath::NebulaCustomParams => json(
                &view
                    .nebula_custom_params(args.chain()?, &args.nebula()?)?
                    .map(hex::encode),
            ),
            QueryPath::RoundHeight => json(&view.round_height(args.chain()?, args.round()?)?),
            QueryPath::CommitHash => json(&view.commit_hash(
                args.chain()?,
                &args.nebula()?,
                args.height()?,
                &args.oracle()?,
            )?),
            QueryPath::Reveal => json(&view.reveal(
                args.chain()?,
                &args.nebula()?,
                args.height()?,
                &args.oracle()?,
            )?),
            QueryPath::Reveals => {
                json(&view.reveals(args.chain()?, &args.nebula()?, args.height()?)?)
            }
            QueryPath::Result => json(&view.result(
                args.chain()?,
                &args.nebula()?,
                args.height()?,
                &args.oracle()?,
            )?),
            QueryPath::Results => {
                let results = view.results(args.chain()?, &args.nebula()?, args.height()?)?;
                json(&results.into_iter().collect::<Vec<_>>())
            }
            QueryPath::SignConsuls => match args.consul_opt()? {
                Some(consul) => json(&view.sign_consuls(args.chain()?, args.round()?, &consul)?),
                None => {
                    let all = view.sign_consuls_all(args.chain()?, args.round()?)?;
                    json(&all.into_iter().collect::<Vec<_>>())
                }
            },
            QueryPath::SignOracles => {
                let (chain, nebula, round) = (args.chain()?, args.nebula()?, args.round()?);
                match args.consul_opt()? {
                    Some(consul) => json(&view.sign_oracles(chain, &nebula, round, &consul)?),
                    None => {
                        let all = view.sign_oracles_all(chain, &nebula, round)?;
                        json(&all.into_iter().collect::<Vec<_>>())
                    }
                }
            }
        }
    }
}

fn json<T: Serialize + ?Sized>(value: &T) -> AppResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| AppError::Query(e.to_string()))
}
