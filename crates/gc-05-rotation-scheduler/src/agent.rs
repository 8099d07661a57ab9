//! # Sync Agent
//!
//! The asynchronous half of the scheduler, one per validator process.
//! Carries each round's new consul and oracle sets from the ledger to
//! every target chain.
//!
//! ```text
//! every consul      : sign candidate set ──→ SignNewConsuls
//!                     sign feed windows  ──→ SignNewOracles
//! round sender only : ≥ ceil(2n/3) signatures ──→ set_oracles_to_nebula
//!                                             ──→ send_consuls_to_gravity_contract
//!                     consuls on every chain  ──→ ApproveLastRound
//! ```
//!
//! Chain state is re-read right before each publish, so a tick can be
//! repeated freely. Failures are scoped to one chain or feed and retried
//! on the next tick.

use crate::domain::{
    round_sender, FeedSnapshot, SchedulerConfig, SchedulerResult, SyncSnapshot, SyncState,
    SyncTracker,
};
use crate::metrics;
use crate::ports::SyncLedger;
use ed25519_dalek::SigningKey;
use gc_01_chain_adaptor::{bft_threshold, AdaptorSet, ChainAdaptor, RetryPolicy, SignatureBatch};
use shared_types::{
    ChainType, ConsulPubKey, NebulaId, OraclesPubKey, Signature, Transaction, TxArg, TxKind,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// What was signed in-process, so a lagging snapshot does not sign twice.
type SignedKey = (u64, ChainType, Option<NebulaId>);

/// Per-validator rotation publisher.
pub struct SyncAgent {
    config: SchedulerConfig,
    retry: RetryPolicy,
    ledger: Arc<dyn SyncLedger>,
    adaptors: AdaptorSet,
    consul_key: SigningKey,
    me: ConsulPubKey,
    tracker: SyncTracker,
    signed: BTreeSet<SignedKey>,
    approvals: BTreeSet<u64>,
}

impl SyncAgent {
    /// Create an agent. `consul_key` signs ledger transactions.
    pub fn new(
        config: SchedulerConfig,
        ledger: Arc<dyn SyncLedger>,
        adaptors: AdaptorSet,
        consul_key: SigningKey,
    ) -> SchedulerResult<Self> {
        config.validate()?;
        let me = ConsulPubKey(consul_key.verifying_key().to_bytes());
        Ok(Self {
            retry: config.retry(),
            config,
            ledger,
            adaptors,
            consul_key,
            me,
            tracker: SyncTracker::new(),
            signed: BTreeSet::new(),
            approvals: BTreeSet::new(),
        })
    }

    /// This validator's ledger identity.
    pub fn consul(&self) -> ConsulPubKey {
        self.me
    }

    /// Sync progress of a round on a chain.
    pub fn state(&self, round: u64, chain: ChainType) -> SyncState {
        self.tracker.state(round, chain)
    }

    /// Run one pass over every chain. Returns the observed round.
    pub async fn tick(&mut self) -> SchedulerResult<u64> {
        let chains = self.adaptors.chains();
        let snapshot = self
            .ledger
            .snapshot(self.config.score_interval, &chains)
            .await?;
        let round = snapshot.round;

        if snapshot.last_round_approved >= round {
            for chain in &chains {
                self.tracker.advance(round, *chain, SyncState::Approved);
            }
        } else if snapshot.consul_index(&self.me).is_some() {
            let sender = round_sender(round, &snapshot.consuls).map(|c| c.pub_key) == Some(self.me);
            for chain in &chains {
                if let Err(e) = self.sync_chain(&snapshot, *chain, sender).await {
                    metrics::record_sync_error(e.kind());
                    warn!(
                        "[gc-05] {} round {} sync failed, retrying next tick: {}",
                        chain, round, e
                    );
                }
            }
            if sender {
                if let Err(e) = self.approve(&snapshot).await {
                    metrics::record_sync_error(e.kind());
                    warn!("[gc-05] approving round {} failed: {}", round, e);
                }
            }
        } else {
            debug!("[gc-05] not a consul in round {}", round);
        }

        let keep = round.saturating_sub(1);
        self.tracker.prune_before(keep);
        self.signed.retain(|(r, _, _)| *r >= keep);
        self.approvals.retain(|r| *r >= keep);
        Ok(round)
    }

    /// Poll until `shutdown` flips to `true` or its sender is dropped.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "[gc-05] sync loop started for {} chains",
            self.adaptors.len()
        );
        let interval = self.config.poll_interval();
        loop {
            if *shutdown.borrow() {
                break;
            }
            if let Err(e) = self.tick().await {
                metrics::record_sync_error(e.kind());
                warn!("[gc-05] tick failed: {}", e);
            }
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = tokio::time::sleep(interval) => {}
            }
        }
        info!("[gc-05] sync loop stopped");
    }

    async fn sync_chain(
        &mut self,
        snapshot: &SyncSnapshot,
        chain: ChainType,
        sender: bool,
    ) -> SchedulerResult<()> {
        let adaptor = Arc::clone(self.adaptors.get(chain)?);
        let round = snapshot.round;
        let candidate = snapshot.candidate_keys(chain);
        if candidate.is_empty() {
            debug!("[gc-05] {} has no candidate keys for round {}", chain, round);
            return Ok(());
        }

        self.sign_consuls(snapshot, chain, adaptor.as_ref(), &candidate)
            .await?;
        let feeds = snapshot.feeds.get(&chain).cloned().unwrap_or_default();
        for feed in feeds.iter().filter(|f| !f.oracles.is_empty()) {
            if let Err(e) = self.sign_oracles(round, chain, adaptor.as_ref(), feed).await {
                metrics::record_sync_error(e.kind());
                warn!(
                    "[gc-05] {} feed {} signing failed: {}",
                    chain,
                    hex_id(&feed.info.nebula),
                    e
                );
            }
        }
        self.tracker
            .advance(round, chain, SyncState::SignaturesCollecting);

        if !sender {
            return Ok(());
        }
        // Oracle sets first: their signatures are checked against the
        // consul set the chain holds before this round's rotation.
        for feed in feeds.iter().filter(|f| !f.oracles.is_empty()) {
            if let Err(e) = self
                .publish_oracles(snapshot, chain, adaptor.as_ref(), feed)
                .await
            {
                metrics::record_sync_error(e.kind());
                warn!(
                    "[gc-05] {} feed {} oracle rotation failed: {}",
                    chain,
                    hex_id(&feed.info.nebula),
                    e
                );
            }
        }
        self.publish_consuls(snapshot, chain, adaptor.as_ref(), &candidate)
            .await
    }

    async fn sign_consuls(
        &mut self,
        snapshot: &SyncSnapshot,
        chain: ChainType,
        adaptor: &dyn ChainAdaptor,
        candidate: &[OraclesPubKey],
    ) -> SchedulerResult<()> {
        let round = snapshot.round;
        let key = (round, chain, None);
        let on_ledger = snapshot
            .consul_signatures
            .get(&chain)
            .is_some_and(|s| s.contains_key(&self.me));
        if on_ledger || self.signed.contains(&key) {
            return Ok(());
        }

        let signature = self
            .retry
            .bounded("sign_consuls", adaptor.sign_consuls(candidate, round))
            .await?;
        self.send(
            TxKind::SignNewConsuls,
            vec![chain.code().into(), round.into(), signature.0.into()],
        )
        .await?;
        self.signed.insert(key);
        metrics::record_signature("consuls");
        info!(
            "[gc-05] {} round {} signed {} candidate consuls",
            chain,
            round,
            candidate.len()
        );
        Ok(())
    }

    async fn sign_oracles(
        &mut self,
        round: u64,
        chain: ChainType,
        adaptor: &dyn ChainAdaptor,
        feed: &FeedSnapshot,
    ) -> SchedulerResult<()> {
        let nebula = &feed.info.nebula;
        let key = (round, chain, Some(nebula.clone()));
        if feed.signatures.contains_key(&self.me) || self.signed.contains(&key) {
            return Ok(());
        }

        let signature = self
            .retry
            .bounded(
                "sign_oracles",
                adaptor.sign_oracles(nebula, &feed.oracles, round),
            )
            .await?;
        self.send(
            TxKind::SignNewOracles,
            vec![
                chain.code().into(),
                nebula.as_bytes().into(),
                round.into(),
                signature.0.into(),
            ],
        )
        .await?;
        self.signed.insert(key);
        metrics::record_signature("oracles");
        debug!(
            "[gc-05] {} round {} signed oracle window of feed {}",
            chain,
            round,
            hex_id(nebula)
        );
        Ok(())
    }

    /// Consul signatures from the ledger, aligned with the chain's seats.
    fn consul_batch(
        snapshot: &SyncSnapshot,
        chain: ChainType,
        signatures: &BTreeMap<ConsulPubKey, Signature>,
        sig_len: usize,
    ) -> SignatureBatch {
        let mut batch = SignatureBatch::new(snapshot.signer_seats(chain), sig_len);
        for (consul, signature) in signatures {
            if let Some(key) = snapshot.key_of(consul, chain) {
                batch.insert(&key, signature.clone());
            }
        }
        batch
    }

    async fn publish_consuls(
        &mut self,
        snapshot: &SyncSnapshot,
        chain: ChainType,
        adaptor: &dyn ChainAdaptor,
        candidate: &[OraclesPubKey],
    ) -> SchedulerResult<()> {
        let round = snapshot.round;
        if self
            .retry
            .bounded("round_exist", adaptor.round_exist(round))
            .await?
        {
            self.tracker.advance(round, chain, SyncState::ThresholdMet);
            return Ok(());
        }

        let signatures = snapshot
            .consul_signatures
            .get(&chain)
            .cloned()
            .unwrap_or_default();
        let batch = Self::consul_batch(snapshot, chain, &signatures, adaptor.signature_len());
        let threshold = bft_threshold(snapshot.consuls.len());
        if !batch.meets(threshold) {
            debug!(
                "[gc-05] {} round {} has {}/{} consul signatures, waiting",
                chain,
                round,
                batch.present_count(),
                threshold
            );
            return Ok(());
        }

        let tx = self
            .retry
            .bounded(
                "send_consuls",
                adaptor.send_consuls_to_gravity_contract(candidate, &batch, round),
            )
            .await?;
        adaptor.wait_tx(&tx, &self.retry).await?;
        metrics::record_publication("consuls");
        self.tracker.advance(round, chain, SyncState::ThresholdMet);
        info!(
            "[gc-05] {} round {} consul set published with {} signatures",
            chain,
            round,
            batch.present_count()
        );
        Ok(())
    }

    async fn publish_oracles(
        &mut self,
        snapshot: &SyncSnapshot,
        chain: ChainType,
        adaptor: &dyn ChainAdaptor,
        feed: &FeedSnapshot,
    ) -> SchedulerResult<()> {
        let round = snapshot.round;
        let nebula = &feed.info.nebula;
        if self
            .retry
            .bounded(
                "oracles_round_exist",
                adaptor.oracles_round_exist(nebula, round),
            )
            .await?
        {
            return Ok(());
        }

        let batch = Self::consul_batch(snapshot, chain, &feed.signatures, adaptor.signature_len());
        let threshold = bft_threshold(snapshot.consuls.len());
        if !batch.meets(threshold) {
            debug!(
                "[gc-05] {} feed {} has {}/{} oracle-set signatures, waiting",
                chain,
                hex_id(nebula),
                batch.present_count(),
                threshold
            );
            return Ok(());
        }

        let tx = self
            .retry
            .bounded(
                "set_oracles",
                adaptor.set_oracles_to_nebula(nebula, &feed.oracles, &batch, round),
            )
            .await?;
        adaptor.wait_tx(&tx, &self.retry).await?;
        metrics::record_publication("oracles");
        info!(
            "[gc-05] {} round {} feed {} oracle window of {} published",
            chain,
            round,
            hex_id(nebula),
            feed.oracles.len()
        );
        Ok(())
    }

    /// Send `ApproveLastRound` once every chain records the round's consul set.
    async fn approve(&mut self, snapshot: &SyncSnapshot) -> SchedulerResult<()> {
        let round = snapshot.round;
        if self.approvals.contains(&round) {
            return Ok(());
        }
        for (chain, adaptor) in self.adaptors.iter() {
            if snapshot.candidate_keys(*chain).is_empty() {
                return Ok(());
            }
            if !self
                .retry
                .bounded("round_exist", adaptor.round_exist(round))
                .await?
            {
                debug!("[gc-05] round {} not yet recorded on {}", round, chain);
                return Ok(());
            }
        }

        self.send(TxKind::ApproveLastRound, vec![round.into()])
            .await?;
        self.approvals.insert(round);
        metrics::record_publication("approval");
        info!("[gc-05] round {} synchronized on every chain, approval sent", round);
        Ok(())
    }

    async fn send(&self, kind: TxKind, args: Vec<TxArg>) -> SchedulerResult<()> {
        let tx = Transaction::new_signed(kind, args, &self.consul_key)?;
        self.ledger.broadcast(tx).await
    }
}

fn hex_id(nebula: &NebulaId) -> String {
    hex::encode(nebula.as_bytes())
}
