//! # Oracle Node
//!
//! One polling loop per oracle process. Each tick reads the ledger
//! height, derives the sub-round, and advances every served feed by at
//! most one step. Every submission is guarded by a ledger lookup, so a
//! tick can be repeated any number of times without side effects.
//!
//! ```text
//! tick ──→ height ──→ SubRound::at ──┬─ Commit   : extract, send sha256(value)
//!                                    ├─ Reveal   : send value behind own commit
//!                                    ├─ Result   : aggregate reveals, sign, send
//!                                    └─ Finalize : submitter publishes the pulse
//! ```
//!
//! Failures are scoped to one feed and retried on the next tick.

use crate::domain::{
    aggregate, pulse_round, result_hash, FeedKey, OracleConfig, OracleError, OracleResult,
    RoundArena, SubRound,
};
use crate::metrics;
use crate::ports::{DataExtractor, LedgerClient};
use ed25519_dalek::SigningKey;
use gc_01_chain_adaptor::{AdaptorError, AdaptorSet, ChainAdaptor, RetryPolicy, SignatureBatch};
use shared_types::{
    ChainType, Hash, NebulaId, OraclesPubKey, Transaction, TxArg, TxKind, Value,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// A feed served by this node.
#[derive(Clone)]
pub struct Feed {
    /// Chain and contract.
    pub key: FeedKey,
    /// Where values come from.
    pub extractor: Arc<dyn DataExtractor>,
}

/// The commit-reveal-result state machine for every served feed.
pub struct OracleNode {
    config: OracleConfig,
    retry: RetryPolicy,
    ledger: Arc<dyn LedgerClient>,
    adaptors: AdaptorSet,
    consul_key: SigningKey,
    feeds: Vec<Feed>,
    arena: RoundArena,
    announced: BTreeSet<(ChainType, u64)>,
    pushes: JoinSet<()>,
}

impl OracleNode {
    /// Create a node. `consul_key` signs ledger transactions.
    pub fn new(
        config: OracleConfig,
        ledger: Arc<dyn LedgerClient>,
        adaptors: AdaptorSet,
        consul_key: SigningKey,
    ) -> OracleResult<Self> {
        config.validate()?;
        Ok(Self {
            retry: config.retry(),
            config,
            ledger,
            adaptors,
            consul_key,
            feeds: Vec::new(),
            arena: RoundArena::new(),
            announced: BTreeSet::new(),
            pushes: JoinSet::new(),
        })
    }

    /// Serve a feed. The chain must have an adaptor.
    pub fn add_feed(
        &mut self,
        chain: ChainType,
        nebula: NebulaId,
        extractor: Arc<dyn DataExtractor>,
    ) -> OracleResult<()> {
        self.adaptors.get(chain)?;
        self.feeds.push(Feed {
            key: FeedKey::new(chain, nebula),
            extractor,
        });
        Ok(())
    }

    /// Served feeds.
    pub fn feeds(&self) -> impl Iterator<Item = &FeedKey> {
        self.feeds.iter().map(|f| &f.key)
    }

    /// In-memory round progress.
    pub fn arena(&self) -> &RoundArena {
        &self.arena
    }

    /// Run one pass over every feed. Returns the observed ledger height.
    pub async fn tick(&mut self) -> OracleResult<u64> {
        let height = self.ledger.height().await?;
        let bps = self.config.blocks_per_sub_round;
        let sub_round = SubRound::at(height, bps);
        let round = pulse_round(height, bps);

        for feed in self.feeds.clone() {
            if let Err(e) = self.step(&feed, round, sub_round).await {
                metrics::record_round_error(e.kind());
                warn!(
                    "[gc-04] {} feed {} round {} {} failed, retrying next tick: {}",
                    feed.key.chain,
                    hex::encode(feed.key.nebula.as_bytes()),
                    round,
                    sub_round,
                    e
                );
            }
        }

        let evicted = self.arena.evict_stale(self.config.arena_horizon);
        if evicted > 0 {
            debug!("[gc-04] evicted {} stale rounds", evicted);
        }
        self.announced.retain(|(_, r)| *r >= round);
        while self.pushes.try_join_next().is_some() {}
        Ok(height)
    }

    /// Poll until `shutdown` flips to `true` or its sender is dropped.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!("[gc-04] oracle loop started for {} feeds", self.feeds.len());
        let interval = self.config.poll_interval();
        loop {
            if *shutdown.borrow() {
                break;
            }
            if let Err(e) = self.tick().await {
                metrics::record_round_error(e.kind());
                warn!("[gc-04] tick failed: {}", e);
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
        while self.pushes.join_next().await.is_some() {}
        info!("[gc-04] oracle loop stopped");
    }

    async fn step(&mut self, feed: &Feed, round: u64, sub_round: SubRound) -> OracleResult<()> {
        let chain = feed.key.chain;
        let nebula = &feed.key.nebula;
        let adaptor = Arc::clone(self.adaptors.get(chain)?);
        let me = adaptor.pub_key();

        let bft = self.ledger.bft_oracles(chain, nebula).await?;
        let Some(my_index) = bft.iter().position(|k| *k == me) else {
            debug!("[gc-04] {} not in the active set of feed {}", me.to_hex(), hex::encode(nebula.as_bytes()));
            return Ok(());
        };

        let mut bound = self.ledger.round_height(chain, round).await?;
        if bound.is_none() && sub_round == SubRound::Commit {
            self.announce_round(chain, round, adaptor.as_ref()).await?;
            bound = self.ledger.round_height(chain, round).await?;
        }
        let Some(pulse) = bound else {
            debug!("[gc-04] {} round {} has no external height yet", chain, round);
            return Ok(());
        };

        match sub_round {
            SubRound::Finalize => {
                if !self.arena.is_done(&feed.key, pulse) {
                    self.finalize(feed, pulse, &adaptor, &bft, my_index).await?;
                }
                self.announce_round(chain, round + 1, adaptor.as_ref()).await
            }
            _ if self.arena.is_done(&feed.key, pulse) => Ok(()),
            SubRound::Commit => self.commit(feed, pulse, adaptor.as_ref(), &me).await,
            SubRound::Reveal => self.reveal(feed, pulse, &me).await,
            SubRound::Result => self.result(feed, pulse, adaptor.as_ref(), &me).await,
        }
    }

    /// Bind `round` to the chain's current height unless already bound.
    async fn announce_round(
        &mut self,
        chain: ChainType,
        round: u64,
        adaptor: &dyn ChainAdaptor,
    ) -> OracleResult<()> {
        if self.announced.contains(&(chain, round))
            || self.ledger.round_height(chain, round).await?.is_some()
        {
            return Ok(());
        }
        let height = self.retry.bounded("get_height", adaptor.get_height()).await?;
        self.send(
            TxKind::NewRound,
            vec![chain.code().into(), round.into(), height.into()],
        )
        .await?;
        self.announced.insert((chain, round));
        debug!("[gc-04] {} round {} announced at external height {}", chain, round, height);
        Ok(())
    }

    async fn commit(
        &mut self,
        feed: &Feed,
        pulse: u64,
        adaptor: &dyn ChainAdaptor,
        me: &OraclesPubKey,
    ) -> OracleResult<()> {
        let (chain, nebula) = (feed.key.chain, &feed.key.nebula);
        if self.arena.entry(&feed.key, pulse).commit_sent {
            return Ok(());
        }
        if self.ledger.commit_hash(chain, nebula, pulse, me).await?.is_some() {
            debug!("[gc-04] commit for pulse {} already on ledger", pulse);
            self.arena.entry(&feed.key, pulse).commit_sent = true;
            return Ok(());
        }

        let value_type = self
            .retry
            .bounded("value_type", adaptor.value_type(nebula))
            .await?;
        let value = feed.extractor.extract(nebula, value_type).await?;
        let commit = result_hash(&value);
        self.send(
            TxKind::Commit,
            vec![
                chain.code().into(),
                nebula.as_bytes().into(),
                pulse.into(),
                commit.to_vec().into(),
                me.0.to_vec().into(),
            ],
        )
        .await?;
        metrics::record_submission(SubRound::Commit.as_str());
        info!("[gc-04] {} pulse {} committed {}", chain, pulse, hex::encode(commit));

        let state = self.arena.entry(&feed.key, pulse);
        state.value = Some(value);
        state.commit = Some(commit);
        state.commit_sent = true;
        Ok(())
    }

    async fn reveal(&mut self, feed: &Feed, pulse: u64, me: &OraclesPubKey) -> OracleResult<()> {
        let (chain, nebula) = (feed.key.chain, &feed.key.nebula);
        let Some(state) = self.arena.get(&feed.key, pulse) else {
            debug!("[gc-04] nothing committed for pulse {}", pulse);
            return Ok(());
        };
        if state.reveal_sent {
            return Ok(());
        }
        let (Some(commit), Some(value)) = (state.commit, state.value.clone()) else {
            debug!("[gc-04] raw value for pulse {} not held, skipping reveal", pulse);
            return Ok(());
        };

        if self.ledger.commit_hash(chain, nebula, pulse, me).await?.is_none() {
            debug!("[gc-04] commit for pulse {} not on ledger yet", pulse);
            return Ok(());
        }
        if self.ledger.reveal(chain, nebula, pulse, me).await?.is_none() {
            self.send(
                TxKind::Reveal,
                vec![
                    chain.code().into(),
                    nebula.as_bytes().into(),
                    pulse.into(),
                    commit.to_vec().into(),
                    value.encode().into(),
                    me.0.to_vec().into(),
                ],
            )
            .await?;
            metrics::record_submission(SubRound::Reveal.as_str());
            info!("[gc-04] {} pulse {} revealed {}", chain, pulse, value);
        }
        self.arena.entry(&feed.key, pulse).reveal_sent = true;
        Ok(())
    }

    /// Aggregate every reveal of a pulse into the value all oracles sign.
    async fn agreed_value(
        &self,
        feed: &Feed,
        pulse: u64,
        adaptor: &dyn ChainAdaptor,
    ) -> OracleResult<(Value, Hash)> {
        let (chain, nebula) = (feed.key.chain, &feed.key.nebula);
        let value_type = self
            .retry
            .bounded("value_type", adaptor.value_type(nebula))
            .await?;
        let reveals = self.ledger.reveals(chain, nebula, pulse).await?;
        let value = aggregate(value_type, pulse, &reveals)?;
        let hash = result_hash(&value);
        Ok((value, hash))
    }

    async fn result(
        &mut self,
        feed: &Feed,
        pulse: u64,
        adaptor: &dyn ChainAdaptor,
        me: &OraclesPubKey,
    ) -> OracleResult<()> {
        let (chain, nebula) = (feed.key.chain, &feed.key.nebula);
        if self.arena.entry(&feed.key, pulse).result_sent {
            return Ok(());
        }

        let (value, hash) = match self.agreed_value(feed, pulse, adaptor).await {
            Ok(agreed) => agreed,
            Err(OracleError::NoReveals(_)) => {
                debug!("[gc-04] no reveals for pulse {} yet", pulse);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        if self.ledger.result(chain, nebula, pulse, me).await?.is_none() {
            let signature = self.retry.bounded("sign", adaptor.sign(&hash)).await?;
            self.send(
                TxKind::Result,
                vec![
                    chain.code().into(),
                    nebula.as_bytes().into(),
                    pulse.into(),
                    signature.0.into(),
                    me.0.to_vec().into(),
                ],
            )
            .await?;
            metrics::record_submission(SubRound::Result.as_str());
            info!("[gc-04] {} pulse {} result {} signed", chain, pulse, value);
        }

        let state = self.arena.entry(&feed.key, pulse);
        state.result = Some((value, hash));
        state.result_sent = true;
        Ok(())
    }

    async fn finalize(
        &mut self,
        feed: &Feed,
        pulse: u64,
        adaptor: &Arc<dyn ChainAdaptor>,
        bft: &[OraclesPubKey],
        my_index: usize,
    ) -> OracleResult<()> {
        let (chain, nebula) = (feed.key.chain, &feed.key.nebula);
        if pulse % bft.len() as u64 != my_index as u64 {
            self.arena.finalize(&feed.key, pulse);
            return Ok(());
        }

        let Some(info) = self.ledger.nebula_info(chain, nebula).await? else {
            debug!("[gc-04] feed {} not registered", hex::encode(nebula.as_bytes()));
            return Ok(());
        };
        let (value, hash) = match self.arena.get(&feed.key, pulse).and_then(|s| s.result.clone()) {
            Some(agreed) => agreed,
            None => match self.agreed_value(feed, pulse, adaptor.as_ref()).await {
                Ok(agreed) => agreed,
                Err(OracleError::NoReveals(_)) => {
                    debug!("[gc-04] nothing to publish for pulse {}", pulse);
                    self.arena.finalize(&feed.key, pulse);
                    return Ok(());
                }
                Err(e) => return Err(e),
            },
        };

        let mut batch = SignatureBatch::new(bft.to_vec(), adaptor.signature_len());
        for (signer, signature) in self.ledger.results(chain, nebula, pulse).await? {
            batch.insert(&signer, signature);
        }
        let threshold = info.bft_value as usize;
        if !batch.meets(threshold) {
            debug!(
                "[gc-04] pulse {} has {}/{} signatures, waiting",
                pulse,
                batch.present_count(),
                threshold
            );
            return Ok(());
        }
        // The chain counts only signatures over the agreed hash. After a
        // refusal, resubmit only once more results have landed.
        let refused_with = self.arena.get(&feed.key, pulse).and_then(|s| s.refused_with);
        if refused_with.is_some_and(|n| batch.present_count() <= n) {
            debug!("[gc-04] pulse {} still short of valid signatures", pulse);
            return Ok(());
        }

        // Re-read immediately before submitting; another submitter may have won.
        let last = self
            .retry
            .bounded("last_pulse_id", adaptor.last_pulse_id(nebula))
            .await?;
        let pulse_id = last + 1;
        let submitted = self
            .retry
            .bounded("add_pulse", adaptor.add_pulse(nebula, pulse_id, hash, &batch))
            .await;
        let tx = match submitted {
            Ok(tx) => tx,
            Err(AdaptorError::Rejected { reason, .. }) => {
                metrics::record_round_error("threshold_miss");
                warn!(
                    "[gc-04] {} refused pulse {} with {} signatures, threshold miss: {}",
                    chain,
                    pulse,
                    batch.present_count(),
                    reason
                );
                self.arena.entry(&feed.key, pulse).refused_with = Some(batch.present_count());
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        adaptor.wait_tx(&tx, &self.retry).await?;
        metrics::record_pulse_published();
        info!(
            "[gc-04] {} pulse {} published as #{} with {} signatures",
            chain,
            pulse,
            pulse_id,
            batch.present_count()
        );

        let pusher = Arc::clone(adaptor);
        let target = nebula.clone();
        self.pushes.spawn(async move {
            if let Err(e) = pusher.send_value_to_subs(&target, pulse_id, &value).await {
                warn!("[gc-04] pushing pulse #{} to subscribers failed: {}", pulse_id, e);
            }
        });
        self.arena.finalize(&feed.key, pulse);
        Ok(())
    }

    async fn send(&self, kind: TxKind, args: Vec<TxArg>) -> OracleResult<()> {
        let tx = Transaction::new_signed(kind, args, &self.consul_key)?;
        self.ledger.broadcast(tx).await
    }
}
