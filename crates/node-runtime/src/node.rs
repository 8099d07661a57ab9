//! # Devnet Node
//!
//! Wires one validator: the ledger application behind [`LocalLedger`], the
//! oracle loop, the sync agent, and one simulated target chain per
//! `[[chains]]` entry. A timer produces ledger blocks and mines one
//! external block per ledger block.
//!
//! ```text
//!            ┌──────────── block timer ────────────┐
//!            ↓                                     ↓
//!   LocalLedger::produce_block            SimulatedChain::advance
//!      ↑ broadcast      ↑ broadcast
//!   OracleNode       SyncAgent ──────→ ChainAdaptor (per chain)
//! ```

use crate::config::NodeConfig;
use crate::ledger::LocalLedger;
use anyhow::{Context, Result};
use ed25519_dalek::SigningKey;
use gc_01_chain_adaptor::{AdaptorSet, ChainAdaptor, SimulatedAdaptor, SimulatedChain};
use gc_02_ledger_store::{open_kv, LedgerStore};
use gc_04_oracle_round::{DataExtractor, FixedExtractor, HttpExtractor, OracleNode};
use gc_05_rotation_scheduler::{Scheduler, SyncAgent};
use gc_06_ledger_app::{AppError, GravityApp};
use shared_types::{ConsulPubKey, OraclesPubKey, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// A fully wired single-validator node.
pub struct Node {
    config: NodeConfig,
    ledger: Arc<LocalLedger>,
    chains: Vec<SimulatedChain>,
    oracle: OracleNode,
    agent: SyncAgent,
}

impl Node {
    /// Build every component and seed genesis.
    pub fn build(config: NodeConfig) -> Result<Self> {
        config.validate()?;
        let consul_key = SigningKey::from_bytes(&config.consul_seed()?);
        let me = ConsulPubKey(consul_key.verifying_key().to_bytes());
        let chain_seed = config.chain_key_seed()?;

        let mut chains = Vec::new();
        let mut adaptors = AdaptorSet::new();
        let mut my_keys: BTreeMap<_, OraclesPubKey> = BTreeMap::new();
        for chain in config.chain_types()? {
            let simulated = SimulatedChain::new(chain);
            let adaptor = SimulatedAdaptor::from_seed(simulated.clone(), &chain_seed)
                .with_context(|| format!("adaptor for {}", chain))?;
            my_keys.insert(chain, adaptor.pub_key());
            adaptors.insert(Arc::new(adaptor))?;
            chains.push(simulated);
        }

        let genesis = config.genesis(me, &my_keys)?;
        for simulated in &chains {
            let consul_keys: Vec<_> = genesis
                .validators
                .iter()
                .filter_map(|v| v.oracles.get(&simulated.chain()).copied())
                .take(config.rotation.consul_count)
                .collect();
            simulated.set_consuls(consul_keys);
        }
        for ((info, value_type), feed) in config.feeds(me)?.into_iter().zip(&genesis.feeds) {
            if let Some(simulated) = chains.iter().find(|c| c.chain() == info.chain) {
                simulated.deploy_nebula(
                    info.nebula.clone(),
                    value_type,
                    info.bft_value as usize,
                    feed.oracles.clone(),
                );
            }
        }

        let store = LedgerStore::new(open_kv(&config.ledger())?)?;
        let scheduler = Scheduler::new(config.scheduler())?;
        let ledger = Arc::new(LocalLedger::new(GravityApp::new(store, scheduler)?));
        if ledger.init(&genesis)? {
            info!(
                "[node] genesis: {} validators, {} feeds",
                genesis.validators.len(),
                genesis.feeds.len()
            );
        }

        let extractor: Arc<dyn DataExtractor> = match &config.extractor.url {
            Some(url) => Arc::new(HttpExtractor::new(
                url.clone(),
                Duration::from_millis(config.extractor.timeout_ms),
            )?),
            None => Arc::new(FixedExtractor::new(Value::Int64(config.extractor.fixed_value))),
        };
        let mut oracle = OracleNode::new(
            config.oracle(),
            ledger.clone(),
            adaptors.clone(),
            consul_key.clone(),
        )?;
        for feed in &genesis.feeds {
            oracle.add_feed(feed.info.chain, feed.info.nebula.clone(), extractor.clone())?;
        }
        let agent = SyncAgent::new(config.scheduler(), ledger.clone(), adaptors, consul_key)?;

        info!(
            "[node] validator {} serving {} feeds on {} chains",
            me,
            genesis.feeds.len(),
            chains.len()
        );
        Ok(Self {
            config,
            ledger,
            chains,
            oracle,
            agent,
        })
    }

    /// Shared ledger handle.
    pub fn ledger(&self) -> Arc<LocalLedger> {
        self.ledger.clone()
    }

    /// Simulated chains, in `[[chains]]` order.
    pub fn chains(&self) -> &[SimulatedChain] {
        &self.chains
    }

    /// Run until `shutdown` flips. A fatal application error stops the
    /// block loop and is returned. Either way the oracle loop and the sync
    /// agent are told to stop and awaited before this returns.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let Node {
            config,
            ledger,
            chains,
            oracle,
            agent,
        } = self;

        let (stop_tx, stop_rx) = watch::channel(false);
        let tasks: Vec<(&str, JoinHandle<()>)> = vec![
            ("oracle loop", tokio::spawn(oracle.run(stop_rx.clone()))),
            ("sync loop", tokio::spawn(agent.run(stop_rx))),
        ];

        let mut timer = tokio::time::interval(Duration::from_millis(config.timing.block_time_ms));
        let outcome = loop {
            tokio::select! {
                _ = timer.tick() => {
                    match produce(&ledger, &chains) {
                        Ok(()) => {}
                        Err(e) if e.is_fatal() => {
                            error!("[node] fatal: {}", e);
                            break Err(anyhow::Error::new(e).context("block production stopped"));
                        }
                        Err(e) => error!("[node] block failed: {}", e),
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("[node] shutdown signal received");
                        break Ok(());
                    }
                }
            }
        };

        let _ = stop_tx.send(true);
        for (name, task) in tasks {
            if let Err(e) = task.await {
                error!("[node] {} ended abnormally: {}", name, e);
            }
        }
        info!("[node] all loops stopped");
        outcome
    }
}

fn produce(ledger: &LocalLedger, chains: &[SimulatedChain]) -> Result<(), AppError> {
    for chain in chains {
        chain.advance(1);
    }
    let block = ledger.produce_block()?;
    if !block.validator_updates.is_empty() {
        info!(
            "[node] block {}: {} validator updates",
            block.height,
            block.validator_updates.len()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gc_02_ledger_store::LedgerRead;
    use shared_types::{ChainType, NebulaId};

    fn config() -> NodeConfig {
        let mut config = NodeConfig::from_toml(
            r#"
            [timing]
            block_time_ms = 20
            poll_interval_ms = 5
            score_interval = 10
            confirm_interval_ms = 5

            [extractor]
            fixed_value = 42

            [[chains]]
            name = "ethereum"

            [[nebulae]]
            chain = "ethereum"
            nebula = "0xfeed"
            "#,
        )
        .unwrap();
        config.telemetry.console_output = false;
        config
    }

    #[test]
    fn test_build_seeds_genesis_and_chain() {
        let node = Node::build(config()).unwrap();
        let chain = &node.chains()[0];
        assert_eq!(chain.consuls().len(), 1);
        let contract = chain.nebula(&NebulaId::new(vec![0xfe, 0xed])).unwrap();
        assert_eq!(contract.oracles, chain.consuls());

        let consuls = node.ledger().read(|view| view.consuls()).unwrap();
        assert_eq!(consuls.len(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_awaits_both_loops() {
        let node = Node::build(config()).unwrap();
        let ledger = node.ledger();
        assert!(Arc::strong_count(&ledger) > 2);

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(node.run(rx));
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();
        handle.await.unwrap().unwrap();

        assert_eq!(Arc::strong_count(&ledger), 1);
    }

    #[tokio::test]
    async fn test_devnet_delivers_pulses() {
        let node = Node::build(config()).unwrap();
        let chain = node.chains()[0].clone();
        let ledger = node.ledger();
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(node.run(rx));

        let nebula = NebulaId::new(vec![0xfe, 0xed]);
        let mut delivered = false;
        for _ in 0..200 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            if chain
                .nebula(&nebula)
                .map(|c| !c.delivered.is_empty())
                .unwrap_or(false)
            {
                delivered = true;
                break;
            }
        }
        tx.send(true).unwrap();
        handle.await.unwrap().unwrap();

        assert!(delivered, "no pulse after {} blocks", ledger.height());
        // Both loops ran to completion and released their ledger handles.
        assert_eq!(Arc::strong_count(&ledger), 1);
        let contract = chain.nebula(&nebula).unwrap();
        assert_eq!(contract.delivered[0].1, Value::Int64(42));
        assert_eq!(chain.chain(), ChainType::ETHEREUM);
    }
}
