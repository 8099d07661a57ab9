//! # Devnet Harness
//!
//! N validators over one [`LocalLedger`] and one simulated chain. Each
//! [`Devnet::step`] lets every validator run one oracle tick and one sync
//! tick against the last committed block, mines one external block and
//! produces the next ledger block from whatever was broadcast.
//!
//! Nothing runs on a timer, so every scenario is reproducible.

use ed25519_dalek::SigningKey;
use gc_01_chain_adaptor::{AdaptorSet, ChainAdaptor, SimulatedAdaptor, SimulatedChain};
use gc_02_ledger_store::{CommittedView, LedgerStore, NebulaInfo};
use gc_04_oracle_round::{FixedExtractor, OracleConfig, OracleNode};
use gc_05_rotation_scheduler::{Scheduler, SchedulerConfig, SyncAgent};
use gc_06_ledger_app::{Genesis, GenesisFeed, GenesisValidator, GravityApp};
use node_runtime::{BlockSummary, LocalLedger};
use shared_types::{
    ChainType, ConsulPubKey, NebulaId, OraclesPubKey, Transaction, TxArg, TxKind, Value, ValueType,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

pub const CHAIN: ChainType = ChainType::ETHEREUM;
pub const SCORE_INTERVAL: u64 = 10;

/// One validator process.
pub struct Validator {
    pub key: SigningKey,
    pub consul: ConsulPubKey,
    pub oracle_key: OraclesPubKey,
    pub oracle: OracleNode,
    pub agent: SyncAgent,
}

/// Shared ledger, shared chain, one feed.
pub struct Devnet {
    pub ledger: Arc<LocalLedger>,
    pub chain: SimulatedChain,
    pub nebula: NebulaId,
    pub validators: Vec<Validator>,
    /// Validators whose oracle loop is stopped.
    pub muted: BTreeSet<usize>,
}

/// Scenario knobs.
pub struct Scenario {
    /// Value each validator's extractor reports, one per validator.
    pub values: Vec<i64>,
    pub consul_count: usize,
    pub bft_value: u64,
}

impl Scenario {
    pub fn uniform(validators: usize, value: i64) -> Self {
        Self {
            values: vec![value; validators],
            consul_count: validators,
            bft_value: 2,
        }
    }
}

fn scheduler_config(consul_count: usize, oracle_window: usize) -> SchedulerConfig {
    SchedulerConfig {
        score_interval: SCORE_INTERVAL,
        consul_count,
        oracle_window,
        confirm_attempts: 2,
        confirm_interval_ms: 1,
        call_timeout_ms: 500,
        ..Default::default()
    }
}

fn oracle_config() -> OracleConfig {
    OracleConfig {
        blocks_per_sub_round: 1,
        poll_interval_ms: 5,
        arena_horizon: 64,
        confirm_attempts: 2,
        confirm_interval_ms: 1,
        call_timeout_ms: 500,
    }
}

impl Devnet {
    pub fn new(scenario: Scenario) -> Self {
        let chain = SimulatedChain::new(CHAIN);
        let nebula = NebulaId::new(vec![0xfe, 0xed]);
        let n = scenario.values.len();
        let scheduler = scheduler_config(scenario.consul_count, n);

        let members: Vec<(SigningKey, Arc<SimulatedAdaptor>)> = (1..=n as u8)
            .map(|i| {
                let key = SigningKey::from_bytes(&[i; 32]);
                let adaptor =
                    SimulatedAdaptor::from_seed(chain.clone(), &[i + 100; 32]).unwrap();
                (key, Arc::new(adaptor))
            })
            .collect();
        let consul_of = |key: &SigningKey| ConsulPubKey(key.verifying_key().to_bytes());
        let chain_keys: Vec<OraclesPubKey> = members.iter().map(|(_, a)| a.pub_key()).collect();

        let genesis = Genesis {
            validators: members
                .iter()
                .map(|(key, adaptor)| GenesisValidator {
                    consul: consul_of(key),
                    score: 100,
                    oracles: BTreeMap::from([(CHAIN, adaptor.pub_key())]),
                })
                .collect(),
            feeds: vec![GenesisFeed {
                info: NebulaInfo {
                    chain: CHAIN,
                    nebula: nebula.clone(),
                    max_pulses_per_block: 1,
                    min_score: 0,
                    bft_value: scenario.bft_value,
                    owner: consul_of(&members[0].0),
                },
                oracles: chain_keys.clone(),
            }],
        };
        chain.set_consuls(chain_keys.iter().take(scenario.consul_count).copied().collect());
        chain.deploy_nebula(
            nebula.clone(),
            ValueType::Int64,
            scenario.bft_value as usize,
            chain_keys.clone(),
        );

        let app = GravityApp::new(
            LedgerStore::in_memory(),
            Scheduler::new(scheduler.clone()).unwrap(),
        )
        .unwrap();
        let ledger = Arc::new(LocalLedger::new(app));
        assert!(ledger.init(&genesis).unwrap());

        let validators = members
            .into_iter()
            .zip(&scenario.values)
            .map(|((key, adaptor), value)| {
                let oracle_key = adaptor.pub_key();
                let adaptors = AdaptorSet::new().with(adaptor).unwrap();
                let mut oracle =
                    OracleNode::new(oracle_config(), ledger.clone(), adaptors.clone(), key.clone())
                        .unwrap();
                oracle
                    .add_feed(
                        CHAIN,
                        nebula.clone(),
                        Arc::new(FixedExtractor::new(Value::Int64(*value))),
                    )
                    .unwrap();
                let agent =
                    SyncAgent::new(scheduler.clone(), ledger.clone(), adaptors, key.clone())
                        .unwrap();
                Validator {
                    consul: consul_of(&key),
                    key,
                    oracle_key,
                    oracle,
                    agent,
                }
            })
            .collect();

        Self {
            ledger,
            chain,
            nebula,
            validators,
            muted: BTreeSet::new(),
        }
    }

    /// One block: every validator ticks, then the chain and the ledger advance.
    pub async fn step(&mut self) -> BlockSummary {
        for (index, validator) in self.validators.iter_mut().enumerate() {
            if !self.muted.contains(&index) {
                validator.oracle.tick().await.unwrap();
            }
            validator.agent.tick().await.unwrap();
        }
        self.chain.advance(1);
        self.ledger.produce_block().unwrap()
    }

    /// Step until the ledger reaches `height`.
    pub async fn run_to(&mut self, height: u64) {
        while self.ledger.height() < height {
            self.step().await;
        }
    }

    pub fn read<T>(&self, f: impl FnOnce(&CommittedView<'_>) -> T) -> T {
        self.ledger.read(f)
    }

    /// Queue a signed transaction from validator `index`.
    pub fn submit(&self, index: usize, kind: TxKind, args: Vec<TxArg>) {
        let tx = Transaction::new_signed(kind, args, &self.validators[index].key).unwrap();
        self.ledger.submit(tx.to_bytes().unwrap());
    }

    pub fn consul(&self, index: usize) -> ConsulPubKey {
        self.validators[index].consul
    }
}
