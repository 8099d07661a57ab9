//! # Node Configuration
//!
//! One TOML file, read once at startup, then `GC_*` environment overrides.
//! Everything is validated before any task starts.
//!
//! ```toml
//! [node]
//! consul_seed = "<64 hex>"
//! chain_key_seed = "<64 hex>"
//!
//! [timing]
//! block_time_ms = 500
//! score_interval = 20
//!
//! [[chains]]
//! name = "ethereum"
//! kind = "simulated"
//!
//! [[nebulae]]
//! chain = "ethereum"
//! nebula = "0xfeed"
//! value_type = "int64"
//!
//! [[genesis.validators]]
//! consul = "<64 hex>"
//! score = 100
//! ```

use gc_02_ledger_store::{LedgerConfig, NebulaInfo};
use gc_03_trust_score::TrustConfig;
use gc_04_oracle_round::OracleConfig;
use gc_05_rotation_scheduler::SchedulerConfig;
use gc_06_ledger_app::{Genesis, GenesisFeed, GenesisValidator};
use gravity_telemetry::TelemetryConfig;
use serde::{Deserialize, Serialize};
use shared_types::{ChainRegistry, ChainType, ConsulPubKey, NebulaId, OraclesPubKey, ValueType};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("Cannot read {path}: {message}")]
    Io {
        /// Offending path.
        path: String,
        /// OS error.
        message: String,
    },

    /// File is not valid TOML for [`NodeConfig`].
    #[error("Parse error: {0}")]
    Parse(String),

    /// A value is out of range or inconsistent.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Complete node configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Keys and storage.
    pub node: NodeSection,
    /// Block, poll and rotation timing.
    pub timing: TimingSection,
    /// Trust engine constants.
    pub trust: TrustConfig,
    /// Consul set and oracle window sizes.
    pub rotation: RotationSection,
    /// Data source.
    pub extractor: ExtractorSection,
    /// Target chains.
    pub chains: Vec<ChainSection>,
    /// Feeds this node serves.
    pub nebulae: Vec<NebulaSection>,
    /// Initial ledger state.
    pub genesis: GenesisSection,
    /// Logging.
    pub telemetry: TelemetryConfig,
}

/// `[node]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSection {
    /// Seed of the ed25519 ledger key, hex.
    pub consul_seed: String,
    /// Seed of the secp256k1 target-chain key, hex.
    pub chain_key_seed: String,
    /// RocksDB directory. In-memory when unset.
    pub data_dir: Option<String>,
    /// fsync every committed block.
    pub sync_writes: bool,
}

impl Default for NodeSection {
    fn default() -> Self {
        Self {
            consul_seed: hex::encode([1u8; 32]),
            chain_key_seed: hex::encode([2u8; 32]),
            data_dir: None,
            sync_writes: false,
        }
    }
}

/// `[timing]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSection {
    /// Devnet block interval.
    pub block_time_ms: u64,
    /// Sleep between oracle and sync ticks.
    pub poll_interval_ms: u64,
    /// Ledger blocks per rotation round.
    pub score_interval: u64,
    /// Ledger blocks per oracle sub-round.
    pub blocks_per_sub_round: u64,
    /// Pulse heights kept per feed.
    pub arena_horizon: u64,
    /// Confirmation polls for chain transactions.
    pub confirm_attempts: u32,
    /// Sleep between confirmation polls.
    pub confirm_interval_ms: u64,
    /// Upper bound on one chain call.
    pub call_timeout_ms: u64,
}

impl Default for TimingSection {
    fn default() -> Self {
        Self {
            block_time_ms: 500,
            poll_interval_ms: 100,
            score_interval: 20,
            blocks_per_sub_round: 1,
            arena_horizon: 64,
            confirm_attempts: 10,
            confirm_interval_ms: 200,
            call_timeout_ms: 5_000,
        }
    }
}

/// `[rotation]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationSection {
    /// Size of the consul set.
    pub consul_count: usize,
    /// Size of each feed's active oracle window.
    pub oracle_window: usize,
}

impl Default for RotationSection {
    fn default() -> Self {
        Self {
            consul_count: 5,
            oracle_window: 5,
        }
    }
}

/// `[extractor]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorSection {
    /// HTTP extractor base URL. A fixed value is served when unset.
    pub url: Option<String>,
    /// Request timeout.
    pub timeout_ms: u64,
    /// Value served without a URL.
    pub fixed_value: i64,
}

impl Default for ExtractorSection {
    fn default() -> Self {
        Self {
            url: None,
            timeout_ms: 2_000,
            fixed_value: 0,
        }
    }
}

/// `[[chains]]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSection {
    /// Registered chain name.
    pub name: String,
    /// Adaptor kind. Only `simulated` ships with the node.
    #[serde(default = "default_chain_kind")]
    pub kind: String,
}

fn default_chain_kind() -> String {
    "simulated".to_string()
}

/// `[[nebulae]]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NebulaSection {
    /// Chain name.
    pub chain: String,
    /// Contract id, hex.
    pub nebula: String,
    /// `int64`, `string` or `bytes`.
    #[serde(default = "default_value_type")]
    pub value_type: String,
    /// Signatures the contract requires.
    #[serde(default = "default_one")]
    pub bft_value: u64,
    /// Pulse cap per external block.
    #[serde(default = "default_one")]
    pub max_pulses_per_block: u64,
    /// Minimum score to join.
    #[serde(default)]
    pub min_score: u64,
}

fn default_value_type() -> String {
    "int64".to_string()
}

fn default_one() -> u64 {
    1
}

/// `[genesis]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenesisSection {
    /// Initial validators. Defaults to this node alone.
    pub validators: Vec<GenesisValidatorSection>,
}

/// `[[genesis.validators]]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisValidatorSection {
    /// Ledger key, hex.
    pub consul: String,
    /// Initial score.
    pub score: u64,
    /// Chain name to oracle key, hex.
    #[serde(default)]
    pub oracles: BTreeMap<String, String>,
}

impl NodeConfig {
    /// Read `path`, apply environment overrides and validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config = Self::from_toml(&content)?.with_env();
        config.validate()?;
        info!("[node] loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse without overrides or validation.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply `GC_*` environment overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(seed) = std::env::var("GC_CONSUL_SEED") {
            self.node.consul_seed = seed;
        }
        if let Ok(seed) = std::env::var("GC_CHAIN_KEY_SEED") {
            self.node.chain_key_seed = seed;
        }
        if let Ok(dir) = std::env::var("GC_DATA_DIR") {
            self.node.data_dir = Some(dir);
        }
        if let Ok(ms) = std::env::var("GC_BLOCK_TIME_MS") {
            match ms.parse() {
                Ok(v) => self.timing.block_time_ms = v,
                Err(_) => warn!("[node] ignoring GC_BLOCK_TIME_MS={}", ms),
            }
        }
        if let Ok(url) = std::env::var("GC_EXTRACTOR_URL") {
            self.extractor.url = Some(url);
        }
        self.telemetry = self.telemetry.with_env();
        self
    }

    /// Reject configurations the node cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        seed(&self.node.consul_seed, "node.consul_seed")?;
        seed(&self.node.chain_key_seed, "node.chain_key_seed")?;
        if self.timing.block_time_ms == 0 {
            return Err(ConfigError::Invalid("timing.block_time_ms must be > 0".into()));
        }
        self.scheduler()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.oracle()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.chains.is_empty() {
            return Err(ConfigError::Invalid("at least one [[chains]] entry is required".into()));
        }
        for chain in &self.chains {
            chain_by_name(&chain.name)?;
            if chain.kind != "simulated" {
                return Err(ConfigError::Invalid(format!(
                    "chain {}: unsupported adaptor kind {}",
                    chain.name, chain.kind
                )));
            }
        }
        for feed in &self.nebulae {
            if !self.chains.iter().any(|c| c.name == feed.chain) {
                return Err(ConfigError::Invalid(format!(
                    "feed {} is on {}, which has no [[chains]] entry",
                    feed.nebula, feed.chain
                )));
            }
            feed.value_type
                .parse::<ValueType>()
                .map_err(|e| ConfigError::Invalid(format!("feed {}: {}", feed.nebula, e)))?;
            nebula_id(&feed.nebula)?;
            if feed.bft_value == 0 {
                return Err(ConfigError::Invalid(format!("feed {}: bft_value must be > 0", feed.nebula)));
            }
        }
        for validator in &self.genesis.validators {
            consul_key(&validator.consul)?;
            for (chain, key) in &validator.oracles {
                chain_by_name(chain)?;
                oracle_key(key)?;
            }
        }
        Ok(())
    }

    /// ed25519 ledger key seed.
    pub fn consul_seed(&self) -> Result<[u8; 32], ConfigError> {
        seed(&self.node.consul_seed, "node.consul_seed")
    }

    /// secp256k1 chain key seed.
    pub fn chain_key_seed(&self) -> Result<[u8; 32], ConfigError> {
        seed(&self.node.chain_key_seed, "node.chain_key_seed")
    }

    /// Configured chains, resolved.
    pub fn chain_types(&self) -> Result<Vec<ChainType>, ConfigError> {
        self.chains.iter().map(|c| chain_by_name(&c.name)).collect()
    }

    /// Store settings.
    pub fn ledger(&self) -> LedgerConfig {
        LedgerConfig {
            path: self.node.data_dir.clone(),
            sync_writes: self.node.sync_writes,
        }
    }

    /// Rotation and sync settings.
    pub fn scheduler(&self) -> SchedulerConfig {
        SchedulerConfig {
            score_interval: self.timing.score_interval,
            consul_count: self.rotation.consul_count,
            oracle_window: self.rotation.oracle_window,
            trust: self.trust,
            poll_interval_ms: self.timing.poll_interval_ms,
            confirm_attempts: self.timing.confirm_attempts,
            confirm_interval_ms: self.timing.confirm_interval_ms,
            call_timeout_ms: self.timing.call_timeout_ms,
        }
    }

    /// Oracle loop settings.
    pub fn oracle(&self) -> OracleConfig {
        OracleConfig {
            blocks_per_sub_round: self.timing.blocks_per_sub_round,
            poll_interval_ms: self.timing.poll_interval_ms,
            arena_horizon: self.timing.arena_horizon,
            confirm_attempts: self.timing.confirm_attempts,
            confirm_interval_ms: self.timing.confirm_interval_ms,
            call_timeout_ms: self.timing.call_timeout_ms,
        }
    }

    /// Feeds as ledger registrations, owned by `owner`.
    pub fn feeds(&self, owner: ConsulPubKey) -> Result<Vec<(NebulaInfo, ValueType)>, ConfigError> {
        self.nebulae
            .iter()
            .map(|feed| {
                let value_type = feed
                    .value_type
                    .parse::<ValueType>()
                    .map_err(|e| ConfigError::Invalid(e.to_string()))?;
                let info = NebulaInfo {
                    chain: chain_by_name(&feed.chain)?,
                    nebula: nebula_id(&feed.nebula)?,
                    max_pulses_per_block: feed.max_pulses_per_block,
                    min_score: feed.min_score,
                    bft_value: feed.bft_value,
                    owner,
                };
                Ok((info, value_type))
            })
            .collect()
    }

    /// Build the genesis document.
    ///
    /// `me` is this node's identity and `my_keys` its chain keys. With no
    /// validators configured the node starts alone; configured feeds are
    /// owned by the first validator and start with every validator key on
    /// their chain.
    pub fn genesis(
        &self,
        me: ConsulPubKey,
        my_keys: &BTreeMap<ChainType, OraclesPubKey>,
    ) -> Result<Genesis, ConfigError> {
        let mut validators = Vec::new();
        for section in &self.genesis.validators {
            let consul = consul_key(&section.consul)?;
            let mut oracles = BTreeMap::new();
            for (chain, key) in &section.oracles {
                oracles.insert(chain_by_name(chain)?, oracle_key(key)?);
            }
            if consul == me {
                for (chain, key) in my_keys {
                    oracles.entry(*chain).or_insert(*key);
                }
            }
            validators.push(GenesisValidator {
                consul,
                score: section.score,
                oracles,
            });
        }
        if validators.is_empty() {
            validators.push(GenesisValidator {
                consul: me,
                score: self.trust.max_score,
                oracles: my_keys.clone(),
            });
        }

        let owner = validators[0].consul;
        let feeds = self
            .feeds(owner)?
            .into_iter()
            .map(|(info, _)| {
                let oracles = validators
                    .iter()
                    .filter_map(|v| v.oracles.get(&info.chain).copied())
                    .collect();
                GenesisFeed { info, oracles }
            })
            .collect();
        Ok(Genesis { validators, feeds })
    }
}

fn seed(value: &str, name: &str) -> Result<[u8; 32], ConfigError> {
    hex::decode(value.trim_start_matches("0x"))
        .map_err(|e| ConfigError::Invalid(format!("{}: {}", name, e)))?
        .try_into()
        .map_err(|_| ConfigError::Invalid(format!("{} must be 32 bytes", name)))
}

fn chain_by_name(name: &str) -> Result<ChainType, ConfigError> {
    ChainRegistry::global()
        .chain(name)
        .map_err(|e| ConfigError::Invalid(e.to_string()))
}

fn nebula_id(value: &str) -> Result<NebulaId, ConfigError> {
    let bytes = hex::decode(value.trim_start_matches("0x"))
        .map_err(|e| ConfigError::Invalid(format!("nebula {}: {}", value, e)))?;
    if bytes.is_empty() {
        return Err(ConfigError::Invalid("empty nebula id".into()));
    }
    Ok(NebulaId::new(bytes))
}

fn consul_key(value: &str) -> Result<ConsulPubKey, ConfigError> {
    ConsulPubKey::from_hex(value.trim_start_matches("0x"))
        .map_err(|e| ConfigError::Invalid(format!("consul {}: {}", value, e)))
}

fn oracle_key(value: &str) -> Result<OraclesPubKey, ConfigError> {
    let bytes = hex::decode(value.trim_start_matches("0x"))
        .map_err(|e| ConfigError::Invalid(format!("oracle {}: {}", value, e)))?;
    OraclesPubKey::from_slice(&bytes).map_err(|e| ConfigError::Invalid(e.to_string()))
}
