//! # Local Ledger
//!
//! In-process stand-in for the ordering engine. Holds the application
//! behind a lock, queues broadcast transactions in a mempool, and turns
//! the queue into a block on every [`LocalLedger::produce_block`].
//!
//! The oracle loop and the sync agent read through the ports they own
//! ([`LedgerClient`], [`SyncLedger`]); every read is served from the last
//! committed block.

use async_trait::async_trait;
use gc_02_ledger_store::{CommittedView, LedgerRead, NebulaInfo, StoreResult};
use gc_04_oracle_round::{LedgerClient, OracleError, OracleResult};
use gc_05_rotation_scheduler::{SchedulerError, SchedulerResult, SyncLedger, SyncSnapshot};
use gc_06_ledger_app::{AppResult, Genesis, GravityApp, ValidatorUpdate};
use parking_lot::Mutex;
use shared_types::{ChainType, Hash, NebulaId, OraclesPubKey, Signature, Transaction};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// What one produced block did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockSummary {
    /// Block height.
    pub height: u64,
    /// Transactions applied.
    pub accepted: usize,
    /// Transactions rejected.
    pub rejected: usize,
    /// App hash after commit.
    pub app_hash: Hash,
    /// Validator power changes.
    pub validator_updates: Vec<ValidatorUpdate>,
}

/// Application plus mempool.
pub struct LocalLedger {
    app: Mutex<GravityApp>,
    mempool: Mutex<Vec<Vec<u8>>>,
}

impl LocalLedger {
    /// Wrap an application.
    pub fn new(app: GravityApp) -> Self {
        Self {
            app: Mutex::new(app),
            mempool: Mutex::new(Vec::new()),
        }
    }

    /// Run `init_chain` unless the store already holds a chain.
    pub fn init(&self, genesis: &Genesis) -> AppResult<bool> {
        let mut app = self.app.lock();
        if !app.store().committed().consuls()?.is_empty() {
            info!("[node] resuming at height {}", app.height());
            return Ok(false);
        }
        app.init_chain(genesis)?;
        Ok(true)
    }

    /// Queue raw transaction bytes.
    pub fn submit(&self, bytes: Vec<u8>) {
        self.mempool.lock().push(bytes);
    }

    /// Transactions waiting for the next block.
    pub fn pending(&self) -> usize {
        self.mempool.lock().len()
    }

    /// Last committed height.
    pub fn height(&self) -> u64 {
        self.app.lock().height()
    }

    /// Run `f` against committed state.
    pub fn read<T>(&self, f: impl FnOnce(&CommittedView<'_>) -> T) -> T {
        let app = self.app.lock();
        let view = app.store().committed();
        f(&view)
    }

    /// JSON query against committed state.
    pub fn query(&self, path: &str, data: &[u8]) -> AppResult<Vec<u8>> {
        self.app.lock().query(path, data)
    }

    /// Drain the mempool into the next block and commit it.
    ///
    /// Only fatal errors come back; rejected transactions are counted.
    pub fn produce_block(&self) -> AppResult<BlockSummary> {
        let txs = std::mem::take(&mut *self.mempool.lock());
        let mut app = self.app.lock();
        let height = app.height() + 1;

        app.begin_block(height)?;
        let mut accepted = 0;
        for bytes in &txs {
            let result = app.deliver_tx(bytes);
            if result.is_ok() {
                accepted += 1;
            } else {
                debug!("[node] block {}: tx rejected ({}): {}", height, result.code, result.log);
            }
        }
        let outcome = app.end_block(height)?;
        let app_hash = app.commit()?;

        let consuls = app.store().committed().consuls()?.len();
        gravity_telemetry::record_block(height, consuls, self.pending());
        Ok(BlockSummary {
            height,
            accepted,
            rejected: txs.len() - accepted,
            app_hash,
            validator_updates: outcome.validator_updates,
        })
    }

    fn oracle_read<T>(
        &self,
        f: impl FnOnce(&CommittedView<'_>) -> StoreResult<T>,
    ) -> OracleResult<T> {
        self.read(f).map_err(|e| OracleError::Ledger(e.to_string()))
    }
}

#[async_trait]
impl LedgerClient for LocalLedger {
    async fn height(&self) -> OracleResult<u64> {
        Ok(LocalLedger::height(self))
    }

    async fn round_height(&self, chain: ChainType, round: u64) -> OracleResult<Option<u64>> {
        self.oracle_read(|view| view.round_height(chain, round))
    }

    async fn commit_hash(
        &self,
        chain: ChainType,
        nebula: &NebulaId,
        height: u64,
        oracle: &OraclesPubKey,
    ) -> OracleResult<Option<Hash>> {
        self.oracle_read(|view| view.commit_hash(chain, nebula, height, oracle))
    }

    async fn reveal(
        &self,
        chain: ChainType,
        nebula: &NebulaId,
        height: u64,
        oracle: &OraclesPubKey,
    ) -> OracleResult<Option<Vec<u8>>> {
        self.oracle_read(|view| view.reveal(chain, nebula, height, oracle))
    }

    async fn reveals(
        &self,
        chain: ChainType,
        nebula: &NebulaId,
        height: u64,
    ) -> OracleResult<Vec<Vec<u8>>> {
        self.oracle_read(|view| view.reveals(chain, nebula, height))
    }

    async fn result(
        &self,
        chain: ChainType,
        nebula: &NebulaId,
        height: u64,
        oracle: &OraclesPubKey,
    ) -> OracleResult<Option<Signature>> {
        self.oracle_read(|view| view.result(chain, nebula, height, oracle))
    }

    async fn results(
        &self,
        chain: ChainType,
        nebula: &NebulaId,
        height: u64,
    ) -> OracleResult<BTreeMap<OraclesPubKey, Signature>> {
        self.oracle_read(|view| view.results(chain, nebula, height))
    }

    async fn bft_oracles(
        &self,
        chain: ChainType,
        nebula: &NebulaId,
    ) -> OracleResult<Vec<OraclesPubKey>> {
        self.oracle_read(|view| view.bft_oracles_by_nebula(chain, nebula))
    }

    async fn nebula_info(
        &self,
        chain: ChainType,
        nebula: &NebulaId,
    ) -> OracleResult<Option<NebulaInfo>> {
        self.oracle_read(|view| view.nebula_info(chain, nebula))
    }

    async fn broadcast(&self, tx: Transaction) -> OracleResult<()> {
        self.submit(tx.to_bytes()?);
        Ok(())
    }
}

#[async_trait]
impl SyncLedger for LocalLedger {
    async fn snapshot(
        &self,
        score_interval: u64,
        chains: &[ChainType],
    ) -> SchedulerResult<SyncSnapshot> {
        self.read(|view| SyncSnapshot::read(view, score_interval, chains))
    }

    async fn broadcast(&self, tx: Transaction) -> SchedulerResult<()> {
        self.submit(tx.to_bytes().map_err(SchedulerError::from)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::SigningKey;
    use gc_02_ledger_store::LedgerStore;
    use gc_05_rotation_scheduler::{Scheduler, SchedulerConfig};
    use gc_06_ledger_app::GenesisValidator;
    use shared_types::{ConsulPubKey, TxKind};

    fn ledger() -> (LocalLedger, SigningKey) {
        let key = SigningKey::from_bytes(&[9; 32]);
        let scheduler = Scheduler::new(SchedulerConfig {
            score_interval: 10,
            ..Default::default()
        })
        .unwrap();
        let app = GravityApp::new(LedgerStore::in_memory(), scheduler).unwrap();
        let ledger = LocalLedger::new(app);
        let genesis = Genesis {
            validators: vec![GenesisValidator {
                consul: ConsulPubKey(key.verifying_key().to_bytes()),
                score: 100,
                oracles: BTreeMap::new(),
            }],
            feeds: Vec::new(),
        };
        assert!(ledger.init(&genesis).unwrap());
        assert!(!ledger.init(&genesis).unwrap());
        (ledger, key)
    }

    #[tokio::test]
    async fn test_broadcast_lands_in_next_block() {
        let (ledger, key) = ledger();
        let tx = Transaction::new_signed(
            TxKind::AddOracle,
            vec![ChainType::ETHEREUM.code().into(), vec![5u8; 33].into()],
            &key,
        )
        .unwrap();
        LedgerClient::broadcast(&ledger, tx).await.unwrap();
        assert_eq!(ledger.pending(), 1);

        let block = ledger.produce_block().unwrap();
        assert_eq!(block.height, 1);
        assert_eq!(block.accepted, 1);
        assert_eq!(ledger.pending(), 0);

        let me = ConsulPubKey(key.verifying_key().to_bytes());
        let keys = ledger.read(|view| view.oracles_by_validator(&me)).unwrap();
        assert_eq!(keys.get(&ChainType::ETHEREUM), Some(&OraclesPubKey([5; 33])));
    }

    #[tokio::test]
    async fn test_rejected_tx_does_not_stop_block() {
        let (ledger, _) = ledger();
        ledger.submit(b"junk".to_vec());
        let block = ledger.produce_block().unwrap();
        assert_eq!((block.accepted, block.rejected), (0, 1));
        assert_eq!(LedgerClient::height(&ledger).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_reads_committed_round() {
        let (ledger, _) = ledger();
        for _ in 0..10 {
            ledger.produce_block().unwrap();
        }
        let snapshot = ledger.snapshot(10, &[ChainType::ETHEREUM]).await.unwrap();
        assert_eq!(snapshot.height, 10);
        assert_eq!(snapshot.round, 2);
        assert_eq!(snapshot.consuls.len(), 1);
    }
}
