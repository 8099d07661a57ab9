//! # Ledger Store
//!
//! Typed view over a [`KeyValueStore`] with a pending overlay.
//!
//! Transaction handlers write into the overlay; `commit` flushes it as one
//! atomic batch at block end and folds it into the app hash. Readers pick a
//! view explicitly:
//!
//! - the store itself ([`LedgerRead`] on `LedgerStore`) sees pending writes,
//!   which is what transaction handlers need;
//! - [`LedgerStore::committed`] sees only the last committed block, which is
//!   what cross-chain publishing decisions read.

use crate::domain::{keys, NebulaInfo, StoreError, StoreResult};
use crate::ports::{BatchOperation, KeyValueStore};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use shared_types::{
    ChainType, Consul, ConsulPubKey, Hash, NebulaId, OraclesPubKey, Signature, Vote,
};
use std::collections::BTreeMap;
use tracing::debug;

fn encode<T: Serialize>(key: &str, value: &T) -> StoreResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| StoreError::codec(key, e))
}

fn decode<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> StoreResult<T> {
    bincode::deserialize(bytes).map_err(|e| StoreError::codec(key, e))
}

/// Typed reads over the key schema.
///
/// Implementors provide raw access; every typed accessor is derived from it.
pub trait LedgerRead {
    /// Raw bytes at `key`.
    fn raw_get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Every (key, bytes) pair under `prefix`, in key order.
    fn raw_scan(&self, prefix: &str) -> StoreResult<BTreeMap<String, Vec<u8>>>;

    /// Decoded value at `key`.
    fn read<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        self.raw_get(key)?
            .map(|bytes| decode(key, &bytes))
            .transpose()
    }

    /// Decoded value at `key`, or `NotFound`.
    fn require<T: DeserializeOwned>(&self, key: &str) -> StoreResult<T> {
        self.read(key)?
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    /// Whether `key` holds anything.
    fn contains(&self, key: &str) -> StoreResult<bool> {
        Ok(self.raw_get(key)?.is_some())
    }

    /// Active consul set.
    fn consuls(&self) -> StoreResult<Vec<Consul>> {
        Ok(self.read(keys::CONSULS)?.unwrap_or_default())
    }

    /// Next consul set.
    fn consuls_candidate(&self) -> StoreResult<Vec<Consul>> {
        Ok(self.read(keys::CONSULS_CANDIDATE)?.unwrap_or_default())
    }

    /// Highest approved round; 0 before the first approval.
    fn last_round_approved(&self) -> StoreResult<u64> {
        Ok(self.read(keys::LAST_ROUND_APPROVED)?.unwrap_or(0))
    }

    /// Last committed block height; 0 before the first block.
    fn last_height(&self) -> StoreResult<u64> {
        Ok(self.read(keys::LAST_HEIGHT)?.unwrap_or(0))
    }

    /// Score of one validator.
    fn score(&self, consul: &ConsulPubKey) -> StoreResult<Option<u64>> {
        self.read(&keys::score(consul))
    }

    /// Every persisted score, ordered by validator key.
    fn scores(&self) -> StoreResult<Vec<(ConsulPubKey, u64)>> {
        let prefix = format!("{}{}", keys::SCORE, keys::SEPARATOR);
        self.raw_scan(&prefix)?
            .iter()
            .map(|(key, bytes)| -> StoreResult<(ConsulPubKey, u64)> {
                let consul = ConsulPubKey::from_hex(keys::last_part(key))?;
                Ok((consul, decode(key, bytes)?))
            })
            .collect()
    }

    /// Votes cast since the last recomputation, ordered by voter key.
    fn votes(&self) -> StoreResult<Vec<(ConsulPubKey, Vec<Vote>)>> {
        let prefix = format!("{}{}", keys::VOTE, keys::SEPARATOR);
        self.raw_scan(&prefix)?
            .iter()
            .map(|(key, bytes)| -> StoreResult<(ConsulPubKey, Vec<Vote>)> {
                let voter = ConsulPubKey::from_hex(keys::last_part(key))?;
                Ok((voter, decode(key, bytes)?))
            })
            .collect()
    }

    /// A validator's registered per-chain keys.
    fn oracles_by_validator(
        &self,
        consul: &ConsulPubKey,
    ) -> StoreResult<BTreeMap<ChainType, OraclesPubKey>> {
        Ok(self
            .read(&keys::oracles_by_validator(consul))?
            .unwrap_or_default())
    }

    /// Every oracle of a feed, in registration order.
    fn oracles_by_nebula(
        &self,
        chain: ChainType,
        nebula: &NebulaId,
    ) -> StoreResult<Vec<OraclesPubKey>> {
        Ok(self
            .read(&keys::oracles_by_nebula(chain, nebula)?)?
            .unwrap_or_default())
    }

    /// Active signing window of a feed.
    fn bft_oracles_by_nebula(
        &self,
        chain: ChainType,
        nebula: &NebulaId,
    ) -> StoreResult<Vec<OraclesPubKey>> {
        Ok(self
            .read(&keys::bft_oracles_by_nebula(chain, nebula)?)?
            .unwrap_or_default())
    }

    /// Rotation index of a feed's window.
    fn oracles_nebula_index(&self, chain: ChainType, nebula: &NebulaId) -> StoreResult<u64> {
        Ok(self
            .read(&keys::oracles_nebula_index(chain, nebula)?)?
            .unwrap_or(0))
    }

    /// Registration of a feed.
    fn nebula_info(&self, chain: ChainType, nebula: &NebulaId) -> StoreResult<Option<NebulaInfo>> {
        self.read(&keys::nebula_info(chain, nebula)?)
    }

    /// Every registered feed, in key order.
    fn nebulae(&self) -> StoreResult<Vec<NebulaInfo>> {
        let prefix = format!("{}{}", keys::NEBULA_INFO, keys::SEPARATOR);
        self.raw_scan(&prefix)?
            .iter()
            .map(|(key, bytes)| decode(key, bytes))
            .collect()
    }

    /// Opaque parameters of a feed.
    fn nebula_custom_params(
        &self,
        chain: ChainType,
        nebula: &NebulaId,
    ) -> StoreResult<Option<Vec<u8>>> {
        self.raw_get(&keys::nebula_custom_params(chain, nebula)?)
    }

    /// External height bound to a round.
    fn round_height(&self, chain: ChainType, round: u64) -> StoreResult<Option<u64>> {
        self.read(&keys::round_height(chain, round)?)
    }

    /// An oracle's commit for a pulse.
    fn commit_hash(
        &self,
        chain: ChainType,
        nebula: &NebulaId,
        height: u64,
        oracle: &OraclesPubKey,
    ) -> StoreResult<Option<Hash>> {
        self.read(&keys::commit(chain, nebula, height, oracle)?)
    }

    /// The value an oracle revealed for a pulse.
    fn reveal(
        &self,
        chain: ChainType,
        nebula: &NebulaId,
        height: u64,
        oracle: &OraclesPubKey,
    ) -> StoreResult<Option<Vec<u8>>> {
        self.raw_get(&keys::reveal(chain, nebula, height, oracle)?)
    }

    /// Every value revealed for a pulse, one per oracle, ordered by oracle key.
    fn reveals(&self, chain: ChainType, nebula: &NebulaId, height: u64) -> StoreResult<Vec<Vec<u8>>> {
        Ok(self
            .raw_scan(&keys::reveal_prefix(chain, nebula, height)?)?
            .into_values()
            .collect())
    }

    /// An oracle's result signature for a pulse.
    fn result(
        &self,
        chain: ChainType,
        nebula: &NebulaId,
        height: u64,
        oracle: &OraclesPubKey,
    ) -> StoreResult<Option<Signature>> {
        self.read(&keys::result(chain, nebula, height, oracle)?)
    }

    /// Every result signature for a pulse, by oracle.
    fn results(
        &self,
        chain: ChainType,
        nebula: &NebulaId,
        height: u64,
    ) -> StoreResult<BTreeMap<OraclesPubKey, Signature>> {
        self.raw_scan(&keys::result_prefix(chain, nebula, height)?)?
            .iter()
            .map(|(key, bytes)| -> StoreResult<(OraclesPubKey, Signature)> {
                let oracle_hex = keys::last_part(key);
                let raw = hex::decode(oracle_hex).map_err(|e| StoreError::codec(key, e))?;
                Ok((OraclesPubKey::from_slice(&raw)?, decode(key, bytes)?))
            })
            .collect()
    }

    /// One consul's signature over a round's consul set.
    fn sign_consuls(
        &self,
        chain: ChainType,
        round: u64,
        consul: &ConsulPubKey,
    ) -> StoreResult<Option<Signature>> {
        self.read(&keys::sign_consuls(chain, round, consul)?)
    }

    /// Every consul-set signature for a round, by consul.
    fn sign_consuls_all(
        &self,
        chain: ChainType,
        round: u64,
    ) -> StoreResult<BTreeMap<ConsulPubKey, Signature>> {
        scan_by_consul(self, &keys::sign_consuls_prefix(chain, round)?)
    }

    /// One consul's signature over a feed's oracle set.
    fn sign_oracles(
        &self,
        chain: ChainType,
        nebula: &NebulaId,
        round: u64,
        consul: &ConsulPubKey,
    ) -> StoreResult<Option<Signature>> {
        self.read(&keys::sign_oracles(chain, nebula, round, consul)?)
    }

    /// Every oracle-set signature for a feed and round, by consul.
    fn sign_oracles_all(
        &self,
        chain: ChainType,
        nebula: &NebulaId,
        round: u64,
    ) -> StoreResult<BTreeMap<ConsulPubKey, Signature>> {
        scan_by_consul(self, &keys::sign_oracles_prefix(chain, nebula, round)?)
    }
}

fn scan_by_consul<R: LedgerRead + ?Sized>(
    reader: &R,
    prefix: &str,
) -> StoreResult<BTreeMap<ConsulPubKey, Signature>> {
    reader
        .raw_scan(prefix)?
        .iter()
        .map(|(key, bytes)| -> StoreResult<(ConsulPubKey, Signature)> {
            let consul = ConsulPubKey::from_hex(keys::last_part(key))?;
            Ok((consul, decode(key, bytes)?))
        })
        .collect()
}

/// Which storage engine to open.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LedgerConfig {
    /// RocksDB directory; in-memory when unset.
    pub path: Option<String>,
    /// fsync every committed block.
    pub sync_writes: bool,
}

/// Open the engine selected by `config`.
pub fn open_kv(config: &LedgerConfig) -> StoreResult<Box<dyn KeyValueStore>> {
    match &config.path {
        None => Ok(Box::new(crate::adapters::InMemoryKVStore::new())),
        #[cfg(feature = "rocksdb")]
        Some(path) => {
            let rocks = crate::adapters::RocksDbConfig {
                path: path.clone(),
                sync_writes: config.sync_writes,
                ..Default::default()
            };
            Ok(Box::new(crate::adapters::RocksDbStore::open(rocks)?))
        }
        #[cfg(not(feature = "rocksdb"))]
        Some(path) => Err(StoreError::Io {
            message: format!("built without rocksdb support, cannot open {}", path),
        }),
    }
}

/// The replicated key space.
pub struct LedgerStore {
    kv: Box<dyn KeyValueStore>,
    pending: BTreeMap<String, Option<Vec<u8>>>,
    app_hash: Hash,
}

impl LedgerStore {
    /// Wrap an engine, restoring the last committed app hash.
    pub fn new(kv: Box<dyn KeyValueStore>) -> StoreResult<Self> {
        let app_hash = match kv.get(keys::APP_HASH.as_bytes())? {
            Some(bytes) => bytes.as_slice().try_into().map_err(|_| StoreError::Corruption {
                message: format!("app hash has {} bytes", bytes.len()),
            })?,
            None => [0u8; 32],
        };
        Ok(Self {
            kv,
            pending: BTreeMap::new(),
            app_hash,
        })
    }

    /// Store over a fresh in-memory engine.
    pub fn in_memory() -> Self {
        Self {
            kv: Box::new(crate::adapters::InMemoryKVStore::new()),
            pending: BTreeMap::new(),
            app_hash: [0u8; 32],
        }
    }

    /// Read-only view of the last committed state.
    pub fn committed(&self) -> CommittedView<'_> {
        CommittedView { store: self }
    }

    /// Hash after the last commit.
    pub fn app_hash(&self) -> Hash {
        self.app_hash
    }

    /// Number of uncommitted writes.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    // -------------------------------------------------------------------------
    // Raw writes
    // -------------------------------------------------------------------------

    /// Stage raw bytes.
    pub fn put_raw(&mut self, key: &str, value: Vec<u8>) {
        self.pending.insert(key.to_string(), Some(value));
    }

    /// Stage a typed value.
    pub fn write<T: Serialize>(&mut self, key: &str, value: &T) -> StoreResult<()> {
        let bytes = encode(key, value)?;
        self.put_raw(key, bytes);
        Ok(())
    }

    /// Stage raw bytes unless `key` already holds something.
    pub fn put_raw_once(&mut self, key: &str, value: Vec<u8>) -> StoreResult<()> {
        if self.contains(key)? {
            return Err(StoreError::AlreadyExists(key.to_string()));
        }
        self.put_raw(key, value);
        Ok(())
    }

    /// Stage a typed value unless `key` already holds something.
    pub fn write_once<T: Serialize>(&mut self, key: &str, value: &T) -> StoreResult<()> {
        let bytes = encode(key, value)?;
        self.put_raw_once(key, bytes)
    }

    /// Stage a deletion.
    pub fn delete(&mut self, key: &str) {
        self.pending.insert(key.to_string(), None);
    }

    /// Drop every staged write.
    pub fn discard(&mut self) {
        self.pending.clear();
    }

    /// Flush staged writes as one atomic batch.
    ///
    /// Returns the new app hash: SHA-256 of the previous hash followed by
    /// every staged operation in key order. An empty block leaves the hash
    /// unchanged.
    pub fn commit(&mut self) -> StoreResult<Hash> {
        if self.pending.is_empty() {
            return Ok(self.app_hash);
        }

        let mut hasher = Sha256::new();
        hasher.update(self.app_hash);
        let mut ops = Vec::with_capacity(self.pending.len() + 1);
        for (key, value) in &self.pending {
            hasher.update((key.len() as u32).to_be_bytes());
            hasher.update(key.as_bytes());
            match value {
                Some(bytes) => {
                    hasher.update([1u8]);
                    hasher.update((bytes.len() as u32).to_be_bytes());
                    hasher.update(bytes);
                    ops.push(BatchOperation::put(key.as_bytes(), bytes.clone()));
                }
                None => {
                    hasher.update([0u8]);
                    ops.push(BatchOperation::delete(key.as_bytes()));
                }
            }
        }
        let app_hash: Hash = hasher.finalize().into();
        ops.push(BatchOperation::put(keys::APP_HASH.as_bytes(), app_hash.to_vec()));

        let count = ops.len();
        self.kv.atomic_batch_write(ops)?;
        self.pending.clear();
        self.app_hash = app_hash;
        debug!("[gc-02] committed {} writes, app hash {}", count, hex::encode(app_hash));
        Ok(app_hash)
    }

    // -------------------------------------------------------------------------
    // Typed writes
    // -------------------------------------------------------------------------

    /// Replace the active consul set.
    pub fn set_consuls(&mut self, consuls: &[Consul]) -> StoreResult<()> {
        self.write(keys::CONSULS, &consuls)
    }

    /// Replace the next consul set.
    pub fn set_consuls_candidate(&mut self, consuls: &[Consul]) -> StoreResult<()> {
        self.write(keys::CONSULS_CANDIDATE, &consuls)
    }

    /// Advance the approved round.
    pub fn set_last_round_approved(&mut self, round: u64) -> StoreResult<()> {
        self.write(keys::LAST_ROUND_APPROVED, &round)
    }

    /// Record the height being committed.
    pub fn set_last_height(&mut self, height: u64) -> StoreResult<()> {
        self.write(keys::LAST_HEIGHT, &height)
    }

    /// Persist a score.
    pub fn set_score(&mut self, consul: &ConsulPubKey, score: u64) -> StoreResult<()> {
        self.write(&keys::score(consul), &score)
    }

    /// Record a validator's votes. One ballot per recomputation interval.
    pub fn put_votes(&mut self, voter: &ConsulPubKey, votes: &[Vote]) -> StoreResult<()> {
        self.write_once(&keys::vote(voter), &votes)
    }

    /// Drop every ballot.
    pub fn clear_votes(&mut self) -> StoreResult<()> {
        let prefix = format!("{}{}", keys::VOTE, keys::SEPARATOR);
        for key in self.raw_scan(&prefix)?.into_keys() {
            self.delete(&key);
        }
        Ok(())
    }

    /// Replace a validator's per-chain keys.
    pub fn set_oracles_by_validator(
        &mut self,
        consul: &ConsulPubKey,
        oracles: &BTreeMap<ChainType, OraclesPubKey>,
    ) -> StoreResult<()> {
        self.write(&keys::oracles_by_validator(consul), oracles)
    }

    /// Replace a feed's full oracle list.
    pub fn set_oracles_by_nebula(
        &mut self,
        chain: ChainType,
        nebula: &NebulaId,
        oracles: &[OraclesPubKey],
    ) -> StoreResult<()> {
        self.write(&keys::oracles_by_nebula(chain, nebula)?, &oracles)
    }

    /// Replace a feed's active window.
    pub fn set_bft_oracles_by_nebula(
        &mut self,
        chain: ChainType,
        nebula: &NebulaId,
        oracles: &[OraclesPubKey],
    ) -> StoreResult<()> {
        self.write(&keys::bft_oracles_by_nebula(chain, nebula)?, &oracles)
    }

    /// Persist a feed's rotation index.
    pub fn set_oracles_nebula_index(
        &mut self,
        chain: ChainType,
        nebula: &NebulaId,
        index: u64,
    ) -> StoreResult<()> {
        self.write(&keys::oracles_nebula_index(chain, nebula)?, &index)
    }

    /// Register or update a feed.
    pub fn set_nebula_info(&mut self, info: &NebulaInfo) -> StoreResult<()> {
        self.write(&keys::nebula_info(info.chain, &info.nebula)?, info)
    }

    /// Remove a feed's registration, oracle lists and parameters.
    pub fn drop_nebula(&mut self, chain: ChainType, nebula: &NebulaId) -> StoreResult<()> {
        self.delete(&keys::nebula_info(chain, nebula)?);
        self.delete(&keys::nebula_custom_params(chain, nebula)?);
        self.delete(&keys::oracles_by_nebula(chain, nebula)?);
        self.delete(&keys::bft_oracles_by_nebula(chain, nebula)?);
        self.delete(&keys::oracles_nebula_index(chain, nebula)?);
        Ok(())
    }

    /// Replace a feed's opaque parameters.
    pub fn set_nebula_custom_params(
        &mut self,
        chain: ChainType,
        nebula: &NebulaId,
        params: Vec<u8>,
    ) -> StoreResult<()> {
        self.put_raw(&keys::nebula_custom_params(chain, nebula)?, params);
        Ok(())
    }

    /// Bind a round to an external height. Write-once.
    pub fn put_round_height(&mut self, chain: ChainType, round: u64, height: u64) -> StoreResult<()> {
        self.write_once(&keys::round_height(chain, round)?, &height)
    }

    /// Record a commit. Write-once per oracle and pulse.
    pub fn put_commit(
        &mut self,
        chain: ChainType,
        nebula: &NebulaId,
        height: u64,
        oracle: &OraclesPubKey,
        commit: &Hash,
    ) -> StoreResult<()> {
        self.write_once(&keys::commit(chain, nebula, height, oracle)?, commit)
    }

    /// Record a reveal. Write-once per oracle and pulse.
    pub fn put_reveal(
        &mut self,
        chain: ChainType,
        nebula: &NebulaId,
        height: u64,
        oracle: &OraclesPubKey,
        value: Vec<u8>,
    ) -> StoreResult<()> {
        self.put_raw_once(&keys::reveal(chain, nebula, height, oracle)?, value)
    }

    /// Record a result signature. Write-once per oracle and pulse.
    pub fn put_result(
        &mut self,
        chain: ChainType,
        nebula: &NebulaId,
        height: u64,
        oracle: &OraclesPubKey,
        signature: &Signature,
    ) -> StoreResult<()> {
        self.write_once(&keys::result(chain, nebula, height, oracle)?, signature)
    }

    /// Record a consul-set signature. Write-once per consul and round.
    pub fn put_sign_consuls(
        &mut self,
        chain: ChainType,
        round: u64,
        consul: &ConsulPubKey,
        signature: &Signature,
    ) -> StoreResult<()> {
        self.write_once(&keys::sign_consuls(chain, round, consul)?, signature)
    }

    /// Record an oracle-set signature. Write-once per consul, feed and round.
    pub fn put_sign_oracles(
        &mut self,
        chain: ChainType,
        nebula: &NebulaId,
        round: u64,
        consul: &ConsulPubKey,
        signature: &Signature,
    ) -> StoreResult<()> {
        self.write_once(&keys::sign_oracles(chain, nebula, round, consul)?, signature)
    }

    fn committed_scan(&self, prefix: &str) -> StoreResult<BTreeMap<String, Vec<u8>>> {
        self.kv
            .prefix_scan(prefix.as_bytes())?
            .into_iter()
            .map(|(key, value)| {
                let key = String::from_utf8(key).map_err(|e| StoreError::Corruption {
                    message: format!("non-UTF-8 key: {}", e),
                })?;
                Ok((key, value))
            })
            .collect()
    }
}

impl LedgerRead for LedgerStore {
    fn raw_get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        match self.pending.get(key) {
            Some(staged) => Ok(staged.clone()),
            None => self.kv.get(key.as_bytes()),
        }
    }

    fn raw_scan(&self, prefix: &str) -> StoreResult<BTreeMap<String, Vec<u8>>> {
        let mut merged = self.committed_scan(prefix)?;
        let staged = self
            .pending
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix));
        for (key, value) in staged {
            match value {
                Some(bytes) => {
                    merged.insert(key.clone(), bytes.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        Ok(merged)
    }
}

/// Committed-state view of a [`LedgerStore`].
pub struct CommittedView<'a> {
    store: &'a LedgerStore,
}

impl LedgerRead for CommittedView<'_> {
    fn raw_get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        self.store.kv.get(key.as_bytes())
    }

    fn raw_scan(&self, prefix: &str) -> StoreResult<BTreeMap<String, Vec<u8>>> {
        self.store.committed_scan(prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn consul(i: u8) -> ConsulPubKey {
        ConsulPubKey([i; 32])
    }

    fn oracle(i: u8) -> OraclesPubKey {
        let mut raw = [i; 33];
        raw[0] = 0x02;
        OraclesPubKey(raw)
    }

    #[test]
    fn test_pending_writes_are_invisible_to_committed_view() {
        let mut store = LedgerStore::in_memory();
        store.set_last_round_approved(3).unwrap();

        assert_eq!(store.last_round_approved().unwrap(), 3);
        assert_eq!(store.committed().last_round_approved().unwrap(), 0);

        store.commit().unwrap();
        assert_eq!(store.committed().last_round_approved().unwrap(), 3);
    }

    #[test]
    fn test_write_once_records() {
        let mut store = LedgerStore::in_memory();
        let nebula = NebulaId::new(vec![1, 2, 3]);
        let hash = [7u8; 32];

        store
            .put_commit(ChainType::ETHEREUM, &nebula, 10, &oracle(1), &hash)
            .unwrap();
        let second = store.put_commit(ChainType::ETHEREUM, &nebula, 10, &oracle(1), &[8u8; 32]);
        assert!(second.unwrap_err().is_already_exists());

        store.commit().unwrap();
        let again = store.put_commit(ChainType::ETHEREUM, &nebula, 10, &oracle(1), &[9u8; 32]);
        assert!(again.unwrap_err().is_already_exists());
        assert_eq!(
            store
                .commit_hash(ChainType::ETHEREUM, &nebula, 10, &oracle(1))
                .unwrap(),
            Some(hash)
        );
    }

    #[test]
    fn test_equal_reveals_are_kept_per_oracle() {
        let mut store = LedgerStore::in_memory();
        let nebula = NebulaId::new(vec![4]);
        let value = 10i64.to_be_bytes().to_vec();
        for i in 1..=3 {
            store
                .put_reveal(ChainType::ETHEREUM, &nebula, 6, &oracle(i), value.clone())
                .unwrap();
        }
        let again = store.put_reveal(ChainType::ETHEREUM, &nebula, 6, &oracle(2), vec![0; 8]);
        assert!(again.unwrap_err().is_already_exists());
        store.commit().unwrap();

        let view = store.committed();
        assert_eq!(view.reveals(ChainType::ETHEREUM, &nebula, 6).unwrap(), vec![value.clone(); 3]);
        assert_eq!(
            view.reveal(ChainType::ETHEREUM, &nebula, 6, &oracle(3)).unwrap(),
            Some(value)
        );
        assert_eq!(view.reveal(ChainType::ETHEREUM, &nebula, 6, &oracle(4)).unwrap(), None);
    }

    #[test]
    fn test_scans_merge_pending_and_committed() {
        let mut store = LedgerStore::in_memory();
        store.set_score(&consul(1), 100).unwrap();
        store.set_score(&consul(2), 50).unwrap();
        store.commit().unwrap();

        store.set_score(&consul(3), 10).unwrap();
        store.delete(&keys::score(&consul(1)));

        let scores = store.scores().unwrap();
        assert_eq!(scores, vec![(consul(2), 50), (consul(3), 10)]);
        assert_eq!(store.committed().scores().unwrap().len(), 2);
    }

    #[test]
    fn test_votes_are_one_ballot_and_clearable() {
        let mut store = LedgerStore::in_memory();
        let ballot = vec![Vote {
            target: consul(2),
            score: 80,
        }];
        store.put_votes(&consul(1), &ballot).unwrap();
        assert!(store.put_votes(&consul(1), &ballot).is_err());
        store.commit().unwrap();

        assert_eq!(store.votes().unwrap(), vec![(consul(1), ballot)]);
        store.clear_votes().unwrap();
        assert!(store.votes().unwrap().is_empty());
        store.commit().unwrap();
        assert!(store.committed().votes().unwrap().is_empty());
    }

    #[test]
    fn test_results_and_signatures_by_signer() {
        let mut store = LedgerStore::in_memory();
        let nebula = NebulaId::new(vec![0xaa]);
        for i in [1u8, 3] {
            store
                .put_result(ChainType::WAVES, &nebula, 5, &oracle(i), &Signature(vec![i; 65]))
                .unwrap();
            store
                .put_sign_consuls(ChainType::WAVES, 2, &consul(i), &Signature(vec![i; 65]))
                .unwrap();
        }
        // A different height must not leak into the scan.
        store
            .put_result(ChainType::WAVES, &nebula, 50, &oracle(2), &Signature(vec![2; 65]))
            .unwrap();

        let results = store.results(ChainType::WAVES, &nebula, 5).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.contains_key(&oracle(1)));
        assert!(results.contains_key(&oracle(3)));

        let sigs = store.sign_consuls_all(ChainType::WAVES, 2).unwrap();
        assert_eq!(sigs.keys().copied().collect::<Vec<_>>(), vec![consul(1), consul(3)]);
    }

    #[test]
    fn test_app_hash_chains_and_survives_reopen() {
        let mut store = LedgerStore::in_memory();
        assert_eq!(store.commit().unwrap(), [0u8; 32]);

        store.set_last_height(1).unwrap();
        let h1 = store.commit().unwrap();
        assert_ne!(h1, [0u8; 32]);

        store.set_last_height(2).unwrap();
        let h2 = store.commit().unwrap();
        assert_ne!(h1, h2);
        assert_eq!(store.app_hash(), h2);
    }

    #[test]
    fn test_identical_blocks_give_identical_hashes() {
        let run = || {
            let mut store = LedgerStore::in_memory();
            store.set_score(&consul(1), 100).unwrap();
            store.set_last_round_approved(1).unwrap();
            store.commit().unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_drop_nebula_removes_registration() {
        let mut store = LedgerStore::in_memory();
        let nebula = NebulaId::new(vec![9]);
        store
            .set_nebula_info(&NebulaInfo {
                chain: ChainType::ERGO,
                nebula: nebula.clone(),
                max_pulses_per_block: 1,
                min_score: 0,
                bft_value: 3,
                owner: consul(1),
            })
            .unwrap();
        store
            .set_oracles_by_nebula(ChainType::ERGO, &nebula, &[oracle(1)])
            .unwrap();
        store.commit().unwrap();
        assert_eq!(store.nebulae().unwrap().len(), 1);

        store.drop_nebula(ChainType::ERGO, &nebula).unwrap();
        store.commit().unwrap();
        assert!(store.nebulae().unwrap().is_empty());
        assert!(store
            .oracles_by_nebula(ChainType::ERGO, &nebula)
            .unwrap()
            .is_empty());
    }
}
