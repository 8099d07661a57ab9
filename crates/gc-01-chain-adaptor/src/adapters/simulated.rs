//! Simulated Target Chain Adapter
//!
//! An in-process stand-in for a Gravity-enabled chain: a consul contract
//! plus one nebula contract per feed, with real secp256k1 signature checks.
//! Used by tests and by the single-node devnet.

use crate::domain::{
    bft_threshold, consuls_message, oracles_message, AdaptorError, AdaptorResult, SignatureBatch,
};
use crate::ports::{ChainAdaptor, ChainTxId};
use async_trait::async_trait;
use k256::ecdsa::{RecoveryId, SigningKey, VerifyingKey};
use parking_lot::Mutex;
use shared_types::{
    sha256, ChainType, Hash, NebulaId, OraclesPubKey, Signature, Value, ValueType,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Width of a recoverable secp256k1 signature (r || s || v).
pub const SECP_SIGNATURE_LEN: usize = 65;

/// State of one deployed nebula contract.
#[derive(Clone, Debug)]
pub struct NebulaContract {
    /// Declared value type.
    pub value_type: ValueType,
    /// Signatures required per pulse.
    pub bft_value: usize,
    /// Current oracle set.
    pub oracles: Vec<OraclesPubKey>,
    /// Oracle rotation rounds applied.
    pub oracle_rounds: BTreeSet<u64>,
    /// Published pulse hashes by pulse id.
    pub pulses: BTreeMap<u64, Hash>,
    /// Values delivered to subscribers.
    pub delivered: Vec<(u64, Value)>,
}

impl NebulaContract {
    /// Highest published pulse id, 0 before the first pulse.
    pub fn last_pulse_id(&self) -> u64 {
        self.pulses.keys().next_back().copied().unwrap_or(0)
    }
}

#[derive(Default)]
struct ChainState {
    height: u64,
    consuls: Vec<OraclesPubKey>,
    rounds: BTreeSet<u64>,
    nebulae: BTreeMap<NebulaId, NebulaContract>,
    confirmed: BTreeSet<ChainTxId>,
    pending: BTreeSet<ChainTxId>,
    hold_confirmations: bool,
    tx_seq: u64,
    offline: bool,
    consul_updates: u64,
    oracle_updates: u64,
}

impl ChainState {
    fn submit(&mut self, chain: ChainType) -> ChainTxId {
        self.tx_seq += 1;
        let id = format!("{}-{}", chain, self.tx_seq);
        if self.hold_confirmations {
            self.pending.insert(id.clone());
        } else {
            self.confirmed.insert(id.clone());
        }
        id
    }
}

/// Shared handle to one simulated chain.
#[derive(Clone)]
pub struct SimulatedChain {
    chain: ChainType,
    state: Arc<Mutex<ChainState>>,
}

impl SimulatedChain {
    /// Empty chain at height 0.
    pub fn new(chain: ChainType) -> Self {
        Self {
            chain,
            state: Arc::new(Mutex::new(ChainState::default())),
        }
    }

    /// Chain code.
    pub fn chain(&self) -> ChainType {
        self.chain
    }

    /// Current height.
    pub fn height(&self) -> u64 {
        self.state.lock().height
    }

    /// Mine `blocks` empty blocks.
    pub fn advance(&self, blocks: u64) {
        self.state.lock().height += blocks;
    }

    /// Seed the consul contract.
    pub fn set_consuls(&self, consuls: Vec<OraclesPubKey>) {
        self.state.lock().consuls = consuls;
    }

    /// Current consul set.
    pub fn consuls(&self) -> Vec<OraclesPubKey> {
        self.state.lock().consuls.clone()
    }

    /// Deploy a nebula contract.
    pub fn deploy_nebula(
        &self,
        nebula: NebulaId,
        value_type: ValueType,
        bft_value: usize,
        oracles: Vec<OraclesPubKey>,
    ) {
        self.state.lock().nebulae.insert(
            nebula,
            NebulaContract {
                value_type,
                bft_value,
                oracles,
                oracle_rounds: BTreeSet::new(),
                pulses: BTreeMap::new(),
                delivered: Vec::new(),
            },
        );
    }

    /// Snapshot of a nebula contract.
    pub fn nebula(&self, nebula: &NebulaId) -> Option<NebulaContract> {
        self.state.lock().nebulae.get(nebula).cloned()
    }

    /// Make every call fail with an RPC error.
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().offline = offline;
    }

    /// Keep new transactions unconfirmed until released.
    pub fn hold_confirmations(&self, hold: bool) {
        let mut state = self.state.lock();
        state.hold_confirmations = hold;
        if !hold {
            let pending = std::mem::take(&mut state.pending);
            state.confirmed.extend(pending);
        }
    }

    /// Accepted consul rotations.
    pub fn consul_updates(&self) -> u64 {
        self.state.lock().consul_updates
    }

    /// Accepted oracle rotations across all feeds.
    pub fn oracle_updates(&self) -> u64 {
        self.state.lock().oracle_updates
    }

    fn online(&self) -> AdaptorResult<parking_lot::MutexGuard<'_, ChainState>> {
        let state = self.state.lock();
        if state.offline {
            return Err(AdaptorError::Rpc {
                chain: self.chain,
                reason: "node unreachable".to_string(),
            });
        }
        Ok(state)
    }

    fn rejected(&self, reason: impl Into<String>) -> AdaptorError {
        AdaptorError::Rejected {
            chain: self.chain,
            reason: reason.into(),
        }
    }

    fn unknown_nebula(&self, nebula: &NebulaId) -> AdaptorError {
        AdaptorError::UnknownNebula {
            chain: self.chain,
            nebula: hex::encode(nebula.as_bytes()),
        }
    }
}

/// Sign a digest, producing `r || s || v`.
pub fn sign_digest(key: &SigningKey, digest: &Hash) -> AdaptorResult<Signature> {
    let (sig, recid) = key
        .sign_prehash_recoverable(digest)
        .map_err(|e| AdaptorError::Signing(e.to_string()))?;
    let mut bytes = sig.to_bytes().to_vec();
    bytes.push(recid.to_byte());
    Ok(Signature(bytes))
}

/// Compressed public key of a signing key, as an oracle envelope.
pub fn oracle_key(key: &SigningKey) -> AdaptorResult<OraclesPubKey> {
    let point = key.verifying_key().to_encoded_point(true);
    Ok(OraclesPubKey::from_slice(point.as_bytes())?)
}

/// Check `signature` over `digest` against `signer`.
pub fn verify_digest(signer: &OraclesPubKey, digest: &Hash, signature: &Signature) -> bool {
    let bytes = signature.as_bytes();
    if bytes.len() != SECP_SIGNATURE_LEN {
        return false;
    }
    let Ok(sig) = k256::ecdsa::Signature::from_slice(&bytes[..64]) else {
        return false;
    };
    let Some(recid) = RecoveryId::from_byte(bytes[64]) else {
        return false;
    };
    match VerifyingKey::recover_from_prehash(digest, &sig, recid) {
        Ok(recovered) => recovered.to_encoded_point(true).as_bytes() == signer.0.as_slice(),
        Err(_) => false,
    }
}

/// Count distinct authorized seats with a valid signature over `digest`.
fn count_valid(batch: &SignatureBatch, authorized: &[OraclesPubKey], digest: &Hash) -> usize {
    let mut seen = BTreeSet::new();
    batch
        .present()
        .filter(|(seat, sig)| {
            authorized.contains(seat) && verify_digest(seat, digest, sig) && seen.insert(**seat)
        })
        .count()
}

/// Adaptor holding one validator's key on a [`SimulatedChain`].
pub struct SimulatedAdaptor {
    chain: SimulatedChain,
    key: SigningKey,
    pub_key: OraclesPubKey,
}

impl SimulatedAdaptor {
    /// Adaptor for `key` on `chain`.
    pub fn new(chain: SimulatedChain, key: SigningKey) -> AdaptorResult<Self> {
        let pub_key = oracle_key(&key)?;
        Ok(Self {
            chain,
            key,
            pub_key,
        })
    }

    /// Adaptor with a key derived from a 32-byte seed.
    pub fn from_seed(chain: SimulatedChain, seed: &[u8; 32]) -> AdaptorResult<Self> {
        let key = SigningKey::from_slice(seed).map_err(|e| AdaptorError::Signing(e.to_string()))?;
        Self::new(chain, key)
    }

    /// Adaptor with a fresh random key.
    pub fn random(chain: SimulatedChain) -> AdaptorResult<Self> {
        Self::new(chain, SigningKey::random(&mut rand::thread_rng()))
    }

    /// Underlying chain handle.
    pub fn simulated_chain(&self) -> &SimulatedChain {
        &self.chain
    }
}

#[async_trait]
impl ChainAdaptor for SimulatedAdaptor {
    fn chain(&self) -> ChainType {
        self.chain.chain
    }

    fn pub_key(&self) -> OraclesPubKey {
        self.pub_key
    }

    fn signature_len(&self) -> usize {
        SECP_SIGNATURE_LEN
    }

    async fn get_height(&self) -> AdaptorResult<u64> {
        Ok(self.chain.online()?.height)
    }

    async fn sign(&self, digest: &Hash) -> AdaptorResult<Signature> {
        sign_digest(&self.key, digest)
    }

    async fn is_confirmed(&self, tx_id: &str) -> AdaptorResult<bool> {
        Ok(self.chain.online()?.confirmed.contains(tx_id))
    }

    async fn value_type(&self, nebula: &NebulaId) -> AdaptorResult<ValueType> {
        let state = self.chain.online()?;
        state
            .nebulae
            .get(nebula)
            .map(|n| n.value_type)
            .ok_or_else(|| self.chain.unknown_nebula(nebula))
    }

    async fn add_pulse(
        &self,
        nebula: &NebulaId,
        pulse_id: u64,
        hash: Hash,
        signatures: &SignatureBatch,
    ) -> AdaptorResult<ChainTxId> {
        let chain = self.chain.chain;
        let mut state = self.chain.online()?;
        let contract = state
            .nebulae
            .get(nebula)
            .ok_or_else(|| self.chain.unknown_nebula(nebula))?;

        let expected = contract.last_pulse_id() + 1;
        if pulse_id != expected {
            return Err(self
                .chain
                .rejected(format!("pulse {} out of order, expected {}", pulse_id, expected)));
        }
        let valid = count_valid(signatures, &contract.oracles, &hash);
        if valid < contract.bft_value {
            return Err(self.chain.rejected(format!(
                "{} valid signatures, bft value {}",
                valid, contract.bft_value
            )));
        }

        if let Some(contract) = state.nebulae.get_mut(nebula) {
            contract.pulses.insert(pulse_id, hash);
        }
        let tx = state.submit(chain);
        info!("[gc-01] {} pulse {} accepted ({} signatures)", chain, pulse_id, valid);
        Ok(tx)
    }

    async fn send_value_to_subs(
        &self,
        nebula: &NebulaId,
        pulse_id: u64,
        value: &Value,
    ) -> AdaptorResult<()> {
        let mut state = self.chain.online()?;
        let unknown = self.chain.unknown_nebula(nebula);
        let contract = state.nebulae.get_mut(nebula).ok_or(unknown)?;
        match contract.pulses.get(&pulse_id) {
            Some(hash) if *hash == sha256(&value.encode()) => {
                contract.delivered.push((pulse_id, value.clone()));
                debug!("[gc-01] delivered pulse {} value {}", pulse_id, value);
                Ok(())
            }
            Some(_) => Err(self.chain.rejected("value does not match pulse hash")),
            None => Err(self.chain.rejected(format!("pulse {} not found", pulse_id))),
        }
    }

    async fn set_oracles_to_nebula(
        &self,
        nebula: &NebulaId,
        oracles: &[OraclesPubKey],
        signatures: &SignatureBatch,
        round: u64,
    ) -> AdaptorResult<ChainTxId> {
        let chain = self.chain.chain;
        let mut state = self.chain.online()?;
        let consuls = state.consuls.clone();
        let contract = state
            .nebulae
            .get(nebula)
            .ok_or_else(|| self.chain.unknown_nebula(nebula))?;
        if contract.oracle_rounds.contains(&round) {
            return Err(self.chain.rejected(format!("oracle round {} exists", round)));
        }

        let digest = oracles_message(nebula, oracles, round);
        let valid = count_valid(signatures, &consuls, &digest);
        let required = bft_threshold(consuls.len());
        if valid < required {
            return Err(self
                .chain
                .rejected(format!("{} valid signatures, {} required", valid, required)));
        }

        if let Some(contract) = state.nebulae.get_mut(nebula) {
            contract.oracles = oracles.to_vec();
            contract.oracle_rounds.insert(round);
        }
        state.oracle_updates += 1;
        Ok(state.submit(chain))
    }

    async fn send_consuls_to_gravity_contract(
        &self,
        consuls: &[OraclesPubKey],
        signatures: &SignatureBatch,
        round: u64,
    ) -> AdaptorResult<ChainTxId> {
        let chain = self.chain.chain;
        let mut state = self.chain.online()?;
        if state.rounds.contains(&round) {
            return Err(self.chain.rejected(format!("round {} exists", round)));
        }
        let last = state.rounds.iter().next_back().copied().unwrap_or(0);
        if round < last {
            return Err(self
                .chain
                .rejected(format!("round {} behind last round {}", round, last)));
        }

        let digest = consuls_message(chain, consuls, round);
        let valid = count_valid(signatures, &state.consuls, &digest);
        let required = bft_threshold(state.consuls.len());
        if valid < required {
            return Err(self
                .chain
                .rejected(format!("{} valid signatures, {} required", valid, required)));
        }

        state.consuls = consuls.to_vec();
        state.rounds.insert(round);
        state.consul_updates += 1;
        info!("[gc-01] {} consuls rotated for round {}", chain, round);
        Ok(state.submit(chain))
    }

    async fn sign_consuls(
        &self,
        consuls: &[OraclesPubKey],
        round: u64,
    ) -> AdaptorResult<Signature> {
        sign_digest(&self.key, &consuls_message(self.chain.chain, consuls, round))
    }

    async fn sign_oracles(
        &self,
        nebula: &NebulaId,
        oracles: &[OraclesPubKey],
        round: u64,
    ) -> AdaptorResult<Signature> {
        sign_digest(&self.key, &oracles_message(nebula, oracles, round))
    }

    async fn last_pulse_id(&self, nebula: &NebulaId) -> AdaptorResult<u64> {
        let state = self.chain.online()?;
        state
            .nebulae
            .get(nebula)
            .map(NebulaContract::last_pulse_id)
            .ok_or_else(|| self.chain.unknown_nebula(nebula))
    }

    async fn last_round(&self) -> AdaptorResult<u64> {
        let state = self.chain.online()?;
        Ok(state.rounds.iter().next_back().copied().unwrap_or(0))
    }

    async fn round_exist(&self, round: u64) -> AdaptorResult<bool> {
        Ok(self.chain.online()?.rounds.contains(&round))
    }

    async fn oracles_round_exist(&self, nebula: &NebulaId, round: u64) -> AdaptorResult<bool> {
        let state = self.chain.online()?;
        state
            .nebulae
            .get(nebula)
            .map(|n| n.oracle_rounds.contains(&round))
            .ok_or_else(|| self.chain.unknown_nebula(nebula))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RetryPolicy;
    use std::time::Duration;

    fn adaptors(chain: &SimulatedChain, n: u8) -> Vec<SimulatedAdaptor> {
        (1..=n)
            .map(|i| SimulatedAdaptor::from_seed(chain.clone(), &[i; 32]).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_sign_and_verify_digest() {
        let chain = SimulatedChain::new(ChainType::ETHEREUM);
        let adaptor = SimulatedAdaptor::from_seed(chain, &[9; 32]).unwrap();
        let digest = sha256(b"pulse");
        let sig = adaptor.sign(&digest).await.unwrap();
        assert_eq!(sig.as_bytes().len(), SECP_SIGNATURE_LEN);
        assert!(verify_digest(&adaptor.pub_key(), &digest, &sig));
        assert!(!verify_digest(&adaptor.pub_key(), &sha256(b"other"), &sig));
    }

    #[tokio::test]
    async fn test_add_pulse_requires_bft_value() {
        let chain = SimulatedChain::new(ChainType::ETHEREUM);
        let oracles = adaptors(&chain, 3);
        let keys: Vec<_> = oracles.iter().map(|a| a.pub_key()).collect();
        let nebula = NebulaId::new(vec![0xaa]);
        chain.deploy_nebula(nebula.clone(), ValueType::Int64, 2, keys.clone());

        let value = Value::Int64(11);
        let hash = sha256(&value.encode());
        let mut batch = SignatureBatch::new(keys.clone(), SECP_SIGNATURE_LEN);
        batch.insert(&keys[0], oracles[0].sign(&hash).await.unwrap());

        let err = oracles[0].add_pulse(&nebula, 1, hash, &batch).await;
        assert!(matches!(err, Err(AdaptorError::Rejected { .. })));

        batch.insert(&keys[2], oracles[2].sign(&hash).await.unwrap());
        let tx = oracles[0].add_pulse(&nebula, 1, hash, &batch).await.unwrap();
        oracles[0]
            .wait_tx(&tx, &RetryPolicy::default())
            .await
            .unwrap();
        assert_eq!(oracles[1].last_pulse_id(&nebula).await.unwrap(), 1);

        // Same pulse id again is refused.
        assert!(oracles[1].add_pulse(&nebula, 1, hash, &batch).await.is_err());

        oracles[0]
            .send_value_to_subs(&nebula, 1, &value)
            .await
            .unwrap();
        assert_eq!(chain.nebula(&nebula).unwrap().delivered, vec![(1, value)]);
    }

    #[tokio::test]
    async fn test_consul_rotation_checks_round_and_threshold() {
        let chain = SimulatedChain::new(ChainType::WAVES);
        let consuls = adaptors(&chain, 3);
        let keys: Vec<_> = consuls.iter().map(|a| a.pub_key()).collect();
        chain.set_consuls(keys.clone());

        let next = vec![keys[1], keys[2]];
        let mut batch = SignatureBatch::new(keys.clone(), SECP_SIGNATURE_LEN);
        for adaptor in consuls.iter().take(2) {
            let sig = adaptor.sign_consuls(&next, 1).await.unwrap();
            batch.insert(&adaptor.pub_key(), sig);
        }

        assert!(!consuls[0].round_exist(1).await.unwrap());
        consuls[0]
            .send_consuls_to_gravity_contract(&next, &batch, 1)
            .await
            .unwrap();
        assert!(consuls[0].round_exist(1).await.unwrap());
        assert_eq!(consuls[0].last_round().await.unwrap(), 1);
        assert_eq!(chain.consuls(), next);

        // Re-submitting an applied round is rejected, not applied twice.
        assert!(consuls[0]
            .send_consuls_to_gravity_contract(&next, &batch, 1)
            .await
            .is_err());
        assert_eq!(chain.consul_updates(), 1);
    }

    #[tokio::test]
    async fn test_wait_tx_is_bounded() {
        let chain = SimulatedChain::new(ChainType::ERGO);
        let adaptor = SimulatedAdaptor::from_seed(chain.clone(), &[3; 32]).unwrap();
        chain.hold_confirmations(true);
        let tx = {
            let mut state = chain.state.lock();
            state.submit(ChainType::ERGO)
        };
        let policy = RetryPolicy {
            attempts: 3,
            interval: Duration::from_millis(1),
            call_timeout: Duration::from_secs(1),
        };
        let result = adaptor.wait_tx(&tx, &policy).await;
        assert!(matches!(result, Err(AdaptorError::Timeout { attempts: 3, .. })));

        chain.hold_confirmations(false);
        assert!(adaptor.wait_tx(&tx, &policy).await.is_ok());
    }

    #[tokio::test]
    async fn test_offline_chain_is_transient() {
        let chain = SimulatedChain::new(ChainType::SOLANA);
        let adaptor = SimulatedAdaptor::random(chain.clone()).unwrap();
        chain.set_offline(true);
        let err = adaptor.get_height().await.unwrap_err();
        assert!(err.is_transient());
    }
}
