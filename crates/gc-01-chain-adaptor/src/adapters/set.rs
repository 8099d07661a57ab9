//! Adaptor Set
//!
//! Chain code -> adaptor map, built once at startup from configuration.

use crate::domain::{AdaptorError, AdaptorResult};
use crate::ports::ChainAdaptor;
use shared_types::ChainType;
use std::collections::BTreeMap;
use std::sync::Arc;

/// The adaptors a validator is connected through, keyed by chain.
#[derive(Clone, Default)]
pub struct AdaptorSet {
    adaptors: BTreeMap<ChainType, Arc<dyn ChainAdaptor>>,
}

impl AdaptorSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an adaptor. One per chain.
    pub fn insert(&mut self, adaptor: Arc<dyn ChainAdaptor>) -> AdaptorResult<()> {
        let chain = adaptor.chain();
        if self.adaptors.contains_key(&chain) {
            return Err(AdaptorError::DuplicateAdaptor(chain));
        }
        self.adaptors.insert(chain, adaptor);
        Ok(())
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, adaptor: Arc<dyn ChainAdaptor>) -> AdaptorResult<Self> {
        self.insert(adaptor)?;
        Ok(self)
    }

    /// Adaptor for `chain`.
    pub fn get(&self, chain: ChainType) -> AdaptorResult<&Arc<dyn ChainAdaptor>> {
        self.adaptors
            .get(&chain)
            .ok_or(AdaptorError::UnsupportedChain(chain))
    }

    /// Whether `chain` is connected.
    pub fn contains(&self, chain: ChainType) -> bool {
        self.adaptors.contains_key(&chain)
    }

    /// Connected chains in code order.
    pub fn chains(&self) -> Vec<ChainType> {
        self.adaptors.keys().copied().collect()
    }

    /// All adaptors in chain-code order.
    pub fn iter(&self) -> impl Iterator<Item = (&ChainType, &Arc<dyn ChainAdaptor>)> {
        self.adaptors.iter()
    }

    /// Number of connected chains.
    pub fn len(&self) -> usize {
        self.adaptors.len()
    }

    /// True when no chain is connected.
    pub fn is_empty(&self) -> bool {
        self.adaptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{SimulatedAdaptor, SimulatedChain};

    #[test]
    fn test_one_adaptor_per_chain() {
        let eth = SimulatedChain::new(ChainType::ETHEREUM);
        let waves = SimulatedChain::new(ChainType::WAVES);
        let set = AdaptorSet::new()
            .with(Arc::new(SimulatedAdaptor::from_seed(eth.clone(), &[1; 32]).unwrap()))
            .unwrap()
            .with(Arc::new(SimulatedAdaptor::from_seed(waves, &[1; 32]).unwrap()))
            .unwrap();
        assert_eq!(set.chains(), vec![ChainType::ETHEREUM, ChainType::WAVES]);
        assert!(set.get(ChainType::ERGO).is_err());

        let dup = set
            .clone()
            .with(Arc::new(SimulatedAdaptor::from_seed(eth, &[2; 32]).unwrap()));
        assert!(matches!(dup, Err(AdaptorError::DuplicateAdaptor(_))));
    }
}
