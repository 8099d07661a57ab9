//! # Chain Registry
//!
//! Bidirectional mapping between a chain's stable byte code and its name.
//!
//! The registry is built once at process start. After installation it is
//! immutable; every storage key and query path renders chains through it.

use crate::errors::IdentityError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

/// Stable byte code of a target chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChainType(pub u8);

impl ChainType {
    /// Ethereum mainnet and EVM testnets.
    pub const ETHEREUM: ChainType = ChainType(0);
    /// Waves.
    pub const WAVES: ChainType = ChainType(1);
    /// Binance Smart Chain (EVM).
    pub const BINANCE: ChainType = ChainType(2);
    /// Solana.
    pub const SOLANA: ChainType = ChainType(3);
    /// Ergo.
    pub const ERGO: ChainType = ChainType(4);

    /// Raw byte code.
    pub fn code(&self) -> u8 {
        self.0
    }

    /// Name from the process-wide registry.
    pub fn name(&self) -> Result<&'static str, IdentityError> {
        ChainRegistry::global().name(*self)
    }

    /// Key encoding family from the process-wide registry.
    pub fn encoding(&self) -> Result<KeyEncoding, IdentityError> {
        ChainRegistry::global().encoding(*self)
    }
}

impl fmt::Display for ChainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Ok(name) => write!(f, "{}", name),
            Err(_) => write!(f, "chain#{}", self.0),
        }
    }
}

/// How a chain renders addresses and public keys as text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyEncoding {
    /// `0x`-prefixed lowercase hex (Ethereum, Binance).
    Evm,
    /// Base58 (Waves, Solana).
    Base58,
    /// Plain lowercase hex (Ergo).
    Hex,
}

/// One registered chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainSpec {
    /// Byte code.
    pub chain: ChainType,
    /// Stable name used in keys and configuration.
    pub name: String,
    /// Text encoding family.
    pub encoding: KeyEncoding,
}

/// Immutable code <-> name registry.
#[derive(Clone, Debug)]
pub struct ChainRegistry {
    by_code: BTreeMap<u8, ChainSpec>,
    by_name: BTreeMap<String, ChainType>,
}

static GLOBAL_REGISTRY: OnceLock<ChainRegistry> = OnceLock::new();

impl ChainRegistry {
    /// Start building a registry.
    pub fn builder() -> ChainRegistryBuilder {
        ChainRegistryBuilder::default()
    }

    /// Install the process-wide registry. Fails if one is already in place.
    pub fn install(registry: ChainRegistry) -> Result<(), IdentityError> {
        GLOBAL_REGISTRY
            .set(registry)
            .map_err(|_| IdentityError::RegistryFrozen)
    }

    /// Process-wide registry; the standard set when none was installed.
    pub fn global() -> &'static ChainRegistry {
        GLOBAL_REGISTRY.get_or_init(ChainRegistry::default)
    }

    /// Look up a chain's name.
    pub fn name(&self, chain: ChainType) -> Result<&str, IdentityError> {
        self.by_code
            .get(&chain.0)
            .map(|spec| spec.name.as_str())
            .ok_or(IdentityError::UnknownChainCode(chain.0))
    }

    /// Look up a chain by name.
    pub fn chain(&self, name: &str) -> Result<ChainType, IdentityError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| IdentityError::UnknownChainName(name.to_string()))
    }

    /// Look up a chain's key encoding.
    pub fn encoding(&self, chain: ChainType) -> Result<KeyEncoding, IdentityError> {
        self.by_code
            .get(&chain.0)
            .map(|spec| spec.encoding)
            .ok_or(IdentityError::UnknownChainCode(chain.0))
    }

    /// All registered chains in code order.
    pub fn chains(&self) -> impl Iterator<Item = &ChainSpec> {
        self.by_code.values()
    }

    /// Number of registered chains.
    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

impl Default for ChainRegistry {
    fn default() -> Self {
        // The standard set cannot collide, so the builder never fails here.
        let mut builder = ChainRegistry::builder();
        for (chain, name, encoding) in [
            (ChainType::ETHEREUM, "ethereum", KeyEncoding::Evm),
            (ChainType::WAVES, "waves", KeyEncoding::Base58),
            (ChainType::BINANCE, "binance", KeyEncoding::Evm),
            (ChainType::SOLANA, "solana", KeyEncoding::Base58),
            (ChainType::ERGO, "ergo", KeyEncoding::Hex),
        ] {
            builder.insert(chain, name, encoding);
        }
        builder.build_unchecked()
    }
}

/// Builder for [`ChainRegistry`].
#[derive(Default)]
pub struct ChainRegistryBuilder {
    specs: Vec<ChainSpec>,
}

impl ChainRegistryBuilder {
    /// Register a chain.
    pub fn register(
        mut self,
        chain: ChainType,
        name: impl Into<String>,
        encoding: KeyEncoding,
    ) -> Self {
        self.insert(chain, name, encoding);
        self
    }

    fn insert(&mut self, chain: ChainType, name: impl Into<String>, encoding: KeyEncoding) {
        self.specs.push(ChainSpec {
            chain,
            name: name.into(),
            encoding,
        });
    }

    /// Freeze the registry, rejecting duplicate codes or names.
    pub fn build(self) -> Result<ChainRegistry, IdentityError> {
        let mut by_code = BTreeMap::new();
        let mut by_name = BTreeMap::new();
        for spec in self.specs {
            if spec.name.is_empty() || spec.name.contains('_') {
                return Err(IdentityError::Malformed {
                    what: "chain name",
                    reason: format!("'{}' must be non-empty without '_'", spec.name),
                });
            }
            if by_code.contains_key(&spec.chain.0) {
                return Err(IdentityError::DuplicateChain(format!("code {}", spec.chain.0)));
            }
            if by_name.contains_key(&spec.name) {
                return Err(IdentityError::DuplicateChain(spec.name));
            }
            by_name.insert(spec.name.clone(), spec.chain);
            by_code.insert(spec.chain.0, spec);
        }
        Ok(ChainRegistry { by_code, by_name })
    }

    fn build_unchecked(self) -> ChainRegistry {
        let mut by_code = BTreeMap::new();
        let mut by_name = BTreeMap::new();
        for spec in self.specs {
            by_name.insert(spec.name.clone(), spec.chain);
            by_code.insert(spec.chain.0, spec);
        }
        ChainRegistry { by_code, by_name }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_roundtrip() {
        let registry = ChainRegistry::default();
        assert_eq!(registry.len(), 5);
        assert_eq!(registry.name(ChainType::WAVES).unwrap(), "waves");
        assert_eq!(registry.chain("ergo").unwrap(), ChainType::ERGO);
        assert_eq!(
            registry.encoding(ChainType::BINANCE).unwrap(),
            KeyEncoding::Evm
        );
    }

    #[test]
    fn test_unknown_chain() {
        let registry = ChainRegistry::default();
        assert_eq!(
            registry.name(ChainType(42)),
            Err(IdentityError::UnknownChainCode(42))
        );
        assert!(registry.chain("dogecoin").is_err());
    }

    #[test]
    fn test_builder_rejects_duplicates() {
        let result = ChainRegistry::builder()
            .register(ChainType(0), "ethereum", KeyEncoding::Evm)
            .register(ChainType(0), "goerli", KeyEncoding::Evm)
            .build();
        assert!(matches!(result, Err(IdentityError::DuplicateChain(_))));

        let result = ChainRegistry::builder()
            .register(ChainType(0), "ethereum", KeyEncoding::Evm)
            .register(ChainType(7), "ethereum", KeyEncoding::Evm)
            .build();
        assert!(matches!(result, Err(IdentityError::DuplicateChain(_))));
    }

    #[test]
    fn test_builder_rejects_separator_in_name() {
        let result = ChainRegistry::builder()
            .register(ChainType(9), "bad_name", KeyEncoding::Hex)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_display_uses_global_registry() {
        assert_eq!(ChainType::ETHEREUM.to_string(), "ethereum");
        assert_eq!(ChainType(200).to_string(), "chain#200");
    }
}
