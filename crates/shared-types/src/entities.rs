//! # Core Domain Entities
//!
//! Identities and records shared by the ledger, the scheduler and the
//! oracle processes.
//!
//! ## Clusters
//!
//! - **Identity**: `ConsulPubKey`, `OraclesPubKey`, `NebulaId`
//! - **Reputation**: `Consul`, `Vote`
//! - **Signatures**: `Signature` with an explicit absent placeholder

use crate::chain::{ChainType, KeyEncoding};
use crate::errors::IdentityError;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use sha2::{Digest, Sha256};
use std::fmt;

/// A 32-byte SHA-256 hash.
pub type Hash = [u8; 32];

/// Length of the chain-agnostic oracle key envelope.
pub const ORACLE_PUBKEY_LEN: usize = 33;

/// SHA-256 over arbitrary bytes.
pub fn sha256(data: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

// =============================================================================
// IDENTITY
// =============================================================================

/// A validator's ed25519 identity on the coordinating ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConsulPubKey(pub [u8; 32]);

impl ConsulPubKey {
    /// Lowercase hex, as used in storage keys.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse lowercase or uppercase hex.
    pub fn from_hex(s: &str) -> Result<Self, IdentityError> {
        let bytes = hex::decode(s.trim_start_matches("0x")).map_err(|e| {
            IdentityError::Malformed {
                what: "consul pubkey",
                reason: e.to_string(),
            }
        })?;
        Self::from_slice(&bytes)
    }

    /// Build from a byte slice of exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, IdentityError> {
        let key: [u8; 32] = bytes.try_into().map_err(|_| IdentityError::InvalidLength {
            what: "consul pubkey",
            got: bytes.len(),
            expected: 32,
        })?;
        Ok(Self(key))
    }
}

impl fmt::Display for ConsulPubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// A validator's identity on one target chain.
///
/// Always 33 bytes. Chains with 32-byte keys (Waves, Solana) store the key
/// right-aligned behind a zero byte; secp256k1 chains store the compressed
/// point as-is.
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OraclesPubKey(#[serde_as(as = "Bytes")] pub [u8; ORACLE_PUBKEY_LEN]);

impl OraclesPubKey {
    /// All-zero key, used as a seat placeholder.
    pub const ZERO: OraclesPubKey = OraclesPubKey([0u8; ORACLE_PUBKEY_LEN]);

    /// Build from 33 envelope bytes or a 32-byte raw key.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, IdentityError> {
        let mut out = [0u8; ORACLE_PUBKEY_LEN];
        match bytes.len() {
            ORACLE_PUBKEY_LEN => out.copy_from_slice(bytes),
            32 => out[1..].copy_from_slice(bytes),
            got => {
                return Err(IdentityError::InvalidLength {
                    what: "oracle pubkey",
                    got,
                    expected: ORACLE_PUBKEY_LEN,
                })
            }
        }
        Ok(Self(out))
    }

    /// Lowercase hex of the full envelope, as used in storage keys.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Render for the given chain.
    pub fn encode(&self, chain: ChainType) -> Result<String, IdentityError> {
        Ok(match chain.encoding()? {
            KeyEncoding::Evm => format!("0x{}", hex::encode(self.0)),
            KeyEncoding::Hex => hex::encode(self.0),
            KeyEncoding::Base58 => bs58::encode(&self.0[1..]).into_string(),
        })
    }

    /// Parse the chain-specific text form.
    pub fn decode(chain: ChainType, s: &str) -> Result<Self, IdentityError> {
        let bytes = decode_text(chain.encoding()?, s, "oracle pubkey")?;
        Self::from_slice(&bytes)
    }
}

impl fmt::Debug for OraclesPubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OraclesPubKey({})", self.to_hex())
    }
}

/// Opaque identifier of a data-feed contract on its target chain.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NebulaId(pub Vec<u8>);

impl NebulaId {
    /// Wrap raw bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Render for the feed's chain.
    pub fn encode(&self, chain: ChainType) -> Result<String, IdentityError> {
        Ok(match chain.encoding()? {
            KeyEncoding::Evm => format!("0x{}", hex::encode(&self.0)),
            KeyEncoding::Hex => hex::encode(&self.0),
            KeyEncoding::Base58 => bs58::encode(&self.0).into_string(),
        })
    }

    /// Parse the chain-specific text form.
    pub fn decode(chain: ChainType, s: &str) -> Result<Self, IdentityError> {
        let bytes = decode_text(chain.encoding()?, s, "nebula id")?;
        if bytes.is_empty() {
            return Err(IdentityError::InvalidLength {
                what: "nebula id",
                got: 0,
                expected: 1,
            });
        }
        Ok(Self(bytes))
    }
}

impl fmt::Debug for NebulaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NebulaId({})", hex::encode(&self.0))
    }
}

fn decode_text(
    encoding: KeyEncoding,
    s: &str,
    what: &'static str,
) -> Result<Vec<u8>, IdentityError> {
    let malformed = |reason: String| IdentityError::Malformed { what, reason };
    match encoding {
        KeyEncoding::Evm => {
            let body = s
                .strip_prefix("0x")
                .ok_or_else(|| malformed("missing 0x prefix".to_string()))?;
            hex::decode(body).map_err(|e| malformed(e.to_string()))
        }
        KeyEncoding::Hex => hex::decode(s).map_err(|e| malformed(e.to_string())),
        KeyEncoding::Base58 => bs58::decode(s)
            .into_vec()
            .map_err(|e| malformed(e.to_string())),
    }
}

// =============================================================================
// REPUTATION
// =============================================================================

/// An active validator and its committed voting weight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consul {
    /// Ledger identity.
    pub pub_key: ConsulPubKey,
    /// Score at the time the set was computed.
    pub value: u64,
}

/// One validator's trust assertion about another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    /// Validator being rated.
    pub target: ConsulPubKey,
    /// Asserted score on the fixed-point scale.
    pub score: u64,
}

// =============================================================================
// SIGNATURES
// =============================================================================

/// A target-chain signature.
///
/// An all-zero signature is the explicit "absent" marker used to keep
/// fixed-size batches aligned with their signer seats.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Signature(pub Vec<u8>);

impl Signature {
    /// Zero-filled placeholder for a missing signer.
    pub fn absent(len: usize) -> Self {
        Self(vec![0u8; len])
    }

    /// True for empty or all-zero bytes.
    pub fn is_absent(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_absent() {
            write!(f, "Signature(absent)")
        } else {
            write!(f, "Signature({})", hex::encode(&self.0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        let digest = sha256(b"abc");
        assert_eq!(
            hex::encode(digest),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_consul_pubkey_hex() {
        let key = ConsulPubKey([0xAB; 32]);
        let parsed = ConsulPubKey::from_hex(&key.to_hex()).unwrap();
        assert_eq!(parsed, key);
        assert!(ConsulPubKey::from_hex("abcd").is_err());
        assert!(ConsulPubKey::from_hex("zz").is_err());
    }

    #[test]
    fn test_oracle_key_evm_encoding() {
        let mut raw = [0x11u8; 33];
        raw[0] = 0x02;
        let key = OraclesPubKey(raw);
        let text = key.encode(ChainType::ETHEREUM).unwrap();
        assert!(text.starts_with("0x02"));
        assert_eq!(OraclesPubKey::decode(ChainType::ETHEREUM, &text).unwrap(), key);
        // EVM text must carry the prefix.
        assert!(OraclesPubKey::decode(ChainType::ETHEREUM, &text[2..]).is_err());
    }

    #[test]
    fn test_oracle_key_base58_is_right_aligned() {
        let key = OraclesPubKey::from_slice(&[7u8; 32]).unwrap();
        assert_eq!(key.0[0], 0);
        let text = key.encode(ChainType::WAVES).unwrap();
        assert_eq!(text, bs58::encode([7u8; 32]).into_string());
        assert_eq!(OraclesPubKey::decode(ChainType::SOLANA, &text).unwrap(), key);
    }

    #[test]
    fn test_oracle_key_rejects_bad_length() {
        assert!(matches!(
            OraclesPubKey::from_slice(&[1u8; 20]),
            Err(IdentityError::InvalidLength { got: 20, .. })
        ));
    }

    #[test]
    fn test_nebula_id_encodings_differ_per_chain() {
        let id = NebulaId::new(vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(id.encode(ChainType::ETHEREUM).unwrap(), "0xdeadbeef");
        assert_eq!(id.encode(ChainType::ERGO).unwrap(), "deadbeef");
        let b58 = id.encode(ChainType::WAVES).unwrap();
        assert_eq!(NebulaId::decode(ChainType::WAVES, &b58).unwrap(), id);
        assert!(NebulaId::decode(ChainType::ERGO, "").is_err());
        assert!(NebulaId::decode(ChainType::ERGO, "xyz").is_err());
    }

    #[test]
    fn test_signature_absent_marker() {
        assert!(Signature::absent(65).is_absent());
        assert!(Signature::default().is_absent());
        assert!(!Signature(vec![0, 1]).is_absent());
    }
}
