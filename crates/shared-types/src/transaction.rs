//! # Ledger Transactions
//!
//! Wire format of everything validators and oracles submit to the
//! coordinating ledger.
//!
//! ## Authentication
//!
//! `id = SHA-256(bincode(sender, kind, args))`. The sender signs `id` with
//! its ed25519 consensus key. Verification recomputes the id first, so a
//! tampered body fails with `IdMismatch` before the signature is checked.
//!
//! ## Argument layouts
//!
//! | Kind | Arguments |
//! |---|---|
//! | `AddOracle` | chain, oracle key |
//! | `AddOracleInNebula` | chain, nebula, oracle key |
//! | `NewRound` | chain, round id, external height |
//! | `Commit` | chain, nebula, pulse height, commit hash, oracle key |
//! | `Reveal` | chain, nebula, pulse height, commit hash, raw value, oracle key |
//! | `Result` | chain, nebula, pulse height, signature, oracle key |
//! | `Vote` | (target, score) pairs |
//! | `SignNewConsuls` | chain, round, signature |
//! | `SignNewOracles` | chain, nebula, round, signature |
//! | `ApproveLastRound` | round |
//! | `SetNebula` | chain, nebula, max pulses per block, min score, bft value |
//! | `DropNebula` | chain, nebula |
//! | `SetNebulaCustomParams` | chain, nebula, params (opaque bytes) |

use crate::entities::{sha256, ConsulPubKey, Hash};
use crate::errors::TxError;
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};

/// Enumerated transaction kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TxKind {
    /// Bind a per-chain oracle key to the sender.
    AddOracle = 0,
    /// Join a feed's oracle set.
    AddOracleInNebula = 1,
    /// Bind a round id to an external height.
    NewRound = 2,
    /// Commit phase record.
    Commit = 3,
    /// Reveal phase record.
    Reveal = 4,
    /// Result phase signature.
    Result = 5,
    /// Trust votes.
    Vote = 6,
    /// Signature over the next consul set.
    SignNewConsuls = 7,
    /// Signature over a feed's next oracle set.
    SignNewOracles = 8,
    /// Mark a round synchronized on every chain.
    ApproveLastRound = 9,
    /// Register or update a feed.
    SetNebula = 10,
    /// Remove a feed.
    DropNebula = 11,
    /// Opaque per-feed parameters.
    SetNebulaCustomParams = 12,
}

impl TxKind {
    /// Stable byte code.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl TryFrom<u8> for TxKind {
    type Error = TxError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            0 => TxKind::AddOracle,
            1 => TxKind::AddOracleInNebula,
            2 => TxKind::NewRound,
            3 => TxKind::Commit,
            4 => TxKind::Reveal,
            5 => TxKind::Result,
            6 => TxKind::Vote,
            7 => TxKind::SignNewConsuls,
            8 => TxKind::SignNewOracles,
            9 => TxKind::ApproveLastRound,
            10 => TxKind::SetNebula,
            11 => TxKind::DropNebula,
            12 => TxKind::SetNebulaCustomParams,
            other => return Err(TxError::UnknownKind(other)),
        })
    }
}

/// One typed argument.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxArg {
    /// Single byte, used for chain codes.
    Byte(u8),
    /// Unsigned integer (heights, rounds, scores).
    Int(u64),
    /// Variable-length bytes (keys, hashes, values, signatures).
    Bytes(Vec<u8>),
}

impl From<u8> for TxArg {
    fn from(v: u8) -> Self {
        TxArg::Byte(v)
    }
}

impl From<u64> for TxArg {
    fn from(v: u64) -> Self {
        TxArg::Int(v)
    }
}

impl From<Vec<u8>> for TxArg {
    fn from(v: Vec<u8>) -> Self {
        TxArg::Bytes(v)
    }
}

impl From<&[u8]> for TxArg {
    fn from(v: &[u8]) -> Self {
        TxArg::Bytes(v.to_vec())
    }
}

#[derive(Serialize)]
struct TxBody<'a> {
    sender: &'a ConsulPubKey,
    kind: TxKind,
    args: &'a [TxArg],
}

/// A signed ledger transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// SHA-256 over the canonical body.
    pub id: Hash,
    /// Sender's consensus key.
    pub sender: ConsulPubKey,
    /// What this transaction does.
    pub kind: TxKind,
    /// ed25519 signature over `id`.
    pub signature: Vec<u8>,
    /// Ordered typed arguments.
    pub args: Vec<TxArg>,
}

impl Transaction {
    /// Build and sign a transaction.
    pub fn new_signed(kind: TxKind, args: Vec<TxArg>, key: &SigningKey) -> Result<Self, TxError> {
        let sender = ConsulPubKey(key.verifying_key().to_bytes());
        let id = Self::compute_id(&sender, kind, &args)?;
        let signature = key.sign(&id).to_bytes().to_vec();
        Ok(Self {
            id,
            sender,
            kind,
            signature,
            args,
        })
    }

    fn compute_id(sender: &ConsulPubKey, kind: TxKind, args: &[TxArg]) -> Result<Hash, TxError> {
        let body = bincode::serialize(&TxBody { sender, kind, args })
            .map_err(|e| TxError::Malformed(e.to_string()))?;
        Ok(sha256(&body))
    }

    /// Check the id and the sender's signature.
    pub fn verify(&self) -> Result<(), TxError> {
        if Self::compute_id(&self.sender, self.kind, &self.args)? != self.id {
            return Err(TxError::IdMismatch);
        }
        let key =
            VerifyingKey::from_bytes(&self.sender.0).map_err(|_| TxError::InvalidSignature)?;
        let sig_bytes: [u8; 64] = self
            .signature
            .as_slice()
            .try_into()
            .map_err(|_| TxError::InvalidSignature)?;
        let signature = ed25519_dalek::Signature::from_bytes(&sig_bytes);
        key.verify(&self.id, &signature)
            .map_err(|_| TxError::InvalidSignature)
    }

    /// Wire bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TxError> {
        bincode::serialize(self).map_err(|e| TxError::Malformed(e.to_string()))
    }

    /// Parse wire bytes. Does not verify.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TxError> {
        bincode::deserialize(bytes).map_err(|e| TxError::Malformed(e.to_string()))
    }

    /// Byte argument at `index`.
    pub fn arg_byte(&self, index: usize) -> Result<u8, TxError> {
        match self.args.get(index) {
            Some(TxArg::Byte(v)) => Ok(*v),
            _ => Err(TxError::BadArgument {
                index,
                expected: "byte",
            }),
        }
    }

    /// Integer argument at `index`.
    pub fn arg_int(&self, index: usize) -> Result<u64, TxError> {
        match self.args.get(index) {
            Some(TxArg::Int(v)) => Ok(*v),
            _ => Err(TxError::BadArgument {
                index,
                expected: "int",
            }),
        }
    }

    /// Bytes argument at `index`.
    pub fn arg_bytes(&self, index: usize) -> Result<&[u8], TxError> {
        match self.args.get(index) {
            Some(TxArg::Bytes(v)) => Ok(v),
            _ => Err(TxError::BadArgument {
                index,
                expected: "bytes",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(seed: u8) -> SigningKey {
        SigningKey::from_bytes(&[seed; 32])
    }

    #[test]
    fn test_signed_transaction_verifies() {
        let tx = Transaction::new_signed(
            TxKind::ApproveLastRound,
            vec![TxArg::Int(3)],
            &key(1),
        )
        .unwrap();
        assert!(tx.verify().is_ok());

        let decoded = Transaction::from_bytes(&tx.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, tx);
        assert!(decoded.verify().is_ok());
    }

    #[test]
    fn test_tampered_args_fail_id_check() {
        let mut tx =
            Transaction::new_signed(TxKind::Vote, vec![TxArg::Int(100)], &key(2)).unwrap();
        tx.args[0] = TxArg::Int(0);
        assert_eq!(tx.verify(), Err(TxError::IdMismatch));
    }

    #[test]
    fn test_foreign_sender_fails_signature() {
        let mut tx =
            Transaction::new_signed(TxKind::Vote, vec![TxArg::Int(100)], &key(2)).unwrap();
        tx.sender = ConsulPubKey(key(3).verifying_key().to_bytes());
        tx.id = Transaction::compute_id(&tx.sender, tx.kind, &tx.args).unwrap();
        assert_eq!(tx.verify(), Err(TxError::InvalidSignature));
    }

    #[test]
    fn test_argument_accessors() {
        let tx = Transaction::new_signed(
            TxKind::NewRound,
            vec![TxArg::Byte(1), TxArg::Int(7), TxArg::Bytes(vec![9])],
            &key(4),
        )
        .unwrap();
        assert_eq!(tx.arg_byte(0).unwrap(), 1);
        assert_eq!(tx.arg_int(1).unwrap(), 7);
        assert_eq!(tx.arg_bytes(2).unwrap(), &[9]);
        assert!(tx.arg_int(0).is_err());
        assert!(tx.arg_bytes(5).is_err());
    }

    #[test]
    fn test_kind_codes() {
        for code in 0u8..=12 {
            assert_eq!(TxKind::try_from(code).unwrap().code(), code);
        }
        assert_eq!(TxKind::try_from(13), Err(TxError::UnknownKind(13)));
    }
}
