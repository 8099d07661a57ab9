//! Digests that target contracts expect consuls and oracles to sign.

use shared_types::{sha256, ChainType, Hash, NebulaId, OraclesPubKey};

const CONSULS_TAG: &[u8] = b"gravity.consuls";
const ORACLES_TAG: &[u8] = b"gravity.oracles";

/// Digest of a new consul set for `round` on `chain`.
pub fn consuls_message(chain: ChainType, consuls: &[OraclesPubKey], round: u64) -> Hash {
    let mut buf = Vec::with_capacity(CONSULS_TAG.len() + 9 + consuls.len() * 33);
    buf.extend_from_slice(CONSULS_TAG);
    buf.push(chain.code());
    buf.extend_from_slice(&round.to_be_bytes());
    for key in consuls {
        buf.extend_from_slice(&key.0);
    }
    sha256(&buf)
}

/// Digest of a feed's new oracle set for `round`.
pub fn oracles_message(nebula: &NebulaId, oracles: &[OraclesPubKey], round: u64) -> Hash {
    let mut buf = Vec::with_capacity(ORACLES_TAG.len() + nebula.0.len() + 8 + oracles.len() * 33);
    buf.extend_from_slice(ORACLES_TAG);
    buf.extend_from_slice(&(nebula.0.len() as u32).to_be_bytes());
    buf.extend_from_slice(nebula.as_bytes());
    buf.extend_from_slice(&round.to_be_bytes());
    for key in oracles {
        buf.extend_from_slice(&key.0);
    }
    sha256(&buf)
}
