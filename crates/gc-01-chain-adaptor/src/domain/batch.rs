//! # Signature Batches
//!
//! Fixed-size signature arrays aligned with signer seats.
//!
//! Target contracts take one signature slot per seat. A seat that has not
//! signed holds an all-zero placeholder, so a batch can always be submitted
//! at full size and the contract decides whether enough seats are present.

use shared_types::{OraclesPubKey, Signature};

/// `ceil(2n/3)`: signatures required to rotate a set of `n` consuls.
pub fn bft_threshold(n: usize) -> usize {
    (2 * n).div_ceil(3)
}

/// Seats plus one signature slot per seat.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureBatch {
    seats: Vec<OraclesPubKey>,
    signatures: Vec<Signature>,
}

impl SignatureBatch {
    /// Batch with every slot set to an absent placeholder of `sig_len` bytes.
    pub fn new(seats: Vec<OraclesPubKey>, sig_len: usize) -> Self {
        let signatures = vec![Signature::absent(sig_len); seats.len()];
        Self { seats, signatures }
    }

    /// Fill the slot of `signer`. Returns false if it holds no seat.
    pub fn insert(&mut self, signer: &OraclesPubKey, signature: Signature) -> bool {
        match self.seats.iter().position(|seat| seat == signer) {
            Some(index) => {
                self.signatures[index] = signature;
                true
            }
            None => false,
        }
    }

    /// Seat keys in order.
    pub fn seats(&self) -> &[OraclesPubKey] {
        &self.seats
    }

    /// Signature slots in seat order.
    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// Number of seats.
    pub fn len(&self) -> usize {
        self.seats.len()
    }

    /// True when there are no seats.
    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    /// Seat indices that hold a real signature.
    pub fn present_indices(&self) -> Vec<usize> {
        self.signatures
            .iter()
            .enumerate()
            .filter(|(_, sig)| !sig.is_absent())
            .map(|(i, _)| i)
            .collect()
    }

    /// Number of seats that signed.
    pub fn present_count(&self) -> usize {
        self.signatures.iter().filter(|s| !s.is_absent()).count()
    }

    /// True iff at least `threshold` seats signed.
    pub fn meets(&self, threshold: usize) -> bool {
        self.present_count() >= threshold
    }

    /// Present (seat, signature) pairs.
    pub fn present(&self) -> impl Iterator<Item = (&OraclesPubKey, &Signature)> {
        self.seats
            .iter()
            .zip(self.signatures.iter())
            .filter(|(_, sig)| !sig.is_absent())
    }
}
