// Path: crates/types/src/validators.rs

//! Validator key tuples and validator-set handling.

use crate::codec::{JamDecode, JamEncode};
use crate::error::CodecError;
use crate::primitives::{BandersnatchKey, BlsKey, Ed25519Key};
use std::collections::BTreeSet;

/// The full key material a validator publishes.
///
/// The tuple layout (and its 336-octet concatenated encoding) is fixed by
/// the protocol: Bandersnatch, Ed25519, BLS, then free-form metadata.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ValidatorKeys {
    /// The Bandersnatch key used for seals, VRFs, and ring proofs.
    pub bandersnatch: BandersnatchKey,
    /// The Ed25519 key used for guarantees, assurances, and judgments.
    pub ed25519: Ed25519Key,
    /// The BLS key reserved for accumulator-level aggregation.
    pub bls: BlsKey,
    /// Opaque metadata (network address, operator tag).
    pub metadata: [u8; 128],
}

impl ValidatorKeys {
    /// The number of octets in the canonical encoding.
    pub const ENCODED_LEN: usize = 32 + 32 + 144 + 128;

    /// The zero validator key, substituted for offenders so set ordering
    /// and cardinality are preserved.
    pub fn zero() -> Self {
        ValidatorKeys {
            bandersnatch: [0u8; 32],
            ed25519: [0u8; 32],
            bls: [0u8; 144],
            metadata: [0u8; 128],
        }
    }

    /// Returns true for the zero (null) validator key.
    pub fn is_zero(&self) -> bool {
        self.bandersnatch == [0u8; 32] && self.ed25519 == [0u8; 32]
    }
}

impl Default for ValidatorKeys {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Debug for ValidatorKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatorKeys")
            .field("bandersnatch", &hex::encode(&self.bandersnatch[..8]))
            .field("ed25519", &hex::encode(&self.ed25519[..8]))
            .finish()
    }
}

impl JamEncode for ValidatorKeys {
    fn encode_to(&self, dest: &mut Vec<u8>) {
        dest.extend_from_slice(&self.bandersnatch);
        dest.extend_from_slice(&self.ed25519);
        dest.extend_from_slice(&self.bls);
        dest.extend_from_slice(&self.metadata);
    }
}

impl JamDecode for ValidatorKeys {
    fn decode(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(ValidatorKeys {
            bandersnatch: <[u8; 32]>::decode(input)?,
            ed25519: <[u8; 32]>::decode(input)?,
            bls: <[u8; 144]>::decode(input)?,
            metadata: <[u8; 128]>::decode(input)?,
        })
    }
}

/// An ordered validator set of fixed cardinality.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct ValidatorSet(pub Vec<ValidatorKeys>);

impl ValidatorSet {
    /// Builds a set of exactly `count` entries, padding with zero keys when
    /// the chain spec prescribes fewer validators than the protocol count.
    pub fn padded(mut keys: Vec<ValidatorKeys>, count: usize) -> Self {
        keys.truncate(count);
        keys.resize_with(count, ValidatorKeys::zero);
        ValidatorSet(keys)
    }

    /// The number of entries, including zero-key padding.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the set holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the keys at `index`, if in bounds.
    pub fn get(&self, index: usize) -> Option<&ValidatorKeys> {
        self.0.get(index)
    }

    /// Returns a copy with every offender's entry replaced by the zero key.
    ///
    /// Ordering and cardinality are preserved so seal-key schedules and
    /// core assignments computed against the set remain stable.
    pub fn with_offenders_nulled(&self, offenders: &BTreeSet<Ed25519Key>) -> Self {
        ValidatorSet(
            self.0
                .iter()
                .map(|keys| {
                    if offenders.contains(&keys.ed25519) {
                        ValidatorKeys::zero()
                    } else {
                        *keys
                    }
                })
                .collect(),
        )
    }

    /// Iterates the Bandersnatch keys in set order.
    pub fn bandersnatch_keys(&self) -> impl Iterator<Item = &BandersnatchKey> {
        self.0.iter().map(|keys| &keys.bandersnatch)
    }
}

impl JamEncode for ValidatorSet {
    fn encode_to(&self, dest: &mut Vec<u8>) {
        // Cardinality is fixed by the chain spec, so the set encodes as a
        // fixed sequence with no length prefix.
        for keys in &self.0 {
            keys.encode_to(dest);
        }
    }
}

impl ValidatorSet {
    /// Decodes a set of exactly `count` entries.
    pub fn decode_fixed(input: &mut &[u8], count: usize) -> Result<Self, CodecError> {
        let mut keys = Vec::with_capacity(count);
        for _ in 0..count {
            keys.push(ValidatorKeys::decode(input)?);
        }
        Ok(ValidatorSet(keys))
    }
}
