// Path: crates/types/src/primitives.rs

//! Fixed-size hash, key, and signature newtypes.
//!
//! Raw byte arrays are the canonical representation everywhere; hex is
//! presentation-only and appears exclusively through the `Display`/`Debug`
//! implementations here.

use crate::codec::{take, JamDecode, JamEncode};
use crate::error::CodecError;

/// A 32-octet BLAKE2b-256 digest.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct OpaqueHash(pub [u8; 32]);

impl OpaqueHash {
    /// The all-zero hash, used for empty authorizer-queue slots and the
    /// pre-genesis parent.
    pub const ZERO: OpaqueHash = OpaqueHash([0u8; 32]);

    /// Returns true if every octet is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl AsRef<[u8]> for OpaqueHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for OpaqueHash {
    fn from(octets: [u8; 32]) -> Self {
        OpaqueHash(octets)
    }
}

impl std::fmt::Display for OpaqueHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl std::fmt::Debug for OpaqueHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Eight leading octets are plenty for log correlation.
        write!(f, "0x{}..", hex::encode(&self.0[..8]))
    }
}

impl JamEncode for OpaqueHash {
    fn encode_to(&self, dest: &mut Vec<u8>) {
        dest.extend_from_slice(&self.0);
    }
}

impl JamDecode for OpaqueHash {
    fn decode(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(OpaqueHash(<[u8; 32]>::decode(input)?))
    }
}

/// The hash of a block header.
pub type HeaderHash = OpaqueHash;
/// The merkle root of a world state.
pub type StateRootHash = OpaqueHash;
/// The hash of a work package.
pub type WorkPackageHash = OpaqueHash;
/// The hash of a work report.
pub type WorkReportHash = OpaqueHash;
/// An entropy value drawn from the VRF accumulator.
pub type Entropy = OpaqueHash;

/// A 32-octet Bandersnatch public key.
pub type BandersnatchKey = [u8; 32];
/// A 32-octet Ed25519 public key.
pub type Ed25519Key = [u8; 32];
/// A 144-octet BLS public key.
pub type BlsKey = [u8; 144];

/// The index of a timeslot since the JAM common era.
pub type TimeSlot = u32;
/// The index of an epoch.
pub type EpochIndex = u32;
/// The index of a validator within a validator set.
pub type ValidatorIndex = u16;
/// The index of a core.
pub type CoreIndex = u16;
/// A gas amount.
pub type Gas = u64;

/// The stable identifier of a service account.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct ServiceId(pub u32);

impl JamEncode for ServiceId {
    fn encode_to(&self, dest: &mut Vec<u8>) {
        self.0.encode_to(dest);
    }
}

impl JamDecode for ServiceId {
    fn decode(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(ServiceId(u32::decode(input)?))
    }
}

impl std::fmt::Display for ServiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A 64-octet Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Ed25519Signature(pub [u8; 64]);

impl Default for Ed25519Signature {
    fn default() -> Self {
        Ed25519Signature([0u8; 64])
    }
}

impl std::fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ed25519:0x{}..", hex::encode(&self.0[..8]))
    }
}

impl JamEncode for Ed25519Signature {
    fn encode_to(&self, dest: &mut Vec<u8>) {
        dest.extend_from_slice(&self.0);
    }
}

impl JamDecode for Ed25519Signature {
    fn decode(input: &mut &[u8]) -> Result<Self, CodecError> {
        let octets = take(input, 64)?;
        let mut out = [0u8; 64];
        out.copy_from_slice(octets);
        Ok(Ed25519Signature(out))
    }
}

/// A 96-octet Bandersnatch VRF signature (plain or ring).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct BandersnatchSignature(pub [u8; 96]);

impl Default for BandersnatchSignature {
    fn default() -> Self {
        BandersnatchSignature([0u8; 96])
    }
}

impl std::fmt::Debug for BandersnatchSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bander:0x{}..", hex::encode(&self.0[..8]))
    }
}

impl JamEncode for BandersnatchSignature {
    fn encode_to(&self, dest: &mut Vec<u8>) {
        dest.extend_from_slice(&self.0);
    }
}

impl JamDecode for BandersnatchSignature {
    fn decode(input: &mut &[u8]) -> Result<Self, CodecError> {
        let octets = take(input, 96)?;
        let mut out = [0u8; 96];
        out.copy_from_slice(octets);
        Ok(BandersnatchSignature(out))
    }
}

/// Returns the epoch index a timeslot falls in.
pub fn epoch_of(slot: TimeSlot, epoch_len: u32) -> EpochIndex {
    slot / epoch_len
}

/// Returns the phase of a timeslot within its epoch.
pub fn phase_of(slot: TimeSlot, epoch_len: u32) -> u32 {
    slot % epoch_len
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{from_bytes_canonical, to_bytes_canonical};

    #[test]
    fn hash_roundtrip_and_zero() {
        let h = OpaqueHash([7u8; 32]);
        assert_eq!(
            from_bytes_canonical::<OpaqueHash>(&to_bytes_canonical(&h)).unwrap(),
            h
        );
        assert!(OpaqueHash::ZERO.is_zero());
        assert!(!h.is_zero());
    }

    #[test]
    fn signature_lengths() {
        assert_eq!(to_bytes_canonical(&Ed25519Signature::default()).len(), 64);
        assert_eq!(
            to_bytes_canonical(&BandersnatchSignature::default()).len(),
            96
        );
    }

    #[test]
    fn epoch_and_phase_arithmetic() {
        assert_eq!(epoch_of(0, 12), 0);
        assert_eq!(epoch_of(11, 12), 0);
        assert_eq!(epoch_of(12, 12), 1);
        assert_eq!(phase_of(25, 12), 1);
    }
}
