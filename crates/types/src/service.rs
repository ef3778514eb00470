// Path: crates/types/src/service.rs

//! Service account records with computed footprint accounting.

use crate::codec::{decode_dict, encode_dict, JamDecode, JamEncode};
use crate::error::CodecError;
use crate::primitives::{Gas, OpaqueHash, ServiceId, TimeSlot};
use std::collections::BTreeMap;

/// The key of a preimage-availability request: the hash requested and the
/// declared preimage length.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct PreimageRequest {
    /// The hash whose preimage is solicited.
    pub hash: OpaqueHash,
    /// The length the preimage must have, in octets.
    pub length: u32,
}

impl JamEncode for PreimageRequest {
    fn encode_to(&self, dest: &mut Vec<u8>) {
        self.hash.encode_to(dest);
        self.length.encode_to(dest);
    }
}

impl JamDecode for PreimageRequest {
    fn decode(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(PreimageRequest {
            hash: OpaqueHash::decode(input)?,
            length: u32::decode(input)?,
        })
    }
}

/// The availability history of a requested preimage.
///
/// Zero timeslots: requested but never provided. One: available since that
/// slot. Two: provided then expunged. Three: provided, expunged, and
/// provided again.
pub type RequestStatus = Vec<TimeSlot>;

/// A service account: code, balance, gas thresholds, and keyed storage.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct ServiceAccount {
    /// The hash of the service's code.
    pub codehash: OpaqueHash,
    /// The service's token balance.
    pub balance: u64,
    /// The minimum gas attached to an accumulate invocation.
    pub min_acc_gas: Gas,
    /// The minimum gas attached to an on-transfer memo invocation.
    pub min_memo_gas: Gas,
    /// Balance granted free of storage charges.
    pub gratis: u64,
    /// The timeslot the account was created in.
    pub created: TimeSlot,
    /// The timeslot of the most recent accumulation.
    pub last_acc: TimeSlot,
    /// The service that created this one.
    pub parent: ServiceId,
    /// General keyed storage.
    pub storage: BTreeMap<Vec<u8>, Vec<u8>>,
    /// Provided preimages, keyed by their hash.
    pub preimages: BTreeMap<OpaqueHash, Vec<u8>>,
    /// Outstanding and historical preimage requests.
    pub requests: BTreeMap<PreimageRequest, RequestStatus>,
}

impl ServiceAccount {
    /// The number of items the account occupies in state:
    /// `2·|requests| + |storage|`.
    pub fn items(&self) -> u32 {
        (2 * self.requests.len() + self.storage.len()) as u32
    }

    /// The number of octets the account occupies in state:
    /// `Σ(81 + z)` over requests plus `Σ(34 + |k| + |v|)` over storage.
    pub fn octets(&self) -> u64 {
        let request_octets: u64 = self
            .requests
            .keys()
            .map(|request| 81 + u64::from(request.length))
            .sum();
        let storage_octets: u64 = self
            .storage
            .iter()
            .map(|(k, v)| 34 + k.len() as u64 + v.len() as u64)
            .sum();
        request_octets + storage_octets
    }

    /// Looks up historical service code by hash, honoring the availability
    /// window anchored at `lookup_time`.
    ///
    /// The preimage must be available: requested, provided no later than
    /// `lookup_time`, and not expunged before it.
    pub fn histlookup(&self, hash: &OpaqueHash, lookup_time: TimeSlot) -> Option<&[u8]> {
        let blob = self.preimages.get(hash)?;
        let status = self
            .requests
            .iter()
            .find(|(request, _)| request.hash == *hash)
            .map(|(_, status)| status)?;
        let available = match status.as_slice() {
            [] => false,
            [since] => *since <= lookup_time,
            [since, until] => *since <= lookup_time && lookup_time < *until,
            [since, until, again, ..] => {
                (*since <= lookup_time && lookup_time < *until) || *again <= lookup_time
            }
        };
        available.then_some(blob.as_slice())
    }
}

impl JamEncode for ServiceAccount {
    fn encode_to(&self, dest: &mut Vec<u8>) {
        self.codehash.encode_to(dest);
        self.balance.encode_to(dest);
        self.min_acc_gas.encode_to(dest);
        self.min_memo_gas.encode_to(dest);
        self.gratis.encode_to(dest);
        // items and octets are computed, never serialized.
        self.created.encode_to(dest);
        self.last_acc.encode_to(dest);
        self.parent.encode_to(dest);
        encode_dict(&self.storage, dest);
        encode_dict(&self.preimages, dest);
        encode_dict(&self.requests, dest);
    }
}

impl JamDecode for ServiceAccount {
    fn decode(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(ServiceAccount {
            codehash: OpaqueHash::decode(input)?,
            balance: u64::decode(input)?,
            min_acc_gas: Gas::decode(input)?,
            min_memo_gas: Gas::decode(input)?,
            gratis: u64::decode(input)?,
            created: TimeSlot::decode(input)?,
            last_acc: TimeSlot::decode(input)?,
            parent: ServiceId::decode(input)?,
            storage: decode_dict(input)?,
            preimages: decode_dict(input)?,
            requests: decode_dict(input)?,
        })
    }
}
