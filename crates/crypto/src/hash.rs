// Path: crates/crypto/src/hash.rs

//! BLAKE2b-256 hashing.
//!
//! Every consensus hash in the protocol is BLAKE2b with a 32-octet digest.
//! Hashing is pure and cheap, so unlike signature verification it is a
//! plain synchronous function rather than an async capability.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use marmalade_types::primitives::OpaqueHash;

type Blake2b256 = Blake2b<U32>;

/// Hashes `data` with BLAKE2b-256.
pub fn blake2b_256<T: AsRef<[u8]>>(data: T) -> OpaqueHash {
    let mut hasher = Blake2b256::new();
    hasher.update(data.as_ref());
    OpaqueHash(hasher.finalize().into())
}

/// Hashes the concatenation of several segments without materializing it.
pub fn blake2b_256_concat(segments: &[&[u8]]) -> OpaqueHash {
    let mut hasher = Blake2b256::new();
    for segment in segments {
        hasher.update(segment);
    }
    OpaqueHash(hasher.finalize().into())
}
