// Path: crates/state/src/trie.rs

//! The keyed binary merkle trie.
//!
//! State commitment works over a set of (31-octet key, encoded value)
//! pairs. The trie branches on successive key bits; values of at most 32
//! octets embed directly in their leaf preimage, longer values contribute
//! their hash. The construction is pure: the root is a function of the pair
//! set alone, independent of insertion order.

use crate::statekey::StateKey;
use marmalade_crypto::hash::{blake2b_256, blake2b_256_concat};
use marmalade_types::primitives::OpaqueHash;

// Leaf with the value hashed (value longer than 32 octets).
const TAG_LEAF_HASHED: u8 = 0x00;
// Leaf with the value embedded, padded with zero octets.
const TAG_LEAF_EMBEDDED: u8 = 0x01;
// Interior node over two child commitments.
const TAG_BRANCH: u8 = 0x02;

/// The number of entries up to which a dictionary-valued component encodes
/// inline; above it, the component commits to a sub-trie root instead.
pub const INLINE_DICT_MAX: usize = 16;

fn leaf_hash(key: &StateKey, value: &[u8]) -> OpaqueHash {
    if value.len() <= 32 {
        let mut padded = [0u8; 32];
        padded[..value.len()].copy_from_slice(value);
        blake2b_256_concat(&[&[TAG_LEAF_EMBEDDED, value.len() as u8], key, &padded])
    } else {
        blake2b_256_concat(&[&[TAG_LEAF_HASHED, 0], key, &blake2b_256(value).0])
    }
}

fn bit_at(key: &StateKey, depth: usize) -> bool {
    let octet = key[depth / 8];
    (octet >> (7 - depth % 8)) & 1 == 1
}

fn merklize_at(entries: &mut [(StateKey, OpaqueHash)], depth: usize) -> OpaqueHash {
    match entries {
        [] => OpaqueHash::ZERO,
        [(_, leaf)] => *leaf,
        _ => {
            // Keys are distinct 31-octet strings, so the recursion always
            // terminates before the bit path is exhausted.
            let split = partition_by_bit(entries, depth);
            let (zeros, ones) = entries.split_at_mut(split);
            let left = merklize_at(zeros, depth + 1);
            let right = merklize_at(ones, depth + 1);
            blake2b_256_concat(&[&[TAG_BRANCH], &left.0, &right.0])
        }
    }
}

// Partitions entries so those with a zero bit at `depth` come first,
// returning the split point.
fn partition_by_bit(entries: &mut [(StateKey, OpaqueHash)], depth: usize) -> usize {
    entries.sort_by_key(|(key, _)| bit_at(key, depth));
    entries
        .iter()
        .position(|(key, _)| bit_at(key, depth))
        .unwrap_or(entries.len())
}

/// Computes the trie root over a set of (key, value) pairs.
///
/// Duplicate keys are a caller bug; the constructors in
/// [`crate::statekey`] guarantee distinctness.
pub fn merklize<'a, I>(pairs: I) -> OpaqueHash
where
    I: IntoIterator<Item = (StateKey, &'a [u8])>,
{
    let mut entries: Vec<(StateKey, OpaqueHash)> = pairs
        .into_iter()
        .map(|(key, value)| (key, leaf_hash(&key, value)))
        .collect();
    merklize_at(&mut entries, 0)
}
