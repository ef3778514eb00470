// Path: crates/crypto/src/keystream.rs

//! The deterministic BLAKE2b keystream used for protocol randomness.
//!
//! Both the guarantor-assignment shuffle and the fallback seal-key schedule
//! draw indices from the same construction: the keystream for draw `i`
//! seeded by 32-octet entropy is the chain of digests starting at
//! `blake2b(seed ‖ encode[4]{i})`, consumed as consecutive 4-octet
//! little-endian words. Words are folded into `[0, bound)` by rejection
//! sampling, so every index is drawn without modulo bias.

use crate::hash::{blake2b_256, blake2b_256_concat};

/// An unbiased index in `[0, bound)` for draw `i` under `seed`.
///
/// `bound` must be non-zero; zero would make the draw meaningless and is a
/// caller bug, answered with index 0.
pub fn draw_index(seed: &[u8; 32], i: u32, bound: u64) -> u64 {
    if bound <= 1 {
        return 0;
    }
    // Largest multiple of `bound` representable in a 32-bit word; words at
    // or above it are rejected to keep the fold uniform.
    let limit = (1u64 << 32) / bound * bound;
    let mut block = blake2b_256_concat(&[seed, &i.to_le_bytes()]).0;
    loop {
        for word in block.chunks_exact(4) {
            let value = u64::from(u32::from_le_bytes([word[0], word[1], word[2], word[3]]));
            if value < limit {
                return value % bound;
            }
        }
        // Rejections exhausted the block; chain the keystream onward.
        block = blake2b_256(block).0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draws_are_deterministic() {
        let seed = [0xABu8; 32];
        assert_eq!(draw_index(&seed, 5, 10), draw_index(&seed, 5, 10));
    }

    #[test]
    fn draws_differ_across_counters_and_seeds() {
        let seed = [0xABu8; 32];
        let other = [0xACu8; 32];
        let hits: std::collections::BTreeSet<u64> =
            (0..64).map(|i| draw_index(&seed, i, 1 << 30)).collect();
        // 64 draws from a 2^30 range collide with negligible probability.
        assert_eq!(hits.len(), 64);
        assert_ne!(draw_index(&seed, 0, 1 << 30), draw_index(&other, 0, 1 << 30));
    }

    #[test]
    fn draws_respect_the_bound() {
        let seed = [7u8; 32];
        for i in 0..200 {
            assert!(draw_index(&seed, i, 7) < 7);
        }
    }

    #[test]
    fn degenerate_bounds_yield_zero() {
        assert_eq!(draw_index(&[0u8; 32], 3, 0), 0);
        assert_eq!(draw_index(&[0u8; 32], 3, 1), 0);
    }
}
