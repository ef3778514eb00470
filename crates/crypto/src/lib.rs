// Path: crates/crypto/src/lib.rs
#![forbid(unsafe_code)]
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented
    )
)]

//! # Marmalade Crypto
//!
//! Concrete hash and signature providers behind the capability seams of
//! `marmalade-api`. BLAKE2b-256 and Ed25519 are implemented directly over
//! audited ecosystem crates; the Bandersnatch ring-VRF, whose internals are
//! outside the kernel's scope, ships here only as a deterministic
//! development backend implementing the same trait a production curve
//! library plugs into.

/// The deterministic development Bandersnatch backend.
pub mod bandersnatch;
/// BLAKE2b-256 hashing.
pub mod hash;
/// The deterministic keystream behind the shuffle and fallback schedules.
pub mod keystream;
/// Ed25519 signature verification.
pub mod sign;

pub use bandersnatch::DevBandersnatch;
pub use hash::blake2b_256;
pub use keystream::draw_index;
pub use sign::ed25519_verify;
