// Path: crates/api/src/crypto.rs

//! The cryptographic verification capability.
//!
//! BLAKE2b hashing and Ed25519 verification are pure and cheap, so they are
//! provided as plain functions by `marmalade-crypto`. Bandersnatch VRF and
//! ring operations are backed by an external library whose internals the
//! core never sees; they are also the expensive calls the scheduler may
//! offload, so the trait here is async and forms a suspension point.

use async_trait::async_trait;
use marmalade_types::primitives::{BandersnatchKey, BandersnatchSignature, OpaqueHash};
use thiserror::Error;

/// The 32-octet VRF output extracted from a Bandersnatch signature
/// (`banderout`).
pub type VrfOutput = [u8; 32];

/// Failures surfaced by a crypto backend.
///
/// Verification *rejection* is a normal result (`Ok(None)` or a domain
/// error at the call site); this type covers backend malfunction only.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The backend is unavailable or returned an internal failure.
    #[error("Crypto backend failure: {0}")]
    Backend(String),
    /// Key material was structurally invalid (wrong length, off-curve).
    #[error("Malformed key material: {0}")]
    MalformedKey(String),
}

/// The Bandersnatch VRF and ring-VRF capability.
///
/// All contexts are caller-assembled byte strings; the provider implements
/// only the raw primitives. `verify_vrf` returns the VRF output hash on
/// success so callers can extract `banderout` without a second call.
#[async_trait]
pub trait BandersnatchProvider: Send + Sync {
    /// Verifies a plain Bandersnatch VRF signature by `key` over `message`
    /// with the given `context`, returning the VRF output on success.
    async fn verify_vrf(
        &self,
        key: &BandersnatchKey,
        context: &[u8],
        message: &[u8],
        signature: &BandersnatchSignature,
    ) -> Result<Option<VrfOutput>, CryptoError>;

    /// Verifies a ring VRF proof against a ring commitment root, returning
    /// the VRF output on success.
    async fn verify_ring(
        &self,
        ring_root: &OpaqueHash,
        context: &[u8],
        message: &[u8],
        signature: &BandersnatchSignature,
    ) -> Result<Option<VrfOutput>, CryptoError>;

    /// Computes the ring commitment root for an ordered set of keys.
    ///
    /// Zero keys (offender substitutions) are padded into the ring so the
    /// commitment stays aligned with validator indices.
    async fn ring_root(&self, keys: &[BandersnatchKey]) -> Result<OpaqueHash, CryptoError>;
}

/// Extracts the 32-octet VRF output committed inside a Bandersnatch
/// signature without verifying it.
///
/// Used where the output seeds further derivations (entropy accumulation,
/// the VRF-sig context) and full verification happens separately.
pub fn banderout(signature: &BandersnatchSignature) -> VrfOutput {
    let mut out = [0u8; 32];
    out.copy_from_slice(&signature.0[..32]);
    out
}
