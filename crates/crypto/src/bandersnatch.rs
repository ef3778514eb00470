// Path: crates/crypto/src/bandersnatch.rs

//! The deterministic development Bandersnatch backend.
//!
//! Real Bandersnatch ring-VRF internals are outside the kernel's scope; the
//! core consumes them through [`BandersnatchProvider`]. This module supplies
//! a BLAKE2b-based stand-in with the properties the pipeline relies on:
//!
//! - The VRF output is a pure function of (public key, context), so a seal
//!   produced over `X_ticket ‖ entropy3 ‖ index` reproduces the ticket
//!   identifier minted during the contest with `X_ticket ‖ entropy2 ‖
//!   index`, exactly as the real curve does.
//! - Verification is deterministic and total.
//!
//! It provides no unforgeability whatsoever and must never be wired into a
//! network-facing deployment; production hosts load a real curve library
//! behind the same trait.

use crate::hash::blake2b_256_concat;
use async_trait::async_trait;
use marmalade_api::crypto::{BandersnatchProvider, CryptoError, VrfOutput};
use marmalade_api::signer::BlockSigner;
use marmalade_types::primitives::{BandersnatchKey, BandersnatchSignature, OpaqueHash};

const OUT_DOMAIN: &[u8] = b"$dev_vrf_out";
const AUTH_DOMAIN: &[u8] = b"$dev_vrf_auth";
const RING_AUTH_DOMAIN: &[u8] = b"$dev_ring_auth";
const RING_ROOT_DOMAIN: &[u8] = b"$dev_ring_root";

fn vrf_output(key: &BandersnatchKey, context: &[u8]) -> VrfOutput {
    blake2b_256_concat(&[OUT_DOMAIN, key, context]).0
}

fn plain_auth(key: &BandersnatchKey, context: &[u8], message: &[u8]) -> [u8; 32] {
    blake2b_256_concat(&[AUTH_DOMAIN, key, context, message]).0
}

fn ring_auth(
    ring_root: &OpaqueHash,
    key: &BandersnatchKey,
    context: &[u8],
    message: &[u8],
) -> [u8; 32] {
    blake2b_256_concat(&[RING_AUTH_DOMAIN, &ring_root.0, key, context, message]).0
}

/// Assembles a plain dev signature: output, authenticator, key echo.
fn plain_signature(
    key: &BandersnatchKey,
    context: &[u8],
    message: &[u8],
) -> BandersnatchSignature {
    let mut raw = [0u8; 96];
    raw[..32].copy_from_slice(&vrf_output(key, context));
    raw[32..64].copy_from_slice(&plain_auth(key, context, message));
    raw[64..].copy_from_slice(key);
    BandersnatchSignature(raw)
}

/// Assembles a ring dev signature: output, ring authenticator, key echo.
///
/// A real ring proof hides the key; the dev backend echoes it because
/// verification against the root alone needs it, and anonymity is not a
/// property development chains exercise.
fn ring_signature(
    ring_root: &OpaqueHash,
    key: &BandersnatchKey,
    context: &[u8],
    message: &[u8],
) -> BandersnatchSignature {
    let mut raw = [0u8; 96];
    raw[..32].copy_from_slice(&vrf_output(key, context));
    raw[32..64].copy_from_slice(&ring_auth(ring_root, key, context, message));
    raw[64..].copy_from_slice(key);
    BandersnatchSignature(raw)
}

/// The deterministic development backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct DevBandersnatch;

#[async_trait]
impl BandersnatchProvider for DevBandersnatch {
    async fn verify_vrf(
        &self,
        key: &BandersnatchKey,
        context: &[u8],
        message: &[u8],
        signature: &BandersnatchSignature,
    ) -> Result<Option<VrfOutput>, CryptoError> {
        let expected = plain_signature(key, context, message);
        Ok((expected == *signature).then(|| vrf_output(key, context)))
    }

    async fn verify_ring(
        &self,
        ring_root: &OpaqueHash,
        context: &[u8],
        message: &[u8],
        signature: &BandersnatchSignature,
    ) -> Result<Option<VrfOutput>, CryptoError> {
        let mut key = [0u8; 32];
        key.copy_from_slice(&signature.0[64..]);
        let expected = ring_signature(ring_root, &key, context, message);
        Ok((expected == *signature).then(|| vrf_output(&key, context)))
    }

    async fn ring_root(&self, keys: &[BandersnatchKey]) -> Result<OpaqueHash, CryptoError> {
        let mut segments: Vec<&[u8]> = Vec::with_capacity(keys.len() + 1);
        segments.push(RING_ROOT_DOMAIN);
        for key in keys {
            segments.push(key);
        }
        Ok(blake2b_256_concat(&segments))
    }
}

/// A development signer bound to one key and the current epoch's ring root.
#[derive(Debug, Clone)]
pub struct DevSigner {
    public: BandersnatchKey,
    ring_root: OpaqueHash,
}

impl DevSigner {
    /// Creates a signer for `public`, producing ring proofs against
    /// `ring_root`.
    pub fn new(public: BandersnatchKey, ring_root: OpaqueHash) -> Self {
        DevSigner { public, ring_root }
    }
}

#[async_trait]
impl BlockSigner for DevSigner {
    fn public(&self) -> BandersnatchKey {
        self.public
    }

    async fn sign_vrf(
        &self,
        context: &[u8],
        message: &[u8],
    ) -> Result<BandersnatchSignature, CryptoError> {
        Ok(plain_signature(&self.public, context, message))
    }

    async fn sign_ring(
        &self,
        context: &[u8],
        message: &[u8],
    ) -> Result<BandersnatchSignature, CryptoError> {
        Ok(ring_signature(&self.ring_root, &self.public, context, message))
    }
}
