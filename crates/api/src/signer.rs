// Path: crates/api/src/signer.rs

//! The authoring-side signing capability.
//!
//! Verification keys live in state; signing keys never enter the kernel.
//! The author asks this capability for seals and VRF signatures and treats
//! the answers as opaque.

use crate::crypto::CryptoError;
use async_trait::async_trait;
use marmalade_types::primitives::{BandersnatchKey, BandersnatchSignature};

/// Holds the local validator's Bandersnatch secret and produces the two
/// header signatures.
#[async_trait]
pub trait BlockSigner: Send + Sync {
    /// The public key the secret corresponds to.
    fn public(&self) -> BandersnatchKey;

    /// Produces a plain VRF signature over `message` with `context`.
    async fn sign_vrf(
        &self,
        context: &[u8],
        message: &[u8],
    ) -> Result<BandersnatchSignature, CryptoError>;

    /// Produces a ring VRF proof over `message` with `context`, proving
    /// membership of the ring committed to by the current epoch root.
    async fn sign_ring(
        &self,
        context: &[u8],
        message: &[u8],
    ) -> Result<BandersnatchSignature, CryptoError>;
}
