// Path: crates/crypto/src/sign.rs

//! Ed25519 signature verification.

use ed25519_dalek::{Signature, VerifyingKey};
use marmalade_types::primitives::{Ed25519Key, Ed25519Signature};

/// Verifies an Ed25519 signature over `message`.
///
/// Returns `false` for malformed keys as well as failed verification: a key
/// that is not a curve point can never have produced a valid signature, and
/// zero keys (offender substitutions) fall out the same way.
pub fn ed25519_verify(key: &Ed25519Key, message: &[u8], signature: &Ed25519Signature) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(key) else {
        return false;
    };
    let signature = Signature::from_bytes(&signature.0);
    verifying_key.verify_strict(message, &signature).is_ok()
}
