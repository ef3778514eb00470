// Path: crates/safrole/src/contexts.rs

//! Signature context strings.
//!
//! Every protocol signature binds a domain-separation context so material
//! signed for one purpose can never verify for another. The constants here
//! are protocol-fixed; contexts that mix in entropy are assembled by the
//! helpers below.

use marmalade_types::primitives::{Entropy, OpaqueHash};

/// Ticket proofs and ticket-mode seals.
pub const X_TICKET: &[u8] = b"$jam_ticket_seal";
/// Fallback-mode seals.
pub const X_FALLBACK: &[u8] = b"$jam_fallback_seal";
/// The entropy-contributing VRF signature.
pub const X_ENTROPY: &[u8] = b"$jam_entropy";
/// Guarantor endorsements of work reports.
pub const X_GUARANTEE: &[u8] = b"$jam_guarantee";
/// Judgments voting a report valid.
pub const X_VALID: &[u8] = b"$jam_valid";
/// Judgments voting a report invalid.
pub const X_INVALID: &[u8] = b"$jam_invalid";
/// Availability assurances over anchored bitfields.
pub const X_AVAILABLE: &[u8] = b"$jam_available";

/// `X_ticket ‖ entropy ‖ attempt`, used for ticket proofs (with the
/// contest entropy) and ticket-mode seals (with the sealing entropy).
pub fn ticket_context(entropy: &Entropy, attempt: u8) -> Vec<u8> {
    let mut context = Vec::with_capacity(X_TICKET.len() + 33);
    context.extend_from_slice(X_TICKET);
    context.extend_from_slice(&entropy.0);
    context.push(attempt);
    context
}

/// `X_fallback ‖ entropy`, used for fallback-mode seals.
pub fn fallback_context(entropy: &Entropy) -> Vec<u8> {
    let mut context = Vec::with_capacity(X_FALLBACK.len() + 32);
    context.extend_from_slice(X_FALLBACK);
    context.extend_from_slice(&entropy.0);
    context
}

/// `X_entropy ‖ banderout(sealSig)`, the VRF signature context.
pub fn entropy_context(seal_output: &[u8; 32]) -> Vec<u8> {
    let mut context = Vec::with_capacity(X_ENTROPY.len() + 32);
    context.extend_from_slice(X_ENTROPY);
    context.extend_from_slice(seal_output);
    context
}

/// `X_guarantee ‖ report_hash`, the guarantor signing payload.
pub fn guarantee_message(report_hash: &OpaqueHash) -> Vec<u8> {
    let mut message = Vec::with_capacity(X_GUARANTEE.len() + 32);
    message.extend_from_slice(X_GUARANTEE);
    message.extend_from_slice(&report_hash.0);
    message
}

/// `X_valid ‖ target` or `X_invalid ‖ target`, the judgment signing
/// payload.
pub fn judgment_message(vote: bool, target: &OpaqueHash) -> Vec<u8> {
    let context = if vote { X_VALID } else { X_INVALID };
    let mut message = Vec::with_capacity(context.len() + 32);
    message.extend_from_slice(context);
    message.extend_from_slice(&target.0);
    message
}

/// `X_available ‖ anchor ‖ bitfield`, the assurance signing payload.
pub fn assurance_message(anchor: &OpaqueHash, bitfield: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(X_AVAILABLE.len() + 32 + bitfield.len());
    message.extend_from_slice(X_AVAILABLE);
    message.extend_from_slice(&anchor.0);
    message.extend_from_slice(bitfield);
    message
}
