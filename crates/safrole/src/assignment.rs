// Path: crates/safrole/src/assignment.rs

//! Deterministic validator-to-core assignment.
//!
//! Every validator is pinned to exactly one core per slot: an even initial
//! spread, a Fisher–Yates shuffle keyed by the epoch's contest entropy, and
//! a slot-dependent rotation. All guarantors of a core recompute the same
//! assignment locally; nothing about it is negotiated.

use marmalade_crypto::keystream::draw_index;
use marmalade_types::config::ChainSpec;
use marmalade_types::error::AssignmentError;
use marmalade_types::primitives::{CoreIndex, Entropy, TimeSlot, ValidatorIndex};

/// Shuffles `items` in place with the keystream-driven Fisher–Yates
/// procedure: for `i` from the top down, draw `r ∈ [0, i]` and swap.
pub fn jam_shuffle<T>(items: &mut [T], entropy: &Entropy) {
    for i in (1..items.len()).rev() {
        let r = draw_index(&entropy.0, i as u32, i as u64 + 1) as usize;
        items.swap(i, r);
    }
}

/// The full per-validator core assignment for a slot.
pub fn core_assignment(
    spec: &ChainSpec,
    entropy2: &Entropy,
    slot: TimeSlot,
) -> Vec<CoreIndex> {
    let validators = spec.num_validators as usize;
    let cores = spec.num_cores as u64;
    // Even initial spread: validator i starts on core ⌊cores·i/validators⌋.
    let mut assignment: Vec<CoreIndex> = (0..validators)
        .map(|i| ((cores * i as u64) / validators as u64) as CoreIndex)
        .collect();
    jam_shuffle(&mut assignment, entropy2);
    let rotation = (spec.phase_of(slot) / spec.rotation_period) as u64;
    for core in &mut assignment {
        *core = ((u64::from(*core) + rotation) % cores) as CoreIndex;
    }
    assignment
}

/// Validates raw entropy bytes from an external boundary (CLI input, wire
/// payloads) into the typed 32-octet form.
pub fn entropy_from_bytes(bytes: &[u8]) -> Result<Entropy, AssignmentError> {
    let octets: [u8; 32] = bytes
        .try_into()
        .map_err(|_| AssignmentError::InvalidEntropyLength(bytes.len()))?;
    Ok(Entropy::from(octets))
}

/// The core a single validator guards at `slot`.
pub fn assigned_core(
    spec: &ChainSpec,
    entropy2: &Entropy,
    slot: TimeSlot,
    validator: ValidatorIndex,
) -> Result<CoreIndex, AssignmentError> {
    let assignment = core_assignment(spec, entropy2, slot);
    assignment
        .get(validator as usize)
        .copied()
        .ok_or(AssignmentError::InvalidValidatorIndex {
            count: assignment.len(),
            got: validator,
        })
}

/// The co-guarantor group of a core at `slot`, in ascending validator
/// order.
pub fn guarantors_of_core(
    spec: &ChainSpec,
    entropy2: &Entropy,
    slot: TimeSlot,
    core: CoreIndex,
) -> Result<Vec<ValidatorIndex>, AssignmentError> {
    if core >= spec.num_cores {
        return Err(AssignmentError::InvalidCoreIndex {
            count: spec.num_cores as usize,
            got: core,
        });
    }
    let assignment = core_assignment(spec, entropy2, slot);
    Ok(assignment
        .iter()
        .enumerate()
        .filter(|(_, assigned)| **assigned == core)
        .map(|(validator, _)| validator as ValidatorIndex)
        .collect())
}
