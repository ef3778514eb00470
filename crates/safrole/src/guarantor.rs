// Path: crates/safrole/src/guarantor.rs

//! Guarantee signature assembly and verification.
//!
//! A work report enters the chain only when every validator assigned to its
//! core in the guarantee's slot has endorsed it with an Ed25519 signature
//! over `X_guarantee ‖ report_hash`.

use crate::assignment::guarantors_of_core;
use crate::contexts::guarantee_message;
use marmalade_crypto::hash::blake2b_256;
use marmalade_crypto::sign::ed25519_verify;
use marmalade_types::block::ReportGuarantee;
use marmalade_types::config::ChainSpec;
use marmalade_types::error::AssignmentError;
use marmalade_types::primitives::{Entropy, WorkReportHash};
use marmalade_types::validators::ValidatorSet;
use tracing::debug;

/// The hash a guarantee's credentials sign.
pub fn report_hash(guarantee: &ReportGuarantee) -> WorkReportHash {
    blake2b_256(marmalade_types::codec::to_bytes_canonical(&guarantee.report))
}

/// Verifies a guarantee against the core assignment of its slot.
///
/// Checks, in order: the report's core exists, every credential comes from
/// a validator assigned to that core, every signature verifies under the
/// active set's keys, and the whole co-guarantor group is present.
pub fn verify_guarantee(
    spec: &ChainSpec,
    active_set: &ValidatorSet,
    entropy2: &Entropy,
    guarantee: &ReportGuarantee,
) -> Result<WorkReportHash, AssignmentError> {
    let core = guarantee.report.core_index;
    let group = guarantors_of_core(spec, entropy2, guarantee.slot, core)?;
    let hash = report_hash(guarantee);
    let message = guarantee_message(&hash);

    for credential in &guarantee.credentials {
        let index = credential.validator_index;
        if !group.contains(&index) {
            // Either out of range entirely, or assigned to another core.
            if index >= spec.num_validators {
                return Err(AssignmentError::InvalidValidatorIndex {
                    count: spec.num_validators as usize,
                    got: index,
                });
            }
            return Err(AssignmentError::BadGuarantorSignature(index));
        }
        let keys = active_set
            .get(index as usize)
            .ok_or(AssignmentError::InvalidValidatorIndex {
                count: active_set.len(),
                got: index,
            })?;
        if !ed25519_verify(&keys.ed25519, &message, &credential.signature) {
            return Err(AssignmentError::BadGuarantorSignature(index));
        }
    }

    // Acceptance needs the complete group, each member exactly once.
    let mut signed: Vec<_> = guarantee
        .credentials
        .iter()
        .map(|credential| credential.validator_index)
        .collect();
    signed.sort_unstable();
    signed.dedup();
    if signed != group {
        debug!(
            target: "safrole",
            core,
            got = signed.len(),
            need = group.len(),
            "guarantee missing co-guarantor signatures"
        );
        return Err(AssignmentError::IncompleteGuarantorGroup {
            core,
            got: signed.len(),
            need: group.len(),
        });
    }
    Ok(hash)
}
