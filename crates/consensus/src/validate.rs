// Path: crates/consensus/src/validate.rs

//! Header validation against the transitioned working state.
//!
//! The checks here run in the strict order the protocol prescribes; the
//! first failure aborts the import with its tagged reason. Steps 1–3 run
//! against the pre-state; the mark and seal checks compare the header
//! against what the Safrole transition computed on the working copy.

use marmalade_api::crypto::{banderout, BandersnatchProvider, VrfOutput};
use marmalade_safrole::contexts::{entropy_context, fallback_context, ticket_context};
use marmalade_safrole::engine::{SafroleEngine, SealAuthority, TransitionOutput};
use marmalade_state::components::RecentHistory;
use marmalade_state::WorldState;
use marmalade_types::block::{Extrinsic, Header};
use marmalade_types::config::ChainSpec;
use marmalade_types::error::{HeaderError, ImportError};
use marmalade_types::primitives::{HeaderHash, StateRootHash, TimeSlot};
use std::collections::BTreeSet;
use tracing::debug;

/// Step 1: the header's prior state root must match the committed world.
pub fn check_prior_state_root(
    header: &Header,
    committed_root: StateRootHash,
) -> Result<(), HeaderError> {
    if header.prior_state_root != committed_root {
        return Err(HeaderError::BadPriorStateRoot {
            expected: committed_root.to_string(),
            got: header.prior_state_root.to_string(),
        });
    }
    Ok(())
}

/// Step 2: the parent must be a recent block, or the genesis hash when no
/// history exists yet.
pub fn check_parent(
    header: &Header,
    recent: &RecentHistory,
    genesis_parent: HeaderHash,
) -> Result<(), HeaderError> {
    let known = if recent.blocks.is_empty() {
        header.parent == genesis_parent
    } else {
        recent.contains(&header.parent)
    };
    if !known {
        return Err(HeaderError::BadParent(header.parent.to_string()));
    }
    Ok(())
}

/// Step 3: the timeslot must strictly advance.
pub fn check_timeslot(header: &Header, the_time: TimeSlot) -> Result<(), HeaderError> {
    if header.timeslot <= the_time {
        return Err(HeaderError::BadSlot {
            latest: the_time,
            got: header.timeslot,
        });
    }
    Ok(())
}

/// The extrinsic hash must commit to the block's extrinsic.
pub fn check_extrinsic_hash(header: &Header, extrinsic: &Extrinsic) -> Result<(), HeaderError> {
    let computed = marmalade_crypto::hash::blake2b_256(extrinsic.encode());
    if header.extrinsic_hash != computed {
        return Err(HeaderError::BadExtrinsicHash);
    }
    Ok(())
}

/// Steps 4–5: mark gating against the transition's expectations.
///
/// The epoch mark is required exactly on the first slot of an epoch; the
/// winners mark exactly when the transition crossed the contest tail with
/// a full accumulator. Content must match field for field.
pub fn check_marks(
    spec: &ChainSpec,
    header: &Header,
    output: &TransitionOutput,
) -> Result<(), HeaderError> {
    let boundary = spec.phase_of(header.timeslot) == 0;
    match (boundary, &header.epoch_mark, &output.epoch_mark) {
        (false, None, _) => {}
        (false, Some(_), _) => {
            return Err(HeaderError::InvalidEpochMark(
                "mark present mid-epoch".into(),
            ))
        }
        (true, None, _) => {
            return Err(HeaderError::InvalidEpochMark(
                "mark missing on the first slot of an epoch".into(),
            ))
        }
        (true, Some(claimed), Some(expected)) => {
            if claimed.validators.len() != spec.num_validators as usize {
                return Err(HeaderError::InvalidEpochMark(format!(
                    "validator count {} != {}",
                    claimed.validators.len(),
                    spec.num_validators
                )));
            }
            if claimed.entropy1 != expected.entropy1 {
                return Err(HeaderError::InvalidEpochMark("entropy1 mismatch".into()));
            }
            if claimed.entropy_accumulator != expected.entropy_accumulator {
                return Err(HeaderError::InvalidEpochMark(
                    "entropy accumulator mismatch".into(),
                ));
            }
            if claimed.validators != expected.validators {
                return Err(HeaderError::InvalidEpochMark(
                    "validator keys mismatch".into(),
                ));
            }
        }
        (true, Some(_), None) => {
            // Unreachable in practice: a first-slot block always rotates.
            return Err(HeaderError::InvalidEpochMark(
                "no rotation for this transition".into(),
            ));
        }
    }

    if header.winners_mark != output.winners_mark {
        return Err(HeaderError::InvalidTicketsMark(match &output.winners_mark {
            Some(_) => "mark absent or diverges from the sealed sequence".into(),
            None => "mark present outside the sealing transition".into(),
        }));
    }
    Ok(())
}

/// Step 6: the offenders mark must list exactly the keys newly judged in
/// this block's disputes, without duplicates.
pub fn check_offenders_mark(header: &Header, extrinsic: &Extrinsic) -> Result<(), HeaderError> {
    let mut expected = BTreeSet::new();
    for culprit in &extrinsic.disputes.culprits {
        expected.insert(culprit.key);
    }
    for fault in &extrinsic.disputes.faults {
        expected.insert(fault.key);
    }
    let claimed: BTreeSet<_> = header.offenders_mark.iter().copied().collect();
    if claimed.len() != header.offenders_mark.len() {
        return Err(HeaderError::InvalidOffendersMark("duplicate key".into()));
    }
    if claimed != expected {
        return Err(HeaderError::InvalidOffendersMark(format!(
            "{} keys claimed, {} keys judged",
            claimed.len(),
            expected.len()
        )));
    }
    Ok(())
}

/// Steps 7–9: author bounds, seal verification, VRF verification.
///
/// Returns the VRF output to mix into the entropy accumulator.
pub async fn check_author_and_seal(
    engine: &SafroleEngine,
    state: &WorldState,
    header: &Header,
    provider: &dyn BandersnatchProvider,
) -> Result<VrfOutput, ImportError> {
    // Step 7: author index bounds.
    let author = state
        .active_set
        .get(header.author_index as usize)
        .ok_or(HeaderError::InvalidAuthorIndex {
            count: state.active_set.len(),
            got: header.author_index,
        })?;

    // Step 8: seal verification under the slot's authority.
    let unsigned = header.encode_unsigned();
    let entropy3 = state.entropy.entropy3;
    let seal_output = match engine.seal_authority(state, header.timeslot) {
        SealAuthority::Ticket(ticket) => {
            let context = ticket_context(&entropy3, ticket.entry_index);
            let output = provider
                .verify_vrf(&author.bandersnatch, &context, &unsigned, &header.seal_sig)
                .await
                .map_err(|e| ImportError::Backend(e.to_string()))?
                .ok_or(HeaderError::BadSealSignature)?;
            // The seal's VRF output must reproduce the winning ticket: the
            // author proves it owns the slot it sealed.
            if ticket.id.0 != output {
                return Err(HeaderError::UnexpectedAuthor.into());
            }
            output
        }
        SealAuthority::Fallback(expected_key) => {
            if expected_key != author.bandersnatch {
                return Err(HeaderError::UnexpectedAuthor.into());
            }
            let context = fallback_context(&entropy3);
            provider
                .verify_vrf(&author.bandersnatch, &context, &unsigned, &header.seal_sig)
                .await
                .map_err(|e| ImportError::Backend(e.to_string()))?
                .ok_or(HeaderError::BadSealSignature)?
        }
    };
    debug_assert_eq!(seal_output, banderout(&header.seal_sig));

    // Step 9: the entropy VRF signature, bound to the seal's output.
    let context = entropy_context(&seal_output);
    let vrf_output = provider
        .verify_vrf(&author.bandersnatch, &context, b"", &header.vrf_sig)
        .await
        .map_err(|e| ImportError::Backend(e.to_string()))?
        .ok_or(HeaderError::BadVrfSignature)?;

    debug!(
        target: "consensus",
        slot = header.timeslot,
        author = header.author_index,
        "header authenticated"
    );
    Ok(vrf_output)
}
