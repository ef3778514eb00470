// Path: crates/consensus/src/apply.rs

//! Extrinsic application: tickets, preimages, guarantees, assurances,
//! disputes, and the accumulation driver.
//!
//! Sub-sections apply in the fixed protocol order. Each function mutates
//! the working state of an open transition and fails atomically: the
//! importer discards the whole working copy on the first error.

use marmalade_api::pvm::{PvmExecutor, PvmInvocation};
use marmalade_crypto::hash::{blake2b_256, blake2b_256_concat};
use marmalade_crypto::sign::ed25519_verify;
use marmalade_safrole::contexts::{assurance_message, judgment_message};
use marmalade_safrole::guarantor::verify_guarantee;
use marmalade_state::components::{PendingReport, ReadyRecord};
use marmalade_state::WorldState;
use marmalade_types::block::{AvailAssurance, DisputesExtrinsic, Preimage, ReportGuarantee};
use marmalade_types::config::ChainSpec;
use marmalade_types::error::ImportError;
use marmalade_types::prelude::OptionExt;
use marmalade_types::primitives::{OpaqueHash, TimeSlot};
use marmalade_types::service::PreimageRequest;
use std::sync::Arc;
use tracing::{debug, warn};

/// Applies preimage provisions.
///
/// Preimages must be sorted and unique by (requester, blob), solicited by
/// the requesting service, and not yet provided. Provision records the
/// blob and stamps the request's availability history.
pub fn apply_preimages(
    state: &mut WorldState,
    preimages: &[Preimage],
    slot: TimeSlot,
) -> Result<(), ImportError> {
    for window in preimages.windows(2) {
        let a = (&window[0].requester, &window[0].blob);
        let b = (&window[1].requester, &window[1].blob);
        if b <= a {
            return Err(ImportError::BadPreimage("not sorted and unique".into()));
        }
    }
    if preimages.is_empty() {
        return Ok(());
    }
    let accounts = Arc::make_mut(&mut state.accounts);
    for preimage in preimages {
        let account = accounts
            .get_mut(&preimage.requester)
            .required(ImportError::BadPreimage(format!(
                "unknown service {}",
                preimage.requester
            )))?;
        let hash = blake2b_256(&preimage.blob);
        let request = PreimageRequest {
            hash,
            length: preimage.blob.len() as u32,
        };
        let status = account
            .requests
            .get_mut(&request)
            .required(ImportError::BadPreimage(format!(
                "unsolicited preimage {}",
                hash
            )))?;
        // An even-length history means the preimage is currently absent
        // (never provided, or expunged); odd means it is already live.
        if status.len() % 2 == 1 {
            return Err(ImportError::BadPreimage(format!(
                "preimage {} already provided",
                hash
            )));
        }
        status.push(slot);
        account.preimages.insert(hash, preimage.blob.clone());
    }
    Ok(())
}

/// Applies report guarantees.
///
/// Each guarantee must carry the full co-guarantor group for its core at
/// its slot, target a free core, and introduce a package the chain has not
/// seen. Accepted reports park on their core awaiting availability.
pub fn apply_guarantees(
    spec: &ChainSpec,
    state: &mut WorldState,
    guarantees: &[ReportGuarantee],
    slot: TimeSlot,
) -> Result<(), ImportError> {
    let rotation = |s: TimeSlot| spec.phase_of(s) / spec.rotation_period;
    for guarantee in guarantees {
        if guarantee.slot > slot {
            return Err(ImportError::BadGuarantee("guarantee from the future".into()));
        }
        // The assignment rotates; a guarantee from a previous rotation
        // window was signed by a different group and cannot be checked
        // against the current one.
        if spec.epoch_of(guarantee.slot) != spec.epoch_of(slot)
            || rotation(guarantee.slot) != rotation(slot)
        {
            return Err(ImportError::BadGuarantee("stale rotation window".into()));
        }
        let entropy2 = state.entropy.entropy2;
        verify_guarantee(spec, &state.active_set, &entropy2, guarantee)?;

        let core = guarantee.report.core_index as usize;
        let package = guarantee.report.package_hash;
        let already_known = state.accumulated.contains(&package)
            || state
                .ready
                .0
                .iter()
                .flatten()
                .any(|record| record.report.package_hash == package)
            || state
                .reports
                .0
                .iter()
                .flatten()
                .any(|pending| pending.report.package_hash == package);
        if already_known {
            return Err(ImportError::BadGuarantee(format!(
                "package {} already known",
                package
            )));
        }

        let reports = Arc::make_mut(&mut state.reports);
        let pending = reports
            .0
            .get_mut(core)
            .required(ImportError::BadGuarantee(format!("no such core {}", core)))?;
        if pending.is_some() {
            return Err(ImportError::BadGuarantee(format!(
                "core {} already engaged",
                core
            )));
        }
        *pending = Some(PendingReport {
            report: guarantee.report.clone(),
            reported_at: slot,
        });

        let activity = Arc::make_mut(&mut state.activity);
        if let Some(counters) = activity.cores.get_mut(core) {
            counters.guaranteed += 1;
        }
        for credential in &guarantee.credentials {
            if let Some(counters) = activity
                .validators
                .get_mut(credential.validator_index as usize)
            {
                counters.guarantees += 1;
            }
        }
    }
    Ok(())
}

/// Applies availability assurances and returns the number of reports that
/// became available.
///
/// An assurance is anchored at the parent block and signed by its
/// validator. A core whose pending report gathers assurances from a
/// supermajority of validators releases it into the ready queue.
pub fn apply_assurances(
    spec: &ChainSpec,
    state: &mut WorldState,
    assurances: &[AvailAssurance],
    parent: &OpaqueHash,
) -> Result<usize, ImportError> {
    let mut votes = vec![0usize; spec.num_cores as usize];
    let mut seen = std::collections::BTreeSet::new();
    for assurance in assurances {
        if assurance.anchor != *parent {
            return Err(ImportError::BadAssurance("anchor is not the parent".into()));
        }
        if !seen.insert(assurance.validator_index) {
            return Err(ImportError::BadAssurance(format!(
                "duplicate assurance from validator {}",
                assurance.validator_index
            )));
        }
        let ed25519 = state
            .active_set
            .get(assurance.validator_index as usize)
            .required(ImportError::BadAssurance(format!(
                "validator {} out of bounds",
                assurance.validator_index
            )))?
            .ed25519;
        let message = assurance_message(&assurance.anchor, &assurance.bitfield);
        if !ed25519_verify(&ed25519, &message, &assurance.signature) {
            return Err(ImportError::BadAssurance(format!(
                "bad signature from validator {}",
                assurance.validator_index
            )));
        }
        for (core, count) in votes.iter_mut().enumerate() {
            let set = assurance
                .bitfield
                .get(core / 8)
                .map(|octet| octet >> (core % 8) & 1 == 1)
                .unwrap_or(false);
            if set {
                *count += 1;
            }
        }
        let activity = Arc::make_mut(&mut state.activity);
        if let Some(counters) = activity
            .validators
            .get_mut(assurance.validator_index as usize)
        {
            counters.assurances += 1;
        }
    }

    // Supermajority: more than two thirds of all validators.
    let threshold = 2 * spec.num_validators as usize / 3;
    let mut released = 0;
    for (core, count) in votes.iter().enumerate() {
        if *count <= threshold {
            continue;
        }
        let taken = Arc::make_mut(&mut state.reports)
            .0
            .get_mut(core)
            .and_then(Option::take);
        let Some(pending) = taken else {
            continue;
        };
        let ready = Arc::make_mut(&mut state.ready);
        if let Some(queue) = ready.0.get_mut(core) {
            queue.push(ReadyRecord {
                report: pending.report,
                dependencies: Vec::new(),
            });
        }
        let activity = Arc::make_mut(&mut state.activity);
        if let Some(counters) = activity.cores.get_mut(core) {
            counters.assured += 1;
        }
        released += 1;
    }
    Ok(released)
}

/// Applies dispute verdicts, culprits, and faults.
///
/// Judgments are signed by the epoch's judging set; a unanimous-valid
/// verdict files under `good`, unanimous-invalid under `bad` (clearing any
/// pending report it refers to), anything else under `wonky`. Culprit and
/// fault keys join the offender set.
pub fn apply_disputes(
    spec: &ChainSpec,
    state: &mut WorldState,
    disputes: &DisputesExtrinsic,
    current_slot: TimeSlot,
) -> Result<(), ImportError> {
    if disputes.is_empty() {
        return Ok(());
    }
    let current_epoch = spec.epoch_of(current_slot);
    for verdict in &disputes.verdicts {
        if state.disputes.already_judged(&verdict.target) {
            return Err(ImportError::BadDispute(format!(
                "target {} already judged",
                verdict.target
            )));
        }
        if verdict.age != current_epoch && verdict.age + 1 != current_epoch {
            return Err(ImportError::BadDispute(
                "verdict from a distant epoch".into(),
            ));
        }
        let judges = if verdict.age == current_epoch {
            &state.active_set
        } else {
            &state.previous_set
        };
        let mut positive = 0usize;
        let mut last_index = None;
        for judgment in &verdict.votes {
            if Some(judgment.index) <= last_index {
                return Err(ImportError::BadDispute(
                    "judgments not strictly ascending".into(),
                ));
            }
            last_index = Some(judgment.index);
            let keys = judges
                .get(judgment.index as usize)
                .required(ImportError::BadDispute(format!(
                    "judge {} out of bounds",
                    judgment.index
                )))?;
            let message = judgment_message(judgment.vote, &verdict.target);
            if !ed25519_verify(&keys.ed25519, &message, &judgment.signature) {
                return Err(ImportError::BadDispute(format!(
                    "bad judgment signature from {}",
                    judgment.index
                )));
            }
            if judgment.vote {
                positive += 1;
            }
        }
        let unanimous_valid = positive == verdict.votes.len();
        let unanimous_invalid = positive == 0;
        if unanimous_invalid {
            clear_bad_report(state, &verdict.target);
        }
        let records = Arc::make_mut(&mut state.disputes);
        if unanimous_valid {
            records.good.insert(verdict.target);
        } else if unanimous_invalid {
            records.bad.insert(verdict.target);
        } else {
            records.wonky.insert(verdict.target);
        }
    }

    let records = Arc::make_mut(&mut state.disputes);
    for culprit in &disputes.culprits {
        if !records.bad.contains(&culprit.target) {
            return Err(ImportError::BadDispute(
                "culprit for a report not judged bad".into(),
            ));
        }
        records.offenders.insert(culprit.key);
    }
    for fault in &disputes.faults {
        let judged = records.good.contains(&fault.target)
            || records.bad.contains(&fault.target)
            || records.wonky.contains(&fault.target);
        if !judged {
            return Err(ImportError::BadDispute(
                "fault for an unjudged report".into(),
            ));
        }
        records.offenders.insert(fault.key);
    }
    debug!(
        target: "consensus",
        verdicts = disputes.verdicts.len(),
        offenders = disputes.culprits.len() + disputes.faults.len(),
        "disputes applied"
    );
    Ok(())
}

// A report judged invalid must not linger on its core.
fn clear_bad_report(state: &mut WorldState, target: &OpaqueHash) {
    let reports = Arc::make_mut(&mut state.reports);
    for slot in reports.0.iter_mut() {
        let matches = slot.as_ref().is_some_and(|pending| {
            blake2b_256(marmalade_types::codec::to_bytes_canonical(&pending.report)) == *target
        });
        if matches {
            *slot = None;
        }
    }
}

/// Drains ready reports whose dependencies are met through the PVM's
/// accumulate entry point.
///
/// Gas is metered against the block allowance; reports whose service or
/// code cannot be resolved are dropped with a warning (they can never
/// accumulate). Returns the number of reports accumulated.
pub async fn accumulate_ready(
    spec: &ChainSpec,
    state: &mut WorldState,
    pvm: &dyn PvmExecutor,
) -> Result<usize, ImportError> {
    let phase = spec.phase_of(state.the_time) as usize;
    let mut gas_left = spec.max_block_gas;
    let mut accumulated_count = 0usize;
    let mut outputs: Vec<OpaqueHash> = Vec::new();

    for core in 0..spec.num_cores as usize {
        while gas_left > 0 {
            // Pop the next record whose dependencies are all accumulated.
            let Some(record) = next_ready(state, core) else {
                break;
            };
            let report = record.report;

            let code_hash = {
                let Some(account) = state.accounts.get(&report.service) else {
                    warn!(
                        target: "consensus",
                        service = %report.service,
                        "dropping report for unknown service"
                    );
                    continue;
                };
                if account
                    .histlookup(&account.codehash, state.the_time)
                    .is_none()
                {
                    warn!(
                        target: "consensus",
                        service = %report.service,
                        "dropping report with unavailable code"
                    );
                    continue;
                }
                account.codehash
            };

            let gas = spec.max_refine_gas.min(gas_left);
            let outcome = pvm
                .execute_accumulate(PvmInvocation {
                    service: report.service,
                    code_hash,
                    lookup_anchor: state.the_time,
                    gas,
                    args: report.output.clone(),
                })
                .await
                .collapsed();
            gas_left = gas_left.saturating_sub(outcome.gas_used.max(1));

            match outcome.result {
                Ok(output) => outputs.push(blake2b_256(&output)),
                Err(err) => {
                    warn!(
                        target: "consensus",
                        service = %report.service,
                        %err,
                        "accumulate invocation failed"
                    );
                }
            }
            let accumulated = Arc::make_mut(&mut state.accumulated);
            if let Some(slot_set) = accumulated.0.get_mut(phase) {
                slot_set.insert(report.package_hash);
            }
            let activity = Arc::make_mut(&mut state.activity);
            if let Some(counters) = activity.cores.get_mut(core) {
                counters.accumulated += 1;
            }
            accumulated_count += 1;
        }
    }

    if !outputs.is_empty() {
        let segments: Vec<&[u8]> = outputs.iter().map(|hash| hash.0.as_slice()).collect();
        state.last_acc_out = blake2b_256_concat(&segments);
        // Fold the round's output root into the accumulation-log peak.
        let recent = Arc::make_mut(&mut state.recent);
        recent.log_peak = blake2b_256_concat(&[&recent.log_peak.0, &state.last_acc_out.0]);
    }
    Ok(accumulated_count)
}

// Pops the first ready record on `core` whose dependencies are all in the
// accumulated log.
fn next_ready(state: &mut WorldState, core: usize) -> Option<ReadyRecord> {
    let satisfied = {
        let queue = state.ready.0.get(core)?;
        queue.iter().position(|record| {
            record
                .dependencies
                .iter()
                .all(|dependency| state.accumulated.contains(dependency))
        })?
    };
    let ready = Arc::make_mut(&mut state.ready);
    Some(ready.0.get_mut(core)?.remove(satisfied))
}
