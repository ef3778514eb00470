// Path: crates/consensus/src/importer.rs

//! The import orchestrator.
//!
//! One block at a time: pre-state checks, a Safrole transition on the
//! working copy, mark and seal authentication, extrinsic application in
//! the fixed order, entropy accumulation, history bookkeeping, and the
//! atomic commit. The first failure aborts the transition; the committed
//! state and its root are untouched on any error path.

use crate::apply::{
    accumulate_ready, apply_assurances, apply_disputes, apply_guarantees, apply_preimages,
};
use crate::validate::{
    check_author_and_seal, check_extrinsic_hash, check_marks, check_offenders_mark, check_parent,
    check_prior_state_root, check_timeslot,
};
use marmalade_api::crypto::BandersnatchProvider;
use marmalade_api::events::{EventBus, KernelEvent};
use marmalade_api::pvm::PvmExecutor;
use marmalade_crypto::hash::blake2b_256;
use marmalade_crypto::hash::blake2b_256_concat;
use marmalade_safrole::engine::{SafroleEngine, TransitionClass};
use marmalade_state::components::RecentBlock;
use marmalade_state::{StateService, WorldState};
use marmalade_types::block::Block;
use marmalade_types::error::ImportError;
use marmalade_types::primitives::{HeaderHash, StateRootHash, TimeSlot};
use std::sync::Arc;
use tracing::{info, warn};

/// Derives the parent hash the first post-genesis block must carry.
pub fn genesis_parent(genesis_root: StateRootHash) -> HeaderHash {
    blake2b_256_concat(&[b"genesis", &genesis_root.0])
}

/// What a successful import produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOutcome {
    /// The imported header's hash.
    pub header_hash: HeaderHash,
    /// The committed post-state root.
    pub state_root: StateRootHash,
    /// The imported block's timeslot.
    pub timeslot: TimeSlot,
    /// True when the import crossed an epoch boundary.
    pub epoch_transitioned: bool,
    /// Tickets accepted into the accumulator.
    pub tickets_accepted: usize,
    /// Reports accumulated into service state.
    pub reports_accumulated: usize,
}

/// The block import pipeline.
pub struct BlockImporter {
    engine: SafroleEngine,
    provider: Arc<dyn BandersnatchProvider>,
    pvm: Arc<dyn PvmExecutor>,
    events: EventBus,
    genesis_parent: HeaderHash,
}

impl BlockImporter {
    /// Assembles the pipeline from its capabilities.
    pub fn new(
        engine: SafroleEngine,
        provider: Arc<dyn BandersnatchProvider>,
        pvm: Arc<dyn PvmExecutor>,
        events: EventBus,
        genesis_parent: HeaderHash,
    ) -> Self {
        BlockImporter {
            engine,
            provider,
            pvm,
            events,
            genesis_parent,
        }
    }

    /// The event bus import notifications are delivered on.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Imports one block to completion.
    ///
    /// Suspension points (signature verification, PVM accumulation, the
    /// commit) make the call cancellable; a cancelled import drops the
    /// open transition and the committed state is unaffected.
    pub async fn import_block(
        &self,
        service: &mut StateService,
        block: &Block,
    ) -> Result<ImportOutcome, ImportError> {
        let header = &block.header;

        // Steps 1-3: pre-state checks against the committed world.
        check_prior_state_root(header, service.state_root())?;
        check_parent(header, &service.current().recent, self.genesis_parent)?;
        check_timeslot(header, service.current().the_time)?;
        check_extrinsic_hash(header, &block.extrinsic)?;

        let mut transition = service.begin_transition();
        let applied = self.apply(&mut transition.working, block).await;
        match applied {
            Ok(applied) => {
                let state_root = service.commit(transition).await?;
                let header_hash = blake2b_256(header.encode());
                if applied.epoch_transitioned {
                    self.events.emit(KernelEvent::EpochTransition {
                        epoch: self.engine.spec().epoch_of(header.timeslot),
                        first_slot: header.timeslot,
                    });
                }
                self.events.emit(KernelEvent::BlockImported {
                    header_hash,
                    timeslot: header.timeslot,
                });
                self.events.emit(KernelEvent::StateCommitted { state_root });
                info!(
                    target: "consensus",
                    slot = header.timeslot,
                    root = %state_root,
                    tickets = applied.tickets_accepted,
                    "block imported"
                );
                Ok(ImportOutcome {
                    header_hash,
                    state_root,
                    timeslot: header.timeslot,
                    epoch_transitioned: applied.epoch_transitioned,
                    tickets_accepted: applied.tickets_accepted,
                    reports_accumulated: applied.reports_accumulated,
                })
            }
            Err(error) => {
                warn!(
                    target: "consensus",
                    slot = header.timeslot,
                    %error,
                    "block rejected"
                );
                service.abort(transition);
                Err(error)
            }
        }
    }

    // Steps 4-11 on the working copy.
    async fn apply(&self, working: &mut WorldState, block: &Block) -> Result<Applied, ImportError> {
        let header = &block.header;
        let extrinsic = &block.extrinsic;
        let spec = self.engine.spec().clone();
        let slot = header.timeslot;

        // The Safrole transition computes the expected marks and the seal
        // schedule the header is judged against.
        let output = self
            .engine
            .transition(working, slot, self.provider.as_ref())
            .await?;

        // Steps 4-6: marks.
        check_marks(&spec, header, &output)?;
        check_offenders_mark(header, extrinsic)?;

        // Steps 7-9: author, seal, VRF.
        let vrf_output =
            check_author_and_seal(&self.engine, working, header, self.provider.as_ref()).await?;

        // Step 10: the extrinsic, in fixed sub-section order. Tickets run
        // after any rotation so boundary-block submissions enter the new
        // epoch's contest.
        let tickets = self
            .engine
            .apply_tickets(working, &extrinsic.tickets, slot, self.provider.as_ref())
            .await?;
        apply_preimages(working, &extrinsic.preimages, slot)?;
        apply_guarantees(&spec, working, &extrinsic.guarantees, slot)?;
        apply_assurances(&spec, working, &extrinsic.assurances, &header.parent)?;
        apply_disputes(&spec, working, &extrinsic.disputes, slot)?;
        let reports_accumulated = accumulate_ready(&spec, working, self.pvm.as_ref()).await?;

        // Author bookkeeping and entropy accumulation close the block.
        self.credit_author(working, block, tickets.len());
        Arc::make_mut(&mut working.entropy).accumulate(&vrf_output);
        Arc::make_mut(&mut working.recent).push(
            RecentBlock {
                header_hash: blake2b_256(header.encode()),
                state_root: header.prior_state_root,
                reported: extrinsic
                    .guarantees
                    .iter()
                    .map(|guarantee| guarantee.report.package_hash)
                    .collect(),
            },
            spec.recent_history_size as usize,
        );

        Ok(Applied {
            epoch_transitioned: output.class != TransitionClass::InEpoch,
            tickets_accepted: tickets.len(),
            reports_accumulated,
        })
    }

    fn credit_author(&self, working: &mut WorldState, block: &Block, tickets: usize) {
        let activity = Arc::make_mut(&mut working.activity);
        if let Some(counters) = activity
            .validators
            .get_mut(block.header.author_index as usize)
        {
            counters.blocks += 1;
            counters.tickets += tickets as u32;
            counters.preimage_count += block.extrinsic.preimages.len() as u32;
            counters.preimage_size += block
                .extrinsic
                .preimages
                .iter()
                .map(|preimage| preimage.blob.len() as u32)
                .sum::<u32>();
        }
    }
}

struct Applied {
    epoch_transitioned: bool,
    tickets_accepted: usize,
    reports_accumulated: usize,
}

#[cfg(test)]
mod tests;
