// Path: crates/consensus/src/author.rs

//! Block authoring for slots the local validator controls.
//!
//! The author never mutates committed state: it transitions a scratch copy
//! to the target slot to learn the seal schedule and the expected marks,
//! then assembles and signs a header the importer (its own, and every
//! peer's) will accept.

use marmalade_api::crypto::{banderout, BandersnatchProvider};
use marmalade_api::signer::BlockSigner;
use marmalade_safrole::contexts::{entropy_context, fallback_context, ticket_context};
use marmalade_safrole::engine::{SafroleEngine, SealAuthority};
use marmalade_state::StateService;
use marmalade_types::block::{Block, Extrinsic, Header};
use marmalade_types::error::AuthorError;
use marmalade_types::primitives::{HeaderHash, TimeSlot, ValidatorIndex};
use std::sync::Arc;
use tracing::info;

/// Builds blocks for slots whose seal key the local validator holds.
pub struct BlockAuthor {
    engine: SafroleEngine,
    provider: Arc<dyn BandersnatchProvider>,
    genesis_parent: HeaderHash,
}

impl BlockAuthor {
    /// Creates an author over the same engine parameterization the
    /// importer uses.
    pub fn new(
        engine: SafroleEngine,
        provider: Arc<dyn BandersnatchProvider>,
        genesis_parent: HeaderHash,
    ) -> Self {
        BlockAuthor {
            engine,
            provider,
            genesis_parent,
        }
    }

    /// Authors a block for `slot` carrying `extrinsic`.
    ///
    /// Fails with [`AuthorError::NotOurSlot`] when the slot's seal
    /// authority belongs to another validator.
    pub async fn author_block(
        &self,
        service: &StateService,
        signer: &dyn BlockSigner,
        slot: TimeSlot,
        extrinsic: Extrinsic,
    ) -> Result<Block, AuthorError> {
        // Scratch transition: learn the post-transition schedule without
        // touching the committed world.
        let mut scratch = service.begin_transition();
        let output = self
            .engine
            .transition(&mut scratch.working, slot, self.provider.as_ref())
            .await
            .map_err(|e| AuthorError::Backend(e.to_string()))?;
        let working = &scratch.working;

        let our_key = signer.public();
        let author_index = working
            .active_set
            .0
            .iter()
            .position(|keys| keys.bandersnatch == our_key)
            .ok_or(AuthorError::UnknownKey)? as ValidatorIndex;

        // Establish ownership of the slot and pick the seal context.
        let entropy3 = working.entropy.entropy3;
        let seal_context = match self.engine.seal_authority(working, slot) {
            SealAuthority::Fallback(expected) => {
                if expected != our_key {
                    return Err(AuthorError::NotOurSlot(slot));
                }
                fallback_context(&entropy3)
            }
            SealAuthority::Ticket(ticket) => {
                let context = ticket_context(&entropy3, ticket.entry_index);
                // The VRF output under this context must reproduce the
                // winning ticket, or the slot belongs to someone else.
                let probe = signer
                    .sign_vrf(&context, b"")
                    .await
                    .map_err(|e| AuthorError::Backend(e.to_string()))?;
                if banderout(&probe) != ticket.id.0 {
                    return Err(AuthorError::NotOurSlot(slot));
                }
                context
            }
        };

        // The seal's VRF output is context-bound, so it is known before
        // the header exists; the entropy signature commits to it.
        let seal_probe = signer
            .sign_vrf(&seal_context, b"")
            .await
            .map_err(|e| AuthorError::Backend(e.to_string()))?;
        let vrf_sig = signer
            .sign_vrf(&entropy_context(&banderout(&seal_probe)), b"")
            .await
            .map_err(|e| AuthorError::Backend(e.to_string()))?;

        let parent = working
            .recent
            .blocks
            .last()
            .map(|block| block.header_hash)
            .unwrap_or(self.genesis_parent);
        let offenders_mark = extrinsic
            .disputes
            .culprits
            .iter()
            .map(|culprit| culprit.key)
            .chain(extrinsic.disputes.faults.iter().map(|fault| fault.key))
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();

        // The epoch mark is announced only on the first slot of an epoch,
        // even when a skipped transition rotated mid-epoch.
        let epoch_mark = if self.engine.spec().phase_of(slot) == 0 {
            output.epoch_mark
        } else {
            None
        };

        let mut header = Header {
            parent,
            prior_state_root: service.state_root(),
            extrinsic_hash: marmalade_crypto::hash::blake2b_256(extrinsic.encode()),
            timeslot: slot,
            epoch_mark,
            winners_mark: output.winners_mark,
            offenders_mark,
            author_index,
            vrf_sig,
            seal_sig: Default::default(),
        };
        header.seal_sig = signer
            .sign_vrf(&seal_context, &header.encode_unsigned())
            .await
            .map_err(|e| AuthorError::Backend(e.to_string()))?;

        info!(
            target: "consensus",
            slot,
            author = author_index,
            "block authored"
        );
        Ok(Block { header, extrinsic })
    }
}
