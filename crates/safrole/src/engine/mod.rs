// Path: crates/safrole/src/engine/mod.rs

//! The slot/epoch transition engine.
//!
//! The engine advances a working [`WorldState`] from its recorded timeslot
//! to a block's timeslot: entropy rotation, validator-set rotation, the
//! seal-key schedule for a new epoch, and the expected header marks. It
//! never reads the header it is validating against; the header validator
//! compares the returned expectations with what the header claims.

use crate::contexts::ticket_context;
use crate::tickets::{accumulate, outside_in};
use marmalade_api::crypto::BandersnatchProvider;
use marmalade_state::components::{ActivityRecords, SealKeys};
use marmalade_state::WorldState;
use marmalade_types::block::{EpochMark, EpochMarkValidator, TicketBody, TicketEnvelope};
use marmalade_types::config::ChainSpec;
use marmalade_types::error::{ImportError, TicketError};
use marmalade_types::primitives::{BandersnatchKey, TimeSlot};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How a block's slot relates to the state's recorded slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionClass {
    /// Same epoch.
    InEpoch,
    /// The immediately following epoch.
    EpochTransition,
    /// More than one epoch ahead.
    SkipEpoch,
}

/// What a slot transition produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutput {
    /// The transition class.
    pub class: TransitionClass,
    /// The epoch mark the block's header must carry (exactly when present).
    pub epoch_mark: Option<EpochMark>,
    /// The winners mark the header must carry (exactly when present).
    pub winners_mark: Option<Vec<TicketBody>>,
}

/// The seal authority of a single slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SealAuthority {
    /// Ticket mode: the slot is reserved for the ticket's producer.
    Ticket(TicketBody),
    /// Fallback mode: the slot belongs to the holder of this key.
    Fallback(BandersnatchKey),
}

/// The Safrole engine, parameterized by the chain spec.
#[derive(Debug, Clone)]
pub struct SafroleEngine {
    spec: ChainSpec,
}

impl SafroleEngine {
    /// Creates an engine for the given spec.
    pub fn new(spec: ChainSpec) -> Self {
        SafroleEngine { spec }
    }

    /// The spec the engine is parameterized by.
    pub fn spec(&self) -> &ChainSpec {
        &self.spec
    }

    /// Classifies a slot transition.
    pub fn classify(&self, previous_slot: TimeSlot, current_slot: TimeSlot) -> TransitionClass {
        let previous_epoch = self.spec.epoch_of(previous_slot);
        let current_epoch = self.spec.epoch_of(current_slot);
        if current_epoch == previous_epoch {
            TransitionClass::InEpoch
        } else if current_epoch == previous_epoch + 1 {
            TransitionClass::EpochTransition
        } else {
            TransitionClass::SkipEpoch
        }
    }

    /// Advances `state` from its recorded slot to `current_slot`.
    ///
    /// The caller has already established `current_slot > state.the_time`.
    /// On an epoch boundary this rotates entropy and validator sets,
    /// installs the new seal-key schedule (recomputing the ring root, a
    /// suspension point), resets activity counters, and clears the ticket
    /// accumulator.
    pub async fn transition(
        &self,
        state: &mut WorldState,
        current_slot: TimeSlot,
        provider: &dyn BandersnatchProvider,
    ) -> Result<TransitionOutput, ImportError> {
        let previous_slot = state.the_time;
        let class = self.classify(previous_slot, current_slot);

        let winners_mark = match class {
            TransitionClass::InEpoch => self.winners_mark(state, previous_slot, current_slot),
            _ => None,
        };

        let epoch_mark = match class {
            TransitionClass::InEpoch => None,
            TransitionClass::EpochTransition | TransitionClass::SkipEpoch => {
                Some(self.rotate_epoch(state, class, previous_slot, provider).await?)
            }
        };

        state.the_time = current_slot;
        Ok(TransitionOutput {
            class,
            epoch_mark,
            winners_mark,
        })
    }

    // The winners mark appears exactly when this in-epoch transition
    // crosses the contest tail with a full accumulator.
    fn winners_mark(
        &self,
        state: &WorldState,
        previous_slot: TimeSlot,
        current_slot: TimeSlot,
    ) -> Option<Vec<TicketBody>> {
        let spec = &self.spec;
        let crosses_tail = spec.phase_of(previous_slot) < spec.contest_duration
            && spec.contest_duration <= spec.phase_of(current_slot);
        let accumulator = &state.safrole.ticket_accumulator;
        if crosses_tail && accumulator.len() == spec.epoch_duration as usize {
            Some(outside_in(accumulator))
        } else {
            None
        }
    }

    // Epoch-boundary bookkeeping. Returns the epoch mark the header must
    // announce.
    async fn rotate_epoch(
        &self,
        state: &mut WorldState,
        class: TransitionClass,
        previous_slot: TimeSlot,
        provider: &dyn BandersnatchProvider,
    ) -> Result<EpochMark, ImportError> {
        let spec = &self.spec;

        // Whether the closing epoch produced a complete sealing sequence.
        // A skipped epoch never can: its tickets were for an epoch that
        // went unused.
        let accumulator_full =
            state.safrole.ticket_accumulator.len() == spec.epoch_duration as usize;
        let tail_reached = spec.phase_of(previous_slot) >= spec.contest_duration;
        let ticket_mode =
            class == TransitionClass::EpochTransition && tail_reached && accumulator_full;

        let pre_rotation_entropy1 = state.entropy.entropy1;

        // Entropy rotation: the accumulator freezes into entropy1 and the
        // older values shift down.
        Arc::make_mut(&mut state.entropy).rotate();

        // Validator rotation: previous ← active ← staging ← filtered
        // pending. Offender substitution preserves ordering and size.
        let offenders = &state.disputes.offenders;
        let incoming = state.safrole.pending_set.with_offenders_nulled(offenders);
        state.previous_set = state.active_set.clone();
        state.active_set = state.staging_set.clone();
        state.staging_set = Arc::new(incoming);

        // The ring the next contest's tickets are drawn against commits to
        // the new staging set.
        let staging_keys: Vec<BandersnatchKey> =
            state.staging_set.bandersnatch_keys().copied().collect();
        let epoch_root = provider
            .ring_root(&staging_keys)
            .await
            .map_err(|e| ImportError::Backend(e.to_string()))?;

        let seal_keys = if ticket_mode {
            info!(target: "safrole", "epoch sealed in ticket mode");
            SealKeys::Tickets(outside_in(&state.safrole.ticket_accumulator))
        } else {
            if class == TransitionClass::SkipEpoch {
                warn!(target: "safrole", "epoch skipped; sealing falls back");
            } else {
                debug!(target: "safrole", "incomplete contest; sealing falls back");
            }
            let active_keys: Vec<BandersnatchKey> =
                state.active_set.bandersnatch_keys().copied().collect();
            SealKeys::fallback_from_entropy(
                &state.entropy.entropy2,
                &active_keys,
                spec.epoch_duration,
            )
        };

        let safrole = Arc::make_mut(&mut state.safrole);
        safrole.epoch_root = epoch_root;
        safrole.seal_keys = seal_keys;
        safrole.ticket_accumulator.clear();

        // Counters are per-epoch.
        state.activity = Arc::new(ActivityRecords::zeroed(spec));

        Ok(EpochMark {
            entropy_accumulator: state.entropy.accumulator,
            entropy1: pre_rotation_entropy1,
            validators: state
                .staging_set
                .0
                .iter()
                .map(|keys| EpochMarkValidator {
                    bandersnatch: keys.bandersnatch,
                    ed25519: keys.ed25519,
                })
                .collect(),
        })
    }

    /// Verifies and accumulates a block's ticket submissions, returning the
    /// accepted ticket bodies in submission order.
    ///
    /// Ring verification is a suspension point. Any rejection invalidates
    /// the block as a whole; the caller discards the working state.
    pub async fn apply_tickets(
        &self,
        state: &mut WorldState,
        envelopes: &[TicketEnvelope],
        current_slot: TimeSlot,
        provider: &dyn BandersnatchProvider,
    ) -> Result<Vec<TicketBody>, ImportError> {
        let spec = &self.spec;
        if envelopes.is_empty() {
            return Ok(Vec::new());
        }
        if spec.phase_of(current_slot) >= spec.contest_duration {
            return Err(TicketError::BadSlot.into());
        }
        if envelopes.len() > spec.max_tickets_per_extrinsic as usize {
            return Err(TicketError::UnexpectedTicket(format!(
                "{} tickets exceed the extrinsic limit {}",
                envelopes.len(),
                spec.max_tickets_per_extrinsic
            ))
            .into());
        }

        let mut bodies = Vec::with_capacity(envelopes.len());
        for envelope in envelopes {
            if envelope.attempt >= spec.tickets_per_validator {
                return Err(TicketError::BadTicketAttempt {
                    limit: spec.tickets_per_validator,
                    got: envelope.attempt,
                }
                .into());
            }
            let context = ticket_context(&state.entropy.entropy2, envelope.attempt);
            let output = provider
                .verify_ring(&state.safrole.epoch_root, &context, b"", &envelope.signature)
                .await
                .map_err(|e| ImportError::Backend(e.to_string()))?
                .ok_or(ImportError::from(TicketError::BadTicketProof))?;
            bodies.push(TicketBody {
                id: output.into(),
                entry_index: envelope.attempt,
            });
        }

        let safrole = Arc::make_mut(&mut state.safrole);
        accumulate(
            &mut safrole.ticket_accumulator,
            &bodies,
            spec.epoch_duration as usize,
        )?;
        debug!(
            target: "safrole",
            accepted = bodies.len(),
            accumulated = safrole.ticket_accumulator.len(),
            "tickets accumulated"
        );
        Ok(bodies)
    }

    /// The seal authority of `slot` under the current schedule.
    pub fn seal_authority(&self, state: &WorldState, slot: TimeSlot) -> SealAuthority {
        let phase = self.spec.phase_of(slot) as usize;
        match &state.safrole.seal_keys {
            SealKeys::Tickets(tickets) => tickets
                .get(phase)
                .map(|ticket| SealAuthority::Ticket(*ticket))
                .unwrap_or(SealAuthority::Fallback([0u8; 32])),
            SealKeys::Fallback(keys) => SealAuthority::Fallback(
                keys.get(phase).copied().unwrap_or([0u8; 32]),
            ),
        }
    }
}

#[cfg(test)]
mod tests;
