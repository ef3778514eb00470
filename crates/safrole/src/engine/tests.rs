// Path: crates/safrole/src/engine/tests.rs

use super::*;
use marmalade_api::crypto::banderout;
use marmalade_api::signer::BlockSigner;
use marmalade_crypto::bandersnatch::{DevBandersnatch, DevSigner};
use marmalade_state::genesis::{dev_validators, genesis_state};
use marmalade_types::primitives::OpaqueHash;
use marmalade_types::validators::ValidatorKeys;

struct Bench {
    engine: SafroleEngine,
    provider: DevBandersnatch,
    state: WorldState,
    validators: Vec<ValidatorKeys>,
}

async fn bench() -> Bench {
    let spec = ChainSpec::tiny();
    let provider = DevBandersnatch;
    let validators = dev_validators(&spec);
    let keys: Vec<BandersnatchKey> = validators.iter().map(|v| v.bandersnatch).collect();
    let epoch_root = provider.ring_root(&keys).await.unwrap();
    let state = genesis_state(&spec, &validators, epoch_root);
    Bench {
        engine: SafroleEngine::new(spec),
        provider,
        state,
        validators,
    }
}

/// Builds verified ticket envelopes for the given (validator, attempt)
/// pairs, sorted ascending by the identifier they will mint.
async fn envelopes_for(
    bench: &Bench,
    pairs: &[(usize, u8)],
) -> Vec<TicketEnvelope> {
    let mut entries = Vec::new();
    for (validator, attempt) in pairs {
        let signer = DevSigner::new(
            bench.validators[*validator].bandersnatch,
            bench.state.safrole.epoch_root,
        );
        let context = ticket_context(&bench.state.entropy.entropy2, *attempt);
        let signature = signer.sign_ring(&context, b"").await.unwrap();
        entries.push((banderout(&signature), *attempt, signature));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries
        .into_iter()
        .map(|(_, attempt, signature)| TicketEnvelope { attempt, signature })
        .collect()
}

/// Fills the accumulator to a full epoch of tickets.
async fn fill_accumulator(bench: &mut Bench) {
    // Six validators with two attempts each cover the twelve slots of the
    // tiny epoch exactly.
    let mut pairs = Vec::new();
    for validator in 0..bench.validators.len() {
        for attempt in 0..2u8 {
            pairs.push((validator, attempt));
        }
    }
    let envelopes = envelopes_for(bench, &pairs).await;
    let engine = bench.engine.clone();
    engine
        .apply_tickets(&mut bench.state, &envelopes, 1, &bench.provider)
        .await
        .unwrap();
    assert_eq!(bench.state.safrole.ticket_accumulator.len(), 12);
}

#[tokio::test]
async fn in_epoch_transition_produces_no_marks() {
    let mut bench = bench().await;
    let output = bench
        .engine
        .transition(&mut bench.state, 3, &bench.provider)
        .await
        .unwrap();
    assert_eq!(output.class, TransitionClass::InEpoch);
    assert!(output.epoch_mark.is_none());
    assert!(output.winners_mark.is_none());
    assert_eq!(bench.state.the_time, 3);
}

#[tokio::test]
async fn epoch_transition_rotates_sets_and_entropy() {
    let mut bench = bench().await;
    // Distinguish the pools so rotation is observable.
    {
        let entropy = Arc::make_mut(&mut bench.state.entropy);
        entropy.accumulator = OpaqueHash([0xAA; 32]);
        entropy.entropy1 = OpaqueHash([0x11; 32]);
        entropy.entropy2 = OpaqueHash([0x22; 32]);
        entropy.entropy3 = OpaqueHash([0x33; 32]);
    }
    bench.state.the_time = 11;
    let active_before = bench.state.active_set.clone();
    let staging_before = bench.state.staging_set.clone();
    let pending_before = bench.state.safrole.pending_set.clone();

    let output = bench
        .engine
        .transition(&mut bench.state, 12, &bench.provider)
        .await
        .unwrap();
    assert_eq!(output.class, TransitionClass::EpochTransition);

    // previous ← active ← staging ← pending.
    assert_eq!(bench.state.previous_set, active_before);
    assert_eq!(bench.state.active_set, staging_before);
    assert_eq!(bench.state.staging_set.0, pending_before.0);

    // (acc, e1, e2, e3) → (acc, acc, e1, e2).
    assert_eq!(bench.state.entropy.accumulator, OpaqueHash([0xAA; 32]));
    assert_eq!(bench.state.entropy.entropy1, OpaqueHash([0xAA; 32]));
    assert_eq!(bench.state.entropy.entropy2, OpaqueHash([0x11; 32]));
    assert_eq!(bench.state.entropy.entropy3, OpaqueHash([0x22; 32]));

    // The mark carries the pre-rotation entropy1 and the new staging set.
    let mark = output.epoch_mark.unwrap();
    assert_eq!(mark.entropy1, OpaqueHash([0x11; 32]));
    assert_eq!(mark.entropy_accumulator, OpaqueHash([0xAA; 32]));
    assert_eq!(mark.validators.len(), 6);
    for (published, staged) in mark.validators.iter().zip(bench.state.staging_set.0.iter()) {
        assert_eq!(published.bandersnatch, staged.bandersnatch);
        assert_eq!(published.ed25519, staged.ed25519);
    }
}

#[tokio::test]
async fn offenders_are_nulled_out_of_the_incoming_staging_set() {
    let mut bench = bench().await;
    let offender = bench.state.safrole.pending_set.0[2].ed25519;
    Arc::make_mut(&mut bench.state.disputes)
        .offenders
        .insert(offender);
    bench.state.the_time = 11;
    bench
        .engine
        .transition(&mut bench.state, 12, &bench.provider)
        .await
        .unwrap();
    assert_eq!(bench.state.staging_set.len(), 6);
    assert!(bench.state.staging_set.0[2].is_zero());
    assert!(!bench.state.staging_set.0[1].is_zero());
}

#[tokio::test]
async fn incomplete_contest_falls_back() {
    let mut bench = bench().await;
    bench.state.the_time = 11;
    bench
        .engine
        .transition(&mut bench.state, 12, &bench.provider)
        .await
        .unwrap();
    assert!(!bench.state.safrole.seal_keys.is_ticketed());
    // Every slot has exactly one authority drawn from the active set.
    let active: Vec<BandersnatchKey> = bench
        .state
        .active_set
        .bandersnatch_keys()
        .copied()
        .collect();
    for slot in 12..24 {
        match bench.engine.seal_authority(&bench.state, slot) {
            SealAuthority::Fallback(key) => assert!(active.contains(&key)),
            SealAuthority::Ticket(_) => panic!("expected fallback mode"),
        }
    }
}

#[tokio::test]
async fn full_contest_seals_the_next_epoch_with_tickets() {
    let mut bench = bench().await;
    fill_accumulator(&mut bench).await;
    let accumulator = bench.state.safrole.ticket_accumulator.clone();

    // Cross the tail within the epoch: the winners mark must announce the
    // outside-in sequence.
    bench.state.the_time = 9;
    let output = bench
        .engine
        .transition(&mut bench.state, 10, &bench.provider)
        .await
        .unwrap();
    assert_eq!(output.winners_mark, Some(outside_in(&accumulator)));

    // Cross the boundary: ticket mode, sealed with the same sequence.
    let output = bench
        .engine
        .transition(&mut bench.state, 12, &bench.provider)
        .await
        .unwrap();
    assert!(output.epoch_mark.is_some());
    assert!(bench.state.safrole.seal_keys.is_ticketed());
    assert!(bench.state.safrole.ticket_accumulator.is_empty());
    for (phase, expected) in outside_in(&accumulator).iter().enumerate() {
        match bench.engine.seal_authority(&bench.state, 12 + phase as u32) {
            SealAuthority::Ticket(ticket) => assert_eq!(ticket, *expected),
            SealAuthority::Fallback(_) => panic!("expected ticket mode"),
        }
    }
}

#[tokio::test]
async fn winners_mark_needs_a_full_accumulator() {
    let mut bench = bench().await;
    let envelopes = envelopes_for(&bench, &[(0, 0), (1, 0)]).await;
    let engine = bench.engine.clone();
    engine
        .apply_tickets(&mut bench.state, &envelopes, 1, &bench.provider)
        .await
        .unwrap();
    bench.state.the_time = 9;
    let output = engine
        .transition(&mut bench.state, 10, &bench.provider)
        .await
        .unwrap();
    assert!(output.winners_mark.is_none());
}

#[tokio::test]
async fn skipped_epochs_always_fall_back() {
    let mut bench = bench().await;
    fill_accumulator(&mut bench).await;
    bench.state.the_time = 11;
    // Jump two epochs ahead.
    let output = bench
        .engine
        .transition(&mut bench.state, 30, &bench.provider)
        .await
        .unwrap();
    assert_eq!(output.class, TransitionClass::SkipEpoch);
    assert!(!bench.state.safrole.seal_keys.is_ticketed());
    assert!(bench.state.safrole.ticket_accumulator.is_empty());
}

#[tokio::test]
async fn tickets_outside_the_contest_are_rejected() {
    let mut bench = bench().await;
    let envelopes = envelopes_for(&bench, &[(0, 0)]).await;
    let engine = bench.engine.clone();
    let err = engine
        .apply_tickets(&mut bench.state, &envelopes, 10, &bench.provider)
        .await
        .unwrap_err();
    assert!(matches!(err, ImportError::Ticket(TicketError::BadSlot)));
}

#[tokio::test]
async fn excessive_attempt_indices_are_rejected() {
    let mut bench = bench().await;
    let mut envelopes = envelopes_for(&bench, &[(0, 0)]).await;
    envelopes[0].attempt = 3; // tiny spec allows attempts 0..3
    let engine = bench.engine.clone();
    let err = engine
        .apply_tickets(&mut bench.state, &envelopes, 1, &bench.provider)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ImportError::Ticket(TicketError::BadTicketAttempt { limit: 3, got: 3 })
    ));
}

#[tokio::test]
async fn corrupted_proofs_are_rejected() {
    let mut bench = bench().await;
    let mut envelopes = envelopes_for(&bench, &[(0, 0)]).await;
    envelopes[0].signature.0[40] ^= 0x01;
    let engine = bench.engine.clone();
    let err = engine
        .apply_tickets(&mut bench.state, &envelopes, 1, &bench.provider)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ImportError::Ticket(TicketError::BadTicketProof)
    ));
}

#[tokio::test]
async fn duplicate_submissions_are_rejected() {
    let mut bench = bench().await;
    let envelopes = envelopes_for(&bench, &[(0, 0)]).await;
    let engine = bench.engine.clone();
    engine
        .apply_tickets(&mut bench.state, &envelopes, 1, &bench.provider)
        .await
        .unwrap();
    let err = engine
        .apply_tickets(&mut bench.state, &envelopes, 2, &bench.provider)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ImportError::Ticket(TicketError::DuplicateTicket)
    ));
}
