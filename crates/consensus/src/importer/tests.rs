// Path: crates/consensus/src/importer/tests.rs

use super::*;
use crate::author::BlockAuthor;
use async_trait::async_trait;
use ed25519_dalek::{Signer as DalekSigner, SigningKey};
use marmalade_api::pvm::{PvmInvocation, PvmOutcome};
use marmalade_api::signer::BlockSigner;
use marmalade_crypto::bandersnatch::{DevBandersnatch, DevSigner};
use marmalade_safrole::contexts::{
    assurance_message, guarantee_message, judgment_message, ticket_context,
};
use marmalade_safrole::guarantor::report_hash;
use marmalade_state::genesis::genesis_state;
use marmalade_types::block::{
    AvailAssurance, Culprit, Extrinsic, GuaranteeCredential, Judgment, Preimage, ReportGuarantee,
    TicketEnvelope, Verdict, WorkReport,
};
use marmalade_types::config::ChainSpec;
use marmalade_types::error::{HeaderError, ImportError};
use marmalade_types::primitives::{Ed25519Signature, OpaqueHash, ServiceId};
use marmalade_types::service::{PreimageRequest, ServiceAccount};
use marmalade_types::validators::ValidatorKeys;

struct TestPvm;

#[async_trait]
impl PvmExecutor for TestPvm {
    async fn execute_refine(&self, invocation: PvmInvocation) -> PvmOutcome {
        PvmOutcome {
            result: Ok(invocation.args),
            export_segments: vec![],
            gas_used: 1_000,
        }
    }

    async fn execute_accumulate(&self, invocation: PvmInvocation) -> PvmOutcome {
        PvmOutcome {
            result: Ok(invocation.args),
            export_segments: vec![],
            gas_used: 1_000,
        }
    }
}

const TEST_SERVICE: ServiceId = ServiceId(7);

struct Bench {
    spec: ChainSpec,
    service: StateService,
    importer: BlockImporter,
    author: BlockAuthor,
    ed25519: Vec<SigningKey>,
    bandersnatch: Vec<[u8; 32]>,
    genesis_ring_root: OpaqueHash,
}

async fn bench() -> Bench {
    let spec = ChainSpec::tiny();
    let provider = Arc::new(DevBandersnatch);
    let ed25519: Vec<SigningKey> = (0..spec.num_validators)
        .map(|i| SigningKey::from_bytes(&[i as u8 + 1; 32]))
        .collect();
    let bandersnatch: Vec<[u8; 32]> = (0..spec.num_validators)
        .map(|i| [i as u8 + 1; 32])
        .collect();
    let validators: Vec<ValidatorKeys> = ed25519
        .iter()
        .zip(&bandersnatch)
        .map(|(signer, bander)| ValidatorKeys {
            bandersnatch: *bander,
            ed25519: signer.verifying_key().to_bytes(),
            bls: [0u8; 144],
            metadata: [0u8; 128],
        })
        .collect();
    let keys: Vec<[u8; 32]> = bandersnatch.clone();
    let genesis_ring_root = provider.ring_root(&keys).await.unwrap();
    let mut state = genesis_state(&spec, &validators, genesis_ring_root);

    // A live service so accumulation has something to run against.
    let code = vec![0xC0, 0xDE];
    let codehash = blake2b_256(&code);
    let mut account = ServiceAccount {
        codehash,
        balance: 1_000_000,
        ..Default::default()
    };
    account.preimages.insert(codehash, code.clone());
    account.requests.insert(
        PreimageRequest {
            hash: codehash,
            length: code.len() as u32,
        },
        vec![0],
    );
    // A standing request used by the preimage tests.
    account.requests.insert(
        PreimageRequest {
            hash: blake2b_256(b"solicited-blob"),
            length: 14,
        },
        vec![],
    );
    Arc::make_mut(&mut state.accounts).insert(TEST_SERVICE, account);

    let service = StateService::new(spec.clone(), state);
    let genesis = genesis_parent(service.state_root());
    let engine = SafroleEngine::new(spec.clone());
    let importer = BlockImporter::new(
        engine.clone(),
        provider.clone(),
        Arc::new(TestPvm),
        EventBus::new(64),
        genesis,
    );
    let author = BlockAuthor::new(engine, provider, genesis);
    Bench {
        spec,
        service,
        importer,
        author,
        ed25519,
        bandersnatch,
        genesis_ring_root,
    }
}

/// Authors a block for `slot` by whichever validator owns its seal.
async fn author_at(bench: &Bench, slot: u32, extrinsic: Extrinsic) -> Block {
    let ring_root = bench.service.current().safrole.epoch_root;
    for key in &bench.bandersnatch {
        let signer = DevSigner::new(*key, ring_root);
        match bench
            .author
            .author_block(&bench.service, &signer, slot, extrinsic.clone())
            .await
        {
            Ok(block) => return block,
            Err(marmalade_types::error::AuthorError::NotOurSlot(_)) => continue,
            Err(err) => panic!("authoring failed: {err}"),
        }
    }
    panic!("no validator owns slot {slot}");
}

async fn import_at(bench: &mut Bench, slot: u32, extrinsic: Extrinsic) -> ImportOutcome {
    let block = author_at(bench, slot, extrinsic).await;
    bench
        .importer
        .import_block(&mut bench.service, &block)
        .await
        .unwrap()
}

/// Ticket envelopes for (validator, attempt) pairs against the current
/// epoch root, sorted by the identifier they will mint.
async fn ticket_envelopes(bench: &Bench, pairs: &[(usize, u8)]) -> Vec<TicketEnvelope> {
    let state = bench.service.current();
    let mut entries = Vec::new();
    for (validator, attempt) in pairs {
        let signer = DevSigner::new(bench.bandersnatch[*validator], state.safrole.epoch_root);
        let context = ticket_context(&state.entropy.entropy2, *attempt);
        let signature = signer.sign_ring(&context, b"").await.unwrap();
        entries.push((marmalade_api::crypto::banderout(&signature), *attempt, signature));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries
        .into_iter()
        .map(|(_, attempt, signature)| TicketEnvelope { attempt, signature })
        .collect()
}

#[tokio::test]
async fn authored_block_imports_cleanly() {
    let mut bench = bench().await;
    let mut events = bench.importer.events().subscribe();
    let before = bench.service.state_root();
    let outcome = import_at(&mut bench, 1, Extrinsic::default()).await;
    assert_eq!(outcome.timeslot, 1);
    assert!(!outcome.epoch_transitioned);
    assert_ne!(outcome.state_root, before);
    assert_eq!(bench.service.current().the_time, 1);
    // The author's counters moved.
    let blocks: u32 = bench
        .service
        .current()
        .activity
        .validators
        .iter()
        .map(|v| v.blocks)
        .sum();
    assert_eq!(blocks, 1);
    // Events arrive in order.
    assert!(matches!(
        events.try_recv().unwrap(),
        KernelEvent::BlockImported { timeslot: 1, .. }
    ));
    assert!(matches!(
        events.try_recv().unwrap(),
        KernelEvent::StateCommitted { .. }
    ));
}

#[tokio::test]
async fn chained_imports_use_recent_history() {
    let mut bench = bench().await;
    let first = import_at(&mut bench, 1, Extrinsic::default()).await;
    let block = author_at(&bench, 2, Extrinsic::default()).await;
    assert_eq!(block.header.parent, first.header_hash);
    assert_eq!(block.header.prior_state_root, first.state_root);
    bench
        .importer
        .import_block(&mut bench.service, &block)
        .await
        .unwrap();
    assert_eq!(bench.service.current().recent.blocks.len(), 2);
}

#[tokio::test]
async fn stale_timeslot_is_rejected_and_the_successor_accepted() {
    let mut bench = bench().await;
    // Establish thetime = 100 (a skipped transition is fine).
    import_at(&mut bench, 100, Extrinsic::default()).await;

    // A block claiming slot 100 again fails the monotonicity check.
    let mut block = author_at(&bench, 101, Extrinsic::default()).await;
    block.header.timeslot = 100;
    let err = bench
        .importer
        .import_block(&mut bench.service, &block)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ImportError::Header(HeaderError::BadSlot {
            latest: 100,
            got: 100
        })
    ));

    // The untampered successor passes.
    import_at(&mut bench, 101, Extrinsic::default()).await;
    assert_eq!(bench.service.current().the_time, 101);
}

#[tokio::test]
async fn rejection_leaves_the_state_root_untouched() {
    let mut bench = bench().await;
    let before = bench.service.state_root();
    let mut block = author_at(&bench, 1, Extrinsic::default()).await;
    block.header.seal_sig.0[10] ^= 0x01;
    let err = bench
        .importer
        .import_block(&mut bench.service, &block)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ImportError::Header(HeaderError::BadSealSignature)
    ));
    assert_eq!(bench.service.state_root(), before);
    bench.service.verify_integrity().unwrap();
}

#[tokio::test]
async fn wrong_prior_state_root_is_rejected() {
    let mut bench = bench().await;
    let mut block = author_at(&bench, 1, Extrinsic::default()).await;
    block.header.prior_state_root = OpaqueHash([0xEE; 32]);
    let err = bench
        .importer
        .import_block(&mut bench.service, &block)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ImportError::Header(HeaderError::BadPriorStateRoot { .. })
    ));
}

#[tokio::test]
async fn unknown_parent_is_rejected() {
    let mut bench = bench().await;
    let mut block = author_at(&bench, 1, Extrinsic::default()).await;
    block.header.parent = OpaqueHash([0xDD; 32]);
    let err = bench
        .importer
        .import_block(&mut bench.service, &block)
        .await
        .unwrap_err();
    assert!(matches!(err, ImportError::Header(HeaderError::BadParent(_))));
}

#[tokio::test]
async fn tampered_extrinsic_hash_is_rejected() {
    let mut bench = bench().await;
    let mut block = author_at(&bench, 1, Extrinsic::default()).await;
    block.extrinsic.reserved = vec![1];
    let err = bench
        .importer
        .import_block(&mut bench.service, &block)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ImportError::Header(HeaderError::BadExtrinsicHash)
    ));
}

#[tokio::test]
async fn epoch_boundary_requires_a_faithful_epoch_mark() {
    let mut bench = bench().await;
    import_at(&mut bench, 11, Extrinsic::default()).await;

    // The authored boundary block carries the correct mark and imports.
    let block = author_at(&bench, 12, Extrinsic::default()).await;
    assert!(block.header.epoch_mark.is_some());

    // A forged entropy1 is caught before any signature work.
    let mut forged = block.clone();
    forged.header.epoch_mark.as_mut().unwrap().entropy1 = OpaqueHash([0xAB; 32]);
    let err = bench
        .importer
        .import_block(&mut bench.service, &forged)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ImportError::Header(HeaderError::InvalidEpochMark(_))
    ));

    // A stripped mark is equally invalid.
    let mut stripped = block.clone();
    stripped.header.epoch_mark = None;
    let err = bench
        .importer
        .import_block(&mut bench.service, &stripped)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ImportError::Header(HeaderError::InvalidEpochMark(_))
    ));

    let outcome = bench
        .importer
        .import_block(&mut bench.service, &block)
        .await
        .unwrap();
    assert!(outcome.epoch_transitioned);
}

#[tokio::test]
async fn spurious_marks_mid_epoch_are_rejected() {
    let mut bench = bench().await;
    let block = author_at(&bench, 1, Extrinsic::default()).await;
    let mut forged = block.clone();
    forged.header.winners_mark = Some(
        (0..bench.spec.epoch_duration)
            .map(|i| marmalade_types::block::TicketBody {
                id: OpaqueHash([i as u8; 32]),
                entry_index: 0,
            })
            .collect(),
    );
    let err = bench
        .importer
        .import_block(&mut bench.service, &forged)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ImportError::Header(HeaderError::InvalidTicketsMark(_))
    ));
}

#[tokio::test]
async fn offenders_mark_must_match_the_disputes() {
    let mut bench = bench().await;
    let block = author_at(&bench, 1, Extrinsic::default()).await;
    let mut forged = block.clone();
    forged.header.offenders_mark = vec![[9u8; 32]];
    let err = bench
        .importer
        .import_block(&mut bench.service, &forged)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ImportError::Header(HeaderError::InvalidOffendersMark(_))
    ));
}

#[tokio::test]
async fn ticket_contest_seals_the_following_epoch() {
    let mut bench = bench().await;
    // Twelve tickets (six validators, two attempts) fill the accumulator.
    let pairs: Vec<(usize, u8)> = (0..6).flat_map(|v| [(v, 0u8), (v, 1u8)]).collect();
    let envelopes = ticket_envelopes(&bench, &pairs).await;
    let outcome = import_at(&mut bench, 1, Extrinsic {
        tickets: envelopes,
        ..Default::default()
    })
    .await;
    assert_eq!(outcome.tickets_accepted, 12);
    assert_eq!(
        bench.service.current().safrole.ticket_accumulator.len(),
        12
    );

    // Crossing the contest tail announces the winners.
    let crossing = author_at(&bench, 10, Extrinsic::default()).await;
    assert!(crossing.header.winners_mark.is_some());
    bench
        .importer
        .import_block(&mut bench.service, &crossing)
        .await
        .unwrap();

    // The boundary block flips the schedule into ticket mode, and the
    // following slots seal against tickets.
    let outcome = import_at(&mut bench, 12, Extrinsic::default()).await;
    assert!(outcome.epoch_transitioned);
    assert!(bench.service.current().safrole.seal_keys.is_ticketed());
    import_at(&mut bench, 13, Extrinsic::default()).await;
    assert_eq!(bench.service.current().the_time, 13);
}

#[tokio::test]
async fn solicited_preimages_are_recorded() {
    let mut bench = bench().await;
    let blob = b"solicited-blob".to_vec();
    let extrinsic = Extrinsic {
        preimages: vec![Preimage {
            requester: TEST_SERVICE,
            blob: blob.clone(),
        }],
        ..Default::default()
    };
    import_at(&mut bench, 1, extrinsic.clone()).await;
    let account = &bench.service.current().accounts[&TEST_SERVICE];
    let hash = blake2b_256(&blob);
    assert_eq!(account.preimages[&hash], blob);
    assert_eq!(
        account.requests[&PreimageRequest {
            hash,
            length: blob.len() as u32
        }],
        vec![1]
    );

    // Providing it again is rejected.
    let block = author_at(&bench, 2, extrinsic).await;
    let err = bench
        .importer
        .import_block(&mut bench.service, &block)
        .await
        .unwrap_err();
    assert!(matches!(err, ImportError::BadPreimage(_)));
}

#[tokio::test]
async fn unsolicited_preimages_are_rejected() {
    let mut bench = bench().await;
    let extrinsic = Extrinsic {
        preimages: vec![Preimage {
            requester: TEST_SERVICE,
            blob: b"nobody asked".to_vec(),
        }],
        ..Default::default()
    };
    let block = author_at(&bench, 1, extrinsic).await;
    let err = bench
        .importer
        .import_block(&mut bench.service, &block)
        .await
        .unwrap_err();
    assert!(matches!(err, ImportError::BadPreimage(_)));
}

fn signed_guarantee(bench: &Bench, slot: u32, core: u16) -> ReportGuarantee {
    let report = WorkReport {
        package_hash: OpaqueHash([0x77; 32]),
        core_index: core,
        authorizer_hash: OpaqueHash([0x88; 32]),
        service: TEST_SERVICE,
        output: vec![1, 2, 3],
    };
    let mut guarantee = ReportGuarantee {
        report,
        slot,
        credentials: vec![],
    };
    let hash = report_hash(&guarantee);
    let message = guarantee_message(&hash);
    let entropy2 = bench.service.current().entropy.entropy2;
    let group = marmalade_safrole::assignment::guarantors_of_core(
        &bench.spec,
        &entropy2,
        slot,
        core,
    )
    .unwrap();
    guarantee.credentials = group
        .iter()
        .map(|index| GuaranteeCredential {
            validator_index: *index,
            signature: Ed25519Signature(
                bench.ed25519[*index as usize].sign(&message).to_bytes(),
            ),
        })
        .collect();
    guarantee
}

#[tokio::test]
async fn guarantee_assurance_accumulation_pipeline() {
    let mut bench = bench().await;

    // Block 1: a fully-credentialed guarantee parks the report on core 0.
    let guarantee = signed_guarantee(&bench, 1, 0);
    let package = guarantee.report.package_hash;
    let first = import_at(&mut bench, 1, Extrinsic {
        guarantees: vec![guarantee],
        ..Default::default()
    })
    .await;
    assert!(bench.service.current().reports.0[0].is_some());

    // Block 2: five of six validators assure core 0; the report becomes
    // available and accumulates through the PVM.
    let bitfield = vec![0b01u8];
    let assurances: Vec<AvailAssurance> = (0..5u16)
        .map(|index| AvailAssurance {
            anchor: first.header_hash,
            bitfield: bitfield.clone(),
            validator_index: index,
            signature: Ed25519Signature(
                bench.ed25519[index as usize]
                    .sign(&assurance_message(&first.header_hash, &bitfield))
                    .to_bytes(),
            ),
        })
        .collect();
    let outcome = import_at(&mut bench, 2, Extrinsic {
        assurances,
        ..Default::default()
    })
    .await;
    assert_eq!(outcome.reports_accumulated, 1);
    let state = bench.service.current();
    assert!(state.reports.0[0].is_none());
    assert!(state.accumulated.contains(&package));
    assert_ne!(state.last_acc_out, OpaqueHash::ZERO);
    assert_eq!(state.activity.cores[0].accumulated, 1);
}

#[tokio::test]
async fn engaged_cores_reject_further_guarantees() {
    let mut bench = bench().await;
    let guarantee = signed_guarantee(&bench, 1, 0);
    import_at(&mut bench, 1, Extrinsic {
        guarantees: vec![guarantee],
        ..Default::default()
    })
    .await;

    let mut second = signed_guarantee(&bench, 2, 0);
    second.report.package_hash = OpaqueHash([0x99; 32]);
    // Re-sign over the changed report.
    let hash = report_hash(&second);
    let message = guarantee_message(&hash);
    for credential in &mut second.credentials {
        credential.signature = Ed25519Signature(
            bench.ed25519[credential.validator_index as usize]
                .sign(&message)
                .to_bytes(),
        );
    }
    let block = author_at(&bench, 2, Extrinsic {
        guarantees: vec![second],
        ..Default::default()
    })
    .await;
    let err = bench
        .importer
        .import_block(&mut bench.service, &block)
        .await
        .unwrap_err();
    assert!(matches!(err, ImportError::BadGuarantee(_)));
}

#[tokio::test]
async fn unanimous_invalid_verdict_records_offenders() {
    let mut bench = bench().await;
    let target = OpaqueHash([0x66; 32]);
    let votes: Vec<Judgment> = (0..bench.spec.judgment_quorum() as u16)
        .map(|index| Judgment {
            vote: false,
            index,
            signature: Ed25519Signature(
                bench.ed25519[index as usize]
                    .sign(&judgment_message(false, &target))
                    .to_bytes(),
            ),
        })
        .collect();
    let culprit_key = bench.ed25519[5].verifying_key().to_bytes();
    let extrinsic = Extrinsic {
        disputes: marmalade_types::block::DisputesExtrinsic {
            verdicts: vec![Verdict {
                target,
                age: 0,
                votes,
            }],
            culprits: vec![Culprit {
                target,
                key: culprit_key,
                signature: Ed25519Signature(
                    bench.ed25519[5]
                        .sign(&guarantee_message(&target))
                        .to_bytes(),
                ),
            }],
            faults: vec![],
        },
        ..Default::default()
    };
    import_at(&mut bench, 1, extrinsic).await;
    let state = bench.service.current();
    assert!(state.disputes.bad.contains(&target));
    assert!(state.disputes.offenders.contains(&culprit_key));

    // The next epoch's staging set nulls the offender out.
    import_at(&mut bench, 12, Extrinsic::default()).await;
    let state = bench.service.current();
    let nulled = state
        .staging_set
        .0
        .iter()
        .filter(|keys| keys.is_zero())
        .count();
    assert_eq!(nulled, 1);
}

#[tokio::test]
async fn genesis_ring_root_matches_the_staging_commitment() {
    let bench = bench().await;
    assert_eq!(
        bench.service.current().safrole.epoch_root,
        bench.genesis_ring_root
    );
}
