// Path: crates/consensus/src/sequencer.rs

//! The import sequencer: ordered, cancellable block processing.
//!
//! The kernel is single-threaded from the caller's perspective: blocks are
//! imported strictly in arrival order, one to completion before the next
//! begins. The sequencer owns the state service and drains a queue;
//! shutdown cancels an in-flight import at its next suspension point,
//! which drops the open transition and leaves the committed state exactly
//! as it was.

use crate::importer::{BlockImporter, ImportOutcome};
use marmalade_state::StateService;
use marmalade_types::block::Block;
use marmalade_types::error::{ErrorCode, ImportError};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

/// The per-block result delivered back to the submitter, when requested.
pub type ImportResult = Result<ImportOutcome, ImportError>;

/// A queued unit of work: the block plus an optional completion channel.
pub struct QueuedBlock {
    /// The block to import.
    pub block: Block,
    /// Where to deliver the outcome; dropped silently if the submitter
    /// went away.
    pub completion: Option<tokio::sync::oneshot::Sender<ImportResult>>,
}

impl From<Block> for QueuedBlock {
    fn from(block: Block) -> Self {
        QueuedBlock {
            block,
            completion: None,
        }
    }
}

/// Owns the state service and importer, processing queued blocks in order.
pub struct ImportSequencer {
    service: StateService,
    importer: BlockImporter,
}

impl ImportSequencer {
    /// Assembles a sequencer over its service and pipeline.
    pub fn new(service: StateService, importer: BlockImporter) -> Self {
        ImportSequencer { service, importer }
    }

    /// Read access to the owned state service.
    pub fn service(&self) -> &StateService {
        &self.service
    }

    /// Imports a single block, serialized with everything else the
    /// sequencer processes.
    pub async fn import(&mut self, block: &Block) -> ImportResult {
        self.importer.import_block(&mut self.service, block).await
    }

    /// Drains the queue until it closes or `shutdown` fires, returning the
    /// service so callers can inspect or persist the final state.
    ///
    /// Rejected blocks are reported to their submitter and logged; they
    /// never stop the loop. Shutdown between blocks exits immediately;
    /// shutdown during a block cancels it at the next suspension point and
    /// discards the partial world.
    pub async fn run(
        mut self,
        mut queue: mpsc::Receiver<QueuedBlock>,
        mut shutdown: watch::Receiver<bool>,
    ) -> StateService {
        loop {
            let queued = tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                next = queue.recv() => match next {
                    Some(queued) => queued,
                    None => break,
                },
            };

            let slot = queued.block.header.timeslot;
            let result = tokio::select! {
                biased;
                _ = shutdown.changed() => {
                    // The import future is dropped here, taking the open
                    // transition with it.
                    info!(target: "consensus", slot, "import cancelled by shutdown");
                    break;
                }
                result = self.import(&queued.block) => result,
            };

            if let Err(error) = &result {
                warn!(
                    target: "consensus",
                    slot,
                    code = error.code(),
                    "sequenced block rejected"
                );
            }
            if let Some(completion) = queued.completion {
                let _ = completion.send(result);
            }
        }
        self.service
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::author::BlockAuthor;
    use crate::importer::genesis_parent;
    use async_trait::async_trait;
    use marmalade_api::crypto::{BandersnatchProvider, CryptoError, VrfOutput};
    use marmalade_api::events::EventBus;
    use marmalade_api::pvm::{PvmExecutor, PvmInvocation, PvmOutcome};
    use marmalade_crypto::bandersnatch::{DevBandersnatch, DevSigner};
    use marmalade_safrole::engine::SafroleEngine;
    use marmalade_state::genesis::{dev_validators, genesis_state};
    use marmalade_types::block::Extrinsic;
    use marmalade_types::config::ChainSpec;
    use marmalade_types::error::AuthorError;
    use marmalade_types::primitives::{BandersnatchKey, BandersnatchSignature, OpaqueHash};
    use std::sync::Arc;
    use std::time::Duration;

    struct NullPvm;

    #[async_trait]
    impl PvmExecutor for NullPvm {
        async fn execute_refine(&self, _: PvmInvocation) -> PvmOutcome {
            PvmOutcome {
                result: Ok(vec![]),
                export_segments: vec![],
                gas_used: 0,
            }
        }
        async fn execute_accumulate(&self, _: PvmInvocation) -> PvmOutcome {
            PvmOutcome {
                result: Ok(vec![]),
                export_segments: vec![],
                gas_used: 0,
            }
        }
    }

    /// Delegates to the dev backend after an injected delay, so tests can
    /// cancel an import while it sits at a suspension point.
    struct SlowProvider {
        inner: DevBandersnatch,
        delay: Duration,
    }

    #[async_trait]
    impl BandersnatchProvider for SlowProvider {
        async fn verify_vrf(
            &self,
            key: &BandersnatchKey,
            context: &[u8],
            message: &[u8],
            signature: &BandersnatchSignature,
        ) -> Result<Option<VrfOutput>, CryptoError> {
            tokio::time::sleep(self.delay).await;
            self.inner.verify_vrf(key, context, message, signature).await
        }

        async fn verify_ring(
            &self,
            ring_root: &OpaqueHash,
            context: &[u8],
            message: &[u8],
            signature: &BandersnatchSignature,
        ) -> Result<Option<VrfOutput>, CryptoError> {
            self.inner
                .verify_ring(ring_root, context, message, signature)
                .await
        }

        async fn ring_root(&self, keys: &[BandersnatchKey]) -> Result<OpaqueHash, CryptoError> {
            self.inner.ring_root(keys).await
        }
    }

    async fn sequencer_with(delay: Duration) -> (ImportSequencer, BlockAuthor) {
        let spec = ChainSpec::tiny();
        let fast = DevBandersnatch;
        let validators = dev_validators(&spec);
        let keys: Vec<[u8; 32]> = validators.iter().map(|v| v.bandersnatch).collect();
        let epoch_root = fast.ring_root(&keys).await.unwrap();
        let state = genesis_state(&spec, &validators, epoch_root);
        let service = StateService::new(spec.clone(), state);
        let genesis = genesis_parent(service.state_root());
        let engine = SafroleEngine::new(spec);
        let provider = Arc::new(SlowProvider { inner: fast, delay });
        let importer = BlockImporter::new(
            engine.clone(),
            provider.clone(),
            Arc::new(NullPvm),
            EventBus::new(16),
            genesis,
        );
        let author = BlockAuthor::new(engine, Arc::new(DevBandersnatch), genesis);
        (ImportSequencer::new(service, importer), author)
    }

    async fn author_at(
        sequencer: &ImportSequencer,
        author: &BlockAuthor,
        slot: u32,
    ) -> Block {
        let ring_root = sequencer.service().current().safrole.epoch_root;
        for tag in 1..=6u8 {
            let signer = DevSigner::new([tag; 32], ring_root);
            match author
                .author_block(sequencer.service(), &signer, slot, Extrinsic::default())
                .await
            {
                Ok(block) => return block,
                Err(AuthorError::NotOurSlot(_)) => continue,
                Err(err) => panic!("authoring failed: {err}"),
            }
        }
        panic!("no validator owns slot {slot}");
    }

    #[tokio::test]
    async fn blocks_are_processed_in_arrival_order() {
        let (sequencer, author) = sequencer_with(Duration::ZERO).await;
        let first = author_at(&sequencer, &author, 1).await;

        let (tx, rx) = mpsc::channel(4);
        let (_stop_tx, stop_rx) = watch::channel(false);
        let (done_tx, done_rx) = tokio::sync::oneshot::channel();
        tx.send(QueuedBlock {
            block: first,
            completion: Some(done_tx),
        })
        .await
        .unwrap();
        drop(tx);

        let service = sequencer.run(rx, stop_rx).await;
        assert_eq!(service.current().the_time, 1);
        assert!(done_rx.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn rejected_blocks_do_not_stop_the_loop() {
        let (sequencer, author) = sequencer_with(Duration::ZERO).await;
        let good = author_at(&sequencer, &author, 1).await;
        let mut bad = good.clone();
        bad.header.seal_sig.0[0] ^= 1;

        let (tx, rx) = mpsc::channel(4);
        let (_stop_tx, stop_rx) = watch::channel(false);
        tx.send(QueuedBlock::from(bad)).await.unwrap();
        tx.send(QueuedBlock::from(good)).await.unwrap();
        drop(tx);

        let service = sequencer.run(rx, stop_rx).await;
        // The tampered block was rejected, the genuine one landed.
        assert_eq!(service.current().the_time, 1);
    }

    #[tokio::test]
    async fn shutdown_cancels_an_import_at_a_suspension_point() {
        let (sequencer, author) = sequencer_with(Duration::from_secs(30)).await;
        let before = sequencer.service().state_root();
        let block = author_at(&sequencer, &author, 1).await;

        let (tx, rx) = mpsc::channel(4);
        let (stop_tx, stop_rx) = watch::channel(false);
        tx.send(QueuedBlock::from(block)).await.unwrap();

        let handle = tokio::spawn(sequencer.run(rx, stop_rx));
        // Let the import reach the slow seal verification, then stop.
        tokio::time::sleep(Duration::from_millis(50)).await;
        stop_tx.send(true).unwrap();
        let service = handle.await.unwrap();

        // The partial transition was discarded wholesale.
        assert_eq!(service.state_root(), before);
        assert_eq!(service.current().the_time, 0);
        service.verify_integrity().unwrap();
    }
}
