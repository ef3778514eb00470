// Path: crates/api/src/pvm.rs

//! The guest virtual machine capability.
//!
//! The core invokes the PVM in two phases: `refine` runs off-chain per work
//! item; `accumulate` runs on-chain per work report. Execution internals
//! (interpreter, recompiler, host-call table) live behind this trait.

use async_trait::async_trait;
use marmalade_types::error::PvmError;
use marmalade_types::primitives::{Gas, OpaqueHash, ServiceId, TimeSlot};

/// One PVM invocation request.
#[derive(Debug, Clone)]
pub struct PvmInvocation {
    /// The service whose code runs.
    pub service: ServiceId,
    /// The hash of the code blob to execute.
    pub code_hash: OpaqueHash,
    /// The lookup-anchor timeslot used to resolve the code via histlookup.
    pub lookup_anchor: TimeSlot,
    /// The gas allowance.
    pub gas: Gas,
    /// The argument blob.
    pub args: Vec<u8>,
}

/// The result of a PVM invocation.
#[derive(Debug, Clone)]
pub struct PvmOutcome {
    /// The produced output, or the terminal condition that ended execution.
    pub result: Result<Vec<u8>, PvmError>,
    /// Segments exported for distributed availability during refine.
    pub export_segments: Vec<Vec<u8>>,
    /// Gas actually consumed.
    pub gas_used: Gas,
}

impl PvmOutcome {
    /// Collapses terminal conditions per the refine orchestrator's policy:
    /// every non-out-of-gas failure folds to `Bad` except `Big`, which the
    /// protocol distinguishes.
    pub fn collapsed(mut self) -> Self {
        if let Err(err) = self.result {
            self.result = Err(err.collapse());
        }
        self
    }
}

/// The guest virtual machine, as seen by the core.
///
/// Both methods are suspension points: the host may run guest code on a
/// worker thread, and an import is cancellable while awaiting them.
#[async_trait]
pub trait PvmExecutor: Send + Sync {
    /// Executes a refine invocation off-chain.
    async fn execute_refine(&self, invocation: PvmInvocation) -> PvmOutcome;

    /// Executes an accumulate invocation on-chain.
    async fn execute_accumulate(&self, invocation: PvmInvocation) -> PvmOutcome;
}
