// Path: crates/consensus/src/lib.rs
#![forbid(unsafe_code)]
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented
    )
)]

//! # Marmalade Consensus
//!
//! The block import pipeline and its authoring counterpart. The
//! [`BlockImporter`] drives a candidate block through pre-state validation,
//! the Safrole transition, extrinsic application, and the post-state
//! commit, emitting kernel events in order. Any failure aborts the open
//! transition and leaves the committed state untouched.

/// Extrinsic application: tickets, preimages, guarantees, assurances,
/// disputes, and the accumulation driver.
pub mod apply;
/// Block authoring for slots the local validator controls.
pub mod author;
/// The import orchestrator.
pub mod importer;
/// Ordered, cancellable processing of queued blocks.
pub mod sequencer;
/// Header validation against the transitioned working state.
pub mod validate;

pub use author::BlockAuthor;
pub use importer::{BlockImporter, ImportOutcome};
pub use sequencer::ImportSequencer;
