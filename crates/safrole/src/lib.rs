// Path: crates/safrole/src/lib.rs
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

//! # Marmalade Safrole
//!
//! The slot/epoch state machine that selects block authors: entropy
//! rotation, validator-set rotation, the ticket contest, seal-key
//! schedules, and the header marks announcing them. The same crate carries
//! the deterministic guarantor-to-core assignment and the guarantee
//! signature rules, since both draw on the epoch entropy the engine
//! rotates.
//!
//! Everything here operates on a [`marmalade_state::WorldState`] working
//! copy owned by an open transition; nothing is persisted or verified
//! against the network from this crate.

/// Deterministic validator-to-core assignment.
pub mod assignment;
/// Signature context strings.
pub mod contexts;
/// The slot/epoch transition engine.
pub mod engine;
/// Guarantee signature assembly and verification.
pub mod guarantor;
/// Ticket accumulation and the outside-in sequencer.
pub mod tickets;

pub use engine::{SafroleEngine, SealAuthority, TransitionClass, TransitionOutput};
