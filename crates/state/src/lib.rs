// Path: crates/state/src/lib.rs
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

//! # Marmalade State
//!
//! The 17-component world state, its merklization, and the `StateService`
//! that owns it. All state mutation in the kernel flows through the
//! service: a block import opens a transition, mutates a copy-on-write
//! working state, and either commits it atomically or aborts leaving the
//! prior handle untouched. Merkle-root computation is pure and synchronous.

/// The world-state structure and its per-component types.
pub mod components;
/// Genesis state construction from a chain spec.
pub mod genesis;
/// The state service owning the world state.
pub mod service;
/// State-key construction for the keyed trie.
pub mod statekey;
/// The keyed binary merkle trie.
pub mod trie;

pub use components::WorldState;
pub use service::{StateService, Transition};
