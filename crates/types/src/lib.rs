// Path: crates/types/src/lib.rs
#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! # Marmalade Types
//!
//! This crate is the foundational library for the Marmalade kernel, containing
//! all consensus-critical data structures, the canonical JAM binary codec, the
//! chain-spec configuration surface, and the error taxonomy.
//!
//! ## Architectural Role
//!
//! As the base crate, `marmalade-types` has minimal dependencies and is itself
//! a dependency for almost every other crate in the workspace. This structure
//! prevents circular dependencies and provides a stable, canonical definition
//! for shared types like `Header`, `Extrinsic`, `ValidatorKeys`, and the
//! various error enums. Everything that is hashed, signed, or merklized is
//! defined here together with its exact wire encoding.

/// The maximum number of entries accepted in the `recent` ancestry component.
pub const MAX_RECENT_HISTORY: usize = 24;

/// A top-level, crate-wide `Result` type alias with a default error type.
pub type Result<T, E = crate::error::CodecError> = std::result::Result<T, E>;

/// Block, header, and extrinsic structures with their canonical encodings.
pub mod block;
/// The canonical, deterministic JAM binary codec.
pub mod codec;
/// The static chain-spec configuration surface.
pub mod config;
/// A unified set of all error types used across the workspace.
pub mod error;
/// A prelude containing useful extension traits like `OptionExt`.
pub mod prelude;
/// Fixed-size hash, key, and signature newtypes.
pub mod primitives;
/// The privileged-service record and its version-gated encoding.
pub mod privileges;
/// Service account records with computed footprint accounting.
pub mod service;
/// Validator key tuples and validator-set handling.
pub mod validators;
