// Path: crates/api/src/lib.rs
#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! # Marmalade API
//!
//! Capability traits at the seams of the kernel core. The importer and the
//! Safrole engine never talk to a curve library, a database, or a guest
//! virtual machine directly; they consume these traits, and the host wires
//! in implementations at startup. Methods that may block or be offloaded to
//! worker threads (PVM execution, signature verification, persistence) are
//! async and double as the pipeline's cancellation points; everything pure
//! stays synchronous.

/// The cryptographic verification capability.
pub mod crypto;
/// Kernel event definitions and the subscription surface.
pub mod events;
/// The guest virtual machine capability.
pub mod pvm;
/// The authoring-side signing capability.
pub mod signer;

pub use crypto::{BandersnatchProvider, CryptoError, VrfOutput};
pub use events::{EventBus, KernelEvent};
pub use pvm::{PvmExecutor, PvmInvocation, PvmOutcome};
pub use signer::BlockSigner;
