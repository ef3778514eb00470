// Path: crates/telemetry/src/lib.rs
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

//! # Marmalade Telemetry
//!
//! Observability for the kernel: global structured-logging initialization
//! and the JIP-3 telemetry client. The client frames events in the
//! canonical codec and holds the node-info preamble gate: the preamble is
//! sent exactly once per connection and never resent across reconnects.

/// The initialization routine for global structured logging.
pub mod init;
/// The JIP-3 wire format and client.
pub mod jip3;

pub use init::init_logging;
pub use jip3::{NodeInfo, TelemetryClient, TelemetryEvent};
