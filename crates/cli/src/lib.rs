// Path: crates/cli/src/lib.rs
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

//! # Marmalade CLI Library
//!
//! The command implementations behind the `marmalade` binary, exposed as a
//! library so integration tests drive the exact code paths the binary
//! runs. This crate is the kernel's primary external consumer: it only
//! touches the public APIs of the `marmalade-*` library crates and
//! contains no protocol logic of its own.

/// Subcommand implementations and the shared command context.
pub mod commands;

pub use commands::{CliError, Context, SpecArgs};
