// Path: crates/cli/src/main.rs
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

//! # Marmalade CLI
//!
//! The node's command-line surface: import blocks, author a block, and
//! inspect or export the world state. Exit codes are part of the
//! interface: `0` success, `1` validation failure, `2` I/O error, `3`
//! configuration error.

use clap::{Parser, Subcommand};
use marmalade_cli::commands::{self, author_block, import_block, state_cmd, SpecArgs};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[clap(
    name = "marmalade",
    version,
    about = "The Marmalade JAM node kernel.",
    long_about = "Marmalade drives the JAM block-production and block-import \
                  state machine: deterministic codec, Safrole sealing, and \
                  the 17-component world state."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import one or more encoded blocks, in order, from genesis.
    ImportBlock(import_block::ImportBlockArgs),

    /// Author a block for a slot the selected dev validator controls.
    AuthorBlock(author_block::AuthorBlockArgs),

    /// Print the state root after importing the given chain.
    ShowStateRoot(state_cmd::ShowStateRootArgs),

    /// Export every state component, hex-encoded, as JSON.
    ExportState(state_cmd::ExportStateArgs),
}

impl Commands {
    fn spec_args(&self) -> &SpecArgs {
        match self {
            Commands::ImportBlock(args) => &args.spec,
            Commands::AuthorBlock(args) => &args.spec,
            Commands::ShowStateRoot(args) => &args.spec,
            Commands::ExportState(args) => &args.spec,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    marmalade_telemetry::init_logging("info");
    let cli = Cli::parse();

    let context = match commands::Context::build(cli.command.spec_args()).await {
        Ok(context) => context,
        Err(error) => return error.report(),
    };

    let result = match cli.command {
        Commands::ImportBlock(args) => import_block::run(context, args).await,
        Commands::AuthorBlock(args) => author_block::run(context, args).await,
        Commands::ShowStateRoot(args) => state_cmd::show_root(context, args).await,
        Commands::ExportState(args) => state_cmd::export(context, args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => error.report(),
    }
}
