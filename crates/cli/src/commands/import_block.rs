// Path: crates/cli/src/commands/import_block.rs

//! The `import-block` subcommand.

use super::{CliError, Context, SpecArgs};
use clap::Args;
use marmalade_telemetry::{NodeInfo, TelemetryClient, TelemetryEvent};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

// 12:00 UTC, 1 January 2025.
const JAM_COMMON_ERA_UNIX: u64 = 1_735_732_800;

/// Arguments of `import-block`.
#[derive(Args, Debug)]
pub struct ImportBlockArgs {
    /// Encoded block files, imported in the given order.
    #[clap(required = true)]
    pub files: Vec<PathBuf>,

    /// JIP-3 telemetry endpoint (host:port).
    #[clap(long)]
    pub telemetry: Option<String>,

    #[clap(flatten)]
    pub spec: SpecArgs,
}

fn timestamp_us() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_micros() as u64)
        .unwrap_or(0)
        .saturating_sub(JAM_COMMON_ERA_UNIX * 1_000_000)
}

async fn emit(client: &mut Option<TelemetryClient>, event: TelemetryEvent) {
    if let Some(client) = client {
        // Telemetry is best-effort; a dead collector never blocks import.
        let _ = client.send(&event, timestamp_us()).await;
    }
}

/// Runs `import-block`.
pub async fn run(mut context: Context, args: ImportBlockArgs) -> Result<(), CliError> {
    let mut telemetry = args.telemetry.as_ref().map(|endpoint| {
        TelemetryClient::new(
            endpoint.clone(),
            NodeInfo {
                protocol_version: 1,
                peer_id: [0u8; 32],
                peer_address: ([0u8; 16], 0),
                node_flags: [0u8; 4],
                impl_name: "marmalade".into(),
                impl_version: env!("CARGO_PKG_VERSION").into(),
                additional_info: String::new(),
            },
        )
    });

    for (event_id, path) in (0u64..).zip(&args.files) {
        let bytes = std::fs::read(path)
            .map_err(|e| CliError::Io(format!("{}: {e}", path.display())))?;
        let block = marmalade_types::block::Block::decode_all(&context.spec, &bytes)
            .map_err(CliError::validation)?;
        match context
            .importer
            .import_block(&mut context.service, &block)
            .await
        {
            Ok(outcome) => {
                emit(&mut telemetry, TelemetryEvent::BlockVerified { event_id }).await;
                emit(
                    &mut telemetry,
                    TelemetryEvent::BlockExecuted {
                        event_id,
                        accumulation_gas: outcome.reports_accumulated as u64,
                    },
                )
                .await;
                info!(
                    target: "cli",
                    file = %path.display(),
                    slot = outcome.timeslot,
                    root = %outcome.state_root,
                    "block imported"
                );
                println!("{} {}", outcome.timeslot, outcome.state_root);
            }
            Err(error) => {
                emit(
                    &mut telemetry,
                    TelemetryEvent::BlockVerificationFailed {
                        event_id,
                        reason: marmalade_types::error::ErrorCode::code(&error).to_string(),
                    },
                )
                .await;
                return Err(CliError::validation(error));
            }
        }
    }
    // Decoded state disagreeing with its recomputed root is fatal
    // corruption: emit the final telemetry event and abort.
    if let Err(error) = context.service.verify_integrity() {
        emit(
            &mut telemetry,
            TelemetryEvent::Fatal {
                reason: error.to_string(),
            },
        )
        .await;
        return Err(CliError::Validation(error.to_string()));
    }

    println!("state-root {}", context.service.state_root());
    Ok(())
}
