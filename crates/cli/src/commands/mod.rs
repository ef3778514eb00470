// Path: crates/cli/src/commands/mod.rs

//! Shared command context and the exit-code error type.

use async_trait::async_trait;
use clap::Args;
use marmalade_api::crypto::BandersnatchProvider;
use marmalade_api::events::EventBus;
use marmalade_api::pvm::{PvmExecutor, PvmInvocation, PvmOutcome};
use marmalade_consensus::importer::genesis_parent;
use marmalade_consensus::{BlockAuthor, BlockImporter};
use marmalade_crypto::bandersnatch::DevBandersnatch;
use marmalade_safrole::engine::SafroleEngine;
use marmalade_state::genesis::{dev_validators, genesis_state};
use marmalade_state::StateService;
use marmalade_types::config::ChainSpec;
use marmalade_types::error::ErrorCode;
use marmalade_types::validators::ValidatorKeys;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::error;

pub mod author_block;
pub mod import_block;
pub mod state_cmd;

/// A command failure, carrying its exit code.
#[derive(Debug)]
pub enum CliError {
    /// A block or state value failed validation (exit code 1).
    Validation(String),
    /// Reading or writing a file failed (exit code 2).
    Io(String),
    /// The chain spec is missing or invalid (exit code 3).
    Config(String),
}

impl CliError {
    /// Logs the failure and yields the process exit code.
    pub fn report(self) -> ExitCode {
        match self {
            CliError::Validation(message) => {
                error!(target: "cli", "validation failure: {message}");
                ExitCode::from(1)
            }
            CliError::Io(message) => {
                error!(target: "cli", "i/o error: {message}");
                ExitCode::from(2)
            }
            CliError::Config(message) => {
                error!(target: "cli", "configuration error: {message}");
                ExitCode::from(3)
            }
        }
    }

    pub fn validation(error: impl ErrorCode + std::fmt::Display) -> Self {
        CliError::Validation(format!("{} ({})", error, error.code()))
    }
}

/// Chain-spec selection, shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct SpecArgs {
    /// Path to a JSON chain-spec file.
    #[clap(long)]
    pub spec: Option<PathBuf>,

    /// Built-in parameterization used when no spec file is given.
    #[clap(long, default_value = "tiny")]
    pub preset: String,
}

impl SpecArgs {
    fn load(&self) -> Result<ChainSpec, CliError> {
        let spec = match &self.spec {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .map_err(|e| CliError::Io(format!("{}: {e}", path.display())))?;
                serde_json::from_str(&raw).map_err(|e| CliError::Config(e.to_string()))?
            }
            None => match self.preset.as_str() {
                "tiny" => ChainSpec::tiny(),
                "full" => ChainSpec::full(),
                other => {
                    return Err(CliError::Config(format!("unknown preset '{other}'")));
                }
            },
        };
        spec.validate().map_err(|e| CliError::Config(e.to_string()))?;
        Ok(spec)
    }
}

/// A PVM stub for the development host: accumulation echoes its argument
/// blob. Deterministic across nodes, which is all the dev chain needs.
pub struct EchoPvm;

#[async_trait]
impl PvmExecutor for EchoPvm {
    async fn execute_refine(&self, invocation: PvmInvocation) -> PvmOutcome {
        PvmOutcome {
            result: Ok(invocation.args),
            export_segments: vec![],
            gas_used: 1_000,
        }
    }

    async fn execute_accumulate(&self, invocation: PvmInvocation) -> PvmOutcome {
        PvmOutcome {
            result: Ok(invocation.args),
            export_segments: vec![],
            gas_used: 1_000,
        }
    }
}

/// Everything a command needs: the spec, a genesis-rooted state service,
/// and the import/author pipelines wired with the development backends.
pub struct Context {
    pub spec: ChainSpec,
    pub service: StateService,
    pub importer: BlockImporter,
    pub author: BlockAuthor,
    pub validators: Vec<ValidatorKeys>,
}

impl Context {
    /// Builds the context from genesis under the selected spec.
    pub async fn build(args: &SpecArgs) -> Result<Self, CliError> {
        let spec = args.load()?;
        let provider = Arc::new(DevBandersnatch);
        let validators = dev_validators(&spec);
        let keys: Vec<[u8; 32]> = validators.iter().map(|v| v.bandersnatch).collect();
        let epoch_root = provider
            .ring_root(&keys)
            .await
            .map_err(|e| CliError::Config(e.to_string()))?;
        let state = genesis_state(&spec, &validators, epoch_root);
        let service = StateService::new(spec.clone(), state);
        let genesis = genesis_parent(service.state_root());
        let engine = SafroleEngine::new(spec.clone());
        let importer = BlockImporter::new(
            engine.clone(),
            provider.clone(),
            Arc::new(EchoPvm),
            EventBus::new(256),
            genesis,
        );
        let author = BlockAuthor::new(engine, provider, genesis);
        Ok(Context {
            spec,
            service,
            importer,
            author,
            validators,
        })
    }

    /// Imports the chain files in order, mutating the service.
    pub async fn import_chain(&mut self, files: &[PathBuf]) -> Result<(), CliError> {
        for path in files {
            let bytes = std::fs::read(path)
                .map_err(|e| CliError::Io(format!("{}: {e}", path.display())))?;
            let block = marmalade_types::block::Block::decode_all(&self.spec, &bytes)
                .map_err(CliError::validation)?;
            self.importer
                .import_block(&mut self.service, &block)
                .await
                .map_err(CliError::validation)?;
        }
        Ok(())
    }
}
