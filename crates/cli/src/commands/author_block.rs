// Path: crates/cli/src/commands/author_block.rs

//! The `author-block` subcommand.

use super::{CliError, Context, SpecArgs};
use clap::Args;
use marmalade_crypto::bandersnatch::DevSigner;
use marmalade_types::block::Extrinsic;
use marmalade_types::error::AuthorError;
use std::path::PathBuf;
use tracing::info;

/// Arguments of `author-block`.
#[derive(Args, Debug)]
pub struct AuthorBlockArgs {
    /// The slot to author for; defaults to the next slot.
    #[clap(long)]
    pub slot: Option<u32>,

    /// The dev validator index to author as; by default every validator
    /// is tried until one owns the slot.
    #[clap(long)]
    pub validator: Option<u16>,

    /// Encoded blocks to import before authoring.
    #[clap(long)]
    pub import: Vec<PathBuf>,

    /// Where to write the encoded block.
    #[clap(long, short)]
    pub out: PathBuf,

    #[clap(flatten)]
    pub spec: SpecArgs,
}

/// Runs `author-block`.
pub async fn run(mut context: Context, args: AuthorBlockArgs) -> Result<(), CliError> {
    context.import_chain(&args.import).await?;

    let slot = args.slot.unwrap_or(context.service.current().the_time + 1);
    let ring_root = context.service.current().safrole.epoch_root;
    let candidates: Vec<u16> = match args.validator {
        Some(index) => vec![index],
        None => (0..context.spec.num_validators).collect(),
    };

    let mut block = None;
    for index in candidates {
        let keys = context
            .validators
            .get(index as usize)
            .ok_or_else(|| CliError::Config(format!("no dev validator {index}")))?;
        let signer = DevSigner::new(keys.bandersnatch, ring_root);
        match context
            .author
            .author_block(&context.service, &signer, slot, Extrinsic::default())
            .await
        {
            Ok(authored) => {
                info!(target: "cli", slot, author = index, "block authored");
                block = Some(authored);
                break;
            }
            Err(AuthorError::NotOurSlot(_)) => continue,
            Err(error) => return Err(CliError::validation(error)),
        }
    }
    let Some(block) = block else {
        return Err(CliError::Validation(format!(
            "no candidate validator owns slot {slot}"
        )));
    };

    std::fs::write(&args.out, block.encode())
        .map_err(|e| CliError::Io(format!("{}: {e}", args.out.display())))?;
    println!("{} {}", slot, args.out.display());
    Ok(())
}
