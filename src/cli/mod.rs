// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`  — adversarial MaskGAN training on .txt files
//   2. `infill` — regenerate the last words of a text
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, InfillArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "mask-gan",
    version = "0.1.0",
    about = "Train a MaskGAN text infilling model on .txt files, then fill in missing words."
)]
pub struct Cli {
    /// The subcommand to run (train or infill)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route to the matching use case; nothing is computed here.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)  => run_train(args),
            Commands::Infill(args) => run_infill(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on corpus in: {}", args.corpus_dir);

    // Convert CLI args → application config
    let use_case = TrainUseCase::new(args.into());
    use_case.execute()?;

    println!("Training complete. Checkpoint saved.");
    Ok(())
}

fn run_infill(args: InfillArgs) -> Result<()> {
    use crate::application::infill_use_case::InfillUseCase;

    let mut use_case = InfillUseCase::new(&args.checkpoint_dir)?;
    let infill       = use_case.infill(&args.text, args.hide_last)?;

    println!("\n{} [{}]", infill.context, infill.completion);
    Ok(())
}
