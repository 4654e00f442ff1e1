// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `run`      — encoder embeddings + SVM, with the baseline
//   2. `baseline` — TF-IDF + SVM only
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{BaselineArgs, Commands, RunArgs};

use crate::application::config::{BackendKind, RunConfig};

#[derive(Parser, Debug)]
#[command(
    name = "lm-embed-classify",
    version = "0.1.0",
    about = "Classify documents with frozen language-model embeddings and a linear SVM."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Run(args)      => run_classify(args),
            Commands::Baseline(args) => run_baseline(args),
        }
    }
}

fn run_classify(args: RunArgs) -> Result<()> {
    use crate::application::classify_use_case::ClassifyUseCase;
    use burn::backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, NdArray, Wgpu};

    let config: RunConfig = args.into();
    tracing::info!("Running on the {:?} backend, writing to '{}'", config.backend, config.outpath);

    let backend  = config.backend;
    let use_case = ClassifyUseCase::new(config);
    let report   = match backend {
        BackendKind::Wgpu    => use_case.execute::<Wgpu>(WgpuDevice::default())?,
        BackendKind::Ndarray => use_case.execute::<NdArray>(NdArrayDevice::Cpu)?,
    };

    println!("Classes:            {}", report.classes.join(", "));
    println!("Train / valid:      {} / {}", report.train_size, report.valid_size);
    println!("Embedding accuracy: {:.4}", report.embedding_accuracy);
    if let Some(acc) = report.baseline_accuracy {
        println!("TF-IDF accuracy:    {:.4}", acc);
    }
    Ok(())
}

fn run_baseline(args: BaselineArgs) -> Result<()> {
    use crate::application::baseline_use_case::BaselineUseCase;

    let report = BaselineUseCase::new(args.into()).execute()?;

    println!("Train / valid:   {} / {}", report.train_size, report.valid_size);
    println!("Vocabulary:      {}", report.vocab_size);
    println!("TF-IDF accuracy: {:.4}", report.accuracy);
    Ok(())
}
