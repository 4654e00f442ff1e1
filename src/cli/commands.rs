// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `run` and `baseline`
// and all their configurable flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};

use crate::application::config::{BackendKind, RunConfig};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Embed documents with the pretrained encoder and fit a linear SVM
    Run(RunArgs),

    /// Fit only the TF-IDF + linear SVM baseline on the raw text
    Baseline(BaselineArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum Backend {
    /// GPU through wgpu
    Wgpu,
    /// CPU through ndarray
    Ndarray,
}

impl From<Backend> for BackendKind {
    fn from(b: Backend) -> Self {
        match b {
            Backend::Wgpu    => BackendKind::Wgpu,
            Backend::Ndarray => BackendKind::Ndarray,
        }
    }
}

/// Input files, sampling and column names shared by both commands.
#[derive(Args, Debug)]
pub struct DataArgs {
    /// Tab-separated metadata with train flag, label and text columns
    #[arg(long)]
    pub df_path: String,

    /// Output directory for config, features, report and metrics
    #[arg(long, default_value = "results")]
    pub outpath: String,

    #[arg(long, default_value_t = 123)]
    pub seed: u64,

    /// Training records to keep (0 = all)
    #[arg(long, default_value_t = 500)]
    pub train_size: usize,

    /// Validation records to keep (default: all)
    #[arg(long)]
    pub valid_size: Option<usize>,

    #[arg(long, default_value = "cl_train")]
    pub train_flag_col: String,

    #[arg(long, default_value = "label")]
    pub label_col: String,

    #[arg(long, default_value = "text")]
    pub text_col: String,

    /// Inverse regularisation of the TF-IDF SVM
    #[arg(long, default_value_t = 1000.0)]
    pub baseline_c: f64,

    /// Vocabulary cap of the TF-IDF vectorizer (0 = uncapped)
    #[arg(long, default_value_t = 30_000)]
    pub max_features: usize,
}

/// All arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Pretrained language-model weights (safetensors)
    #[arg(long)]
    pub lm_weights_path: String,

    /// One JSON array of token ids per line, aligned with the metadata rows
    #[arg(long)]
    pub doc_path: String,

    #[command(flatten)]
    pub data: DataArgs,

    /// Validation batch size; training uses half of it
    #[arg(long, default_value_t = 48)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 400)]
    pub emb_sz: usize,

    #[arg(long, default_value_t = 1150)]
    pub n_hid: usize,

    #[arg(long, default_value_t = 3)]
    pub n_layers: usize,

    /// Timesteps per recurrent chunk
    #[arg(long, default_value_t = 70)]
    pub bptt: usize,

    /// Only the last `max_seq` timesteps reach the pooling
    #[arg(long, default_value_t = 1400)]
    pub max_seq: usize,

    #[arg(long, default_value_t = 1)]
    pub pad_token: u32,

    /// Inverse regularisation of the embedding SVM
    #[arg(long, default_value_t = 0.1)]
    pub svm_c: f64,

    #[arg(long)]
    pub skip_baseline: bool,

    #[arg(long, value_enum, default_value_t = Backend::Wgpu)]
    pub backend: Backend,
}

/// All arguments for the `baseline` command.
#[derive(Args, Debug)]
pub struct BaselineArgs {
    #[command(flatten)]
    pub data: DataArgs,
}

impl DataArgs {
    fn apply(self, cfg: RunConfig) -> RunConfig {
        RunConfig {
            df_path:        self.df_path,
            outpath:        self.outpath,
            seed:           self.seed,
            train_size:     Some(self.train_size).filter(|&n| n > 0),
            valid_size:     self.valid_size,
            train_flag_col: self.train_flag_col,
            label_col:      self.label_col,
            text_col:       self.text_col,
            baseline_c:     self.baseline_c,
            max_features:   Some(self.max_features).filter(|&n| n > 0),
            ..cfg
        }
    }
}

/// Convert CLI RunArgs into the application-layer RunConfig.
/// The application layer never sees clap types.
impl From<RunArgs> for RunConfig {
    fn from(a: RunArgs) -> Self {
        let base = RunConfig {
            lm_weights_path: a.lm_weights_path,
            doc_path:        a.doc_path,
            batch_size:      a.batch_size,
            emb_sz:          a.emb_sz,
            n_hid:           a.n_hid,
            n_layers:        a.n_layers,
            bptt:            a.bptt,
            max_seq:         a.max_seq,
            pad_token:       a.pad_token,
            svm_c:           a.svm_c,
            skip_baseline:   a.skip_baseline,
            backend:         a.backend.into(),
            ..RunConfig::default()
        };
        a.data.apply(base)
    }
}

impl From<BaselineArgs> for RunConfig {
    fn from(a: BaselineArgs) -> Self {
        a.data.apply(RunConfig::default())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use crate::cli::Cli;
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Commands {
        Cli::try_parse_from(args).unwrap().command
    }

    #[test]
    fn test_run_defaults() {
        let cmd = parse(&[
            "lm-embed-classify", "run",
            "--lm-weights-path", "lm.safetensors",
            "--df-path", "meta.tsv",
            "--doc-path", "docs.jsonl",
        ]);
        let Commands::Run(args) = cmd else { panic!("expected run") };
        let cfg: RunConfig = args.into();

        assert_eq!(cfg.seed, 123);
        assert_eq!(cfg.train_size, Some(500));
        assert_eq!(cfg.valid_size, None);
        assert_eq!(cfg.svm_c, 0.1);
        assert_eq!(cfg.baseline_c, 1000.0);
        assert_eq!(cfg.backend, BackendKind::Wgpu);
        assert_eq!(cfg.doc_path, "docs.jsonl");
    }

    #[test]
    fn test_zero_train_size_means_all() {
        let cmd = parse(&[
            "lm-embed-classify", "baseline",
            "--df-path", "meta.tsv",
            "--train-size", "0",
            "--max-features", "0",
        ]);
        let Commands::Baseline(args) = cmd else { panic!("expected baseline") };
        let cfg: RunConfig = args.into();
        assert_eq!(cfg.train_size, None);
        assert_eq!(cfg.max_features, None);
    }

    #[test]
    fn test_backend_flag() {
        let cmd = parse(&[
            "lm-embed-classify", "run",
            "--lm-weights-path", "w", "--df-path", "d", "--doc-path", "t",
            "--backend", "ndarray", "--skip-baseline",
        ]);
        let Commands::Run(args) = cmd else { panic!("expected run") };
        let cfg: RunConfig = args.into();
        assert_eq!(cfg.backend, BackendKind::Ndarray);
        assert!(cfg.skip_baseline);
    }
}
