// ============================================================
// Layer 2 — Baseline Use Case
// ============================================================
// Bag-of-n-grams reference point for the encoder embeddings:
//
//   Step 1: Read the metadata TSV          (Layer 4 - data)
//   Step 2: Prepare the splits             (Layer 2 - prepare)
//   Step 3: Fit TF-IDF on training text    (Layer 5 - ml)
//   Step 4: Fit and score a linear SVM     (Layer 5 - ml)
//   Step 5: Log metrics and report         (Layer 6 - infra)
//
// No pretrained weights or token arrays are read here.

use anyhow::Result;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::application::{
    config::RunConfig,
    prepare::{prepare_corpus, Split},
};
use crate::data::loader::read_metadata;
use crate::domain::{example::Example, traits::Classifier};
use crate::infra::{
    metrics::{EvalMetrics, MetricsLogger},
    run_store::RunStore,
};
use crate::ml::{
    svm::{LinearSvc, LinearSvcConfig},
    tfidf::{TfidfConfig, TfidfVectorizer},
};

pub const BASELINE_MODEL: &str = "tfidf_svm";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineReport {
    pub train_size: usize,
    pub valid_size: usize,
    pub n_class:    usize,
    pub vocab_size: usize,
    pub accuracy:   f64,
}

/// Fit TF-IDF + linear SVM on `train` and score it on `valid`.
pub fn score_tfidf_baseline(
    train:        &Split,
    valid:        &Split,
    c:            f64,
    max_features: Option<usize>,
    seed:         u64,
) -> Result<(f64, usize)> {
    let vectorizer = TfidfVectorizer::new(TfidfConfig { max_features, ..TfidfConfig::default() })?;
    let fitted     = vectorizer.fit(&train.texts());

    let x_train = fitted.transform(&train.texts());
    let x_valid = fitted.transform(&valid.texts());

    let svm_cfg = LinearSvcConfig::default().with_c(c).with_seed(seed);
    let svm     = LinearSvc::fit(&svm_cfg, &x_train, &train.targets, fitted.vocab_len())?;
    let acc     = svm.score(&x_valid, &valid.targets);

    tracing::info!("TF-IDF baseline accuracy: {:.4}", acc);
    Ok((acc, fitted.vocab_len()))
}

pub struct BaselineUseCase {
    config: RunConfig,
}

impl BaselineUseCase {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<BaselineReport> {
        let cfg = &self.config;
        let mut rng = StdRng::seed_from_u64(cfg.seed);

        let store = RunStore::create(&cfg.outpath)?;
        store.save_json("run_config.json", cfg)?;

        // ── Step 1: Metadata only ─────────────────────────────────────────────
        tracing::info!("Loading metadata from '{}'", cfg.df_path);
        let examples: Vec<Example> = read_metadata(Path::new(&cfg.df_path), &cfg.columns())?
            .into_iter()
            .map(|r| Example::new(Vec::new(), r.text, r.label, r.is_train))
            .collect();

        // ── Step 2: Splits ────────────────────────────────────────────────────
        let prepared = prepare_corpus(
            examples,
            cfg.train_size,
            cfg.valid_size,
            cfg.train_batch_size(),
            &mut rng,
        )?;

        // ── Steps 3-4: Fit and score ──────────────────────────────────────────
        let (accuracy, vocab_size) = score_tfidf_baseline(
            &prepared.train,
            &prepared.valid,
            cfg.baseline_c,
            cfg.max_features,
            cfg.seed,
        )?;

        // ── Step 5: Record ────────────────────────────────────────────────────
        let report = BaselineReport {
            train_size: prepared.train.len(),
            valid_size: prepared.valid.len(),
            n_class:    prepared.labels.n_class(),
            vocab_size,
            accuracy,
        };
        MetricsLogger::new(store.dir())?.log(&EvalMetrics::new(
            BASELINE_MODEL,
            report.train_size,
            report.valid_size,
            report.n_class,
            accuracy,
        ))?;
        store.save_json("report.json", &report)?;

        Ok(report)
    }
}
