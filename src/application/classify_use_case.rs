// ============================================================
// Layer 2 — ClassifyUseCase
// ============================================================
// Orchestrates the full embedding-classification run in order:
//
//   Step 1: Seed and save config              (Layer 6 - infra)
//   Step 2: Load corpus and prepare splits    (Layer 4 - data)
//   Step 3: Load pretrained weights           (Layer 6 - infra)
//   Step 4: Build model, load, freeze         (Layer 5 - ml)
//   Step 5: Warm up and extract embeddings    (Layer 5 - ml)
//   Step 6: Fit and score the embedding SVM   (Layer 5 - ml)
//   Step 7: TF-IDF baseline (optional)        (Layer 2 - baseline)
//   Step 8: Log metrics and write the report  (Layer 6 - infra)
//
// Generic over the Burn backend; the CLI picks wgpu or ndarray.

use anyhow::{ensure, Context, Result};
use burn::prelude::*;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::application::{
    baseline_use_case::{score_tfidf_baseline, BASELINE_MODEL},
    config::RunConfig,
    prepare::prepare_corpus,
};
use crate::data::{dataset::DocDataset, loader::TsvCorpusLoader};
use crate::domain::traits::{Classifier, CorpusSource};
use crate::infra::{
    metrics::{EvalMetrics, MetricsLogger},
    run_store::RunStore,
    weights::{LoadReport, WeightLoader, WeightsBlob},
};
use crate::ml::{
    extractor::FeatureExtractor,
    model::ClassifierConfig,
    svm::{LinearSvc, LinearSvcConfig},
};

pub const EMBEDDING_MODEL: &str = "lm_embedding_svm";

/// Written to report.json and returned to the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub train_size: usize,
    pub valid_size: usize,
    pub n_class:    usize,
    pub classes:    Vec<String>,

    pub embedding_accuracy: f64,
    /// None when the baseline was skipped
    pub baseline_accuracy:  Option<f64>,

    pub weights: LoadReport,
}

pub struct ClassifyUseCase {
    config: RunConfig,
}

impl ClassifyUseCase {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    pub fn execute<B: Backend>(&self, device: B::Device) -> Result<RunReport> {
        let cfg = &self.config;

        // ── Step 1: Seed everything once ──────────────────────────────────────
        B::seed(cfg.seed);
        let mut rng = StdRng::seed_from_u64(cfg.seed);

        let store = RunStore::create(&cfg.outpath)?;
        store.save_json("run_config.json", cfg)?;

        // ── Step 2: Corpus ────────────────────────────────────────────────────
        tracing::info!("Loading corpus from '{}' and '{}'", cfg.df_path, cfg.doc_path);
        let loader   = TsvCorpusLoader::new(&cfg.df_path, &cfg.doc_path, cfg.columns());
        let examples = loader.load_all()?;
        tracing::info!("Loaded {} records", examples.len());

        let prepared = prepare_corpus(
            examples,
            cfg.train_size,
            cfg.valid_size,
            cfg.train_batch_size(),
            &mut rng,
        )?;
        let n_class = prepared.labels.n_class();

        // ── Step 3: Pretrained weights, decoder removed ───────────────────────
        let mut blob = WeightsBlob::from_safetensors(Path::new(&cfg.lm_weights_path))
            .context("Cannot load pretrained language-model weights")?;
        blob.drop_matching("decoder.");
        ensure!(!blob.is_empty(), "'{}' holds no usable F32 tensors", cfg.lm_weights_path);
        let n_tok = blob.vocab_size()?;
        prepared.check_vocab(n_tok)?;

        // ── Step 4: Model ─────────────────────────────────────────────────────
        let model_cfg = ClassifierConfig::new(cfg.encoder_config(n_tok), n_class);
        tracing::info!(
            "Encoder: vocab {}, emb {}, hidden {}, {} layers",
            n_tok, cfg.emb_sz, cfg.n_hid, cfg.n_layers
        );

        let mut weight_loader = WeightLoader::new(&blob);
        let model = model_cfg
            .init::<B>(&device)
            .load_pretrained(&mut weight_loader)
            .freeze_encoder();
        let weights = weight_loader.finish();
        weights.log_summary();

        // ── Step 5: Embeddings ────────────────────────────────────────────────
        let extractor = FeatureExtractor::new(model.encoder, device, cfg.pad_token);

        let train_ds = DocDataset::from_parts(prepared.train.docs(), &prepared.train.targets);
        let valid_ds = DocDataset::from_parts(prepared.valid.docs(), &prepared.valid.targets);

        if !prepared.train.is_empty() {
            extractor.warm_up(train_ds.head(cfg.train_batch_size()))?;
        }
        let train_x = extractor.extract(train_ds, cfg.train_batch_size(), "train")?;
        let valid_x = extractor.extract(valid_ds, cfg.batch_size, "valid")?;
        ensure!(
            !train_x.is_empty() && !valid_x.is_empty(),
            "encoder produced no embeddings ({} train, {} valid)",
            train_x.len(),
            valid_x.len()
        );
        store.save_features(&[("train", &train_x), ("valid", &valid_x)])?;

        // ── Step 6: Embedding SVM ─────────────────────────────────────────────
        let svm_cfg = LinearSvcConfig::default().with_c(cfg.svm_c).with_seed(cfg.seed);
        let svm     = LinearSvc::fit(&svm_cfg, &train_x.rows, &train_x.targets, train_x.dim)?;
        let embedding_accuracy = svm.score(&valid_x.rows, &valid_x.targets);
        tracing::info!("Embedding SVM accuracy: {:.4}", embedding_accuracy);

        let metrics = MetricsLogger::new(store.dir())?;
        let record  = |model: &str, acc: f64| {
            EvalMetrics::new(model, prepared.train.len(), prepared.valid.len(), n_class, acc)
        };
        let embedding_metrics = record(EMBEDDING_MODEL, embedding_accuracy);
        metrics.log(&embedding_metrics)?;

        // ── Step 7: Baseline ──────────────────────────────────────────────────
        let baseline_accuracy = if cfg.skip_baseline {
            None
        } else {
            let (acc, _) = score_tfidf_baseline(
                &prepared.train,
                &prepared.valid,
                cfg.baseline_c,
                cfg.max_features,
                cfg.seed,
            )?;
            let baseline_metrics = record(BASELINE_MODEL, acc);
            metrics.log(&baseline_metrics)?;
            tracing::info!(
                "Embedding SVM vs TF-IDF: {:+.4}",
                embedding_metrics.gain_over(&baseline_metrics)
            );
            Some(acc)
        };

        // ── Step 8: Report ────────────────────────────────────────────────────
        tracing::info!("Appended accuracies to '{}'", metrics.csv_path().display());
        let report = RunReport {
            train_size: prepared.train.len(),
            valid_size: prepared.valid.len(),
            n_class,
            classes: prepared.labels.classes().to_vec(),
            embedding_accuracy,
            baseline_accuracy,
            weights,
        };
        store.save_json("report.json", &report)?;

        Ok(report)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::config::BackendKind;
    use burn::backend::NdArray;
    use safetensors::{tensor::TensorView, Dtype};
    use std::fs;
    use tempfile::TempDir;

    const N_TOK: usize  = 12;
    const EMB_SZ: usize = 4;

    fn write_inputs(dir: &Path) -> (String, String, String) {
        let mut tsv   = String::from("cl_train\tlabel\ttext\n");
        let mut jsonl = String::new();
        for i in 0..12usize {
            let (label, base) = if i % 2 == 0 { ("a", 2) } else { ("b", 7) };
            let tokens: Vec<usize> = (0..(i % 4) + 1).map(|k| base + k % 3).collect();
            tsv.push_str(&format!("{}\t{}\tword{} text{}\n", i < 8, label, base, i));
            jsonl.push_str(&serde_json::to_string(&tokens).unwrap());
            jsonl.push('\n');
        }
        let df  = dir.join("meta.tsv");
        let doc = dir.join("docs.jsonl");
        fs::write(&df, tsv).unwrap();
        fs::write(&doc, jsonl).unwrap();

        let emb: Vec<u8> = (0..N_TOK * EMB_SZ)
            .flat_map(|i| ((i % 5) as f32 * 0.1).to_le_bytes())
            .collect();
        let dec: Vec<u8> = vec![0u8; N_TOK * 4];
        let weights = dir.join("lm.safetensors");
        safetensors::serialize_to_file(
            vec![
                ("encoder.encoder.weight", TensorView::new(Dtype::F32, vec![N_TOK, EMB_SZ], &emb).unwrap()),
                ("decoder.bias", TensorView::new(Dtype::F32, vec![N_TOK], &dec).unwrap()),
            ],
            &None,
            &weights,
        )
        .unwrap();

        let s = |p: std::path::PathBuf| p.to_string_lossy().into_owned();
        (s(weights), s(df), s(doc))
    }

    #[test]
    fn test_full_run_on_ndarray() {
        let tmp = TempDir::new().unwrap();
        let (lm_weights_path, df_path, doc_path) = write_inputs(tmp.path());
        let out = tmp.path().join("out");

        let cfg = RunConfig {
            lm_weights_path,
            df_path,
            doc_path,
            outpath:    out.to_string_lossy().into_owned(),
            train_size: Some(6),
            batch_size: 4,
            emb_sz:     EMB_SZ,
            n_hid:      5,
            n_layers:   2,
            bptt:       2,
            max_seq:    4,
            backend:    BackendKind::Ndarray,
            ..RunConfig::default()
        };

        let report = ClassifyUseCase::new(cfg).execute::<NdArray>(Default::default()).unwrap();

        assert_eq!(report.train_size, 6);
        assert_eq!(report.valid_size, 4);
        assert_eq!(report.n_class, 2);
        assert!((0.0..=1.0).contains(&report.embedding_accuracy));
        assert!(report.baseline_accuracy.is_some());
        assert!(report.weights.applied.contains(&"encoder.encoder.weight".to_string()));
        assert!(report.weights.unused.is_empty());

        for name in ["run_config.json", "features.safetensors", "report.json", "metrics.csv"] {
            assert!(out.join(name).is_file(), "missing {name}");
        }
        let csv = fs::read_to_string(out.join("metrics.csv")).unwrap();
        assert_eq!(csv.lines().count(), 3);
    }

    #[test]
    fn test_token_beyond_vocabulary_fails_before_encoding() {
        let tmp = TempDir::new().unwrap();
        let (lm_weights_path, df_path, doc_path) = write_inputs(tmp.path());

        // first record gets an id past the 12-row embedding matrix
        let docs = fs::read_to_string(&doc_path).unwrap();
        let rest: Vec<&str> = docs.lines().skip(1).collect();
        fs::write(&doc_path, format!("[2, 3, 50]\n{}\n", rest.join("\n"))).unwrap();

        let cfg = RunConfig {
            lm_weights_path,
            df_path,
            doc_path,
            outpath:    tmp.path().join("out").to_string_lossy().into_owned(),
            train_size: None,
            emb_sz:     EMB_SZ,
            n_hid:      5,
            n_layers:   2,
            ..RunConfig::default()
        };

        let err = ClassifyUseCase::new(cfg).execute::<NdArray>(Default::default()).unwrap_err();
        let err = err.downcast::<crate::domain::error::ClassifyError>().unwrap();
        assert!(matches!(
            err,
            crate::domain::error::ClassifyError::TokenOutOfVocab { token: 50, n_tok: N_TOK }
        ));
    }

    #[test]
    fn test_missing_weights_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let (_, df_path, doc_path) = write_inputs(tmp.path());
        let cfg = RunConfig {
            lm_weights_path: tmp.path().join("nope.safetensors").to_string_lossy().into_owned(),
            df_path,
            doc_path,
            outpath: tmp.path().join("out").to_string_lossy().into_owned(),
            train_size: None,
            ..RunConfig::default()
        };
        assert!(ClassifyUseCase::new(cfg).execute::<NdArray>(Default::default()).is_err());
    }
}
