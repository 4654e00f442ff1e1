// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends one CSV row per evaluated model so repeated runs (e.g.
// sweeping --train-size) build up a single comparison table.
//
// Output file: {outpath}/metrics.csv
//
//   model,train_size,valid_size,n_class,accuracy
//   lm_embedding_svm,500,7600,4,0.861316
//   tfidf_svm,500,7600,4,0.792105

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

/// Evaluation of one downstream classifier on the validation split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalMetrics {
    /// Which model produced the predictions
    pub model: String,

    pub train_size: usize,
    pub valid_size: usize,
    pub n_class:    usize,

    /// Exact-match accuracy in [0.0, 1.0]
    pub accuracy: f64,
}

impl EvalMetrics {
    pub fn new(
        model:      impl Into<String>,
        train_size: usize,
        valid_size: usize,
        n_class:    usize,
        accuracy:   f64,
    ) -> Self {
        Self { model: model.into(), train_size, valid_size, n_class, accuracy }
    }

    /// Absolute accuracy difference over another model's result
    pub fn gain_over(&self, other: &EvalMetrics) -> f64 {
        self.accuracy - other.accuracy
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "model,train_size,valid_size,n_class,accuracy")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EvalMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)?;

        writeln!(
            f,
            "{},{},{},{},{:.6}",
            m.model, m.train_size, m.valid_size, m.n_class, m.accuracy,
        )?;

        tracing::debug!("Logged {} accuracy={:.4}", m.model, m.accuracy);
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_gain_over() {
        let a = EvalMetrics::new("a", 10, 10, 2, 0.9);
        let b = EvalMetrics::new("b", 10, 10, 2, 0.75);
        assert!((a.gain_over(&b) - 0.15).abs() < 1e-12);
    }

    #[test]
    fn test_rows_are_appended_under_one_header() {
        let dir = TempDir::new().unwrap();
        MetricsLogger::new(dir.path()).unwrap()
            .log(&EvalMetrics::new("svm", 5, 3, 2, 0.5)).unwrap();
        let logger = MetricsLogger::new(dir.path()).unwrap();
        logger.log(&EvalMetrics::new("tfidf", 5, 3, 2, 1.0)).unwrap();

        let text  = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "model,train_size,valid_size,n_class,accuracy");
        assert_eq!(lines[2], "tfidf,5,3,2,1.000000");
    }
}
