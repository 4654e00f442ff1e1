// ============================================================
// Layer 2 — Run Configuration
// ============================================================
// Everything a run needs, in one serialisable struct.
// Saved as run_config.json next to the results so any number in
// report.json can be traced back to the settings that produced it.

use serde::{Deserialize, Serialize};

use crate::data::loader::ColumnNames;
use crate::ml::model::EncoderConfig;

/// Which Burn backend runs the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Wgpu,
    Ndarray,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub lm_weights_path: String,
    pub df_path:         String,
    pub doc_path:        String,
    pub outpath:         String,

    pub seed:       u64,
    /// None or 0 keeps the whole split
    pub train_size: Option<usize>,
    pub valid_size: Option<usize>,

    pub train_flag_col: String,
    pub label_col:      String,
    pub text_col:       String,

    pub batch_size: usize,
    pub emb_sz:     usize,
    pub n_hid:      usize,
    pub n_layers:   usize,
    pub bptt:       usize,
    pub max_seq:    usize,
    pub pad_token:  u32,

    pub svm_c:         f64,
    pub baseline_c:    f64,
    pub max_features:  Option<usize>,
    pub skip_baseline: bool,

    pub backend: BackendKind,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            lm_weights_path: "lm_weights.safetensors".to_string(),
            df_path:         "metadata.tsv".to_string(),
            doc_path:        "docs.jsonl".to_string(),
            outpath:         "results".to_string(),
            seed:            123,
            train_size:      Some(500),
            valid_size:      None,
            train_flag_col:  "cl_train".to_string(),
            label_col:       "label".to_string(),
            text_col:        "text".to_string(),
            batch_size:      48,
            emb_sz:          400,
            n_hid:           1150,
            n_layers:        3,
            bptt:            70,
            max_seq:         20 * 70,
            pad_token:       1,
            svm_c:           0.1,
            baseline_c:      1000.0,
            max_features:    Some(30_000),
            skip_baseline:   false,
            backend:         BackendKind::Wgpu,
        }
    }
}

impl RunConfig {
    pub fn columns(&self) -> ColumnNames {
        ColumnNames {
            train_flag: self.train_flag_col.clone(),
            label:      self.label_col.clone(),
            text:       self.text_col.clone(),
        }
    }

    /// Training batches are half the size of validation batches.
    pub fn train_batch_size(&self) -> usize {
        (self.batch_size / 2).max(1)
    }

    pub fn encoder_config(&self, n_tok: usize) -> EncoderConfig {
        EncoderConfig::new(n_tok)
            .with_emb_sz(self.emb_sz)
            .with_n_hid(self.n_hid)
            .with_n_layers(self.n_layers)
            .with_bptt(self.bptt)
            .with_max_seq(self.max_seq)
            .with_pad_token(self.pad_token as usize)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = RunConfig::default();
        assert_eq!(cfg.seed, 123);
        assert_eq!(cfg.train_batch_size(), 24);
        assert_eq!(cfg.max_seq, 1400);
        assert_eq!(cfg.encoder_config(100).pooled_dim(), 1200);
    }

    #[test]
    fn test_json_roundtrip_keeps_backend_name() {
        let cfg  = RunConfig { backend: BackendKind::Ndarray, ..RunConfig::default() };
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(json.contains("\"backend\":\"ndarray\""));

        let back: RunConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.backend, BackendKind::Ndarray);
        assert_eq!(back.train_size, Some(500));
    }
}
