// ============================================================
// Layer 6 — Run Store
// ============================================================
// Everything a run leaves behind lives in one output directory:
//
//   outpath/
//     run_config.json        ← effective configuration
//     features.safetensors   ← pooled embeddings + targets per split
//     report.json            ← accuracies and weight-load report
//     metrics.csv            ← appended by MetricsLogger
//
// Saving the features means the downstream classifiers can be
// refitted without running the encoder again.

use anyhow::{Context, Result};
use safetensors::{tensor::TensorView, Dtype};
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::ml::extractor::FeatureMatrix;

pub struct RunStore {
    dir: PathBuf,
}

impl RunStore {
    /// Open the output directory, creating it (and parents) if absent.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create output directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save_json<T: Serialize>(&self, name: &str, value: &T) -> Result<PathBuf> {
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::debug!("Wrote '{}'", path.display());
        Ok(path)
    }

    /// Store each split's embeddings as `{split}_emb` [n, dim] (F32) and
    /// `{split}_target` [n] (I64).
    pub fn save_features(&self, splits: &[(&str, &FeatureMatrix)]) -> Result<PathBuf> {
        let path = self.dir.join("features.safetensors");

        let mut buffers: Vec<(String, Dtype, Vec<usize>, Vec<u8>)> = Vec::new();
        for (split, m) in splits {
            let emb: Vec<u8> = m.rows.iter().flatten().flat_map(|v| v.to_le_bytes()).collect();
            buffers.push((format!("{split}_emb"), Dtype::F32, vec![m.rows.len(), m.dim], emb));

            let target: Vec<u8> = m.targets.iter().flat_map(|&t| (t as i64).to_le_bytes()).collect();
            buffers.push((format!("{split}_target"), Dtype::I64, vec![m.targets.len()], target));
        }

        let views = buffers
            .iter()
            .map(|(name, dtype, shape, bytes)| {
                TensorView::new(*dtype, shape.clone(), bytes).map(|v| (name.clone(), v))
            })
            .collect::<Result<Vec<_>, _>>()
            .context("Cannot build feature tensors")?;

        safetensors::serialize_to_file(views, &None, &path)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;

        tracing::info!("Saved features to '{}'", path.display());
        Ok(path)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use safetensors::SafeTensors;
    use tempfile::TempDir;

    #[test]
    fn test_creates_nested_dir_and_writes_json() {
        let tmp   = TempDir::new().unwrap();
        let store = RunStore::create(tmp.path().join("a/b")).unwrap();
        assert!(store.dir().is_dir());

        let path = store.save_json("x.json", &vec![1, 2, 3]).unwrap();
        let back: Vec<i32> = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(back, vec![1, 2, 3]);
    }

    #[test]
    fn test_feature_file_layout() {
        let tmp   = TempDir::new().unwrap();
        let store = RunStore::create(tmp.path()).unwrap();
        let m = FeatureMatrix {
            rows:    vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]],
            targets: vec![0, 1],
            dim:     3,
        };

        let path  = store.save_features(&[("train", &m)]).unwrap();
        let bytes = fs::read(path).unwrap();
        let st    = SafeTensors::deserialize(&bytes).unwrap();

        assert_eq!(st.tensor("train_emb").unwrap().shape(), &[2, 3]);
        assert_eq!(st.tensor("train_target").unwrap().dtype(), Dtype::I64);
    }
}
