// ============================================================
// Layer 6 — Pretrained Weight Blob
// ============================================================
// The fine-tuned language model is shipped as a safetensors file:
// a flat map from parameter name to F32 tensor, named after the
// PyTorch state dict it was exported from.
//
// Loading is NON-STRICT:
//   - names the model asks for but the blob lacks  → "missing"
//   - names present with a different shape         → "mismatched"
//   - names in the blob the model never asks for   → "unused"
// None of these abort the run; the model keeps its random init for
// anything it could not take, and the LoadReport records it all.
//
// Language-model decoder entries ("decoder.") are dropped before
// loading. The classifier has no decoder, and the tied decoder
// weight would otherwise show up as a large "unused" tensor.

use anyhow::{bail, Context, Result};
use burn::prelude::*;
use safetensors::{Dtype, SafeTensors};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::Path,
};

/// Embedding matrix whose first dimension is the vocabulary size.
pub const EMBEDDING_KEY: &str = "encoder.encoder.weight";

#[derive(Debug, Clone, PartialEq)]
pub struct NamedTensor {
    pub shape: Vec<usize>,
    pub data:  Vec<f32>,
}

#[derive(Debug, Clone, Default)]
pub struct WeightsBlob {
    tensors: BTreeMap<String, NamedTensor>,
}

impl WeightsBlob {
    pub fn new(tensors: BTreeMap<String, NamedTensor>) -> Self {
        Self { tensors }
    }

    /// Read every F32 tensor from a safetensors file.
    /// Tensors of other dtypes are skipped with a warning.
    pub fn from_safetensors(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .with_context(|| format!("Cannot read weights file '{}'", path.display()))?;
        let st = SafeTensors::deserialize(&bytes)
            .with_context(|| format!("Cannot parse '{}' as safetensors", path.display()))?;

        let mut tensors = BTreeMap::new();
        for (name, view) in st.tensors() {
            if view.dtype() != Dtype::F32 {
                tracing::warn!("Skipping '{}': dtype {:?} is not F32", name, view.dtype());
                continue;
            }
            let data: Vec<f32> = view
                .data()
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect();
            tensors.insert(name, NamedTensor { shape: view.shape().to_vec(), data });
        }

        tracing::info!("Loaded {} tensors from '{}'", tensors.len(), path.display());
        Ok(Self { tensors })
    }

    /// Remove every entry whose name contains `pattern`; returns how many went.
    pub fn drop_matching(&mut self, pattern: &str) -> usize {
        let before = self.tensors.len();
        self.tensors.retain(|name, _| !name.contains(pattern));
        let dropped = before - self.tensors.len();
        tracing::debug!("Dropped {} '{}' tensors", dropped, pattern);
        dropped
    }

    pub fn get(&self, name: &str) -> Option<&NamedTensor> {
        self.tensors.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tensors.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// Vocabulary size = rows of the token embedding matrix.
    pub fn vocab_size(&self) -> Result<usize> {
        match self.get(EMBEDDING_KEY) {
            Some(t) if t.shape.len() == 2 => Ok(t.shape[0]),
            Some(t) => bail!("'{EMBEDDING_KEY}' has shape {:?}, expected 2 dimensions", t.shape),
            None    => bail!("weights have no '{EMBEDDING_KEY}' entry to size the vocabulary"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeMismatch {
    pub name:     String,
    pub expected: Vec<usize>,
    pub found:    Vec<usize>,
}

/// Outcome of a non-strict load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadReport {
    pub applied:    Vec<String>,
    pub missing:    Vec<String>,
    pub mismatched: Vec<ShapeMismatch>,
    pub unused:     Vec<String>,
}

impl LoadReport {
    pub fn log_summary(&self) {
        tracing::info!(
            "Weights: {} applied, {} missing, {} shape-mismatched, {} unused",
            self.applied.len(),
            self.missing.len(),
            self.mismatched.len(),
            self.unused.len(),
        );
        for m in &self.mismatched {
            tracing::warn!("Kept init for '{}': expected {:?}, found {:?}", m.name, m.expected, m.found);
        }
        for name in &self.missing {
            tracing::warn!("No pretrained value for '{}'", name);
        }
    }
}

/// Hands tensors out of a blob by name and keeps score.
pub struct WeightLoader<'a> {
    blob:   &'a WeightsBlob,
    used:   BTreeSet<String>,
    report: LoadReport,
}

impl<'a> WeightLoader<'a> {
    pub fn new(blob: &'a WeightsBlob) -> Self {
        Self { blob, used: BTreeSet::new(), report: LoadReport::default() }
    }

    /// First of `names` present in the blob with exactly `expected` shape.
    /// The first candidate name is reported when none is present.
    pub fn take(&mut self, names: &[String], expected: &[usize]) -> Option<Vec<f32>> {
        let Some((name, tensor)) = names
            .iter()
            .find_map(|n| self.blob.get(n).map(|t| (n, t)))
        else {
            if let Some(first) = names.first() {
                self.report.missing.push(first.clone());
            }
            return None;
        };

        self.used.insert(name.clone());
        if tensor.shape != expected {
            self.report.mismatched.push(ShapeMismatch {
                name:     name.clone(),
                expected: expected.to_vec(),
                found:    tensor.shape.clone(),
            });
            return None;
        }

        self.report.applied.push(name.clone());
        Some(tensor.data.clone())
    }

    /// Replacement for a 2-D parameter, shaped and placed like `current`.
    pub fn take_2d<B: Backend>(&mut self, names: &[String], current: Tensor<B, 2>) -> Option<Tensor<B, 2>> {
        let shape = current.dims();
        self.take(names, &shape)
            .map(|data| Tensor::from_data(TensorData::new(data, shape), &current.device()))
    }

    pub fn take_1d<B: Backend>(&mut self, names: &[String], current: Tensor<B, 1>) -> Option<Tensor<B, 1>> {
        let shape = current.dims();
        self.take(names, &shape)
            .map(|data| Tensor::from_data(TensorData::new(data, shape), &current.device()))
    }

    pub fn finish(mut self) -> LoadReport {
        self.report.unused = self
            .blob
            .names()
            .filter(|n| !self.used.contains(*n))
            .map(str::to_string)
            .collect();
        self.report
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use safetensors::tensor::TensorView;
    use tempfile::TempDir;

    fn blob(entries: &[(&str, Vec<usize>)]) -> WeightsBlob {
        WeightsBlob::new(
            entries
                .iter()
                .map(|(n, shape)| {
                    let len = shape.iter().product();
                    (n.to_string(), NamedTensor { shape: shape.clone(), data: vec![0.5; len] })
                })
                .collect(),
        )
    }

    #[test]
    fn test_drop_decoder_and_vocab_size() {
        let mut b = blob(&[
            ("encoder.encoder.weight", vec![7, 3]),
            ("decoder.weight", vec![7, 3]),
            ("decoder.bias", vec![7]),
        ]);
        assert_eq!(b.drop_matching("decoder."), 2);
        assert_eq!(b.len(), 1);
        assert_eq!(b.vocab_size().unwrap(), 7);
    }

    #[test]
    fn test_non_strict_take() {
        let b = blob(&[
            ("a", vec![2, 2]),
            ("b", vec![3]),
            ("extra", vec![1]),
        ]);
        let mut loader = WeightLoader::new(&b);

        assert!(loader.take(&["a".to_string()], &[2, 2]).is_some());
        assert!(loader.take(&["b".to_string()], &[4]).is_none());
        assert!(loader.take(&["zzz".to_string()], &[1]).is_none());

        let report = loader.finish();
        assert_eq!(report.applied, vec!["a"]);
        assert_eq!(report.mismatched.len(), 1);
        assert_eq!(report.mismatched[0].found, vec![3]);
        assert_eq!(report.missing, vec!["zzz"]);
        assert_eq!(report.unused, vec!["extra"]);
    }

    #[test]
    fn test_fallback_name_is_used() {
        let b = blob(&[("w_hh", vec![2])]);
        let mut loader = WeightLoader::new(&b);
        let got = loader.take(&["w_hh_raw".to_string(), "w_hh".to_string()], &[2]);
        assert_eq!(got, Some(vec![0.5, 0.5]));
        assert!(loader.finish().missing.is_empty());
    }

    #[test]
    fn test_take_2d_builds_tensor() {
        let b = blob(&[("w", vec![2, 3])]);
        let mut loader = WeightLoader::new(&b);
        let current: Tensor<NdArray, 2> = Tensor::zeros([2, 3], &Default::default());
        let t = loader.take_2d(&["w".to_string()], current).unwrap();
        assert_eq!(t.dims(), [2, 3]);
    }

    #[test]
    fn test_reads_safetensors_file() {
        let dir  = TempDir::new().unwrap();
        let path = dir.path().join("lm.safetensors");

        let values: Vec<f32> = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let bytes: Vec<u8>   = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let view = TensorView::new(Dtype::F32, vec![3, 2], &bytes).unwrap();
        safetensors::serialize_to_file(vec![(EMBEDDING_KEY, view)], &None, &path).unwrap();

        let b = WeightsBlob::from_safetensors(&path).unwrap();
        assert_eq!(b.vocab_size().unwrap(), 3);
        assert_eq!(b.get(EMBEDDING_KEY).unwrap().data, values);
    }
}
