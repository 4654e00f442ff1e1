// ============================================================
// Layer 4 — Ragged Document Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<DocItem> of
// DIFFERENT lengths into one [batch, seq_len] Int tensor.
//
// Documents are LEFT-padded with the pad token:
//
//   doc A:  [ 7  8  9 10]          →  [ 7  8  9 10]
//   doc B:  [ 3  4]                →  [ 1  1  3  4]
//
// so the final timestep of every row is a real token. The pooling
// step relies on this to take "last hidden state" from column -1,
// and uses `lengths` to ignore the padded prefix for max/mean.
//
// An empty document becomes a single pad token so every row has at
// least one timestep to pool over.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::DocItem;

/// A batch of documents ready for the encoder forward pass.
#[derive(Debug, Clone)]
pub struct DocBatch<B: Backend> {
    /// Left-padded token ids — shape: [batch_size, seq_len]
    pub tokens: Tensor<B, 2, Int>,

    /// Real (unpadded) length of each row, at least 1
    pub lengths: Vec<usize>,

    /// Class indices — shape: [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

#[derive(Clone, Debug)]
pub struct DocBatcher<B: Backend> {
    pub device:    B::Device,
    pub pad_token: u32,
}

impl<B: Backend> DocBatcher<B> {
    pub fn new(device: B::Device, pad_token: u32) -> Self {
        Self { device, pad_token }
    }
}

/// Left-pad ragged token lists into one row-major buffer.
/// Returns (flat ids, seq_len, per-row lengths).
pub fn pad_left(docs: &[&[u32]], pad_token: u32) -> (Vec<i64>, usize, Vec<usize>) {
    let lengths: Vec<usize> = docs.iter().map(|d| d.len().max(1)).collect();
    let seq_len = lengths.iter().copied().max().unwrap_or(1);

    let mut flat = Vec::with_capacity(docs.len() * seq_len);
    for (doc, &len) in docs.iter().zip(&lengths) {
        flat.extend(std::iter::repeat(i64::from(pad_token)).take(seq_len - len));
        if doc.is_empty() {
            flat.push(i64::from(pad_token));
        } else {
            flat.extend(doc.iter().map(|&t| i64::from(t)));
        }
    }
    (flat, seq_len, lengths)
}

impl<B: Backend> Batcher<DocItem, DocBatch<B>> for DocBatcher<B> {
    fn batch(&self, items: Vec<DocItem>) -> DocBatch<B> {
        let batch_size = items.len();
        let docs: Vec<&[u32]> = items.iter().map(|i| i.tokens.as_slice()).collect();
        let (flat, seq_len, lengths) = pad_left(&docs, self.pad_token);

        let tokens = Tensor::<B, 2, Int>::from_data(
            TensorData::new(flat, [batch_size, seq_len]),
            &self.device,
        );

        let targets: Vec<i64> = items.iter().map(|i| i.target as i64).collect();
        let targets = Tensor::<B, 1, Int>::from_data(
            TensorData::new(targets, [batch_size]),
            &self.device,
        );

        DocBatch { tokens, lengths, targets }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_pad_left_layout() {
        let a = [7u32, 8, 9, 10];
        let b = [3u32, 4];
        let (flat, seq_len, lengths) = pad_left(&[&a, &b], 1);

        assert_eq!(seq_len, 4);
        assert_eq!(lengths, vec![4, 2]);
        assert_eq!(flat, vec![7, 8, 9, 10, 1, 1, 3, 4]);
    }

    #[test]
    fn test_empty_doc_becomes_one_pad() {
        let e: [u32; 0] = [];
        let (flat, seq_len, lengths) = pad_left(&[&e], 1);
        assert_eq!(seq_len, 1);
        assert_eq!(lengths, vec![1]);
        assert_eq!(flat, vec![1]);
    }

    #[test]
    fn test_large_ids_are_not_wrapped() {
        let big = [3_000_000_000u32];
        let (flat, _, _) = pad_left(&[&big], 1);
        assert_eq!(flat, vec![3_000_000_000i64]);
    }

    #[test]
    fn test_batch_shapes() {
        let device  = Default::default();
        let batcher = DocBatcher::<NdArray>::new(device, 1);
        let batch   = batcher.batch(vec![
            DocItem { tokens: vec![5, 6, 7], target: 0 },
            DocItem { tokens: vec![9],       target: 2 },
        ]);

        assert_eq!(batch.tokens.dims(), [2, 3]);
        assert_eq!(batch.targets.dims(), [2]);
        assert_eq!(batch.lengths, vec![3, 1]);

        let ids: Vec<i64> = batch
            .tokens
            .into_data()
            .convert::<i64>()
            .to_vec::<i64>()
            .unwrap();
        assert_eq!(ids, vec![5, 6, 7, 1, 1, 9]);
    }
}
