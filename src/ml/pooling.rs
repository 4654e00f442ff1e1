// ============================================================
// Layer 5 — Concat Pooling
// ============================================================
// Reduces per-timestep hidden states [batch, time, d] to one
// fixed-length vector per document:
//
//   [ h_last  ‖  max_t h_t  ‖  mean_t h_t ]   → [batch, 3 * d]
//
// Inputs are left-padded, so h_last is always a real token. Max
// and mean only see the real positions: pad slots get a large
// negative offset before the max and a zero weight in the mean.

use burn::prelude::*;

const PAD_PENALTY: f32 = 1.0e9;

/// Real tokens of each row that fall inside the retained window.
///
/// `padded_len` is the full padded sequence length and `offset` the
/// first retained timestep; rows are left-padded so their real tokens
/// occupy the tail of the window.
pub fn window_lengths(lengths: &[usize], padded_len: usize, offset: usize) -> Vec<usize> {
    let window = padded_len.saturating_sub(offset).max(1);
    lengths.iter().map(|&l| l.clamp(1, window)).collect()
}

/// hidden: [batch, window, d] → [batch, 3 * d]
pub fn concat_pool<B: Backend>(
    hidden:     Tensor<B, 3>,
    lengths:    &[usize],
    padded_len: usize,
    offset:     usize,
) -> Tensor<B, 2> {
    let [batch, window, d] = hidden.dims();
    let device = hidden.device();
    let real   = window_lengths(lengths, padded_len, offset);

    let mask: Vec<f32> = real
        .iter()
        .flat_map(|&n| (0..window).map(move |t| if t + n >= window { 1.0 } else { 0.0 }))
        .collect();
    let mask = Tensor::<B, 3>::from_data(TensorData::new(mask, [batch, window, 1]), &device);

    let counts: Vec<f32> = real.iter().map(|&n| n as f32).collect();
    let counts = Tensor::<B, 2>::from_data(TensorData::new(counts, [batch, 1]), &device);

    let last = hidden
        .clone()
        .slice([0..batch, window - 1..window, 0..d])
        .reshape([batch, d]);

    let penalty = mask.clone().sub_scalar(1.0).mul_scalar(PAD_PENALTY);
    let max = (hidden.clone() + penalty).max_dim(1).reshape([batch, d]);

    let mean = (hidden * mask).sum_dim(1).reshape([batch, d]) / counts;

    Tensor::cat(vec![last, max, mean], 1)
}
