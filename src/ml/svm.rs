// ============================================================
// Layer 5 — Linear Support Vector Classifier
// ============================================================
// L2-regularised, squared-hinge linear SVM with an intercept:
//
//   min_w  ½‖w‖² + C Σ max(0, 1 − y_i (w·x_i + b))²
//
// solved in the dual by coordinate descent. Each step updates a
// single α_i in closed form and keeps w = Σ α_i y_i x_i in sync, so
// one pass costs O(nnz). The intercept is treated as an extra
// constant feature equal to 1.
//
// Multi-class: one-vs-rest; the class with the largest decision
// value wins. Two classes use a single binary problem.
//
// Rows are abstracted behind FeatureRow so the same solver serves
// dense encoder embeddings and sparse TF-IDF vectors.
//
// Reference: Hsieh et al. (2008) A Dual Coordinate Descent Method
//            for Large-scale Linear SVM

use anyhow::{ensure, Result};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::domain::traits::Classifier;

// ─── Feature rows ─────────────────────────────────────────────────────────────
pub trait FeatureRow {
    fn dot(&self, w: &[f64]) -> f64;
    /// w += a * x
    fn axpy(&self, a: f64, w: &mut [f64]);
    fn sq_norm(&self) -> f64;
}

impl FeatureRow for Vec<f32> {
    fn dot(&self, w: &[f64]) -> f64 {
        self.iter().zip(w).map(|(&x, &wi)| x as f64 * wi).sum()
    }

    fn axpy(&self, a: f64, w: &mut [f64]) {
        for (wi, &x) in w.iter_mut().zip(self) {
            *wi += a * x as f64;
        }
    }

    fn sq_norm(&self) -> f64 {
        self.iter().map(|&x| (x as f64) * (x as f64)).sum()
    }
}

/// Sparse row with strictly increasing column indices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseRow {
    pub indices: Vec<usize>,
    pub values:  Vec<f32>,
}

impl SparseRow {
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }
}

impl FeatureRow for SparseRow {
    fn dot(&self, w: &[f64]) -> f64 {
        self.indices
            .iter()
            .zip(&self.values)
            .map(|(&j, &v)| w[j] * v as f64)
            .sum()
    }

    fn axpy(&self, a: f64, w: &mut [f64]) {
        for (&j, &v) in self.indices.iter().zip(&self.values) {
            w[j] += a * v as f64;
        }
    }

    fn sq_norm(&self) -> f64 {
        self.values.iter().map(|&v| (v as f64) * (v as f64)).sum()
    }
}

// ─── Config ───────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearSvcConfig {
    /// Inverse regularisation strength
    pub c: f64,
    /// Stop when the projected-gradient spread drops below this
    pub tol: f64,
    pub max_iter: usize,
    /// Seed for the coordinate visiting order
    pub seed: u64,
}

impl Default for LinearSvcConfig {
    fn default() -> Self {
        Self { c: 1.0, tol: 1e-4, max_iter: 1000, seed: 0 }
    }
}

impl LinearSvcConfig {
    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

// ─── Model ────────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearSvc {
    /// Sorted distinct class indices seen during fit
    classes: Vec<usize>,
    /// One weight vector per binary problem
    weights: Vec<Vec<f64>>,
    biases:  Vec<f64>,
}

impl LinearSvc {
    /// Fit on `rows` (all of width `dim`) with dense class `targets`.
    pub fn fit<R: FeatureRow>(
        config:  &LinearSvcConfig,
        rows:    &[R],
        targets: &[usize],
        dim:     usize,
    ) -> Result<Self> {
        ensure!(!rows.is_empty(), "cannot fit a linear SVM on zero rows");
        ensure!(
            rows.len() == targets.len(),
            "{} rows but {} targets",
            rows.len(),
            targets.len()
        );
        ensure!(config.c > 0.0, "C must be positive, got {}", config.c);

        let mut classes = targets.to_vec();
        classes.sort_unstable();
        classes.dedup();

        let mut rng = StdRng::seed_from_u64(config.seed);

        // One problem for binary, one per class otherwise, none if only one class
        let positives: Vec<usize> = match classes.len() {
            1 => Vec::new(),
            2 => vec![classes[1]],
            _ => classes.clone(),
        };

        let mut weights = Vec::with_capacity(positives.len());
        let mut biases  = Vec::with_capacity(positives.len());
        for &pos in &positives {
            let y: Vec<f64> = targets
                .iter()
                .map(|&t| if t == pos { 1.0 } else { -1.0 })
                .collect();
            let (w, b) = solve_binary(config, rows, &y, dim, &mut rng);
            weights.push(w);
            biases.push(b);
        }

        tracing::debug!(
            "Fitted LinearSvc: C={}, {} classes, {} binary problems",
            config.c,
            classes.len(),
            weights.len()
        );
        Ok(Self { classes, weights, biases })
    }

    pub fn classes(&self) -> &[usize] {
        &self.classes
    }

    /// Raw decision values, one per binary problem.
    pub fn decision<R: FeatureRow>(&self, row: &R) -> Vec<f64> {
        self.weights
            .iter()
            .zip(&self.biases)
            .map(|(w, b)| row.dot(w) + b)
            .collect()
    }

    fn predict_one<R: FeatureRow>(&self, row: &R) -> usize {
        let scores = self.decision(row);
        match self.classes.len() {
            1 => self.classes[0],
            2 => {
                if scores[0] > 0.0 { self.classes[1] } else { self.classes[0] }
            }
            _ => {
                let best = scores
                    .iter()
                    .enumerate()
                    .fold((0, f64::NEG_INFINITY), |acc, (i, &s)| if s > acc.1 { (i, s) } else { acc })
                    .0;
                self.classes[best]
            }
        }
    }
}

impl<R: FeatureRow> Classifier<R> for LinearSvc {
    fn predict(&self, rows: &[R]) -> Vec<usize> {
        rows.iter().map(|r| self.predict_one(r)).collect()
    }
}

/// Dual coordinate descent for one ±1 problem. Returns (w, b).
fn solve_binary<R: FeatureRow>(
    config: &LinearSvcConfig,
    rows:   &[R],
    y:      &[f64],
    dim:    usize,
    rng:    &mut StdRng,
) -> (Vec<f64>, f64) {
    let n    = rows.len();
    let diag = 0.5 / config.c;

    // Q_ii of the dual, including the constant bias feature
    let qd: Vec<f64> = rows.iter().map(|r| r.sq_norm() + 1.0 + diag).collect();

    let mut alpha = vec![0.0f64; n];
    let mut w     = vec![0.0f64; dim];
    let mut b     = 0.0f64;
    let mut order: Vec<usize> = (0..n).collect();

    let mut converged = false;
    for _ in 0..config.max_iter {
        order.shuffle(rng);

        let mut pg_max = f64::NEG_INFINITY;
        let mut pg_min = f64::INFINITY;

        for &i in &order {
            let g  = y[i] * (rows[i].dot(&w) + b) - 1.0 + diag * alpha[i];
            let pg = if alpha[i] == 0.0 { g.min(0.0) } else { g };

            pg_max = pg_max.max(pg);
            pg_min = pg_min.min(pg);

            if pg.abs() > 1e-12 {
                let old  = alpha[i];
                alpha[i] = (old - g / qd[i]).max(0.0);
                let step = (alpha[i] - old) * y[i];
                rows[i].axpy(step, &mut w);
                b += step;
            }
        }

        if pg_max - pg_min <= config.tol {
            converged = true;
            break;
        }
    }

    if !converged {
        tracing::warn!(
            "LinearSvc did not converge in {} iterations; consider scaling features or raising max_iter",
            config.max_iter
        );
    }
    (w, b)
}
