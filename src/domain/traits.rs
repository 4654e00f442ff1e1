// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer only talks to these seams, so a different
// corpus format or a different downstream classifier can be dropped
// in without touching the use cases.

use anyhow::Result;

use crate::domain::example::Example;

// ─── CorpusSource ─────────────────────────────────────────────────────────────
/// Any component that can produce the full labelled corpus.
///
/// Implementations:
///   - TsvCorpusLoader → metadata TSV + JSON Lines token array
pub trait CorpusSource {
    /// Load every record, in file order, with its train flag set.
    fn load_all(&self) -> Result<Vec<Example>>;
}

// ─── Classifier ───────────────────────────────────────────────────────────────
/// A fitted classifier over rows of type `R` (dense embeddings or
/// sparse TF-IDF vectors), predicting dense class indices.
pub trait Classifier<R> {
    /// Predict one class index per row.
    fn predict(&self, rows: &[R]) -> Vec<usize>;

    /// Exact-match accuracy against `targets`.
    fn score(&self, rows: &[R], targets: &[usize]) -> f64 {
        accuracy(&self.predict(rows), targets)
    }
}

/// Fraction of positions where `predicted` equals `targets`.
/// Always in `[0, 1]`; an empty evaluation set scores 0.
pub fn accuracy(predicted: &[usize], targets: &[usize]) -> f64 {
    let total = predicted.len().min(targets.len());
    if total == 0 {
        return 0.0;
    }
    let correct = predicted
        .iter()
        .zip(targets)
        .filter(|(p, t)| p == t)
        .count();
    correct as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy_bounds() {
        assert_eq!(accuracy(&[0, 1, 2], &[0, 1, 2]), 1.0);
        assert_eq!(accuracy(&[1, 1, 1], &[0, 0, 0]), 0.0);
        let a = accuracy(&[0, 1, 1, 0], &[0, 1, 0, 1]);
        assert!((a - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_accuracy_empty_is_zero() {
        assert_eq!(accuracy(&[], &[]), 0.0);
    }
}
