// ============================================================
// Layer 4 — Length-aware Ordering
// ============================================================
// Recurrent encoders pay for every padded timestep, so batches of
// similar-length documents are much cheaper to run. Two orderings:
//
//   sort_by_length_desc — validation: deterministic, longest first.
//   SortishSampler      — training: mostly sorted, still random.
//
// Neither changes WHAT gets computed, only the batch composition.
//
// Sortish algorithm:
//   1. shuffle all indices
//   2. cut into chunks of 50 * batch_size
//   3. sort each chunk by descending length
//   4. cut the result into batches of batch_size
//   5. put the batch holding the longest document first (so the
//      largest allocation happens up front), shuffle the rest

use rand::{seq::SliceRandom, Rng};
use std::cmp::Reverse;

/// Indices of `lengths` ordered longest-first.
/// Stable: equal lengths keep their original relative order, which
/// makes applying the sort twice a no-op.
pub fn sort_by_length_desc(lengths: &[usize]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..lengths.len()).collect();
    order.sort_by_key(|&i| Reverse(lengths[i]));
    order
}

/// Reorder `items` by the given index permutation.
pub fn apply_order<T: Clone>(items: &[T], order: &[usize]) -> Vec<T> {
    order.iter().map(|&i| items[i].clone()).collect()
}

pub struct SortishSampler {
    batch_size:  usize,
    chunk_batches: usize,
}

impl SortishSampler {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size:    batch_size.max(1),
            chunk_batches: 50,
        }
    }

    /// A permutation of `0..lengths.len()` grouped into length-homogeneous batches.
    pub fn order<R: Rng + ?Sized>(&self, lengths: &[usize], rng: &mut R) -> Vec<usize> {
        let n = lengths.len();
        if n == 0 {
            return Vec::new();
        }

        let mut idx: Vec<usize> = (0..n).collect();
        idx.shuffle(rng);

        let chunk = self.batch_size * self.chunk_batches;
        for c in idx.chunks_mut(chunk) {
            c.sort_by_key(|&i| Reverse(lengths[i]));
        }

        let mut batches: Vec<Vec<usize>> = idx
            .chunks(self.batch_size)
            .map(|b| b.to_vec())
            .collect();

        // Batch with the single longest document goes first
        let longest = batches
            .iter()
            .enumerate()
            .max_by_key(|(_, b)| b.iter().map(|&i| lengths[i]).max().unwrap_or(0))
            .map(|(i, _)| i)
            .unwrap_or(0);
        batches.swap(0, longest);
        batches[1..].shuffle(rng);

        batches.into_iter().flatten().collect()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_sort_desc_is_stable() {
        let lengths = [3, 5, 3, 1, 5];
        let order   = sort_by_length_desc(&lengths);
        // ties keep original order: 1 before 4, 0 before 2
        assert_eq!(order, vec![1, 4, 0, 2, 3]);
    }

    #[test]
    fn test_sort_desc_is_idempotent() {
        let lengths = [4, 9, 1, 9, 4, 4, 0];
        let once    = apply_order(&lengths, &sort_by_length_desc(&lengths));
        let twice   = apply_order(&once, &sort_by_length_desc(&once));
        assert_eq!(once, twice);
        assert!(once.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_sortish_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(123);
        let lengths: Vec<usize> = (0..1000).map(|i| (i * 37) % 211).collect();

        let mut order = SortishSampler::new(24).order(&lengths, &mut rng);
        assert_eq!(order.len(), lengths.len());
        order.sort_unstable();
        assert_eq!(order, (0..1000).collect::<Vec<_>>());
    }

    #[test]
    fn test_sortish_longest_batch_first() {
        let mut rng = StdRng::seed_from_u64(7);
        let lengths: Vec<usize> = (0..300).map(|i| i % 97).chain(std::iter::once(5000)).collect();

        let order = SortishSampler::new(16).order(&lengths, &mut rng);
        let first_batch_max = order[..16].iter().map(|&i| lengths[i]).max().unwrap();
        assert_eq!(first_batch_max, 5000);
    }

    #[test]
    fn test_sortish_empty() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(SortishSampler::new(8).order(&[], &mut rng).is_empty());
    }
}
