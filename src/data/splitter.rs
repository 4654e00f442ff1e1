// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// The partition is fixed by the metadata file: each Example
// already carries its train flag, so splitting is a boolean mask,
// not a random shuffle.
//
// After partitioning, either side can be down-sampled uniformly at
// random WITHOUT replacement to a requested size. This is how the
// "how good are the features with only N labelled examples?"
// experiments are run.

use rand::Rng;

use crate::domain::error::ClassifyError;
use crate::domain::example::{Example, SplitKind};

/// Partition examples by their train flag into (train, valid),
/// preserving file order on both sides.
pub fn partition(examples: Vec<Example>) -> (Vec<Example>, Vec<Example>) {
    let (train, valid): (Vec<Example>, Vec<Example>) =
        examples.into_iter().partition(|e| e.is_train);

    tracing::debug!("Partitioned: {} train, {} valid", train.len(), valid.len());
    (train, valid)
}

/// Keep `size` items chosen uniformly without replacement.
///
/// `None` (or `Some(0)`) keeps everything. Asking for more items than
/// exist is an error rather than a silent clamp.
pub fn downsample<T, R: Rng + ?Sized>(
    items: Vec<T>,
    size:  Option<usize>,
    split: SplitKind,
    rng:   &mut R,
) -> Result<Vec<T>, ClassifyError> {
    let size = match size {
        Some(n) if n > 0 => n,
        _ => return Ok(items),
    };

    let available = items.len();
    if size > available {
        return Err(ClassifyError::SampleTooLarge {
            split,
            requested: size,
            available,
        });
    }

    tracing::info!("Subset {} data to {} records", split, size);

    // index::sample gives distinct indices; collect them in draw order
    let picked = rand::seq::index::sample(rng, available, size).into_vec();

    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    Ok(picked
        .into_iter()
        .filter_map(|i| slots[i].take())
        .collect())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashSet;

    fn ex(id: u32, is_train: bool) -> Example {
        Example::new(vec![id], format!("doc {id}"), "x", is_train)
    }

    #[test]
    fn test_partition_respects_flags_and_order() {
        let items = vec![ex(0, true), ex(1, false), ex(2, true), ex(3, false)];
        let (train, valid) = partition(items);

        let train_ids: Vec<u32> = train.iter().map(|e| e.tokens[0]).collect();
        let valid_ids: Vec<u32> = valid.iter().map(|e| e.tokens[0]).collect();
        assert_eq!(train_ids, vec![0, 2]);
        assert_eq!(valid_ids, vec![1, 3]);
    }

    #[test]
    fn test_downsample_never_exceeds_or_duplicates() {
        let mut rng = StdRng::seed_from_u64(123);
        for size in [1usize, 7, 50, 100] {
            let items: Vec<usize> = (0..100).collect();
            let out = downsample(items, Some(size), SplitKind::Train, &mut rng).unwrap();

            assert_eq!(out.len(), size);
            let unique: HashSet<usize> = out.iter().copied().collect();
            assert_eq!(unique.len(), out.len());
            assert!(out.iter().all(|&i| i < 100));
        }
    }

    #[test]
    fn test_downsample_none_or_zero_keeps_all() {
        let mut rng = StdRng::seed_from_u64(1);
        let out = downsample((0..10).collect::<Vec<_>>(), None, SplitKind::Valid, &mut rng).unwrap();
        assert_eq!(out.len(), 10);
        let out = downsample((0..10).collect::<Vec<_>>(), Some(0), SplitKind::Valid, &mut rng).unwrap();
        assert_eq!(out, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_downsample_too_large_is_error() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = downsample(vec![1, 2, 3], Some(4), SplitKind::Train, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            ClassifyError::SampleTooLarge { requested: 4, available: 3, .. }
        ));
    }

    #[test]
    fn test_downsample_is_reproducible_for_a_seed() {
        let a = downsample((0..1000).collect::<Vec<_>>(), Some(20), SplitKind::Train, &mut StdRng::seed_from_u64(9)).unwrap();
        let b = downsample((0..1000).collect::<Vec<_>>(), Some(20), SplitKind::Train, &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
    }
}
