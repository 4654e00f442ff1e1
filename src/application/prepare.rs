// ============================================================
// Layer 2 — Corpus Preparation
// ============================================================
// Shared by both use cases. Turns the loaded corpus into two
// ordered, label-encoded splits:
//
//   Step 1: Partition by train flag         (Layer 4 - data)
//   Step 2: Down-sample each split          (Layer 4 - data)
//   Step 3: Build the label lookup          (Layer 3 - domain)
//   Step 4: Encode labels of both splits    (Layer 3 - domain)
//   Step 5: Order validation longest-first  (Layer 4 - data)
//   Step 6: Order training sortish          (Layer 4 - data)

use anyhow::Result;
use rand::Rng;

use crate::data::{
    sampler::{apply_order, sort_by_length_desc, SortishSampler},
    splitter::{downsample, partition},
};
use crate::domain::{
    error::ClassifyError,
    example::{Example, SplitKind},
    labels::LabelLookup,
};

/// One split, in the order its batches will be fed.
#[derive(Debug, Clone)]
pub struct Split {
    pub examples: Vec<Example>,
    pub targets:  Vec<usize>,
}

impl Split {
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn docs(&self) -> Vec<Vec<u32>> {
        self.examples.iter().map(|e| e.tokens.clone()).collect()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.examples.iter().map(|e| e.text.as_str()).collect()
    }

    fn reorder(self, order: &[usize]) -> Self {
        Self {
            examples: apply_order(&self.examples, order),
            targets:  apply_order(&self.targets, order),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PreparedCorpus {
    pub train:  Split,
    pub valid:  Split,
    pub labels: LabelLookup,
}

impl PreparedCorpus {
    /// Every token id of both splits must index a row of the
    /// pretrained embedding matrix.
    pub fn check_vocab(&self, n_tok: usize) -> Result<(), ClassifyError> {
        let out_of_range = self
            .train
            .examples
            .iter()
            .chain(&self.valid.examples)
            .flat_map(|e| e.tokens.iter().copied())
            .find(|&t| t as usize >= n_tok);

        match out_of_range {
            Some(token) => Err(ClassifyError::TokenOutOfVocab { token, n_tok }),
            None        => Ok(()),
        }
    }
}

pub fn prepare_corpus<R: Rng + ?Sized>(
    examples:    Vec<Example>,
    train_size:  Option<usize>,
    valid_size:  Option<usize>,
    train_batch: usize,
    rng:         &mut R,
) -> Result<PreparedCorpus> {
    // ── Step 1: Partition ─────────────────────────────────────────────────────
    let (train, valid) = partition(examples);
    if train.is_empty() {
        return Err(ClassifyError::EmptySplit(SplitKind::Train).into());
    }
    if valid.is_empty() {
        return Err(ClassifyError::EmptySplit(SplitKind::Valid).into());
    }

    // ── Step 2: Down-sample ───────────────────────────────────────────────────
    let train = downsample(train, train_size, SplitKind::Train, rng)?;
    let valid = downsample(valid, valid_size, SplitKind::Valid, rng)?;

    // ── Steps 3-4: Labels ─────────────────────────────────────────────────────
    let train_labels: Vec<&str> = train.iter().map(|e| e.label.as_str()).collect();
    let labels = LabelLookup::from_training(&train_labels);
    tracing::info!("{} classes: {:?}", labels.n_class(), labels.classes());

    let train_targets = labels.encode_all(&train_labels)?;
    let valid_labels: Vec<&str> = valid.iter().map(|e| e.label.as_str()).collect();
    let valid_targets = labels.encode_all(&valid_labels)?;

    let train = Split { examples: train, targets: train_targets };
    let valid = Split { examples: valid, targets: valid_targets };

    // ── Step 5: Validation longest-first ─────────────────────────────────────
    let valid_lengths: Vec<usize> = valid.examples.iter().map(Example::len).collect();
    let valid = valid.reorder(&sort_by_length_desc(&valid_lengths));

    // ── Step 6: Training sortish ─────────────────────────────────────────────
    let train_lengths: Vec<usize> = train.examples.iter().map(Example::len).collect();
    let order = SortishSampler::new(train_batch).order(&train_lengths, rng);
    let train = train.reorder(&order);

    tracing::info!("Prepared {} train and {} valid records", train.len(), valid.len());
    Ok(PreparedCorpus { train, valid, labels })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn corpus() -> Vec<Example> {
        let mut out = Vec::new();
        for i in 0..10u32 {
            let label = if i % 2 == 0 { "pos" } else { "neg" };
            out.push(Example::new(vec![7; i as usize + 1], format!("doc {i}"), label, i < 6));
        }
        out
    }

    #[test]
    fn test_splits_are_encoded_and_ordered() {
        let mut rng = StdRng::seed_from_u64(123);
        let p = prepare_corpus(corpus(), None, None, 2, &mut rng).unwrap();

        assert_eq!(p.train.len(), 6);
        assert_eq!(p.valid.len(), 4);
        assert_eq!(p.labels.classes(), &["neg".to_string(), "pos".to_string()]);

        let lens: Vec<usize> = p.valid.examples.iter().map(Example::len).collect();
        assert_eq!(lens, vec![10, 9, 8, 7]);

        for split in [&p.train, &p.valid] {
            for (e, &t) in split.examples.iter().zip(&split.targets) {
                assert_eq!(p.labels.decode(t), Some(e.label.as_str()));
            }
        }
    }

    #[test]
    fn test_downsample_sizes_apply() {
        let mut rng = StdRng::seed_from_u64(1);
        let p = prepare_corpus(corpus(), Some(4), Some(0), 2, &mut rng).unwrap();
        assert_eq!(p.train.len(), 4);
        assert_eq!(p.valid.len(), 4);
    }

    #[test]
    fn test_unknown_validation_label_is_rejected() {
        let mut examples = corpus();
        examples.push(Example::new(vec![1], "odd one", "other", false));
        let mut rng = StdRng::seed_from_u64(0);
        let err = prepare_corpus(examples, None, None, 2, &mut rng).unwrap_err();
        assert!(err.to_string().contains("other"));
    }

    #[test]
    fn test_token_beyond_vocabulary_is_rejected() {
        let mut examples = corpus();
        examples.push(Example::new(vec![2, 3, 50], "late doc", "pos", false));
        let mut rng = StdRng::seed_from_u64(0);
        let p = prepare_corpus(examples, None, None, 2, &mut rng).unwrap();

        let err = p.check_vocab(10).unwrap_err();
        assert!(matches!(err, ClassifyError::TokenOutOfVocab { token: 50, n_tok: 10 }));
        assert!(p.check_vocab(51).is_ok());
    }

    #[test]
    fn test_empty_split_is_rejected() {
        let only_train: Vec<Example> = corpus().into_iter().filter(|e| e.is_train).collect();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(prepare_corpus(only_train, None, None, 2, &mut rng).is_err());
    }
}
