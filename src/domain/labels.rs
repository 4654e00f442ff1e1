// ============================================================
// Layer 3 — Label Lookup
// ============================================================
// Maps arbitrary categorical labels onto a dense range
// [0, n_class) so the classifiers can work with plain indices.
//
// The table is built from the TRAINING labels only. Distinct
// labels are sorted first, so the same training set always gives
// the same indices regardless of row order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::error::ClassifyError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelLookup {
    /// Sorted distinct labels; position == class index
    classes: Vec<String>,
    index:   BTreeMap<String, usize>,
}

impl LabelLookup {
    /// Build the lookup from the labels of the training split.
    pub fn from_training<S: AsRef<str>>(labels: &[S]) -> Self {
        let mut classes: Vec<String> = labels.iter().map(|l| l.as_ref().to_string()).collect();
        classes.sort();
        classes.dedup();

        let index = classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();

        Self { classes, index }
    }

    pub fn n_class(&self) -> usize {
        self.classes.len()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Class index of `label`, or `UnknownLabel` if training never saw it.
    pub fn encode(&self, label: &str) -> Result<usize, ClassifyError> {
        self.index
            .get(label)
            .copied()
            .ok_or_else(|| ClassifyError::UnknownLabel(label.to_string()))
    }

    /// Encode a whole column, failing on the first unseen label.
    pub fn encode_all<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<usize>, ClassifyError> {
        labels.iter().map(|l| self.encode(l.as_ref())).collect()
    }

    pub fn decode(&self, class: usize) -> Option<&str> {
        self.classes.get(class).map(String::as_str)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_lookup_is_bijection_onto_range() {
        let labels = ["sports", "world", "sports", "business", "tech", "world"];
        let lookup = LabelLookup::from_training(&labels);

        assert_eq!(lookup.n_class(), 4);

        let encoded: HashSet<usize> = labels
            .iter()
            .map(|l| lookup.encode(l).unwrap())
            .collect();
        let expected: HashSet<usize> = (0..4).collect();
        assert_eq!(encoded, expected);

        // decode(encode(x)) == x for every training label
        for l in labels {
            let idx = lookup.encode(l).unwrap();
            assert_eq!(lookup.decode(idx), Some(l));
        }
    }

    #[test]
    fn test_indices_follow_sorted_order() {
        let lookup = LabelLookup::from_training(&["3", "1", "2", "1"]);
        assert_eq!(lookup.classes(), &["1", "2", "3"]);
        assert_eq!(lookup.encode("1").unwrap(), 0);
        assert_eq!(lookup.encode("3").unwrap(), 2);
    }

    #[test]
    fn test_unseen_label_is_an_error() {
        let lookup = LabelLookup::from_training(&["a", "b"]);
        let err = lookup.encode_all(&["a", "c"]).unwrap_err();
        assert!(matches!(err, ClassifyError::UnknownLabel(ref l) if l == "c"));
    }

    #[test]
    fn test_empty_training_labels() {
        let lookup = LabelLookup::from_training::<&str>(&[]);
        assert_eq!(lookup.n_class(), 0);
        assert!(lookup.decode(0).is_none());
    }
}
