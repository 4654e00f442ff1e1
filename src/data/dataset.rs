use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

/// One tokenised document with its dense class index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocItem {
    pub tokens: Vec<u32>,
    pub target: usize,
}

/// In-memory ragged dataset. Items are served in stored order, so the
/// caller arranges them (sorted / sortish) before building it.
pub struct DocDataset {
    items: Vec<DocItem>,
}

impl DocDataset {
    /// Build from parallel token / target columns.
    pub fn from_parts(docs: Vec<Vec<u32>>, targets: &[usize]) -> Self {
        let items = docs
            .into_iter()
            .zip(targets)
            .map(|(tokens, &target)| DocItem { tokens, target })
            .collect();
        Self { items }
    }

    /// The first `n` items, or all of them if there are fewer.
    pub fn head(&self, n: usize) -> &[DocItem] {
        &self.items[..n.min(self.items.len())]
    }
}

impl Dataset<DocItem> for DocDataset {
    fn get(&self, index: usize) -> Option<DocItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}
