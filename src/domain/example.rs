// ============================================================
// Layer 3 — Example Domain Type
// ============================================================
// One record of the classification corpus: the raw text (for the
// TF-IDF baseline), the pre-tokenised ids (for the encoder), the
// original categorical label, and the train/validation flag read
// from the metadata file.

use serde::{Deserialize, Serialize};

/// A labelled document, tokenised ahead of time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    /// Token ids in vocabulary order of the pretrained encoder
    pub tokens: Vec<u32>,

    /// The untokenised text, used only by the bag-of-n-grams baseline
    pub text: String,

    /// The label exactly as it appears in the metadata file
    pub label: String,

    /// `true` when the record belongs to the training partition
    pub is_train: bool,
}

impl Example {
    pub fn new(
        tokens:   Vec<u32>,
        text:     impl Into<String>,
        label:    impl Into<String>,
        is_train: bool,
    ) -> Self {
        Self {
            tokens,
            text:  text.into(),
            label: label.into(),
            is_train,
        }
    }

    /// Number of tokens in the document
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Which side of the fixed partition a set of examples came from.
/// Used for log lines and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitKind {
    Train,
    Valid,
}

impl std::fmt::Display for SplitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SplitKind::Train => write!(f, "train"),
            SplitKind::Valid => write!(f, "valid"),
        }
    }
}
