// ============================================================
// Layer 3 — Error Taxonomy
// ============================================================
// Every data problem the run can detect up front gets its own
// variant, so the CLI reports "label 'x' never appears in training"
// instead of a bare index panic deep inside the pipeline.

use thiserror::Error;

use crate::domain::example::SplitKind;

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("column '{column}' not found in '{path}'")]
    MissingColumn { column: String, path: String },

    #[error("row {row}: cannot read '{value}' as a train flag (expected true/false or 1/0)")]
    InvalidTrainFlag { row: usize, value: String },

    #[error("line {line}: malformed token array: {reason}")]
    MalformedTokens { line: usize, reason: String },

    #[error("metadata has {records} rows but the document array has {docs} documents")]
    LengthMismatch { records: usize, docs: usize },

    #[error("label '{0}' does not appear in the training split")]
    UnknownLabel(String),

    #[error("requested {requested} {split} records but only {available} are available")]
    SampleTooLarge {
        split:     SplitKind,
        requested: usize,
        available: usize,
    },

    #[error("token id {token} is outside the pretrained vocabulary of {n_tok} entries")]
    TokenOutOfVocab { token: u32, n_tok: usize },

    #[error("the {0} split is empty")]
    EmptySplit(SplitKind),
}
