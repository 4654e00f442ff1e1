// ============================================================
// Layer 4 — Corpus Loader
// ============================================================
// Reads the two input files and zips them into Examples:
//
//   metadata.tsv   — tab-separated, header row, one row per record.
//                    Needs a boolean train-flag column, a label
//                    column and a raw text column.
//   docs.jsonl     — one JSON array of token ids per line, in the
//                    same order as the metadata rows.
//
// Both files must describe the same number of records; anything
// else is reported as a ClassifyError rather than a panic later on.

use anyhow::{Context, Result};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use crate::domain::error::ClassifyError;
use crate::domain::example::Example;
use crate::domain::traits::CorpusSource;

/// Names of the metadata columns the loader looks up by header.
#[derive(Debug, Clone)]
pub struct ColumnNames {
    pub train_flag: String,
    pub label:      String,
    pub text:       String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            train_flag: "cl_train".to_string(),
            label:      "label".to_string(),
            text:       "text".to_string(),
        }
    }
}

/// One parsed metadata row, before it is joined with its tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct MetaRecord {
    pub is_train: bool,
    pub label:    String,
    pub text:     String,
}

/// Loads a corpus from a metadata TSV plus a JSON Lines token array.
/// Implements the CorpusSource trait from Layer 3.
pub struct TsvCorpusLoader {
    df_path:  PathBuf,
    doc_path: PathBuf,
    columns:  ColumnNames,
}

impl TsvCorpusLoader {
    pub fn new(
        df_path:  impl Into<PathBuf>,
        doc_path: impl Into<PathBuf>,
        columns:  ColumnNames,
    ) -> Self {
        Self {
            df_path:  df_path.into(),
            doc_path: doc_path.into(),
            columns,
        }
    }
}

impl CorpusSource for TsvCorpusLoader {
    fn load_all(&self) -> Result<Vec<Example>> {
        let records = read_metadata(&self.df_path, &self.columns)?;
        let docs    = read_token_docs(&self.doc_path)?;

        if records.len() != docs.len() {
            return Err(ClassifyError::LengthMismatch {
                records: records.len(),
                docs:    docs.len(),
            }
            .into());
        }

        let examples: Vec<Example> = records
            .into_iter()
            .zip(docs)
            .map(|(r, tokens)| Example::new(tokens, r.text, r.label, r.is_train))
            .collect();

        let n_train = examples.iter().filter(|e| e.is_train).count();
        tracing::info!(
            "Loaded {} records ({} train, {} valid)",
            examples.len(),
            n_train,
            examples.len() - n_train
        );
        Ok(examples)
    }
}

/// Read the metadata TSV, keeping only the three columns we need.
pub fn read_metadata(path: &Path, columns: &ColumnNames) -> Result<Vec<MetaRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Cannot open metadata file '{}'", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("Cannot read header of '{}'", path.display()))?
        .clone();

    let column_index = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| {
                ClassifyError::MissingColumn {
                    column: name.to_string(),
                    path:   path.display().to_string(),
                }
                .into()
            })
    };

    let flag_idx  = column_index(&columns.train_flag)?;
    let label_idx = column_index(&columns.label)?;
    let text_idx  = column_index(&columns.text)?;

    let mut records = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result
            .with_context(|| format!("Cannot parse row {} of '{}'", row + 1, path.display()))?;

        let field = |idx: usize| record.get(idx).unwrap_or("");
        let flag  = field(flag_idx);

        records.push(MetaRecord {
            is_train: parse_train_flag(flag).ok_or_else(|| ClassifyError::InvalidTrainFlag {
                row:   row + 1,
                value: flag.to_string(),
            })?,
            label: field(label_idx).to_string(),
            text:  field(text_idx).to_string(),
        });
    }

    tracing::debug!("Read {} metadata rows from '{}'", records.len(), path.display());
    Ok(records)
}

/// Read a JSON Lines file where each non-blank line is an array of token ids.
pub fn read_token_docs(path: &Path) -> Result<Vec<Vec<u32>>> {
    let file = File::open(path)
        .with_context(|| format!("Cannot open document array '{}'", path.display()))?;

    let mut docs = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("Cannot read '{}'", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let tokens: Vec<u32> = serde_json::from_str(&line).map_err(|e| {
            ClassifyError::MalformedTokens {
                line:   i + 1,
                reason: e.to_string(),
            }
        })?;
        docs.push(tokens);
    }

    tracing::debug!("Read {} tokenised documents from '{}'", docs.len(), path.display());
    Ok(docs)
}

/// Accepts the spellings pandas and hand-written files use for booleans.
fn parse_train_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "t" | "yes" => Some(true),
        "false" | "0" | "f" | "no" => Some(false),
        _ => None,
    }
}
