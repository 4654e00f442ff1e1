// ============================================================
// Layer 5 — TF-IDF Vectorizer
// ============================================================
// Bag-of-n-grams baseline over the raw text:
//
//   1. lowercase, tokens = runs of ≥ 2 word characters
//   2. word n-grams for every n in [ngram_min, ngram_max],
//      joined with a single space
//   3. vocabulary = the `max_features` terms with the highest total
//      count over the fitting corpus (ties → alphabetical),
//      re-indexed alphabetically
//   4. weight = raw count × idf,  idf = ln((1 + n) / (1 + df)) + 1
//   5. every row scaled to unit L2 norm

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::ml::svm::SparseRow;

const TOKEN_PATTERN: &str = r"(?u)\b\w\w+\b";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfConfig {
    pub ngram_min:    usize,
    pub ngram_max:    usize,
    pub max_features: Option<usize>,
    pub lowercase:    bool,
}

impl Default for TfidfConfig {
    fn default() -> Self {
        Self {
            ngram_min:    1,
            ngram_max:    2,
            max_features: Some(30_000),
            lowercase:    true,
        }
    }
}

/// Unfitted vectorizer: knows how to turn text into n-grams.
pub struct TfidfVectorizer {
    config: TfidfConfig,
    token:  Regex,
}

/// Fitted vectorizer with a frozen vocabulary and idf weights.
pub struct FittedTfidf {
    analyzer:   TfidfVectorizer,
    vocabulary: HashMap<String, usize>,
    idf:        Vec<f32>,
}

impl TfidfVectorizer {
    pub fn new(config: TfidfConfig) -> Result<Self> {
        let token = Regex::new(TOKEN_PATTERN).context("Invalid TF-IDF token pattern")?;
        Ok(Self { config, token })
    }

    /// Text → list of n-gram terms, in document order.
    pub fn analyze(&self, text: &str) -> Vec<String> {
        let text = if self.config.lowercase { text.to_lowercase() } else { text.to_string() };
        let tokens: Vec<&str> = self.token.find_iter(&text).map(|m| m.as_str()).collect();

        let lo = self.config.ngram_min.max(1);
        let hi = self.config.ngram_max.max(lo);

        let mut terms = Vec::new();
        for n in lo..=hi {
            if n > tokens.len() {
                break;
            }
            terms.extend(tokens.windows(n).map(|w| w.join(" ")));
        }
        terms
    }

    pub fn fit<S: AsRef<str>>(self, docs: &[S]) -> FittedTfidf {
        let mut total: BTreeMap<String, usize> = BTreeMap::new();
        let mut df:    HashMap<String, usize>  = HashMap::new();

        for doc in docs {
            let counts = count_terms(self.analyze(doc.as_ref()));
            for (term, c) in counts {
                *df.entry(term.clone()).or_insert(0) += 1;
                *total.entry(term).or_insert(0) += c;
            }
        }

        // BTreeMap iteration is alphabetical; the stable sort keeps it for ties
        let mut terms: Vec<(String, usize)> = total.into_iter().collect();
        if let Some(max) = self.config.max_features {
            if terms.len() > max {
                terms.sort_by(|a, b| b.1.cmp(&a.1));
                terms.truncate(max);
                terms.sort_by(|a, b| a.0.cmp(&b.0));
            }
        }

        let n = docs.len() as f64;
        let mut vocabulary = HashMap::with_capacity(terms.len());
        let mut idf        = Vec::with_capacity(terms.len());
        for (i, (term, _)) in terms.into_iter().enumerate() {
            let d = df.get(&term).copied().unwrap_or(0) as f64;
            idf.push((((1.0 + n) / (1.0 + d)).ln() + 1.0) as f32);
            vocabulary.insert(term, i);
        }

        tracing::info!("TF-IDF vocabulary: {} terms from {} documents", vocabulary.len(), docs.len());
        FittedTfidf { analyzer: self, vocabulary, idf }
    }
}

impl FittedTfidf {
    pub fn vocab_len(&self) -> usize {
        self.idf.len()
    }

    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    pub fn idf(&self) -> &[f32] {
        &self.idf
    }

    pub fn transform_one(&self, text: &str) -> SparseRow {
        let mut weights: BTreeMap<usize, f32> = BTreeMap::new();
        for term in self.analyzer.analyze(text) {
            if let Some(&j) = self.vocabulary.get(&term) {
                *weights.entry(j).or_insert(0.0) += 1.0;
            }
        }

        let mut row = SparseRow {
            indices: Vec::with_capacity(weights.len()),
            values:  Vec::with_capacity(weights.len()),
        };
        for (j, tf) in weights {
            row.indices.push(j);
            row.values.push(tf * self.idf[j]);
        }

        let norm = row.values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            row.values.iter_mut().for_each(|v| *v /= norm);
        }
        row
    }

    pub fn transform<S: AsRef<str>>(&self, docs: &[S]) -> Vec<SparseRow> {
        docs.iter().map(|d| self.transform_one(d.as_ref())).collect()
    }
}

fn count_terms(terms: Vec<String>) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for t in terms {
        *counts.entry(t).or_insert(0) += 1;
    }
    counts
}
