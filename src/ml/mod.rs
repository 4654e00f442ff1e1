// ============================================================
// Layer 5 — ML / Model Layer
// ============================================================
// All Burn framework code lives here, next to the two classical
// learners that consume its output.
//
//   model.rs     — AWD-LSTM style encoder (embedding + stacked
//                  LSTMs run in bptt chunks) and the pooling
//                  classifier head
//
//   pooling.rs   — last ‖ max ‖ mean pooling that ignores the
//                  left padding
//
//   extractor.rs — runs the frozen encoder over a dataset and
//                  collects one embedding row per document
//
//   svm.rs       — linear SVM (dual coordinate descent) over
//                  dense or sparse rows
//
//   tfidf.rs     — word n-gram TF-IDF vectorizer for the baseline
//
// Reference: Burn Book §3 (Building Blocks)
//            Merity et al. (2017) Regularizing and Optimizing
//            LSTM Language Models

/// Recurrent encoder and classifier architecture
pub mod model;

/// Mask-aware concat pooling
pub mod pooling;

/// Batched embedding extraction
pub mod extractor;

/// Linear support vector classifier
pub mod svm;

/// TF-IDF bag-of-n-grams vectorizer
pub mod tfidf;
