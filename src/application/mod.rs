// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// a specific goal (a full embedding run or the baseline alone).
//
// Rules for this layer:
//   - No ML math or model code here
//   - No UI or printing here (that's Layer 1)
//   - No direct file parsing (that's Layer 4 and 6)
//   - Only workflow coordination

// Serialisable run settings shared by both workflows
pub mod config;

// Partition, down-sample, encode and order the corpus
pub mod prepare;

// Frozen encoder embeddings + linear SVM, with the baseline alongside
pub mod classify_use_case;

// TF-IDF + linear SVM on the raw text only
pub mod baseline_use_case;
