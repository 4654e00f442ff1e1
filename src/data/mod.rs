// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from the two input files
// all the way to tensor batches.
//
// The pipeline flows in this order:
//
//   metadata.tsv + docs.jsonl
//       │
//       ▼
//   TsvCorpusLoader   → joins rows and token arrays into Examples
//       │
//       ▼
//   splitter          → train/valid partition, seeded down-sampling
//       │
//       ▼
//   sampler           → longest-first (valid) / sortish (train) order
//       │
//       ▼
//   DocDataset        → implements Burn's Dataset trait
//       │
//       ▼
//   DocBatcher        → left-pads documents into tensor batches
//       │
//       ▼
//   DataLoader        → feeds batches to the encoder
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads the metadata TSV and the JSON Lines token array
pub mod loader;

/// Fixed train/valid partition and down-sampling
pub mod splitter;

/// Length-based orderings
pub mod sampler;

/// Implements Burn's Dataset trait for tokenised documents
pub mod dataset;

/// Implements Burn's Batcher trait with left padding
pub mod batcher;
