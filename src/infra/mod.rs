// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// File formats that don't belong to any one business layer:
//
//   weights.rs   — reads pretrained tensors from safetensors and
//                  applies them to the encoder by name, skipping
//                  anything absent or of the wrong shape
//
//   run_store.rs — the output directory: run config, features,
//                  report
//
//   metrics.rs   — one CSV row per evaluated model
//
// Reference: Rust Book §9 (Error Handling with anyhow)

/// Non-strict pretrained weight loading
pub mod weights;

/// Run output directory
pub mod run_store;

/// Accuracy CSV logger
pub mod metrics;
