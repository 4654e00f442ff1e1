// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs and traits that define the core concepts:
// labelled examples, the label lookup, and the error taxonomy.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Everything in here is testable without a GPU.

// A pre-tokenised, labelled example and the split it belongs to
pub mod example;

// Label → dense class index mapping built from the training split
pub mod labels;

// Validation errors raised while preparing the data
pub mod error;

// Core abstractions (traits) that other layers implement
pub mod traits;
