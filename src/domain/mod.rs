// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits that name the concepts
// of adversarial masked-span training.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O or network calls
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// A loaded text document
pub mod document;

// Error taxonomy shared by the trainer and its collaborators
pub mod error;

// Named scalar observations and the fixed metric names
pub mod metric;

// Core abstractions (traits) that other layers implement
pub mod traits;
