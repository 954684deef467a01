// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between raw .txt files and the six-tensor batch
// the rollout trainer consumes.
//
//   .txt files
//       │
//       ▼
//   TextLoader        → reads files into Documents
//       │
//       ▼
//   Preprocessor      → lowercases, normalises whitespace
//       │
//       ▼
//   Tokenizer         → words → token ids (infra/tokenizer_store)
//       │
//       ▼
//   Chunker           → fixed windows of at most max_seq_len ids
//       │
//       ▼
//   Masker            → hides a span, builds src / tgt / visibility
//       │
//       ▼
//   MaskedDataset     → burn Dataset of samples
//       │
//       ▼
//   MaskedBatcher     → padded Batch tensors (burn Batcher,
//                       driven by DataLoaderBuilder)
//
// Reference: Burn Book §4 (Datasets)
//            Rust Book §13 (Iterators and Closures)

/// Loads .txt files from a directory
pub mod loader;

/// Cleans and normalises raw text
pub mod preprocessor;

/// Special token ids and tokenizer conversions
pub mod vocab;

/// Splits long token sequences into overlapping windows
pub mod chunker;

/// Hides a span of each sequence for the generator to fill
pub mod masker;

/// Burn Dataset over masked samples
pub mod dataset;

/// Stacks masked samples into padded tensor batches
pub mod batcher;
