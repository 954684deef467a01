// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the checkpoint directory:
//
//   checkpoint.rs   — ParameterStore trait and its file-backed
//                     CheckpointManager. Model weights go
//                     through Burn's NamedMpkGzFileRecorder and
//                     are replaced atomically; the run's
//                     TrainConfig is kept next to them as JSON.
//
//   tokenizer_store.rs — HuggingFace word-level tokenizer.
//                     Built once from the corpus, then
//                     reloaded so training and inference
//                     share token ids.
//
//   metrics.rs      — CsvMetricSink, the MetricSink that
//                     appends every phase metric to a CSV.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Parameter store trait and file checkpoints
pub mod checkpoint;

/// Tokenizer building, saving and loading
pub mod tokenizer_store;

/// Metric CSV sink
pub mod metrics;
