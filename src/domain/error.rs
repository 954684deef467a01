// ============================================================
// Layer 3 — Training Error Taxonomy
// ============================================================
// Every failure the rollout trainer can surface to its caller.
//
// The trainer never recovers locally and never retries:
// an error aborts the current run() call and travels up
// unchanged. The caller decides whether to skip the batch,
// abort the epoch or stop training.
//
//   ModelForward   — shape or length mismatch seen by the model
//   OptimizerStep  — accumulated loss is NaN or infinite
//   Persistence    — checkpoint could not be read or written
//   Configuration  — trainer settings that cannot run
//
// Reference: Rust Book §9 (Recoverable Errors with Result)
//            thiserror crate documentation

use thiserror::Error;

/// Errors raised by the rollout phases, the orchestrator and the
/// parameter store.
#[derive(Debug, Error)]
pub enum TrainError {
    /// The model rejected its inputs (mismatched shapes, sequence
    /// longer than the position table, ...).
    #[error("model forward failed: {0}")]
    ModelForward(String),

    /// The accumulated phase loss was not finite, so the optimizer
    /// step was refused.
    #[error("optimizer step refused in {phase} phase: loss = {loss}")]
    OptimizerStep {
        /// Phase whose accumulated loss was rejected
        phase: &'static str,
        /// The offending scalar value
        loss: f64,
    },

    /// A checkpoint could not be loaded or saved.
    #[error("persistence failure for checkpoint '{name}': {reason}")]
    Persistence {
        /// Checkpoint key, e.g. "mgan"
        name: String,
        /// Underlying recorder or filesystem message
        reason: String,
    },

    /// The trainer configuration violates one of its invariants.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl TrainError {
    pub fn persistence(name: &str, reason: impl std::fmt::Display) -> Self {
        Self::Persistence {
            name:   name.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_failure() {
        let e = TrainError::OptimizerStep { phase: "generator", loss: f64::NAN };
        assert_eq!(e.to_string(), "optimizer step refused in generator phase: loss = NaN");

        let e = TrainError::persistence("mgan", "disk full");
        assert_eq!(e.to_string(), "persistence failure for checkpoint 'mgan': disk full");
    }
}
