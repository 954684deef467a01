// ============================================================
// Layer 3 — Metric Domain Type
// ============================================================
// A single named scalar observation on the training time axis.
//
// Metrics are append-only: a (name, step, value) triple has no
// identity beyond its fields. The step is the trainer's run
// counter, not the epoch and not the batch index.
//
// The metric names below are consumed by downstream dashboards,
// so they (and the reductions behind them) are fixed.
//
// Reference: Rust Book §5 (Structs)

use serde::{Deserialize, Serialize};

/// Mean real-sequence discriminator loss over the rollouts
pub const DISCRIMINATOR_REAL: &str = "discriminator/real";

/// Mean generated-sequence discriminator loss over the rollouts
pub const DISCRIMINATOR_FAKE: &str = "discriminator/fake";

/// Mean of real and fake discriminator losses
pub const DISCRIMINATOR: &str = "discriminator";

/// Mean generator surrogate loss over the rollouts
pub const GENERATOR_ADVANTAGE: &str = "generator/advantage";

/// Raw SUM of per-rollout average token rewards (not a mean)
pub const GENERATOR_REWARD_PER_TOKEN: &str = "generator/reward/token";

/// Mean critic regression loss during the generator phase
pub const CRITIC_LOSS: &str = "critic/loss";

/// Mean critic regression loss during standalone critic training
pub const CRITIC_PRETRAIN: &str = "critic/pretrain";

/// Teacher-forced generator NLL during the MLE warm-up
pub const MLE_LOSS: &str = "mle/loss";

/// One observation emitted by a training phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name:  String,
    pub step:  usize,
    pub value: f64,
}

impl Metric {
    pub fn new(name: impl Into<String>, step: usize, value: f64) -> Self {
        Self { name: name.into(), step, value }
    }
}
