// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn training and inference code lives here.
//
//   model.rs               — MaskedSequenceModel trait (the two
//                            modes every rollout phase calls),
//                            MaskedLanguageModel (MLE) and the
//                            concrete MaskGanModel: generator,
//                            discriminator and critic heads
//
//   phase.rs               — PhaseContext: what a trainer run
//                            lends to each phase, and the single
//                            backward + optimiser step
//
//   discriminator_phase.rs — real vs generated classification
//   generator_phase.rs     — policy-gradient generator update
//   critic_phase.rs        — optional standalone critic update
//   mle_phase.rs           — teacher-forced generator warm-up
//
//   schedule.rs            — exponential learning-rate decay
//   trainer.rs             — MaskGanTrainer, runs the phases in
//                            order and checkpoints after each run
//   training_loop.rs       — epoch / batch driver on Wgpu
//   inferencer.rs          — loads a checkpoint, fills text
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Fedus et al. (2018) MaskGAN

/// Model adapter trait and the concrete MaskGAN model
pub mod model;

/// Shared state and optimiser step for the rollout phases
pub mod phase;

pub mod discriminator_phase;
pub mod generator_phase;
pub mod critic_phase;
pub mod mle_phase;

/// Learning-rate schedule
pub mod schedule;

/// Multi-phase rollout trainer
pub mod trainer;

/// Epoch loop with CSV metrics and checkpoints
pub mod training_loop;

/// Inference engine — loads checkpoint and fills hidden words
pub mod inferencer;

#[cfg(test)]
pub mod testing;
