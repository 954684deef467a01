// ============================================================
// Layer 5 — Critic Phase (optional)
// ============================================================
// Standalone critic training, run after the generator phase
// when enabled.
//
// Each rollout, with probability `full_context_probability`,
// the generator sees every true token (all-visible mask) so
// the critic also learns values for fully observed contexts.
// The replacement only lasts for that rollout.
//
// Only the critic loss is kept; one backward, one step.

use burn::{module::AutodiffModule, optim::Optimizer, prelude::*, tensor::backend::AutodiffBackend};
use rand::Rng;

use crate::data::batcher::Batch;
use crate::domain::error::TrainError;
use crate::domain::metric::CRITIC_PRETRAIN;
use crate::ml::model::MaskedSequenceModel;
use crate::ml::phase::{scalar, zero_loss, PhaseContext};

#[derive(Debug, Clone, Copy)]
pub struct CriticPhase {
    pub full_context_probability: f64,
}

impl CriticPhase {
    pub fn new(full_context_probability: f64) -> Self {
        Self { full_context_probability }
    }

    pub fn execute<B, M, O>(
        &self,
        ctx:          &mut PhaseContext<'_, B, M, O>,
        batch:        &Batch<B>,
        num_rollouts: usize,
    ) -> Result<(), TrainError>
    where
        B: AutodiffBackend,
        M: AutodiffModule<B> + MaskedSequenceModel<B>,
        O: Optimizer<M, B>,
    {
        let device      = batch.device();
        let all_visible = Tensor::<B, 2, Int>::ones(batch.src_mask.dims(), &device).equal_elem(1);

        let mut critic_total = zero_loss::<B>(&device);
        let mut critic_sum   = 0.0;
        let mut full_context = 0usize;

        for _ in 0..num_rollouts {
            let mask = if ctx.rng.gen_bool(self.full_context_probability) {
                full_context += 1;
                all_visible.clone()
            } else {
                batch.src_mask.clone()
            };

            let out = ctx.model.generate(
                batch.src_tokens.clone(),
                batch.src_lengths.clone(),
                mask,
                batch.tgt_tokens.clone(),
                ctx.rng,
            )?;

            let critic_loss = out.critic_loss.mean();
            critic_sum   += scalar(&critic_loss);
            critic_total  = critic_total + critic_loss;
        }

        ctx.apply("critic", critic_total)?;
        ctx.log(CRITIC_PRETRAIN, critic_sum / num_rollouts as f64);

        tracing::debug!(step = ctx.step, full_context, "critic phase done");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::traits::MemorySink;
    use crate::ml::testing::{phase_fixture, Script};
    use std::sync::atomic::Ordering;

    #[test]
    fn test_certain_full_context_reveals_every_rollout() {
        let (mut fx, batch) = phase_fixture(Script::default());
        let mut sink = MemorySink::new();

        CriticPhase::new(1.0).execute(&mut fx.context(&mut sink, 0.01), &batch, 3).unwrap();

        assert_eq!(fx.script.full_context_calls.load(Ordering::SeqCst), 3);
        assert_eq!(fx.steps(), 1);
    }

    #[test]
    fn test_zero_probability_keeps_source_mask() {
        let script = Script { critic_losses: vec![0.2, 0.4], ..Script::default() };
        let (mut fx, batch) = phase_fixture(script);
        let mut sink = MemorySink::new();

        CriticPhase::new(0.0).execute(&mut fx.context(&mut sink, 0.01), &batch, 2).unwrap();

        assert_eq!(fx.script.full_context_calls.load(Ordering::SeqCst), 0);
        assert_eq!(fx.script.tracked_generate_calls.load(Ordering::SeqCst), 2);
        let got = sink.last(CRITIC_PRETRAIN).unwrap();
        assert!((got - 0.3).abs() < 1e-6, "{got}");
        assert_eq!(sink.metrics().len(), 1);
    }
}
