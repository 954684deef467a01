// ============================================================
// Layer 5 — Generator Phase
// ============================================================
// Policy-gradient update of the generator, plus the critic
// baseline it is measured against.
//
// Per rollout (with gradient tracking):
//   (gen_loss, _, critic_loss, avg_reward) = G(src)
//   Σgen    += gen_loss
//   Σcritic += critic_loss          (skipped when pretraining)
//
// gen_loss is the advantage-weighted log-likelihood of the
// sample, so the update ASCENDS it:
//
//   total = −Σgen + Σcritic
//
// Reported:
//   generator/advantage    = Σgen / N
//   generator/reward/token = Σavg_reward   (raw sum, not a mean)
//   critic/loss            = Σcritic / N   (only when not pretraining)

use burn::{module::AutodiffModule, optim::Optimizer, prelude::*, tensor::backend::AutodiffBackend};

use crate::data::batcher::Batch;
use crate::domain::error::TrainError;
use crate::domain::metric::{CRITIC_LOSS, GENERATOR_ADVANTAGE, GENERATOR_REWARD_PER_TOKEN};
use crate::ml::model::MaskedSequenceModel;
use crate::ml::phase::{scalar, zero_loss, PhaseContext};

#[derive(Debug, Clone, Copy, Default)]
pub struct GeneratorPhase {
    /// Skip the critic update and its metric
    pub pretrain: bool,
}

impl GeneratorPhase {
    pub fn new(pretrain: bool) -> Self {
        Self { pretrain }
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
        let device = batch.device();

        let mut generator_total = zero_loss::<B>(&device);
        let mut critic_total    = zero_loss::<B>(&device);
        let mut generator_sum   = 0.0;
        let mut critic_sum      = 0.0;
        let mut reward_sum      = 0.0;

        for _ in 0..num_rollouts {
            let out = ctx.model.generate(
                batch.src_tokens.clone(),
                batch.src_lengths.clone(),
                batch.src_mask.clone(),
                batch.tgt_tokens.clone(),
                ctx.rng,
            )?;

            let generator_loss = out.generator_loss.mean();
            generator_sum   += scalar(&generator_loss);
            generator_total  = generator_total + generator_loss;
            reward_sum      += scalar(&out.avg_reward.mean());

            if !self.pretrain {
                let critic_loss = out.critic_loss.mean();
                critic_sum   += scalar(&critic_loss);
                critic_total  = critic_total + critic_loss;
            }
        }

        let total = if self.pretrain {
            generator_total.neg()
        } else {
            critic_total - generator_total
        };
        ctx.apply("generator", total)?;

        let n = num_rollouts as f64;
        ctx.log(GENERATOR_ADVANTAGE, generator_sum / n);
        ctx.log(GENERATOR_REWARD_PER_TOKEN, reward_sum);
        if !self.pretrain {
            ctx.log(CRITIC_LOSS, critic_sum / n);
        }

        tracing::debug!(
            step = ctx.step,
            advantage = generator_sum / n,
            reward = reward_sum,
            "generator phase done"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::traits::MemorySink;
    use crate::ml::testing::{phase_fixture, Script};
    use std::sync::atomic::Ordering;

    fn close(got: Option<f64>, expected: f64) {
        let got = got.unwrap();
        assert!((got - expected).abs() < 1e-6, "{got} != {expected}");
    }

    #[test]
    fn test_reward_is_summed_and_advantage_averaged() {
        let script = Script {
            generator_losses: vec![1.0, 2.0, 3.0],
            critic_losses:    vec![0.3, 0.6, 0.9],
            rewards:          vec![0.5, 0.25, 0.25],
            ..Script::default()
        };
        let (mut fx, batch) = phase_fixture(script);
        let mut sink = MemorySink::new();

        GeneratorPhase::new(false).execute(&mut fx.context(&mut sink, 0.01), &batch, 3).unwrap();

        close(sink.last(GENERATOR_ADVANTAGE), 2.0);
        close(sink.last(GENERATOR_REWARD_PER_TOKEN), 1.0);
        close(sink.last(CRITIC_LOSS), 0.6);
    }

    #[test]
    fn test_single_step_with_tracked_rollouts() {
        for rollouts in [1, 4] {
            let (mut fx, batch) = phase_fixture(Script::default());
            let mut sink = MemorySink::new();

            GeneratorPhase::new(false).execute(&mut fx.context(&mut sink, 0.01), &batch, rollouts).unwrap();

            assert_eq!(fx.steps(), 1);
            assert_eq!(fx.script.tracked_generate_calls.load(Ordering::SeqCst), rollouts);
            assert_eq!(fx.script.untracked_generate_calls.load(Ordering::SeqCst), 0);
        }
    }

    #[test]
    fn test_pretrain_skips_critic_metric() {
        let (mut fx, batch) = phase_fixture(Script::default());
        let mut sink = MemorySink::new();

        GeneratorPhase::new(true).execute(&mut fx.context(&mut sink, 0.01), &batch, 2).unwrap();

        assert_eq!(sink.last(CRITIC_LOSS), None);
        assert!(sink.last(GENERATOR_ADVANTAGE).is_some());
        assert_eq!(sink.metrics().len(), 2);
    }

    #[test]
    fn test_update_ascends_the_generator_loss() {
        // L = −Σ k·w  ⇒  ∂L/∂w = −k·N  ⇒  SGD moves w up by lr·k·N
        let weight_change = |k: f64| {
            let script = Script { generator_losses: vec![k], ..Script::default() };
            let (mut fx, batch) = phase_fixture(script);
            let mut sink = MemorySink::new();
            let before = fx.model.weight_value();

            GeneratorPhase::new(true).execute(&mut fx.context(&mut sink, 0.1), &batch, 2).unwrap();
            fx.model.weight_value() - before
        };

        let unit   = weight_change(1.0);
        let scaled = weight_change(3.0);
        assert!(unit > 0.0);
        assert!((unit - 0.2).abs() < 1e-5, "{unit}");
        assert!((scaled - 3.0 * unit).abs() < 1e-5, "{scaled} vs {unit}");
    }
}
