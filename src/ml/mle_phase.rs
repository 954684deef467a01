// ============================================================
// Layer 5 — MLE Warm-up Phase
// ============================================================
// Teacher-forced maximum-likelihood training of the generator,
// run for a few epochs before the adversarial phases so the
// first rollouts are not sampled from a uniform policy.
//
//   loss = mean over the batch of NLL(true token | context)
//          at hidden, in-length positions
//
// One batch → one backward → one optimiser step. No rollouts:
// the loss has no sampling noise to average out.

use burn::{module::AutodiffModule, optim::Optimizer, tensor::backend::AutodiffBackend};

use crate::data::batcher::Batch;
use crate::domain::error::TrainError;
use crate::domain::metric::MLE_LOSS;
use crate::ml::model::MaskedLanguageModel;
use crate::ml::phase::PhaseContext;

#[derive(Debug, Clone, Copy, Default)]
pub struct MlePhase;

impl MlePhase {
    pub fn execute<B, M, O>(
        &self,
        ctx:   &mut PhaseContext<'_, B, M, O>,
        batch: &Batch<B>,
    ) -> Result<(), TrainError>
    where
        B: AutodiffBackend,
        M: AutodiffModule<B> + MaskedLanguageModel<B>,
        O: Optimizer<M, B>,
    {
        let loss = ctx
            .model
            .mle_loss(
                batch.src_tokens.clone(),
                batch.src_lengths.clone(),
                batch.src_mask.clone(),
                batch.tgt_tokens.clone(),
            )?
            .mean();

        let value = ctx.apply("mle", loss)?;
        ctx.log(MLE_LOSS, value);

        tracing::debug!(step = ctx.step, loss = value, "mle phase done");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::traits::MemorySink;
    use crate::ml::model::{MaskGanConfig, MaskGanModel};
    use crate::ml::testing::{phase_fixture, sample_batch, Script, TestBackend};
    use burn::optim::AdamConfig;
    use rand::{rngs::StdRng, SeedableRng};
    use std::sync::atomic::Ordering;

    #[test]
    fn test_one_step_logs_the_batch_loss() {
        let script = Script { mle_losses: vec![0.7], ..Script::default() };
        let (mut fx, batch) = phase_fixture(script);
        let mut sink = MemorySink::new();

        MlePhase.execute(&mut fx.context(&mut sink, 0.01), &batch).unwrap();

        assert_eq!(fx.steps(), 1);
        assert_eq!(fx.script.mle_calls.load(Ordering::SeqCst), 1);
        assert_eq!(fx.script.tracked_generate_calls.load(Ordering::SeqCst), 0);
        let got = sink.last(MLE_LOSS).unwrap();
        assert!((got - 0.7).abs() < 1e-6, "{got}");
    }

    #[test]
    fn test_non_finite_loss_is_refused() {
        let script = Script { mle_losses: vec![f64::INFINITY], ..Script::default() };
        let (mut fx, batch) = phase_fixture(script);
        let mut sink = MemorySink::new();

        let err = MlePhase.execute(&mut fx.context(&mut sink, 0.01), &batch).unwrap_err();

        assert!(matches!(err, TrainError::OptimizerStep { phase: "mle", .. }));
        assert_eq!(fx.steps(), 0);
        assert!(sink.metrics().is_empty());
    }

    #[test]
    fn test_repeated_steps_fit_the_batch() {
        let device    = Default::default();
        let batch     = sample_batch(&device);
        let mut model = MaskGanConfig::new(12, 6)
            .with_d_model(16)
            .with_d_hidden(16)
            .init::<TestBackend>(&device);
        let mut optim = AdamConfig::new().init::<TestBackend, MaskGanModel<TestBackend>>();
        let mut rng   = StdRng::seed_from_u64(0);
        let mut sink  = MemorySink::new();

        for _ in 0..30 {
            let mut ctx = PhaseContext::new(&mut model, &mut optim, 0.05, &mut rng, &mut sink, 0);
            MlePhase.execute(&mut ctx, &batch).unwrap();
        }

        let losses: Vec<f64> = sink.metrics().iter().map(|m| m.value).collect();
        assert_eq!(losses.len(), 30);
        assert!(losses[29] < losses[0] * 0.5, "{} -> {}", losses[0], losses[29]);
    }
}
