// ============================================================
// Layer 5 — Discriminator Phase
// ============================================================
// Teaches the discriminator to tell true sequences from the
// generator's fills.
//
// Per rollout:
//   real = D(tgt[:, 1:] → tgt)          labelled real
//   fake = D(src → G(src) sample)       labelled generated
//   loss += (real + fake) / 2
//
// The generator samples on the inner backend (model.valid()),
// so nothing it does can reach the gradient graph.
//
// After all rollouts: one backward, one optimiser step.

use burn::{module::AutodiffModule, optim::Optimizer, prelude::*, tensor::backend::AutodiffBackend};

use crate::data::batcher::Batch;
use crate::domain::error::TrainError;
use crate::domain::metric::{DISCRIMINATOR, DISCRIMINATOR_FAKE, DISCRIMINATOR_REAL};
use crate::ml::model::MaskedSequenceModel;
use crate::ml::phase::{scalar, zero_loss, PhaseContext};

#[derive(Debug, Clone, Copy, Default)]
pub struct DiscriminatorPhase;

impl DiscriminatorPhase {
    pub fn execute<B, M, O>(
        &self,
        ctx:          &mut PhaseContext<'_, B, M, O>,
        batch:        &Batch<B>,
        num_rollouts: usize,
    ) -> Result<(), TrainError>
    where
        B: AutodiffBackend,
        M: AutodiffModule<B> + MaskedSequenceModel<B>,
        M::InnerModule: MaskedSequenceModel<B::InnerBackend>,
        O: Optimizer<M, B>,
    {
        let target  = batch.target();
        let inner   = batch.inner();
        let sampler = ctx.model.valid();

        let mut loss     = zero_loss::<B>(&batch.device());
        let mut real_sum = 0.0;
        let mut fake_sum = 0.0;

        for _ in 0..num_rollouts {
            let real = ctx.model
                .discriminate(
                    target.clone(),
                    batch.src_lengths.clone(),
                    batch.tgt_mask.clone(),
                    batch.tgt_tokens.clone(),
                    true,
                )?
                .mean();

            let generated = sampler.generate(
                inner.src_tokens.clone(),
                inner.src_lengths.clone(),
                inner.src_mask.clone(),
                inner.tgt_tokens.clone(),
                ctx.rng,
            )?;
            let samples = Tensor::<B, 2, Int>::from_inner(generated.samples);

            let fake = ctx.model
                .discriminate(
                    batch.src_tokens.clone(),
                    batch.src_lengths.clone(),
                    batch.tgt_mask.clone(),
                    samples,
                    false,
                )?
                .mean();

            real_sum += scalar(&real);
            fake_sum += scalar(&fake);
            loss = loss + (real + fake) / 2.0;
        }

        ctx.apply("discriminator", loss)?;

        let n = num_rollouts as f64;
        ctx.log(DISCRIMINATOR_REAL, real_sum / n);
        ctx.log(DISCRIMINATOR_FAKE, fake_sum / n);
        ctx.log(DISCRIMINATOR, (real_sum + fake_sum) / (2.0 * n));

        tracing::debug!(
            step = ctx.step,
            real = real_sum / n,
            fake = fake_sum / n,
            "discriminator phase done"
        );
        Ok(())
    }
}
