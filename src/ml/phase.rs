// ============================================================
// Layer 5 — Phase Context
// ============================================================
// The mutable state one trainer run lends to each phase:
//
//   model    — the shared parameter set (autodiff backend)
//   optim    — the single optimiser every phase steps
//   lr       — learning rate for the current epoch
//   rng      — sampling noise for the generator
//   metrics  — where phase summaries go
//   step     — the metric time axis (read-only for phases)
//
// Each phase follows the same discipline:
//   fresh zero accumulator → add every rollout's loss →
//   apply() exactly once.
//
// Burn keeps no gradient buffers between backward passes,
// so a fresh accumulator is all "zero_grad" means here.
//
// Reference: Burn Book §5 (Custom Training Loop)

use std::marker::PhantomData;

use burn::{
    module::AutodiffModule,
    optim::{GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
    optim::LearningRate,
};
use rand::rngs::StdRng;

use crate::domain::error::TrainError;
use crate::domain::traits::MetricSink;

pub struct PhaseContext<'a, B, M, O>
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
    O: Optimizer<M, B>,
{
    pub model:   &'a mut M,
    pub optim:   &'a mut O,
    pub lr:      LearningRate,
    pub rng:     &'a mut StdRng,
    pub metrics: &'a mut dyn MetricSink,
    pub step:    usize,
    _backend:    PhantomData<B>,
}

impl<'a, B, M, O> PhaseContext<'a, B, M, O>
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
    O: Optimizer<M, B>,
{
    pub fn new(
        model:   &'a mut M,
        optim:   &'a mut O,
        lr:      LearningRate,
        rng:     &'a mut StdRng,
        metrics: &'a mut dyn MetricSink,
        step:    usize,
    ) -> Self {
        Self { model, optim, lr, rng, metrics, step, _backend: PhantomData }
    }

    /// One backward pass over `loss` and one optimiser step.
    ///
    /// A non-finite loss is refused before backward so the
    /// parameters are never touched by NaN / inf gradients.
    pub fn apply(&mut self, phase: &'static str, loss: Tensor<B, 1>) -> Result<f64, TrainError> {
        let value = scalar(&loss);
        if !value.is_finite() {
            return Err(TrainError::OptimizerStep { phase, loss: value });
        }

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &*self.model);
        *self.model = self.optim.step(self.lr, self.model.clone(), grads);

        tracing::debug!(phase, loss = value, lr = self.lr, "optimiser step");
        Ok(value)
    }

    pub fn log(&mut self, name: &str, value: f64) {
        self.metrics.log(name, self.step, value);
    }
}

/// Detached host copy of a single-element tensor
pub fn scalar<B: Backend>(t: &Tensor<B, 1>) -> f64 {
    t.clone().into_scalar().elem::<f64>()
}

/// Fresh [1] accumulator every phase starts from
pub fn zero_loss<B: Backend>(device: &B::Device) -> Tensor<B, 1> {
    Tensor::zeros([1], device)
}
