// ============================================================
// Layer 5 — MaskGAN Rollout Trainer
// ============================================================
// Owns everything one adversarial training run mutates:
//
//   model       — shared generator / discriminator / critic params
//   optim       — ONE optimiser stepped by every phase
//   metrics     — sink for per-phase summaries
//   store       — checkpoint persistence under the key "mgan"
//   step        — run counter, the metric time axis
//
// One call to run(epoch, batch):
//
//   lr = learning_rate · lr_decay^epoch
//   ── Discriminator phase ──  N rollouts → 1 step
//   ── Generator phase ──────  N rollouts → 1 step
//   ── Critic phase ─────────  N rollouts → 1 step   (optional)
//   checkpoint "mgan"
//   step += 1
//
// pretrain_mle(epoch, batch) is the optional warm-up before
// those runs: one teacher-forced MLE step, then the same
// checkpoint and step bookkeeping.
//
// Any error aborts the run where it happens: later phases do
// not execute, nothing is checkpointed and the step counter
// stays put. Parameters already updated by earlier phases of
// the failed run are not rolled back.
//
// Key Burn insight:
//   - M runs on the autodiff backend for the learning passes
//   - M::InnerModule (from model.valid()) samples without any
//     gradient bookkeeping inside the discriminator phase
//
// Reference: Burn Book §5 (Custom Training Loop)
//            Yu et al. (2017) SeqGAN, Fedus et al. (2018) MaskGAN

use std::marker::PhantomData;

use burn::{
    module::AutodiffModule,
    optim::Optimizer,
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use rand::{rngs::StdRng, SeedableRng};

use crate::data::batcher::Batch;
use crate::domain::error::TrainError;
use crate::domain::traits::MetricSink;
use crate::infra::checkpoint::ParameterStore;
use crate::ml::critic_phase::CriticPhase;
use crate::ml::discriminator_phase::DiscriminatorPhase;
use crate::ml::generator_phase::GeneratorPhase;
use crate::ml::mle_phase::MlePhase;
use crate::ml::model::{MaskedLanguageModel, MaskedSequenceModel};
use crate::ml::phase::PhaseContext;
use crate::ml::schedule::ExponentialDecay;

/// Parameter-store key the trainer loads from and checkpoints to
pub const CHECKPOINT_NAME: &str = "mgan";

// ─── Configuration ────────────────────────────────────────────────────────────
#[derive(Config, Debug)]
pub struct RolloutConfig {
    /// Rollouts accumulated before each phase's single optimiser step
    #[config(default = 50)]
    pub num_rollouts: usize,
    #[config(default = 1e-3)]
    pub learning_rate: f64,
    /// Per-epoch multiplicative decay of the learning rate
    #[config(default = 0.5)]
    pub lr_decay: f64,
    /// Train the generator without the critic baseline
    #[config(default = false)]
    pub pretrain: bool,
    /// Run the standalone critic phase after the generator phase
    #[config(default = false)]
    pub critic_phase: bool,
    /// Chance, per critic rollout, of revealing every true token
    #[config(default = 0.3)]
    pub full_context_probability: f64,
    /// Seed of the sampling RNG
    #[config(default = 42)]
    pub seed: u64,
}

impl RolloutConfig {
    pub fn validate(&self) -> Result<(), TrainError> {
        if self.num_rollouts == 0 {
            return Err(TrainError::Configuration("num_rollouts must be at least 1".into()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(TrainError::Configuration(format!(
                "learning_rate must be positive, got {}", self.learning_rate
            )));
        }
        if !(self.lr_decay > 0.0 && self.lr_decay <= 1.0) {
            return Err(TrainError::Configuration(format!(
                "lr_decay must be in (0, 1], got {}", self.lr_decay
            )));
        }
        if !(0.0..=1.0).contains(&self.full_context_probability) {
            return Err(TrainError::Configuration(format!(
                "full_context_probability must be in [0, 1], got {}",
                self.full_context_probability
            )));
        }
        Ok(())
    }

    pub fn schedule(&self) -> ExponentialDecay {
        ExponentialDecay::new(self.learning_rate, self.lr_decay)
    }
}

// ─── Trainer ──────────────────────────────────────────────────────────────────
pub struct MaskGanTrainer<B, M, O, S, P>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + MaskedSequenceModel<B>,
    M::InnerModule: MaskedSequenceModel<B::InnerBackend>,
    O: Optimizer<M, B>,
    S: MetricSink,
    P: ParameterStore,
{
    model:         M,
    optim:         O,
    metrics:       S,
    store:         P,
    config:        RolloutConfig,
    schedule:      ExponentialDecay,
    rng:           StdRng,
    step:          usize,
    discriminator: DiscriminatorPhase,
    generator:     GeneratorPhase,
    critic:        Option<CriticPhase>,
    _backend:      PhantomData<B>,
}

impl<B, M, O, S, P> MaskGanTrainer<B, M, O, S, P>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + MaskedSequenceModel<B>,
    M::InnerModule: MaskedSequenceModel<B::InnerBackend>,
    O: Optimizer<M, B>,
    S: MetricSink,
    P: ParameterStore,
{
    /// Build the model once through `build_model(device, pretrain)`
    /// and restore the "mgan" checkpoint if the store has one.
    pub fn new<F>(
        config:      RolloutConfig,
        build_model: F,
        optim:       O,
        metrics:     S,
        store:       P,
        device:      &B::Device,
    ) -> Result<Self, TrainError>
    where
        F: FnOnce(&B::Device, bool) -> M,
    {
        config.validate()?;

        let model = build_model(device, config.pretrain);
        let model = store.load::<B, M>(CHECKPOINT_NAME, model, device)?;

        tracing::info!(
            rollouts = config.num_rollouts,
            pretrain = config.pretrain,
            critic_phase = config.critic_phase,
            "MaskGAN trainer ready"
        );

        Ok(Self {
            model,
            optim,
            metrics,
            store,
            schedule:      config.schedule(),
            rng:           StdRng::seed_from_u64(config.seed),
            step:          0,
            discriminator: DiscriminatorPhase,
            generator:     GeneratorPhase::new(config.pretrain),
            critic:        config
                .critic_phase
                .then(|| CriticPhase::new(config.full_context_probability)),
            config,
            _backend:      PhantomData,
        })
    }

    /// One adversarial training step over `batch`.
    pub fn run(&mut self, epoch: usize, batch: &Batch<B>) -> Result<(), TrainError> {
        batch.validate()?;

        let lr = self.schedule.learning_rate(epoch);
        let n  = self.config.num_rollouts;

        {
            let mut ctx = PhaseContext::new(
                &mut self.model,
                &mut self.optim,
                lr,
                &mut self.rng,
                &mut self.metrics,
                self.step,
            );

            // ── Step 1: discriminator ───────────────────────────────────────
            self.discriminator.execute(&mut ctx, batch, n)?;

            // ── Step 2: generator (+ critic baseline) ───────────────────────
            self.generator.execute(&mut ctx, batch, n)?;

            // ── Step 3: standalone critic ───────────────────────────────────
            if let Some(critic) = &self.critic {
                critic.execute(&mut ctx, batch, n)?;
            }
        }

        self.store.checkpoint::<B, M>(CHECKPOINT_NAME, &self.model)?;
        self.step += 1;

        tracing::info!(epoch, step = self.step, lr, "trainer run complete");
        Ok(())
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn into_model(self) -> M {
        self.model
    }

    /// Number of successful runs so far
    pub fn step(&self) -> usize {
        self.step
    }

    pub fn metrics(&self) -> &S {
        &self.metrics
    }

    pub fn store(&self) -> &P {
        &self.store
    }

    pub fn config(&self) -> &RolloutConfig {
        &self.config
    }
}

impl<B, M, O, S, P> MaskGanTrainer<B, M, O, S, P>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + MaskedSequenceModel<B> + MaskedLanguageModel<B>,
    M::InnerModule: MaskedSequenceModel<B::InnerBackend>,
    O: Optimizer<M, B>,
    S: MetricSink,
    P: ParameterStore,
{
    /// One maximum-likelihood warm-up step over `batch`.
    pub fn pretrain_mle(&mut self, epoch: usize, batch: &Batch<B>) -> Result<(), TrainError> {
        batch.validate()?;

        let lr = self.schedule.learning_rate(epoch);
        {
            let mut ctx = PhaseContext::new(
                &mut self.model,
                &mut self.optim,
                lr,
                &mut self.rng,
                &mut self.metrics,
                self.step,
            );
            MlePhase.execute(&mut ctx, batch)?;
        }

        self.store.checkpoint::<B, M>(CHECKPOINT_NAME, &self.model)?;
        self.step += 1;

        tracing::info!(epoch, step = self.step, lr, "mle warm-up step complete");
        Ok(())
    }
}
