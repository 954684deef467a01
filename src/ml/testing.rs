// Test doubles for the rollout phases and the trainer.
//
// ScriptedModel owns a single scalar parameter `w`; every loss it
// reports is `w · scripted_value`, so tests can predict both the
// logged metrics and the exact gradient an optimiser step sees.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use burn::{
    backend::{Autodiff, NdArray},
    data::dataloader::batcher::Batcher,
    module::{AutodiffModule, Ignored, Param},
    optim::{GradientsParams, LearningRate, MultiGradientsParams, Optimizer, SgdConfig},
    prelude::*,
    tensor::{backend::AutodiffBackend, TensorData},
};
use rand::{rngs::StdRng, SeedableRng};

use crate::data::batcher::{Batch, MaskedBatcher};
use crate::data::masker::MaskedSample;
use crate::data::vocab::{BOS_ID, MASK_ID};
use crate::domain::error::TrainError;
use crate::domain::traits::MetricSink;
use crate::infra::checkpoint::ParameterStore;
use crate::ml::model::{GeneratorOutput, MaskedLanguageModel, MaskedSequenceModel};
use crate::ml::phase::PhaseContext;

pub type TestBackend = Autodiff<NdArray>;

// ─── Script ───────────────────────────────────────────────────────────────────
/// Per-call values cycled by call index; an empty list means 1.0
/// for losses and 0.0 for rewards.
#[derive(Debug, Default)]
pub struct Script {
    pub real_losses:      Vec<f64>,
    pub fake_losses:      Vec<f64>,
    pub generator_losses: Vec<f64>,
    pub critic_losses:    Vec<f64>,
    pub mle_losses:       Vec<f64>,
    pub rewards:          Vec<f64>,
    pub fail_discriminator: bool,

    pub real_calls:               AtomicUsize,
    pub fake_calls:               AtomicUsize,
    pub tracked_generate_calls:   AtomicUsize,
    pub untracked_generate_calls: AtomicUsize,
    pub full_context_calls:       AtomicUsize,
    pub mle_calls:                AtomicUsize,
}

fn pick(values: &[f64], index: usize, default: f64) -> f64 {
    if values.is_empty() { default } else { values[index % values.len()] }
}

// ─── ScriptedModel ────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct ScriptedModel<B: Backend> {
    pub weight: Param<Tensor<B, 1>>,
    pub script: Ignored<Arc<Script>>,
}

impl<B: Backend> ScriptedModel<B> {
    pub fn new(script: Arc<Script>, device: &B::Device) -> Self {
        Self {
            weight: Param::from_tensor(Tensor::ones([1], device)),
            script: Ignored(script),
        }
    }

    pub fn weight_value(&self) -> f64 {
        self.weight.val().into_scalar().elem::<f64>()
    }

    fn scaled(&self, value: f64) -> Tensor<B, 1> {
        self.weight.val().mul_scalar(value)
    }
}

impl<B: Backend> MaskedSequenceModel<B> for ScriptedModel<B> {
    fn discriminate(
        &self,
        _tokens:   Tensor<B, 2, Int>,
        _lengths:  Tensor<B, 1, Int>,
        _mask:     Tensor<B, 2, Bool>,
        _sequence: Tensor<B, 2, Int>,
        real:      bool,
    ) -> Result<Tensor<B, 1>, TrainError> {
        let script = &self.script.0;
        if script.fail_discriminator {
            return Err(TrainError::ModelForward("scripted discriminator failure".into()));
        }
        let value = if real {
            pick(&script.real_losses, script.real_calls.fetch_add(1, Ordering::SeqCst), 1.0)
        } else {
            pick(&script.fake_losses, script.fake_calls.fetch_add(1, Ordering::SeqCst), 1.0)
        };
        Ok(self.scaled(value))
    }

    fn generate(
        &self,
        _tokens:            Tensor<B, 2, Int>,
        _lengths:           Tensor<B, 1, Int>,
        mask:               Tensor<B, 2, Bool>,
        prev_output_tokens: Tensor<B, 2, Int>,
        _rng:               &mut StdRng,
    ) -> Result<GeneratorOutput<B>, TrainError> {
        let script = &self.script.0;

        // inference-only calls run on a backend that never tracks gradients
        if !self.weight.val().is_require_grad() {
            script.untracked_generate_calls.fetch_add(1, Ordering::SeqCst);
            return Ok(GeneratorOutput {
                generator_loss: self.scaled(0.0),
                samples:        prev_output_tokens,
                critic_loss:    self.scaled(0.0),
                avg_reward:     self.scaled(0.0),
            });
        }

        let [batch, time] = mask.dims();
        let visible = mask.int().sum().into_scalar().elem::<i64>();
        if visible == (batch * time) as i64 {
            script.full_context_calls.fetch_add(1, Ordering::SeqCst);
        }

        let i      = script.tracked_generate_calls.fetch_add(1, Ordering::SeqCst);
        let reward = pick(&script.rewards, i, 0.0);
        let device = self.weight.val().device();

        Ok(GeneratorOutput {
            generator_loss: self.scaled(pick(&script.generator_losses, i, 1.0)),
            samples:        prev_output_tokens,
            critic_loss:    self.scaled(pick(&script.critic_losses, i, 1.0)),
            avg_reward:     Tensor::from_data(TensorData::new(vec![reward], [1]), &device),
        })
    }
}

impl<B: Backend> MaskedLanguageModel<B> for ScriptedModel<B> {
    fn mle_loss(
        &self,
        _tokens:             Tensor<B, 2, Int>,
        _lengths:            Tensor<B, 1, Int>,
        _mask:               Tensor<B, 2, Bool>,
        _prev_output_tokens: Tensor<B, 2, Int>,
    ) -> Result<Tensor<B, 1>, TrainError> {
        let script = &self.script.0;
        let i = script.mle_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.scaled(pick(&script.mle_losses, i, 1.0)))
    }
}

// ─── CountingOptimizer ────────────────────────────────────────────────────────
/// Forwards to `inner` and counts how many steps were taken.
#[derive(Clone)]
pub struct CountingOptimizer<O> {
    inner: O,
    steps: Arc<AtomicUsize>,
}

impl<O> CountingOptimizer<O> {
    pub fn new(inner: O) -> Self {
        Self { inner, steps: Arc::new(AtomicUsize::new(0)) }
    }

    pub fn counter(&self) -> Arc<AtomicUsize> {
        self.steps.clone()
    }

    pub fn steps(&self) -> usize {
        self.steps.load(Ordering::SeqCst)
    }
}

impl<M, B, O> Optimizer<M, B> for CountingOptimizer<O>
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
    O: Optimizer<M, B>,
{
    type Record = O::Record;

    fn step(&mut self, lr: LearningRate, module: M, grads: GradientsParams) -> M {
        self.steps.fetch_add(1, Ordering::SeqCst);
        self.inner.step(lr, module, grads)
    }

    fn step_multi(&mut self, lr: LearningRate, module: M, grads: MultiGradientsParams) -> M {
        self.steps.fetch_add(1, Ordering::SeqCst);
        self.inner.step_multi(lr, module, grads)
    }

    fn to_record(&self) -> Self::Record {
        self.inner.to_record()
    }

    fn load_record(mut self, record: Self::Record) -> Self {
        self.inner = self.inner.load_record(record);
        self
    }
}

// ─── RecordingStore ───────────────────────────────────────────────────────────
/// Parameter store that keeps nothing and counts calls.
#[derive(Debug, Clone, Default)]
pub struct RecordingStore {
    pub loads:       Arc<AtomicUsize>,
    pub checkpoints: Arc<AtomicUsize>,
}

impl ParameterStore for RecordingStore {
    fn load<B: Backend, M: Module<B>>(
        &self,
        _name:   &str,
        model:   M,
        _device: &B::Device,
    ) -> Result<M, TrainError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(model)
    }

    fn checkpoint<B: Backend, M: Module<B>>(&self, _name: &str, _model: &M) -> Result<(), TrainError> {
        self.checkpoints.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ─── Fixtures ─────────────────────────────────────────────────────────────────
/// Two rows: one four-token sequence with its tail hidden,
/// one two-token sequence padded to four.
pub fn sample_batch(device: &<TestBackend as Backend>::Device) -> Batch<TestBackend> {
    let items = vec![
        MaskedSample {
            src:     vec![5, 6, MASK_ID, MASK_ID],
            tgt:     vec![BOS_ID, 5, 6, 7, 8],
            visible: vec![true, true, false, false],
        },
        MaskedSample {
            src:     vec![9, MASK_ID],
            tgt:     vec![BOS_ID, 9, 10],
            visible: vec![true, false],
        },
    ];
    MaskedBatcher.batch(items, device)
}

pub struct PhaseFixture<O> {
    pub model:  ScriptedModel<TestBackend>,
    pub optim:  CountingOptimizer<O>,
    pub rng:    StdRng,
    pub script: Arc<Script>,
}

impl<O: Optimizer<ScriptedModel<TestBackend>, TestBackend>> PhaseFixture<O> {
    pub fn context<'a>(
        &'a mut self,
        sink: &'a mut dyn MetricSink,
        lr:   LearningRate,
    ) -> PhaseContext<'a, TestBackend, ScriptedModel<TestBackend>, CountingOptimizer<O>> {
        PhaseContext::new(&mut self.model, &mut self.optim, lr, &mut self.rng, sink, 0)
    }

    pub fn steps(&self) -> usize {
        self.optim.steps()
    }
}

/// Scripted model + plain SGD + a sample batch
pub fn phase_fixture(
    script: Script,
) -> (
    PhaseFixture<impl Optimizer<ScriptedModel<TestBackend>, TestBackend>>,
    Batch<TestBackend>,
) {
    let device = Default::default();
    let script = Arc::new(script);
    let optim  = SgdConfig::new().init::<TestBackend, ScriptedModel<TestBackend>>();

    let fixture = PhaseFixture {
        model:  ScriptedModel::new(script.clone(), &device),
        optim:  CountingOptimizer::new(optim),
        rng:    StdRng::seed_from_u64(0),
        script,
    };
    (fixture, sample_batch(&device))
}
