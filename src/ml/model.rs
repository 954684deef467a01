use burn::{
    nn::{
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::{activation, TensorData},
};
use rand::{distributions::Uniform, rngs::StdRng, Rng};

use crate::data::vocab::MASK_ID;
use crate::domain::error::TrainError;

// ─── Model adapter contract ───────────────────────────────────────────────────

/// Everything the generator mode returns for one rollout.
/// All tensors except `samples` are per-example, shape [batch].
#[derive(Debug, Clone)]
pub struct GeneratorOutput<B: Backend> {
    /// Policy-gradient surrogate, already weighted by the advantage.
    /// Larger is better: the generator phase negates it before descent.
    pub generator_loss: Tensor<B, 1>,
    /// Filled sequence in the layout of `tgt_tokens` ([batch, time + 1], <bos> first)
    pub samples:        Tensor<B, 2, Int>,
    /// Critic regression loss against the per-token reward
    pub critic_loss:    Tensor<B, 1>,
    /// Mean per-token reward over the filled positions
    pub avg_reward:     Tensor<B, 1>,
}

/// The mode-polymorphic model the rollout phases drive.
///
/// Implemented for every backend so the same module can run with
/// gradient tracking (autodiff backend) and, through
/// `AutodiffModule::valid`, without it.
pub trait MaskedSequenceModel<B: Backend>: Module<B> {
    /// Discriminator mode: per-example loss of classifying `sequence`
    /// ([batch, time + 1], <bos> first) as real (`real = true`) or generated.
    fn discriminate(
        &self,
        tokens:   Tensor<B, 2, Int>,
        lengths:  Tensor<B, 1, Int>,
        mask:     Tensor<B, 2, Bool>,
        sequence: Tensor<B, 2, Int>,
        real:     bool,
    ) -> Result<Tensor<B, 1>, TrainError>;

    /// Generator mode: fill the hidden positions of `tokens` and score the result.
    fn generate(
        &self,
        tokens:             Tensor<B, 2, Int>,
        lengths:            Tensor<B, 1, Int>,
        mask:               Tensor<B, 2, Bool>,
        prev_output_tokens: Tensor<B, 2, Int>,
        rng:                &mut StdRng,
    ) -> Result<GeneratorOutput<B>, TrainError>;
}

/// Teacher-forced mode used to warm the generator up before
/// adversarial training.
pub trait MaskedLanguageModel<B: Backend>: Module<B> {
    /// Per-example mean negative log-likelihood of the true tokens
    /// at hidden, in-length positions. Padding never contributes.
    fn mle_loss(
        &self,
        tokens:             Tensor<B, 2, Int>,
        lengths:            Tensor<B, 1, Int>,
        mask:               Tensor<B, 2, Bool>,
        prev_output_tokens: Tensor<B, 2, Int>,
    ) -> Result<Tensor<B, 1>, TrainError>;
}

// ─── Concrete model ───────────────────────────────────────────────────────────

#[derive(Config, Debug)]
pub struct MaskGanConfig {
    pub vocab_size:  usize,
    pub max_seq_len: usize,
    #[config(default = 128)]
    pub d_model:     usize,
    #[config(default = 256)]
    pub d_hidden:    usize,
}

impl MaskGanConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> MaskGanModel<B> {
        MaskGanModel {
            generator:          self.build_encoder(device),
            generator_head:     LinearConfig::new(self.d_hidden, self.vocab_size).init(device),
            critic_head:        LinearConfig::new(self.d_hidden, 1).init(device),
            discriminator:      self.build_encoder(device),
            discriminator_head: LinearConfig::new(self.d_hidden, 1).init(device),
            vocab_size:         self.vocab_size,
            max_seq_len:        self.max_seq_len,
        }
    }

    fn build_encoder<B: Backend>(&self, device: &B::Device) -> SpanEncoder<B> {
        SpanEncoder {
            token_embedding:    EmbeddingConfig::new(self.vocab_size, self.d_model).init(device),
            position_embedding: EmbeddingConfig::new(self.max_seq_len, self.d_model).init(device),
            projection:         LinearConfig::new(self.d_model, self.d_hidden).init(device),
            norm:               LayerNormConfig::new(self.d_hidden).init(device),
        }
    }
}

/// Token + position embedding followed by one GELU projection.
#[derive(Module, Debug)]
pub struct SpanEncoder<B: Backend> {
    pub token_embedding:    Embedding<B>,
    pub position_embedding: Embedding<B>,
    pub projection:         Linear<B>,
    pub norm:               LayerNorm<B>,
}

impl<B: Backend> SpanEncoder<B> {
    /// tokens: [batch, time] → [batch, time, d_hidden]
    pub fn forward(&self, tokens: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let [batch, time] = tokens.dims();
        let tok_emb = self.token_embedding.forward(tokens);
        let positions = Tensor::<B, 1, Int>::arange(0..time as i64, &tok_emb.device())
            .unsqueeze::<2>()
            .expand([batch, time]);
        let x = tok_emb + self.position_embedding.forward(positions);
        self.norm.forward(activation::gelu(self.projection.forward(x)))
    }
}

/// Generator, discriminator and critic sharing one parameter set.
#[derive(Module, Debug)]
pub struct MaskGanModel<B: Backend> {
    pub generator:          SpanEncoder<B>,
    pub generator_head:     Linear<B>,
    pub critic_head:        Linear<B>,
    pub discriminator:      SpanEncoder<B>,
    pub discriminator_head: Linear<B>,
    pub vocab_size:         usize,
    pub max_seq_len:        usize,
}

impl<B: Backend> MaskGanModel<B> {
    fn check_shapes(
        &self,
        tokens:   &Tensor<B, 2, Int>,
        lengths:  &Tensor<B, 1, Int>,
        mask:     &Tensor<B, 2, Bool>,
        sequence: &Tensor<B, 2, Int>,
    ) -> Result<[usize; 2], TrainError> {
        let [batch, time] = tokens.dims();
        if time == 0 || time > self.max_seq_len {
            return Err(TrainError::ModelForward(format!(
                "sequence length {time} outside 1..={}", self.max_seq_len
            )));
        }
        if lengths.dims() != [batch] || mask.dims() != [batch, time] {
            return Err(TrainError::ModelForward(format!(
                "lengths {:?} / mask {:?} do not match tokens [{batch}, {time}]",
                lengths.dims(), mask.dims()
            )));
        }
        if sequence.dims() != [batch, time + 1] {
            return Err(TrainError::ModelForward(format!(
                "sequence {:?} must be [{batch}, {}] (<bos> + tokens)",
                sequence.dims(), time + 1
            )));
        }
        Ok([batch, time])
    }

    /// Per-position real/fake logits for `scored` ([batch, time]).
    /// The context is rebuilt from the mask alone, so real and generated
    /// rows are conditioned on exactly the same visible tokens.
    fn discriminator_logits(&self, mask: Tensor<B, 2, Bool>, scored: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        let [batch, time] = scored.dims();
        let context = scored.clone().mask_fill(mask.bool_not(), MASK_ID as i64);
        let h = self.discriminator.forward(context) + self.discriminator.forward(scored);
        self.discriminator_head.forward(h).reshape([batch, time])
    }
}

impl<B: Backend> MaskedSequenceModel<B> for MaskGanModel<B> {
    fn discriminate(
        &self,
        tokens:   Tensor<B, 2, Int>,
        lengths:  Tensor<B, 1, Int>,
        mask:     Tensor<B, 2, Bool>,
        sequence: Tensor<B, 2, Int>,
        real:     bool,
    ) -> Result<Tensor<B, 1>, TrainError> {
        let [batch, time] = self.check_shapes(&tokens, &lengths, &mask, &sequence)?;
        let device = tokens.device();

        let scored = sequence.slice([0..batch, 1..time + 1]);
        let logits = self.discriminator_logits(mask.clone(), scored);

        // binary cross-entropy with the label folded into the logit sign
        let per_position = if real {
            activation::log_sigmoid(logits).neg()
        } else {
            activation::log_sigmoid(logits.neg()).neg()
        };

        let hidden = mask.bool_not().float() * valid_positions(lengths, batch, time, &device);
        Ok(masked_mean(per_position, hidden))
    }

    fn generate(
        &self,
        tokens:             Tensor<B, 2, Int>,
        lengths:            Tensor<B, 1, Int>,
        mask:               Tensor<B, 2, Bool>,
        prev_output_tokens: Tensor<B, 2, Int>,
        rng:                &mut StdRng,
    ) -> Result<GeneratorOutput<B>, TrainError> {
        let [batch, time] = self.check_shapes(&tokens, &lengths, &mask, &prev_output_tokens)?;
        let device = tokens.device();

        let target  = prev_output_tokens.clone().slice([0..batch, 1..time + 1]);
        let context = tokens.mask_where(mask.clone(), target.clone());

        let hidden = self.generator.forward(context);               // [batch, time, d_hidden]
        let logits = self.generator_head.forward(hidden.clone());   // [batch, time, vocab]

        // Gumbel-max sampling; visible positions keep the true token,
        // so only hidden ones need noise
        let hidden_flags: Vec<bool> = mask
            .clone()
            .int()
            .into_data()
            .iter::<i64>()
            .map(|visible| visible == 0)
            .collect();
        let noise   = gumbel_noise::<B>(&hidden_flags, [batch, time, self.vocab_size], rng, &device);
        let sampled = (logits.clone().detach() + noise).argmax(2).reshape([batch, time]);
        let filled  = sampled.mask_where(mask.clone(), target);

        let log_probs = activation::log_softmax(logits, 2)
            .gather(2, filled.clone().unsqueeze_dim::<3>(2))
            .reshape([batch, time]);

        let reward = activation::log_sigmoid(self.discriminator_logits(mask.clone(), filled.clone()))
            .detach();
        let values = self.critic_head.forward(hidden.detach()).reshape([batch, time]);

        let valid = valid_positions(lengths, batch, time, &device);
        let fill  = mask.bool_not().float() * valid.clone();

        let advantage      = reward.clone() - values.clone().detach();
        let generator_loss = masked_mean(log_probs * advantage, fill.clone());
        let error          = values - reward.clone();
        let critic_loss    = masked_mean(error.clone() * error, valid);
        let avg_reward     = masked_mean(reward, fill);

        let bos     = prev_output_tokens.slice([0..batch, 0..1]);
        let samples = Tensor::cat(vec![bos, filled], 1);

        Ok(GeneratorOutput { generator_loss, samples, critic_loss, avg_reward })
    }
}

impl<B: Backend> MaskedLanguageModel<B> for MaskGanModel<B> {
    fn mle_loss(
        &self,
        tokens:             Tensor<B, 2, Int>,
        lengths:            Tensor<B, 1, Int>,
        mask:               Tensor<B, 2, Bool>,
        prev_output_tokens: Tensor<B, 2, Int>,
    ) -> Result<Tensor<B, 1>, TrainError> {
        let [batch, time] = self.check_shapes(&tokens, &lengths, &mask, &prev_output_tokens)?;
        let device = tokens.device();

        let target  = prev_output_tokens.slice([0..batch, 1..time + 1]);
        let context = tokens.mask_where(mask.clone(), target.clone());
        let logits  = self.generator_head.forward(self.generator.forward(context));

        let nll = activation::log_softmax(logits, 2)
            .gather(2, target.unsqueeze_dim::<3>(2))
            .reshape([batch, time])
            .neg();

        let fill = mask.bool_not().float() * valid_positions(lengths, batch, time, &device);
        Ok(masked_mean(nll, fill))
    }
}

/// 1.0 where the position index is below the row's length, else 0.0
fn valid_positions<B: Backend>(
    lengths: Tensor<B, 1, Int>,
    batch:   usize,
    time:    usize,
    device:  &B::Device,
) -> Tensor<B, 2> {
    let positions = Tensor::<B, 1, Int>::arange(0..time as i64, device)
        .unsqueeze::<2>()
        .expand([batch, time]);
    positions
        .lower(lengths.reshape([batch, 1]).expand([batch, time]))
        .float()
}

/// Weighted mean over the time axis: [batch, time] → [batch].
/// Rows without any weight yield 0.
fn masked_mean<B: Backend>(values: Tensor<B, 2>, weights: Tensor<B, 2>) -> Tensor<B, 1> {
    let [batch, _] = values.dims();
    let total = (values * weights.clone()).sum_dim(1).reshape([batch]);
    let count = weights.sum_dim(1).reshape([batch]).clamp_min(1.0);
    total / count
}

/// Gumbel(0, 1) noise of `shape` ([batch, time, vocab]) for the
/// positions flagged in `hidden` (row-major [batch, time]); every
/// other position gets zeros.
fn gumbel_noise<B: Backend>(
    hidden: &[bool],
    shape:  [usize; 3],
    rng:    &mut StdRng,
    device: &B::Device,
) -> Tensor<B, 3> {
    let vocab   = shape[2];
    let uniform = Uniform::new(f32::EPSILON, 1.0);

    let mut values: Vec<f32> = Vec::with_capacity(hidden.len() * vocab);
    for &draw in hidden {
        if draw {
            values.extend((0..vocab).map(|_| -(-rng.sample(uniform).ln()).ln()));
        } else {
            values.resize(values.len() + vocab, 0.0);
        }
    }
    Tensor::from_data(TensorData::new(values, shape), device)
}
