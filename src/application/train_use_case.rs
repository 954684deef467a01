// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 0: Validate the config
//   Step 1: Load .txt files             (Layer 4 - data)
//   Step 2: Clean the text              (Layer 4 - data)
//   Step 3: Build / load tokenizer      (Layer 6 - infra)
//   Step 4: Encode and chunk            (Layer 4 - data)
//   Step 5: Mask each chunk             (Layer 4 - data)
//   Step 6: Save config                 (Layer 6 - infra)
//   Step 7: MLE warm-up, then the rollout trainer (Layer 5 - ml)
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::{bail, Result};
use burn::data::dataset::Dataset;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::data::{
    chunker::Chunker,
    dataset::MaskedDataset,
    loader::TextLoader,
    masker::{MaskStrategy, Masker},
    preprocessor::Preprocessor,
    vocab::encode,
};
use crate::domain::traits::DocumentSource;
use crate::infra::{checkpoint::CheckpointManager, tokenizer_store::TokenizerStore};
use crate::ml::model::MaskGanConfig;
use crate::ml::trainer::RolloutConfig;
use crate::ml::training_loop::run_training;

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything a run needs, from corpus location to rollout count.
// Saved as train_config.json so `infill` can rebuild the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub corpus_dir:     String,
    pub checkpoint_dir: String,
    pub max_seq_len:    usize,
    pub chunk_overlap:  usize,
    pub batch_size:     usize,
    pub epochs:         usize,
    pub vocab_size:     usize,
    pub d_model:        usize,
    pub d_hidden:       usize,
    pub mask:           MaskStrategy,

    /// Teacher-forced generator epochs before adversarial training
    #[serde(default)]
    pub mle_epochs:     usize,

    pub num_rollouts:             usize,
    pub lr:                       f64,
    pub lr_decay:                 f64,
    pub pretrain:                 bool,
    pub critic_phase:             bool,
    pub full_context_probability: f64,
    pub seed:                     u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            corpus_dir:     "data/corpus".to_string(),
            checkpoint_dir: "checkpoints".to_string(),
            max_seq_len:    40,
            chunk_overlap:  10,
            batch_size:     16,
            epochs:         10,
            vocab_size:     10_000,
            d_model:        128,
            d_hidden:       256,
            mask:           MaskStrategy::Span { ratio: 0.5 },

            mle_epochs:     0,

            num_rollouts:             50,
            lr:                       1e-3,
            lr_decay:                 0.5,
            pretrain:                 false,
            critic_phase:             false,
            full_context_probability: 0.3,
            seed:                     42,
        }
    }
}

impl TrainConfig {
    /// Reject values the data pipeline cannot work with.
    /// Rollout hyperparameters are checked by RolloutConfig::validate.
    pub fn validate(&self) -> Result<()> {
        if self.max_seq_len == 0 {
            bail!("max_seq_len must be at least 1");
        }
        if self.batch_size == 0 {
            bail!("batch_size must be at least 1");
        }
        if let MaskStrategy::Span { ratio } = self.mask {
            if !(0.0..=1.0).contains(&ratio) {
                bail!("mask ratio must be in [0, 1], got {ratio}");
            }
        }
        Ok(())
    }

    pub fn rollout_config(&self) -> RolloutConfig {
        RolloutConfig::new()
            .with_num_rollouts(self.num_rollouts)
            .with_learning_rate(self.lr)
            .with_lr_decay(self.lr_decay)
            .with_pretrain(self.pretrain)
            .with_critic_phase(self.critic_phase)
            .with_full_context_probability(self.full_context_probability)
            .with_seed(self.seed)
    }

    /// Model architecture for a vocabulary of `vocab_len` entries
    pub fn model_config(&self, vocab_len: usize) -> MaskGanConfig {
        MaskGanConfig::new(vocab_len, self.max_seq_len)
            .with_d_model(self.d_model)
            .with_d_hidden(self.d_hidden)
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;

        // ── Step 0: Reject unusable settings before touching disk ────────────
        cfg.validate()?;
        cfg.rollout_config().validate()?;

        // ── Step 1: Load all .txt documents ──────────────────────────────────
        tracing::info!("Loading .txt files from '{}'", cfg.corpus_dir);
        let raw_docs = TextLoader::new(&cfg.corpus_dir).load_all()?;
        tracing::info!("Loaded {} documents", raw_docs.len());

        // ── Step 2: Clean / normalise text ────────────────────────────────────
        let preprocessor = Preprocessor::new();
        let clean_docs: Vec<String> = raw_docs
            .iter()
            .map(|d| preprocessor.clean(&d.text))
            .collect();

        // ── Step 3: Build / load tokenizer ────────────────────────────────────
        let tokenizer = TokenizerStore::new(&cfg.checkpoint_dir).load_or_build(&clean_docs, cfg.vocab_size)?;

        // ── Step 4 + 5: Encode, chunk and mask ───────────────────────────────
        let encoded = clean_docs
            .iter()
            .map(|doc| encode(&tokenizer, doc))
            .collect::<Result<Vec<_>>>()?;
        let dataset = build_dataset(&encoded, cfg);
        tracing::info!("Built {} masked sequences", dataset.len());
        if dataset.is_empty() {
            bail!("No training text found in '{}'", cfg.corpus_dir);
        }

        // ── Step 6: Save config for inference ─────────────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir);
        ckpt_manager.save_config(cfg)?;

        // ── Step 7: Run the trainer (Layer 5) ─────────────────────────────────
        run_training(cfg, dataset, tokenizer.get_vocab_size(false), ckpt_manager)
    }
}

/// Cut every encoded document into windows of at most
/// `max_seq_len` tokens and mask each window once.
fn build_dataset(docs: &[Vec<u32>], cfg: &TrainConfig) -> MaskedDataset {
    let overlap = cfg.chunk_overlap.min(cfg.max_seq_len.saturating_sub(1));
    let chunker = Chunker::new(cfg.max_seq_len, overlap);
    let masker  = Masker::new(cfg.mask);
    let mut rng = StdRng::seed_from_u64(cfg.seed);

    let samples = docs
        .iter()
        .flat_map(|doc| chunker.chunk(doc))
        .filter_map(|window| masker.mask(&window, &mut rng))
        .collect();

    MaskedDataset::new(samples)
}
