// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `train` and `infill`
// and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};
use crate::application::train_use_case::TrainConfig;
use crate::data::masker::MaskStrategy;

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the MaskGAN generator, discriminator and critic on .txt files
    Train(TrainArgs),

    /// Fill in the last words of a text using a trained checkpoint
    Infill(InfillArgs),
}

/// Which positions of each training sequence are hidden
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum MaskKind {
    /// The last --mask-tokens tokens
    End,
    /// One random contiguous span covering --mask-ratio of the sequence
    Span,
}

/// All arguments for the `train` command.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory containing .txt files to train on
    #[arg(long, default_value = "data/corpus")]
    pub corpus_dir: String,

    /// Directory for checkpoints, vocabulary, config and metrics
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Maximum number of tokens per training sequence
    #[arg(long, default_value_t = 40)]
    pub max_seq_len: usize,

    /// Tokens shared by consecutive windows of a long document
    #[arg(long, default_value_t = 10)]
    pub chunk_overlap: usize,

    /// Number of sequences per batch
    #[arg(long, default_value_t = 16)]
    pub batch_size: usize,

    /// Number of full passes through the corpus
    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    /// Teacher-forced generator epochs run before adversarial training
    #[arg(long, default_value_t = 0)]
    pub mle_epochs: usize,

    /// Largest vocabulary size, special tokens included
    #[arg(long, default_value_t = 10_000)]
    pub vocab_size: usize,

    /// Embedding dimension
    #[arg(long, default_value_t = 128)]
    pub d_model: usize,

    /// Hidden dimension of the encoders and heads
    #[arg(long, default_value_t = 256)]
    pub d_hidden: usize,

    #[arg(long, value_enum, default_value_t = MaskKind::Span)]
    pub mask: MaskKind,

    /// Hidden tokens per sequence with --mask end
    #[arg(long, default_value_t = 5)]
    pub mask_tokens: usize,

    /// Hidden fraction of each sequence with --mask span
    #[arg(long, default_value_t = 0.5)]
    pub mask_ratio: f64,

    /// Rollouts accumulated before each optimiser step
    #[arg(long, default_value_t = 50)]
    pub num_rollouts: usize,

    /// Learning rate at epoch 0
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Learning rate multiplier applied once per epoch
    #[arg(long, default_value_t = 0.5)]
    pub lr_decay: f64,

    /// Train the generator without the critic baseline
    #[arg(long)]
    pub pretrain: bool,

    /// Also run the standalone critic phase after each generator phase
    #[arg(long)]
    pub critic_phase: bool,

    /// Chance a critic rollout sees every true token
    #[arg(long, default_value_t = 0.3)]
    pub full_context_probability: f64,

    /// Seed for sampling, masking and shuffling
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// This is the boundary between Layer 1 and Layer 2 —
/// the application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        let mask = match a.mask {
            MaskKind::End  => MaskStrategy::End { n_tokens: a.mask_tokens },
            MaskKind::Span => MaskStrategy::Span { ratio: a.mask_ratio },
        };
        TrainConfig {
            corpus_dir:     a.corpus_dir,
            checkpoint_dir: a.checkpoint_dir,
            max_seq_len:    a.max_seq_len,
            chunk_overlap:  a.chunk_overlap,
            batch_size:     a.batch_size,
            epochs:         a.epochs,
            vocab_size:     a.vocab_size,
            d_model:        a.d_model,
            d_hidden:       a.d_hidden,
            mask,
            mle_epochs:     a.mle_epochs,

            num_rollouts:             a.num_rollouts,
            lr:                       a.lr,
            lr_decay:                 a.lr_decay,
            pretrain:                 a.pretrain,
            critic_phase:             a.critic_phase,
            full_context_probability: a.full_context_probability,
            seed:                     a.seed,
        }
    }
}

/// All arguments for the `infill` command
#[derive(Args, Debug)]
pub struct InfillArgs {
    /// Text whose last words should be regenerated
    #[arg(long)]
    pub text: String,

    /// How many trailing words to hide and regenerate
    #[arg(long, default_value_t = 3)]
    pub hide_last: usize,

    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,
}
