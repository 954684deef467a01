// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Loads the trained parameter set on the plain (non-autodiff)
// backend and lets the generator fill hidden positions.
use anyhow::{bail, Result};
use burn::{data::dataloader::batcher::Batcher, prelude::*};
use rand::{rngs::StdRng, SeedableRng};

use crate::data::batcher::{Batch, MaskedBatcher};
use crate::data::masker::MaskedSample;
use crate::infra::checkpoint::{CheckpointManager, ParameterStore};
use crate::ml::model::{MaskGanModel, MaskedSequenceModel};
use crate::ml::trainer::CHECKPOINT_NAME;

type InferBackend = burn::backend::Wgpu;

pub struct Inferencer {
    model:       MaskGanModel<InferBackend>,
    max_seq_len: usize,
    device:      burn::backend::wgpu::WgpuDevice,
    rng:         StdRng,
}

impl Inferencer {
    pub fn from_checkpoint(ckpt_manager: &CheckpointManager, vocab_len: usize) -> Result<Self> {
        let device = burn::backend::wgpu::WgpuDevice::default();
        let cfg    = ckpt_manager.load_config()?;

        if !ckpt_manager.has_checkpoint(CHECKPOINT_NAME) {
            bail!(
                "No '{}' checkpoint in '{}'. Have you trained the model first?",
                CHECKPOINT_NAME,
                ckpt_manager.dir().display()
            );
        }

        let model = cfg.model_config(vocab_len).init::<InferBackend>(&device);
        let model = ckpt_manager.load::<InferBackend, _>(CHECKPOINT_NAME, model, &device)?;
        tracing::info!("Model loaded from checkpoint");

        Ok(Self {
            model,
            max_seq_len: cfg.max_seq_len,
            device,
            rng: StdRng::seed_from_u64(cfg.seed),
        })
    }

    pub fn max_seq_len(&self) -> usize {
        self.max_seq_len
    }

    /// Token ids of `sample` with every hidden position filled
    /// by the generator (visible positions are returned as is).
    pub fn fill(&mut self, sample: &MaskedSample) -> Result<Vec<u32>> {
        let batch: Batch<InferBackend> = MaskedBatcher.batch(vec![sample.clone()], &self.device);
        let (src, src_lengths, src_mask, tgt, _, _) = batch.into_parts();

        let out = self.model.generate(src, src_lengths, src_mask, tgt, &mut self.rng)?;

        // drop the leading <bos>
        let ids = out
            .samples
            .into_data()
            .iter::<i64>()
            .skip(1)
            .map(|t| t as u32)
            .collect();
        Ok(ids)
    }
}
