// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Epoch / batch driver around MaskGanTrainer.
//
//   mle_epochs  × every batch → trainer.pretrain_mle   (optional)
//   epochs      × every batch → trainer.run
//
// Batches come from Burn's DataLoader over MaskedDataset:
// shuffled with the configured seed, one worker, so the
// batch order is the same on every run with that seed.
//
// Key Burn insight:
//   - Training uses MyBackend (Autodiff<Wgpu>) for gradients
//   - The trainer samples on MyInnerBackend (Wgpu) internally
//     through model.valid(), so only one batcher is needed
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use std::sync::Arc;

use anyhow::{Context, Result};
use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    optim::AdamConfig,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{Batch, MaskedBatcher},
    dataset::MaskedDataset,
};
use crate::domain::metric::{DISCRIMINATOR, GENERATOR_ADVANTAGE, MLE_LOSS};
use crate::infra::{checkpoint::CheckpointManager, metrics::CsvMetricSink};
use crate::ml::model::MaskGanModel;
use crate::ml::trainer::MaskGanTrainer;

type MyBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

pub fn run_training(
    cfg:          &TrainConfig,
    dataset:      MaskedDataset,
    vocab_len:    usize,
    ckpt_manager: CheckpointManager,
) -> Result<()> {
    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);

    let model_cfg = cfg.model_config(vocab_len);
    let metrics   = CsvMetricSink::new(ckpt_manager.dir())?;

    // ── Adam optimiser, shared by all three phases ────────────────────────────
    let optim = AdamConfig::new()
        .with_epsilon(1e-8)
        .init::<MyBackend, MaskGanModel<MyBackend>>();

    let mut trainer = MaskGanTrainer::<MyBackend, _, _, _, _>::new(
        cfg.rollout_config(),
        |device, pretrain| {
            tracing::info!(
                "Model ready: vocab={}, d_model={}, d_hidden={}, pretrain={}",
                vocab_len, cfg.d_model, cfg.d_hidden, pretrain
            );
            model_cfg.init::<MyBackend>(device)
        },
        optim,
        metrics,
        ckpt_manager,
        &device,
    )?;

    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    let loader: Arc<dyn DataLoader<MyBackend, Batch<MyBackend>>> = DataLoaderBuilder::new(MaskedBatcher)
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(1)
        .set_device(device.clone())
        .build(dataset);

    // ── MLE warm-up ───────────────────────────────────────────────────────────
    for epoch in 0..cfg.mle_epochs {
        let mut loss_sum = 0.0f64;
        let mut batches  = 0usize;

        for batch in loader.iter() {
            batches += 1;
            trainer
                .pretrain_mle(epoch, &batch)
                .with_context(|| format!("MLE warm-up failed at epoch {epoch}, batch {batches}"))?;
            loss_sum += trainer.metrics().last(MLE_LOSS).unwrap_or(f64::NAN);
        }

        println!(
            "MLE   {:>3}/{} | batches={} | mle/loss={:.4} | step={}",
            epoch + 1, cfg.mle_epochs, batches, loss_sum / batches.max(1) as f64, trainer.step(),
        );
    }

    // ── Adversarial epoch loop ────────────────────────────────────────────────
    for epoch in 0..cfg.epochs {
        let mut disc_sum = 0.0f64;
        let mut adv_sum  = 0.0f64;
        let mut batches  = 0usize;

        for batch in loader.iter() {
            batches += 1;
            trainer
                .run(epoch, &batch)
                .with_context(|| format!("Training failed at epoch {epoch}, batch {batches}"))?;

            disc_sum += trainer.metrics().last(DISCRIMINATOR).unwrap_or(f64::NAN);
            adv_sum  += trainer.metrics().last(GENERATOR_ADVANTAGE).unwrap_or(f64::NAN);
        }

        let n = batches.max(1) as f64;
        println!(
            "Epoch {:>3}/{} | batches={} | discriminator={:.4} | generator/advantage={:.4} | step={}",
            epoch + 1, cfg.epochs, batches, disc_sum / n, adv_sum / n, trainer.step(),
        );
    }

    tracing::info!("Training complete!");
    Ok(())
}
