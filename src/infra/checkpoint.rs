// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores the trainer's parameter set using Burn's
// NamedMpkGzFileRecorder at full precision.
//
// What lives in the checkpoint directory:
//   mgan.mpk.gz        — every learned parameter (generator,
//                        discriminator and critic together)
//   train_config.json  — run configuration, so `infill` can
//                        rebuild the exact architecture
//   tokenizer.json     — see tokenizer_store.rs
//   metrics.csv        — see metrics.rs
//
// Checkpoint writes are all-or-nothing:
//
//   1. record → <dir>/mgan-partial.mpk.gz
//   2. rename   mgan-partial.mpk.gz → mgan.mpk.gz
//
// A crash between the two steps leaves the previous
// mgan.mpk.gz untouched. The recorder replaces whatever
// extension the path has, so staging names never contain a dot.
//
// Reference: Burn Book §5 (Records and Checkpointing)
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkGzFileRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::domain::error::TrainError;

type ParamRecorder = NamedMpkGzFileRecorder<FullPrecisionSettings>;

const RECORD_EXTENSION: &str = "mpk.gz";

// ─── ParameterStore ───────────────────────────────────────────────────────────
/// Named persistence for a module's parameters.
pub trait ParameterStore {
    /// Restore `name` into `model`. A store without that entry
    /// hands the model back unchanged.
    fn load<B: Backend, M: Module<B>>(
        &self,
        name:   &str,
        model:  M,
        device: &B::Device,
    ) -> Result<M, TrainError>;

    /// Overwrite `name` with the current parameters of `model`.
    fn checkpoint<B: Backend, M: Module<B>>(&self, name: &str, model: &M) -> Result<(), TrainError>;
}

/// File-backed parameter store plus the run's JSON config.
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    /// Path to the directory where checkpoints are stored
    dir: PathBuf,
}

impl CheckpointManager {
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        fs::create_dir_all(&dir).ok();
        Self { dir }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    /// Final on-disk location of checkpoint `name`
    pub fn checkpoint_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{RECORD_EXTENSION}"))
    }

    pub fn has_checkpoint(&self, name: &str) -> bool {
        self.checkpoint_path(name).exists()
    }

    /// Save the run configuration to JSON.
    ///
    /// Written before training starts so the inferencer can
    /// reconstruct the exact model architecture.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join("train_config.json");
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join("train_config.json");

        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read config from '{}'. \
                 Make sure you have run 'train' before 'infill'.",
                path.display()
            )
        })?;

        serde_json::from_str(&json)
            .with_context(|| format!("Malformed config in '{}'", path.display()))
    }
}

impl ParameterStore for CheckpointManager {
    fn load<B: Backend, M: Module<B>>(
        &self,
        name:   &str,
        model:  M,
        device: &B::Device,
    ) -> Result<M, TrainError> {
        if !self.has_checkpoint(name) {
            tracing::info!("No checkpoint '{}' in '{}', starting fresh", name, self.dir.display());
            return Ok(model);
        }

        let record: <M as Module<B>>::Record = ParamRecorder::new()
            .load(self.dir.join(name), device)
            .map_err(|e| TrainError::persistence(name, format!("{e:?}")))?;

        tracing::info!("Restored checkpoint '{}'", self.checkpoint_path(name).display());
        Ok(model.load_record(record))
    }

    fn checkpoint<B: Backend, M: Module<B>>(&self, name: &str, model: &M) -> Result<(), TrainError> {
        let staging = self.dir.join(format!("{name}-partial"));

        ParamRecorder::new()
            .record(model.clone().into_record(), staging.clone())
            .map_err(|e| TrainError::persistence(name, format!("{e:?}")))?;

        fs::rename(staging.with_extension(RECORD_EXTENSION), self.checkpoint_path(name))
            .map_err(|e| TrainError::persistence(name, e))?;

        tracing::debug!("Checkpoint '{}' written", name);
        Ok(())
    }
}
