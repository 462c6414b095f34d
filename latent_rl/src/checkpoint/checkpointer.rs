//! Checkpointing for world models and agents.
//!
//! Any Burn module can be saved and restored; model configurations are
//! stored next to the weights as JSON so a checkpoint can be rebuilt
//! without the original code path that produced it.

use burn::module::Module;
use burn::record::{BinFileRecorder, FullPrecisionSettings};
use burn::tensor::backend::Backend;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ensure, LatentRlError, Result};

const CHECKPOINT_PREFIX: &str = "checkpoint_";
const CHECKPOINT_EXT: &str = "bin";
const BEST_FILE: &str = "best.bin";

/// Configuration for the checkpointer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointerConfig {
    /// Directory to store checkpoints.
    pub checkpoint_dir: PathBuf,
    /// Steps between checkpoint saves.
    pub save_interval: usize,
    /// Number of recent checkpoints to keep (0 = keep all).
    pub keep_last_n: usize,
    /// Whether to track and save the best model.
    pub save_best: bool,
}

impl Default for CheckpointerConfig {
    fn default() -> Self {
        Self {
            checkpoint_dir: PathBuf::from("./checkpoints"),
            save_interval: 10_000,
            keep_last_n: 5,
            save_best: true,
        }
    }
}

impl CheckpointerConfig {
    pub fn new(checkpoint_dir: impl Into<PathBuf>) -> Self {
        Self {
            checkpoint_dir: checkpoint_dir.into(),
            ..Default::default()
        }
    }

    pub fn with_save_interval(mut self, interval: usize) -> Self {
        self.save_interval = interval;
        self
    }

    pub fn with_keep_last_n(mut self, n: usize) -> Self {
        self.keep_last_n = n;
        self
    }

    pub fn with_save_best(mut self, save_best: bool) -> Self {
        self.save_best = save_best;
        self
    }

    pub fn validate(&self) -> Result<()> {
        ensure(self.save_interval > 0, || {
            "checkpoint save_interval must be positive".to_string()
        })
    }
}

/// Checkpoint metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointInfo {
    pub path: PathBuf,
    /// Step at which the checkpoint was saved.
    pub step: usize,
    /// Metric passed to [`Checkpointer::save`]; `None` for checkpoints
    /// discovered on disk.
    pub metric: Option<f32>,
}

/// Saves modules at regular intervals, tracks the best one by metric and
/// prunes old checkpoints.
#[derive(Debug)]
pub struct Checkpointer {
    config: CheckpointerConfig,
    best_metric: f32,
    history: Vec<CheckpointInfo>,
}

impl Checkpointer {
    /// Creates the checkpoint directory if it doesn't exist.
    pub fn new(config: CheckpointerConfig) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.checkpoint_dir)?;

        Ok(Self {
            config,
            best_metric: f32::NEG_INFINITY,
            history: Vec::new(),
        })
    }

    pub fn config(&self) -> &CheckpointerConfig {
        &self.config
    }

    pub fn should_save(&self, step: usize) -> bool {
        step > 0 && step % self.config.save_interval == 0
    }

    /// Save `model` as `checkpoint_{step:08}.bin`.
    ///
    /// When best tracking is on and `metric` beats every previous metric,
    /// the model is also written to `best.bin`.
    pub fn save<B: Backend, M: Module<B>>(
        &mut self,
        model: &M,
        step: usize,
        metric: Option<f32>,
    ) -> Result<PathBuf> {
        let path = self.checkpoint_path(step);
        let recorder = BinFileRecorder::<FullPrecisionSettings>::new();

        model
            .clone()
            .save_file(&path, &recorder)
            .map_err(|e| LatentRlError::Recorder(e.to_string()))?;
        log::info!("saved checkpoint at step {} to {}", step, path.display());

        self.history.push(CheckpointInfo {
            path: path.clone(),
            step,
            metric,
        });

        if let (true, Some(m)) = (self.config.save_best, metric) {
            if m > self.best_metric {
                self.best_metric = m;
                model
                    .clone()
                    .save_file(self.best_path(), &recorder)
                    .map_err(|e| LatentRlError::Recorder(e.to_string()))?;
                log::info!("new best metric {:.4} at step {}", m, step);
            }
        }

        self.cleanup_old_checkpoints();
        Ok(path)
    }

    /// Load weights from `path` into `template`.
    ///
    /// The template must have the same architecture as the saved module,
    /// usually built from the same config.
    pub fn load<B: Backend, M: Module<B>>(&self, template: M, path: &Path, device: &B::Device) -> Result<M> {
        let recorder = BinFileRecorder::<FullPrecisionSettings>::new();
        let model = template
            .load_file(path, &recorder, device)
            .map_err(|e| LatentRlError::Recorder(e.to_string()))?;
        log::info!("loaded checkpoint {}", path.display());
        Ok(model)
    }

    pub fn load_best<B: Backend, M: Module<B>>(&self, template: M, device: &B::Device) -> Result<M> {
        let best_path = self.best_path();
        if !best_path.exists() {
            return Err(LatentRlError::NoCheckpoints);
        }
        self.load(template, &best_path, device)
    }

    /// Returns the model and the step it was saved at.
    pub fn load_latest<B: Backend, M: Module<B>>(
        &self,
        template: M,
        device: &B::Device,
    ) -> Result<(M, usize)> {
        let latest = self.find_latest_checkpoint()?;
        let model = self.load(template, &latest.path, device)?;
        Ok((model, latest.step))
    }

    pub fn find_latest_checkpoint(&self) -> Result<CheckpointInfo> {
        self.list_checkpoints()?
            .pop()
            .ok_or(LatentRlError::NoCheckpoints)
    }

    /// All `checkpoint_*.bin` files in the directory, sorted by step.
    pub fn list_checkpoints(&self) -> Result<Vec<CheckpointInfo>> {
        let mut checkpoints: Vec<CheckpointInfo> = fs::read_dir(&self.config.checkpoint_dir)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let path = entry.path();
                let step = parse_step(path.file_name()?.to_str()?)?;
                Some(CheckpointInfo {
                    path,
                    step,
                    metric: None,
                })
            })
            .collect();

        checkpoints.sort_by_key(|c| c.step);
        Ok(checkpoints)
    }

    pub fn best_metric(&self) -> f32 {
        self.best_metric
    }

    /// Write a model config as pretty JSON under `name` in the checkpoint
    /// directory.
    pub fn save_config<C: Serialize>(&self, name: &str, config: &C) -> Result<PathBuf> {
        let path = self.config.checkpoint_dir.join(name);
        fs::write(&path, serde_json::to_string_pretty(config)?)?;
        log::info!("saved config to {}", path.display());
        Ok(path)
    }

    /// Read a config written by [`Checkpointer::save_config`].
    pub fn load_config<C: DeserializeOwned>(&self, name: &str) -> Result<C> {
        let json = fs::read_to_string(self.config.checkpoint_dir.join(name))?;
        Ok(serde_json::from_str(&json)?)
    }

    fn checkpoint_path(&self, step: usize) -> PathBuf {
        self.config
            .checkpoint_dir
            .join(format!("{}{:08}.{}", CHECKPOINT_PREFIX, step, CHECKPOINT_EXT))
    }

    fn best_path(&self) -> PathBuf {
        self.config.checkpoint_dir.join(BEST_FILE)
    }

    /// Drop the oldest checkpoints saved by this instance beyond `keep_last_n`.
    fn cleanup_old_checkpoints(&mut self) {
        if self.config.keep_last_n == 0 {
            return;
        }

        let excess = self.history.len().saturating_sub(self.config.keep_last_n);
        for old in self.history.drain(..excess) {
            if let Err(e) = fs::remove_file(&old.path) {
                log::warn!("failed to remove old checkpoint {}: {}", old.path.display(), e);
            }
        }
    }
}

/// `checkpoint_00000100.bin` -> 100
fn parse_step(filename: &str) -> Option<usize> {
    filename
        .strip_prefix(CHECKPOINT_PREFIX)?
        .strip_suffix(CHECKPOINT_EXT)?
        .strip_suffix('.')?
        .parse()
        .ok()
}
