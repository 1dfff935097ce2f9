//! Model checkpoints and prediction dumps.

use super::TrainingConfig;
use crate::data::io::{read_json, write_json};
use crate::error::{Result, TensorRnnError};
use crate::model::TensorRnnModel;
use burn::config::Config;
use burn::module::Module;
use burn::record::{BinFileRecorder, FullPrecisionSettings};
use burn::tensor::backend::Backend;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

pub const MODEL_FILE: &str = "model";
pub const CONFIG_FILE: &str = "config.json";
pub const PREDICTION_FILE: &str = "predict.json";

/// Ground-truth next-step targets next to the model's predictions,
/// both flattened row-major from `shape`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    /// `[num_batches, batch_size, num_steps, channels]`
    pub shape: [usize; 4],
    pub targets: Vec<f32>,
    pub predictions: Vec<f32>,
}

impl PredictionRecord {
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        write_json(path.as_ref(), self)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        read_json(path.as_ref())
    }
}

fn recorder() -> BinFileRecorder<FullPrecisionSettings> {
    BinFileRecorder::<FullPrecisionSettings>::new()
}

/// Write the model weights and the training configuration under `dir`.
/// Returns the checkpoint path (the recorder adds its own extension).
pub fn save_checkpoint<B: Backend>(
    model: &TensorRnnModel<B>,
    config: &TrainingConfig,
    dir: &Path,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(MODEL_FILE);
    model
        .clone()
        .save_file(path.clone(), &recorder())
        .map_err(TensorRnnError::record)?;
    config.save(dir.join(CONFIG_FILE))?;
    info!(path = %path.display(), "checkpoint saved");
    Ok(path)
}

/// Rebuild a model from a directory written by [`save_checkpoint`].
pub fn load_checkpoint<B: Backend>(
    dir: &Path,
    device: &B::Device,
) -> Result<(TensorRnnModel<B>, TrainingConfig)> {
    let config = TrainingConfig::load(dir.join(CONFIG_FILE))
        .map_err(|err| TensorRnnError::config(format!("{:?}", err)))?;
    let model = TensorRnnModel::new(&config.model, device)?
        .load_file(dir.join(MODEL_FILE), &recorder(), device)
        .map_err(TensorRnnError::record)?;
    Ok((model, config))
}
