//! # Training Driver
//!
//! Epoch loop around [`TensorRnnModel`]: contiguous data split, Adam with
//! global-norm gradient clipping, a stepped learning-rate decay, validation
//! after every epoch and one test pass at the end.
//!
//! ```ignore
//! use burn::backend::{Autodiff, NdArray};
//! use tensor_rnn::train::{train, TrainingConfig};
//!
//! type Backend = Autodiff<NdArray<f32>>;
//!
//! let config = TrainingConfig::tiny(series.ncols());
//! let report = train::<Backend>(&config, &series, "runs/lorenz", &device)?;
//! println!("test error {}", report.test_error);
//! ```
//!
//! Every batch starts from a zero lag window. A non-finite loss is logged and
//! flagged in the epoch summary; training carries on.

mod checkpoint;
mod config;

pub use checkpoint::{
    load_checkpoint, save_checkpoint, PredictionRecord, CONFIG_FILE, MODEL_FILE, PREDICTION_FILE,
};
pub use config::TrainingConfig;

use crate::data::{split_raw_data, SeqBatcher};
use crate::error::Result;
use crate::model::TensorRnnModel;
use burn::grad_clipping::GradientClippingConfig;
use burn::module::AutodiffModule;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::ElementConversion;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Errors and learning rate of one epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochSummary {
    /// One-based.
    pub epoch: usize,
    pub learning_rate: f64,
    pub train_error: f64,
    pub valid_error: f64,
    /// A batch produced a NaN or infinite loss.
    pub diverged: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub epochs: Vec<EpochSummary>,
    pub test_error: f64,
    pub checkpoint: PathBuf,
    pub predictions: PathBuf,
}

/// Mean loss of one pass and whether any batch diverged.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub error: f64,
    pub diverged: bool,
    pub record: PredictionRecord,
}

/// Score `model` on every batch of `batcher` without updating it.
pub fn evaluate<B: Backend>(
    model: &TensorRnnModel<B>,
    batcher: &SeqBatcher,
    device: &B::Device,
) -> Result<Evaluation> {
    let mut total = 0.0;
    let mut diverged = false;
    let mut targets = Vec::new();
    let mut predictions = Vec::new();

    for batch in batcher.iter() {
        let (inputs, batch_targets) = batch.to_tensors::<B>(device);
        let (predicted, loss) = model.forward_loss(inputs, batch_targets)?;
        let loss = loss.into_scalar().elem::<f64>();
        diverged |= !loss.is_finite();
        total += loss;
        targets.extend(batch.targets.iter().copied());
        predictions.extend(predicted.into_data().iter::<f32>());
    }

    let epoch_size = batcher.epoch_size();
    Ok(Evaluation {
        error: total / epoch_size as f64,
        diverged,
        record: PredictionRecord {
            shape: [
                epoch_size,
                batcher.batch_size(),
                batcher.num_steps(),
                batcher.num_channels(),
            ],
            targets,
            predictions,
        },
    })
}

/// Train a forecaster on `series` (`[rows, channels]`) and write the
/// checkpoint, the configuration and the test predictions to `artifact_dir`.
pub fn train<B: AutodiffBackend>(
    config: &TrainingConfig,
    series: &Array2<f32>,
    artifact_dir: impl AsRef<Path>,
    device: &B::Device,
) -> Result<TrainingReport> {
    config.validate()?;
    let artifact_dir = artifact_dir.as_ref();
    if series.ncols() != config.model.input_size {
        return Err(crate::TensorRnnError::data(format!(
            "series has {} channels but the model expects {}",
            series.ncols(),
            config.model.input_size
        )));
    }

    let raw = split_raw_data(series, config.train_fraction, config.valid_fraction)?;
    let train_batches = SeqBatcher::new(&raw.train, config.batch_size, config.num_steps)?;
    let valid_batches = SeqBatcher::new(&raw.valid, config.batch_size, config.num_steps)?;
    let test_batches = SeqBatcher::new(&raw.test, config.eval_batch_size, config.eval_num_steps)?;
    info!(
        train = raw.train.nrows(),
        valid = raw.valid.nrows(),
        test = raw.test.nrows(),
        epoch_size = train_batches.epoch_size(),
        "data split"
    );

    let mut model = TensorRnnModel::<B>::new(&config.model, device)?;
    let mut optim = AdamConfig::new()
        .with_grad_clipping(Some(GradientClippingConfig::Norm(config.max_grad_norm)))
        .init::<B, TensorRnnModel<B>>();

    let mut epochs = Vec::with_capacity(config.max_max_epoch);
    for epoch in 0..config.max_max_epoch {
        let lr = config.learning_rate_for_epoch(epoch);
        info!(epoch = epoch + 1, learning_rate = lr, "epoch start");

        let mut total = 0.0;
        let mut diverged = false;
        for (step, batch) in train_batches.iter().enumerate() {
            let (inputs, targets) = batch.to_tensors::<B>(device);
            let (_, loss) = model.forward_loss(inputs, targets)?;
            let value = loss.clone().into_scalar().elem::<f64>();
            if !value.is_finite() {
                warn!(epoch = epoch + 1, step, "training loss is not finite");
                diverged = true;
            }
            total += value;

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(lr, model, grads);
            debug!(epoch = epoch + 1, step, loss = value, "batch");
        }
        let train_error = total / train_batches.epoch_size() as f64;

        let valid = evaluate(&model.valid(), &valid_batches, device)?;
        diverged |= valid.diverged;
        info!(
            epoch = epoch + 1,
            train_error,
            valid_error = valid.error,
            "epoch done"
        );
        if diverged {
            warn!(epoch = epoch + 1, "training diverged");
        }

        epochs.push(EpochSummary {
            epoch: epoch + 1,
            learning_rate: lr,
            train_error,
            valid_error: valid.error,
            diverged,
        });
    }

    let test = evaluate(&model.valid(), &test_batches, device)?;
    info!(test_error = test.error, "test pass done");

    let checkpoint = save_checkpoint(&model, config, artifact_dir)?;
    let predictions = artifact_dir.join(PREDICTION_FILE);
    test.record.save(&predictions)?;
    info!(path = %predictions.display(), "predictions saved");

    Ok(TrainingReport {
        epochs,
        test_error: test.error,
        checkpoint,
        predictions,
    })
}
