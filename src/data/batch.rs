//! Contiguous train/valid/test splits and sequence batching
//!
//! A `[N, C]` series is cut into `batch_size` contiguous streams of
//! `N / batch_size` rows each. Batch `i` takes rows `[i * T, (i + 1) * T)` of
//! every stream as inputs and the same window shifted by one row as targets,
//! so the model always predicts the next value.

use crate::error::{Result, TensorRnnError};
use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use ndarray::{s, Array2, Array3};

/// A series split along time into three contiguous parts.
#[derive(Debug, Clone, PartialEq)]
pub struct RawData {
    pub train: Array2<f32>,
    pub valid: Array2<f32>,
    pub test: Array2<f32>,
}

/// Slice `series` into train, valid and test in that order.
///
/// The first `floor(N * train_fraction)` rows train, the next
/// `floor(N * valid_fraction)` validate, the rest test. Every part must be
/// non-empty.
pub fn split_raw_data(
    series: &Array2<f32>,
    train_fraction: f64,
    valid_fraction: f64,
) -> Result<RawData> {
    if !(train_fraction > 0.0 && valid_fraction > 0.0 && train_fraction + valid_fraction < 1.0) {
        return Err(TensorRnnError::data(format!(
            "split fractions must be positive and sum below 1, got {} and {}",
            train_fraction, valid_fraction
        )));
    }
    let rows = series.nrows();
    let train_end = (rows as f64 * train_fraction).floor() as usize;
    let valid_end = train_end + (rows as f64 * valid_fraction).floor() as usize;
    if train_end == 0 || valid_end == train_end || valid_end >= rows {
        return Err(TensorRnnError::data(format!(
            "{} rows are too few to split {}/{}",
            rows, train_fraction, valid_fraction
        )));
    }

    Ok(RawData {
        train: series.slice(s![..train_end, ..]).to_owned(),
        valid: series.slice(s![train_end..valid_end, ..]).to_owned(),
        test: series.slice(s![valid_end.., ..]).to_owned(),
    })
}

/// One batch of inputs and next-step targets, both `[batch, num_steps, C]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SeqBatch {
    pub inputs: Array3<f32>,
    pub targets: Array3<f32>,
}

impl SeqBatch {
    pub fn to_tensors<B: Backend>(&self, device: &B::Device) -> (Tensor<B, 3>, Tensor<B, 3>) {
        (
            array_to_tensor(&self.inputs, device),
            array_to_tensor(&self.targets, device),
        )
    }
}

/// Copy a host array onto the backend.
pub fn array_to_tensor<B: Backend>(array: &Array3<f32>, device: &B::Device) -> Tensor<B, 3> {
    let (a, b, c) = array.dim();
    let values: Vec<f32> = array.iter().copied().collect();
    Tensor::from_data(TensorData::new(values, [a, b, c]), device)
}

/// Produces the batches of one epoch over a series.
#[derive(Debug, Clone)]
pub struct SeqBatcher {
    /// `[batch_size, batch_len, C]`
    streams: Array3<f32>,
    num_steps: usize,
    epoch_size: usize,
}

impl SeqBatcher {
    pub fn new(series: &Array2<f32>, batch_size: usize, num_steps: usize) -> Result<Self> {
        if batch_size == 0 || num_steps == 0 {
            return Err(TensorRnnError::data("batch_size and num_steps must be positive"));
        }
        let (rows, channels) = series.dim();
        let batch_len = rows / batch_size;
        let epoch_size = batch_len.saturating_sub(1) / num_steps;
        if epoch_size == 0 {
            return Err(TensorRnnError::data(format!(
                "{} rows give epoch size 0 for batch_size {} and num_steps {}; \
                 decrease batch_size or num_steps",
                rows, batch_size, num_steps
            )));
        }

        let mut streams = Array3::zeros((batch_size, batch_len, channels));
        for b in 0..batch_size {
            streams
                .slice_mut(s![b, .., ..])
                .assign(&series.slice(s![b * batch_len..(b + 1) * batch_len, ..]));
        }

        Ok(Self {
            streams,
            num_steps,
            epoch_size,
        })
    }

    /// Number of batches in one pass.
    pub fn epoch_size(&self) -> usize {
        self.epoch_size
    }

    pub fn batch_size(&self) -> usize {
        self.streams.dim().0
    }

    pub fn num_steps(&self) -> usize {
        self.num_steps
    }

    pub fn num_channels(&self) -> usize {
        self.streams.dim().2
    }

    /// Batch `index` of the epoch.
    pub fn batch(&self, index: usize) -> Result<SeqBatch> {
        if index >= self.epoch_size {
            return Err(TensorRnnError::data(format!(
                "batch {} out of range for epoch size {}",
                index, self.epoch_size
            )));
        }
        let start = index * self.num_steps;
        let end = start + self.num_steps;
        Ok(SeqBatch {
            inputs: self.streams.slice(s![.., start..end, ..]).to_owned(),
            targets: self.streams.slice(s![.., start + 1..end + 1, ..]).to_owned(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = SeqBatch> + '_ {
        (0..self.epoch_size).filter_map(move |i| self.batch(i).ok())
    }
}
