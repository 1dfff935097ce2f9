//! Stacked layers over a shared lag window

use super::{LayerCell, RecurrentCell, StepCell};
use crate::config::ModelConfig;
use crate::error::{ensure_dims, Result, TensorRnnError};
use crate::rnn::LagWindow;
use burn::module::Module;
use burn::nn::{Dropout, DropoutConfig};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// A stack of recurrent layers stepping together.
///
/// Layer 0 reads the input, layer `k` reads the output of layer `k - 1`.
/// Dropout with probability `1 - keep_prob` sits between layers and only acts
/// while training on an autodiff backend.
#[derive(Module, Debug)]
pub struct CellStack<B: Backend> {
    layers: Vec<LayerCell<B>>,
    dropout: Dropout,
    #[module(skip)]
    num_lags: usize,
}

impl<B: Backend> CellStack<B> {
    pub fn from_config(config: &ModelConfig, device: &B::Device) -> Result<Self> {
        config.validate()?;
        let layers = (0..config.num_layers)
            .map(|layer| LayerCell::from_config(config, layer, device))
            .collect::<Result<Vec<_>>>()?;
        Self::from_layers(layers, config.keep_prob)
    }

    /// Stack prebuilt layers. Each layer's input width must match the hidden
    /// width below it, and every layer must use the same number of lags.
    pub fn from_layers(layers: Vec<LayerCell<B>>, keep_prob: f64) -> Result<Self> {
        let first = layers
            .first()
            .ok_or_else(|| TensorRnnError::config("a stack needs at least one layer"))?;
        let num_lags = first.num_lags();
        for pair in layers.windows(2) {
            ensure_dims(
                "CellStack::from_layers(width)",
                &[pair[0].hidden_size()],
                &[pair[1].input_size()],
            )?;
        }
        for layer in &layers {
            ensure_dims("CellStack::from_layers(lags)", &[num_lags], &[layer.num_lags()])?;
        }
        if !(keep_prob > 0.0 && keep_prob <= 1.0) {
            return Err(TensorRnnError::config(format!(
                "keep_prob must be in (0, 1], got {}",
                keep_prob
            )));
        }

        Ok(Self {
            layers,
            dropout: DropoutConfig::new(1.0 - keep_prob).init(),
            num_lags,
        })
    }

    pub fn layers(&self) -> &[LayerCell<B>] {
        &self.layers
    }

    /// Hidden width of the top layer.
    pub fn output_size(&self) -> usize {
        self.layers
            .last()
            .map(|layer| layer.hidden_size())
            .unwrap_or(0)
    }
}

impl<B: Backend> StepCell<B> for CellStack<B> {
    fn num_layers(&self) -> usize {
        self.layers.len()
    }

    fn state_sizes(&self) -> Vec<usize> {
        self.layers.iter().map(|layer| layer.hidden_size()).collect()
    }

    fn window_len(&self) -> usize {
        self.num_lags
    }

    fn step(
        &self,
        input: Tensor<B, 2>,
        window: &LagWindow<B>,
    ) -> Result<(Tensor<B, 2>, Vec<Tensor<B, 2>>)> {
        ensure_dims("CellStack::step", &[self.layers.len()], &[window.num_layers()])?;

        let mut x = input;
        let mut states = Vec::with_capacity(self.layers.len());
        for (index, layer) in self.layers.iter().enumerate() {
            if index > 0 {
                x = self.dropout.forward(x);
            }
            let lags = window.layer(index)?;
            let (output, state) = layer.forward(x, &lags)?;
            states.push(state);
            x = output;
        }
        Ok((self.dropout.forward(x), states))
    }
}
