//! Configurable layer cell
//!
//! Holds exactly one of the three cell kinds so that a stack of layers can be
//! built from a [`ModelConfig`] and saved as one module.

use super::{FullTensorRnnCell, MatrixRnnCell, RecurrentCell, TensorRnnCell};
use crate::config::ModelConfig;
use crate::error::{Result, TensorRnnError};
use burn::module::Module;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

/// Which recurrence a layer uses.
#[derive(Module, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CellKind {
    /// [`MatrixRnnCell`]: linear in the concatenated lags
    Matrix,
    /// [`TensorRnnCell`]: tensor-train high-order term
    #[default]
    TensorTrain,
    /// [`FullTensorRnnCell`]: dense high-order term
    FullTensor,
}

/// One recurrent layer of any [`CellKind`].
#[derive(Module, Debug)]
pub struct LayerCell<B: Backend> {
    #[module(skip)]
    kind: CellKind,
    #[module(skip)]
    input_size: usize,
    #[module(skip)]
    hidden_size: usize,
    #[module(skip)]
    num_lags: usize,
    matrix: Option<MatrixRnnCell<B>>,
    tensor: Option<TensorRnnCell<B>>,
    full: Option<FullTensorRnnCell<B>>,
}

impl<B: Backend> LayerCell<B> {
    /// Build layer `layer` of the stack described by `config`.
    pub fn from_config(config: &ModelConfig, layer: usize, device: &B::Device) -> Result<Self> {
        let input_size = config.layer_input_size(layer);
        let cell = match config.cell {
            CellKind::Matrix => MatrixRnnCell::new_scaled(
                input_size,
                config.hidden_size,
                config.num_lags,
                config.init_scale,
                device,
            )?
            .with_activation(config.activation)
            .into(),
            CellKind::TensorTrain => {
                if config.rank_vals.len() + 1 != config.num_orders {
                    return Err(TensorRnnError::config(format!(
                        "tensor order {} does not match rank_vals {:?}",
                        config.num_orders, config.rank_vals
                    )));
                }
                TensorRnnCell::new_scaled(
                    input_size,
                    config.hidden_size,
                    config.num_lags,
                    &config.rank_vals,
                    config.init_scale,
                    device,
                )?
                .with_activation(config.activation)
                .with_contraction(config.contraction)?
                .into()
            }
            CellKind::FullTensor => FullTensorRnnCell::new_scaled(
                input_size,
                config.hidden_size,
                config.num_lags,
                config.num_orders,
                config.init_scale,
                device,
            )?
            .with_activation(config.activation)
            .into(),
        };
        Ok(cell)
    }

    pub fn kind(&self) -> CellKind {
        self.kind
    }

    fn empty(kind: CellKind, input_size: usize, hidden_size: usize, num_lags: usize) -> Self {
        Self {
            kind,
            input_size,
            hidden_size,
            num_lags,
            matrix: None,
            tensor: None,
            full: None,
        }
    }

    fn inner(&self) -> Result<&dyn RecurrentCell<B>> {
        let cell: Option<&dyn RecurrentCell<B>> = match self.kind {
            CellKind::Matrix => self.matrix.as_ref().map(|c| c as &dyn RecurrentCell<B>),
            CellKind::TensorTrain => self.tensor.as_ref().map(|c| c as &dyn RecurrentCell<B>),
            CellKind::FullTensor => self.full.as_ref().map(|c| c as &dyn RecurrentCell<B>),
        };
        cell.ok_or_else(|| {
            TensorRnnError::config(format!("layer of kind {:?} holds no cell", self.kind))
        })
    }
}

impl<B: Backend> From<MatrixRnnCell<B>> for LayerCell<B> {
    fn from(cell: MatrixRnnCell<B>) -> Self {
        let mut layer = Self::empty(
            CellKind::Matrix,
            cell.input_size(),
            cell.hidden_size(),
            cell.num_lags(),
        );
        layer.matrix = Some(cell);
        layer
    }
}

impl<B: Backend> From<TensorRnnCell<B>> for LayerCell<B> {
    fn from(cell: TensorRnnCell<B>) -> Self {
        let mut layer = Self::empty(
            CellKind::TensorTrain,
            cell.input_size(),
            cell.hidden_size(),
            cell.num_lags(),
        );
        layer.tensor = Some(cell);
        layer
    }
}

impl<B: Backend> From<FullTensorRnnCell<B>> for LayerCell<B> {
    fn from(cell: FullTensorRnnCell<B>) -> Self {
        let mut layer = Self::empty(
            CellKind::FullTensor,
            cell.input_size(),
            cell.hidden_size(),
            cell.num_lags(),
        );
        layer.full = Some(cell);
        layer
    }
}

impl<B: Backend> RecurrentCell<B> for LayerCell<B> {
    fn input_size(&self) -> usize {
        self.input_size
    }

    fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    fn num_lags(&self) -> usize {
        self.num_lags
    }

    fn forward(
        &self,
        input: Tensor<B, 2>,
        lags: &[Tensor<B, 2>],
    ) -> Result<(Tensor<B, 2>, Tensor<B, 2>)> {
        self.inner()?.forward(input, lags)
    }
}
