//! Forecasting model: a recurrent stack plus a linear read-out.

use crate::cells::{uniform_linear, CellStack, StepCell};
use crate::config::ModelConfig;
use crate::error::{ensure_dims, Result, TensorRnnError};
use crate::rnn::{tensor_rnn, LagWindow};
use burn::module::Module;
use burn::nn::loss::{MseLoss, Reduction};
use burn::nn::Linear;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Predicts the next value of every channel at every step of a sequence.
#[derive(Module, Debug)]
pub struct TensorRnnModel<B: Backend> {
    stack: CellStack<B>,
    output: Linear<B>,
    #[module(skip)]
    output_size: usize,
}

impl<B: Backend> TensorRnnModel<B> {
    /// Validate `config` and allocate every parameter once.
    pub fn new(config: &ModelConfig, device: &B::Device) -> Result<Self> {
        let stack = CellStack::from_config(config, device)?;
        let output = uniform_linear(
            config.hidden_size,
            config.output_size,
            config.init_scale,
            device,
        );
        Ok(Self {
            stack,
            output,
            output_size: config.output_size,
        })
    }

    pub fn stack(&self) -> &CellStack<B> {
        &self.stack
    }

    pub fn num_lags(&self) -> usize {
        self.stack.window_len()
    }

    pub fn output_size(&self) -> usize {
        self.output_size
    }

    /// All-zero starting window for a batch.
    pub fn zero_window(&self, batch_size: usize, device: &B::Device) -> Result<LagWindow<B>> {
        LagWindow::zeros(
            self.num_lags(),
            batch_size,
            &self.stack.state_sizes(),
            device,
        )
    }

    /// `inputs`: `[batch, num_steps, input_size]`.
    ///
    /// Returns predictions `[batch, num_steps, output_size]` and the window
    /// after the last step.
    pub fn forward(
        &self,
        inputs: Tensor<B, 3>,
        window: LagWindow<B>,
    ) -> Result<(Tensor<B, 3>, LagWindow<B>)> {
        let [_, num_steps, _] = inputs.dims();
        if num_steps == 0 {
            return Err(TensorRnnError::data("input sequence has no time steps"));
        }
        let (outputs, window) = tensor_rnn(&self.stack, inputs, self.num_lags(), window)?;
        // [batch, hidden] per step -> [batch, num_steps, hidden]
        let hidden: Tensor<B, 3> = Tensor::stack(outputs, 1);
        let predictions = self.output.forward(hidden);
        Ok((predictions, window))
    }

    /// Mean squared error between predictions and targets of equal shape.
    pub fn loss(&self, predictions: Tensor<B, 3>, targets: Tensor<B, 3>) -> Result<Tensor<B, 1>> {
        ensure_dims("TensorRnnModel::loss", &predictions.dims(), &targets.dims())?;
        Ok(MseLoss::new().forward(predictions, targets, Reduction::Mean))
    }

    /// Run `inputs` from a zero window and score against `targets`.
    pub fn forward_loss(
        &self,
        inputs: Tensor<B, 3>,
        targets: Tensor<B, 3>,
    ) -> Result<(Tensor<B, 3>, Tensor<B, 1>)> {
        let [batch_size, _, _] = inputs.dims();
        let window = self.zero_window(batch_size, &inputs.device())?;
        let (predictions, _) = self.forward(inputs, window)?;
        let loss = self.loss(predictions.clone(), targets)?;
        Ok((predictions, loss))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cells::CellKind;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_model_forward_shapes() {
        let device = Default::default();
        let config = ModelConfig::new(3, 3).with_hidden_size(6).with_num_layers(2);
        let model = TensorRnnModel::<TestBackend>::new(&config, &device).unwrap();

        let inputs = Tensor::<TestBackend, 3>::ones([2, 7, 3], &device);
        let window = model.zero_window(2, &device).unwrap();
        let (predictions, window) = model.forward(inputs, window).unwrap();

        assert_eq!(predictions.dims(), [2, 7, 3]);
        assert_eq!(window.num_layers(), 2);
    }

    #[test]
    fn test_model_loss_is_finite() {
        let device = Default::default();
        let config = ModelConfig::new(1, 1)
            .with_hidden_size(4)
            .with_cell(CellKind::Matrix);
        let model = TensorRnnModel::<TestBackend>::new(&config, &device).unwrap();

        let inputs = Tensor::<TestBackend, 3>::ones([3, 5, 1], &device);
        let targets = Tensor::<TestBackend, 3>::zeros([3, 5, 1], &device);
        let (_, loss) = model.forward_loss(inputs, targets).unwrap();
        assert!(loss.into_scalar().is_finite());
    }

    #[test]
    fn test_loss_shape_mismatch() {
        let device = Default::default();
        let model = TensorRnnModel::<TestBackend>::new(&ModelConfig::new(1, 1), &device).unwrap();
        let a = Tensor::<TestBackend, 3>::zeros([1, 2, 1], &device);
        let b = Tensor::<TestBackend, 3>::zeros([1, 3, 1], &device);
        assert!(model.loss(a, b).is_err());
    }
}
