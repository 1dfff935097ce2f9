//! First-order lag cell
//!
//! The baseline without any tensor product: the input and all lag states are
//! concatenated and passed through one affine map,
//!
//! ```text
//! h_t = activation([x_t, h_{t-L}, ..., h_{t-1}] · W + b)
//! ```

use super::{assign_linear, check_step_inputs, uniform_linear, RecurrentCell, DEFAULT_INIT_SCALE};
use crate::activation::Activation;
use crate::error::{Result, TensorRnnError};
use burn::module::Module;
use burn::nn::Linear;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Recurrent cell over the concatenation of input and lag states.
#[derive(Module, Debug)]
pub struct MatrixRnnCell<B: Backend> {
    #[module(skip)]
    input_size: usize,
    #[module(skip)]
    hidden_size: usize,
    #[module(skip)]
    num_lags: usize,
    #[module(skip)]
    activation: Activation,
    /// `[input_size + hidden_size * num_lags, hidden_size]` plus bias
    linear: Linear<B>,
}

impl<B: Backend> MatrixRnnCell<B> {
    /// Create a new cell with the default initialisation scale
    pub fn new(
        input_size: usize,
        hidden_size: usize,
        num_lags: usize,
        device: &B::Device,
    ) -> Result<Self> {
        Self::new_scaled(input_size, hidden_size, num_lags, DEFAULT_INIT_SCALE, device)
    }

    /// Create a new cell with weights drawn from `U(-init_scale, init_scale)`
    pub fn new_scaled(
        input_size: usize,
        hidden_size: usize,
        num_lags: usize,
        init_scale: f64,
        device: &B::Device,
    ) -> Result<Self> {
        if input_size == 0 || hidden_size == 0 || num_lags == 0 {
            return Err(TensorRnnError::config(format!(
                "MatrixRnnCell sizes must be positive, got input {} hidden {} lags {}",
                input_size, hidden_size, num_lags
            )));
        }
        let linear = uniform_linear(
            input_size + hidden_size * num_lags,
            hidden_size,
            init_scale,
            device,
        );

        Ok(Self {
            input_size,
            hidden_size,
            num_lags,
            activation: Activation::Tanh,
            linear,
        })
    }

    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    /// Replace the affine map. `weight` is `[input_size + hidden_size * num_lags, hidden_size]`.
    pub fn with_weights(mut self, weight: Tensor<B, 2>, bias: Tensor<B, 1>) -> Result<Self> {
        assign_linear(&mut self.linear, weight, bias, "MatrixRnnCell::with_weights")?;
        Ok(self)
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }
}

impl<B: Backend> RecurrentCell<B> for MatrixRnnCell<B> {
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
        check_step_inputs(
            "MatrixRnnCell::forward",
            &input,
            lags,
            self.input_size,
            self.hidden_size,
            self.num_lags,
        )?;

        let mut parts = Vec::with_capacity(lags.len() + 1);
        parts.push(input);
        parts.extend(lags.iter().cloned());
        let x = Tensor::cat(parts, 1);

        let new_state = self.activation.apply(self.linear.forward(x));
        Ok((new_state.clone(), new_state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::backend::Backend as BurnBackend;

    type TestBackend = NdArray<f32>;
    type TestDevice = <TestBackend as BurnBackend>::Device;

    fn get_test_device() -> TestDevice {
        Default::default()
    }

    #[test]
    fn test_matrix_cell_creation() {
        let device = get_test_device();
        let cell = MatrixRnnCell::<TestBackend>::new(3, 8, 2, &device).unwrap();

        assert_eq!(cell.input_size(), 3);
        assert_eq!(cell.hidden_size(), 8);
        assert_eq!(cell.num_lags(), 2);
        assert_eq!(cell.activation(), Activation::Tanh);
    }

    #[test]
    fn test_matrix_cell_forward() {
        let device = get_test_device();
        let cell = MatrixRnnCell::<TestBackend>::new(3, 8, 2, &device).unwrap();

        let input = Tensor::<TestBackend, 2>::ones([4, 3], &device);
        let lags = vec![Tensor::<TestBackend, 2>::zeros([4, 8], &device); 2];

        let (output, new_state) = cell.forward(input, &lags).unwrap();
        assert_eq!(output.dims(), [4, 8]);

        let diff = (output - new_state).abs().max().into_scalar();
        assert!(diff < 1e-6, "Output should equal new state");
    }

    #[test]
    fn test_matrix_cell_known_weights() {
        let device = get_test_device();
        // input 1, hidden 1, lags 2 -> weight [3, 1]
        let weight = Tensor::<TestBackend, 2>::from_floats([[1.0], [2.0], [3.0]], &device);
        let bias = Tensor::<TestBackend, 1>::from_floats([0.5], &device);
        let cell = MatrixRnnCell::<TestBackend>::new(1, 1, 2, &device)
            .unwrap()
            .with_activation(Activation::Identity)
            .with_weights(weight, bias)
            .unwrap();

        let input = Tensor::<TestBackend, 2>::from_floats([[1.0]], &device);
        let lags = vec![
            Tensor::<TestBackend, 2>::from_floats([[10.0]], &device),
            Tensor::<TestBackend, 2>::from_floats([[100.0]], &device),
        ];

        let (output, _) = cell.forward(input, &lags).unwrap();
        // 1*1 + 10*2 + 100*3 + 0.5
        assert!((output.into_scalar() - 321.5).abs() < 1e-3);
    }

    #[test]
    fn test_matrix_cell_rejects_zero_sizes() {
        let device = get_test_device();
        for (input, hidden, lags) in [(0, 8, 2), (3, 0, 2), (3, 8, 0)] {
            assert!(matches!(
                MatrixRnnCell::<TestBackend>::new(input, hidden, lags, &device),
                Err(TensorRnnError::Config(_))
            ));
        }
    }

    #[test]
    fn test_matrix_cell_wrong_lag_count() {
        let device = get_test_device();
        let cell = MatrixRnnCell::<TestBackend>::new(3, 8, 2, &device).unwrap();

        let input = Tensor::<TestBackend, 2>::ones([4, 3], &device);
        let lags = vec![Tensor::<TestBackend, 2>::zeros([4, 8], &device)];
        assert!(cell.forward(input, &lags).is_err());
    }

    #[test]
    fn test_matrix_cell_bad_weights() {
        let device = get_test_device();
        let weight = Tensor::<TestBackend, 2>::zeros([4, 1], &device);
        let bias = Tensor::<TestBackend, 1>::zeros([1], &device);
        let cell = MatrixRnnCell::<TestBackend>::new(1, 1, 2, &device).unwrap();
        let result = cell.with_weights(weight, bias);
        assert!(result.is_err());
    }
}
