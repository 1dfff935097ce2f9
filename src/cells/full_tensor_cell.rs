//! Dense full-tensor high-order cell
//!
//! Same recurrence as [`super::TensorRnnCell`] but with the order-`K` weight
//! tensor stored densely as a `[D^K, H]` matrix. Only tractable for small
//! orders and widths; kept as a correctness baseline for the tensor-train cell.

use super::{assign_linear, check_step_inputs, uniform_linear, RecurrentCell, DEFAULT_INIT_SCALE};
use crate::activation::Activation;
use crate::error::{ensure_dims, Result, TensorRnnError};
use crate::network::{augmented_size, augmented_state, dense_rows, full_contract, high_order_state};
use burn::module::{Module, Param};
use burn::nn::Linear;
use burn::tensor::backend::Backend;
use burn::tensor::{Distribution, Tensor};

/// High-order cell with an uncompressed weight tensor.
#[derive(Module, Debug)]
pub struct FullTensorRnnCell<B: Backend> {
    #[module(skip)]
    input_size: usize,
    #[module(skip)]
    hidden_size: usize,
    #[module(skip)]
    num_lags: usize,
    #[module(skip)]
    num_orders: usize,
    #[module(skip)]
    activation: Activation,
    input_map: Linear<B>,
    /// `[D^K, hidden_size]`
    weights_h: Param<Tensor<B, 2>>,
}

impl<B: Backend> FullTensorRnnCell<B> {
    pub fn new(
        input_size: usize,
        hidden_size: usize,
        num_lags: usize,
        num_orders: usize,
        device: &B::Device,
    ) -> Result<Self> {
        Self::new_scaled(input_size, hidden_size, num_lags, num_orders, DEFAULT_INIT_SCALE, device)
    }

    /// Fails when `D^K * hidden_size` exceeds [`crate::network::MAX_DENSE_ENTRIES`].
    pub fn new_scaled(
        input_size: usize,
        hidden_size: usize,
        num_lags: usize,
        num_orders: usize,
        init_scale: f64,
        device: &B::Device,
    ) -> Result<Self> {
        if input_size == 0 || hidden_size == 0 || num_lags == 0 || num_orders == 0 {
            return Err(TensorRnnError::config(
                "input_size, hidden_size, num_lags and num_orders must be positive",
            ));
        }
        let rows = dense_rows(augmented_size(hidden_size, num_lags), num_orders, hidden_size)?;
        let weights_h = Tensor::<B, 2>::random(
            [rows, hidden_size],
            Distribution::Uniform(-init_scale, init_scale),
            device,
        );

        Ok(Self {
            input_size,
            hidden_size,
            num_lags,
            num_orders,
            activation: Activation::Tanh,
            input_map: uniform_linear(input_size, hidden_size, init_scale, device),
            weights_h: Param::from_tensor(weights_h),
        })
    }

    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    /// Replace the dense recurrent weights, `[D^K, hidden_size]`.
    pub fn with_recurrent_weights(mut self, weights: Tensor<B, 2>) -> Result<Self> {
        let expected = self.weights_h.val().dims();
        ensure_dims("FullTensorRnnCell::with_recurrent_weights", &expected, &weights.dims())?;
        self.weights_h = Param::from_tensor(weights);
        Ok(self)
    }

    /// Replace `W_x` and the bias.
    pub fn with_input_weights(mut self, weight: Tensor<B, 2>, bias: Tensor<B, 1>) -> Result<Self> {
        assign_linear(&mut self.input_map, weight, bias, "FullTensorRnnCell::with_input_weights")?;
        Ok(self)
    }

    pub fn order(&self) -> usize {
        self.num_orders
    }

    pub fn recurrent_weights(&self) -> Tensor<B, 2> {
        self.weights_h.val()
    }

    /// The recurrent term alone, `[batch, hidden_size]`.
    pub fn recurrent_term(&self, lags: &[Tensor<B, 2>]) -> Result<Tensor<B, 2>> {
        let augmented = augmented_state(lags)?;
        let state = high_order_state(augmented, self.num_orders)?;
        full_contract(state.into_flat(), self.weights_h.val())
    }
}

impl<B: Backend> RecurrentCell<B> for FullTensorRnnCell<B> {
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
            "FullTensorRnnCell::forward",
            &input,
            lags,
            self.input_size,
            self.hidden_size,
            self.num_lags,
        )?;

        let out_x = self.input_map.forward(input);
        let out_h = self.recurrent_term(lags)?;
        let new_state = self.activation.apply(out_x + out_h);
        Ok((new_state.clone(), new_state))
    }
}
