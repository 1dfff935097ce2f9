//! Tensor-train high-order cell
//!
//! The recurrent term is a multilinear function of the augmented lag state
//! `s = [h_{t-L}, ..., h_{t-1}, 1]` of order `K`:
//!
//! ```text
//! h_t = activation(x_t · W_x + b + Σ_j W[j_1, ..., j_K, :] s[j_1] ... s[j_K])
//! ```
//!
//! `W` is never stored. It is held as a tensor-train core chain of ranks
//! `[1, r_1, ..., r_{K-1}, H]`, see [`crate::network::TtCores`]. The constant
//! 1 channel of `s` lets the chain carry every lower-order term as well,
//! including a learned bias.

use super::{assign_linear, check_step_inputs, uniform_linear, RecurrentCell, DEFAULT_INIT_SCALE};
use crate::activation::Activation;
use crate::error::Result;
use crate::network::{
    augmented_size, augmented_state, dense_state_len, high_order_state, tt_contract,
    tt_contract_factored, TtCores, TtLayout,
};
use burn::module::Module;
use burn::nn::Linear;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

/// How the recurrent term is contracted.
#[derive(Module, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Contraction {
    /// Build the `D^K` state tensor by outer products, then contract it
    /// against the chain core by core. Only accepted while `D^K` stays within
    /// [`crate::network::MAX_DENSE_ENTRIES`].
    Dense,
    /// Collapse each core against the augmented state and chain the resulting
    /// `r × r` matrices. Same result, no `D^K` intermediate.
    #[default]
    Factored,
}

/// A tensor-train recurrent cell
///
/// # Type Parameters
/// * `B` - The backend type
#[derive(Module, Debug)]
pub struct TensorRnnCell<B: Backend> {
    #[module(skip)]
    input_size: usize,
    #[module(skip)]
    hidden_size: usize,
    #[module(skip)]
    num_lags: usize,
    #[module(skip)]
    activation: Activation,
    #[module(skip)]
    contraction: Contraction,
    /// `W_x` and the bias `b`
    input_map: Linear<B>,
    cores: TtCores<B>,
}

impl<B: Backend> TensorRnnCell<B> {
    /// Create a new tensor-train cell of order `rank_vals.len() + 1`.
    ///
    /// Fails with a configuration error when a rank is zero or a size is zero.
    pub fn new(
        input_size: usize,
        hidden_size: usize,
        num_lags: usize,
        rank_vals: &[usize],
        device: &B::Device,
    ) -> Result<Self> {
        Self::new_scaled(input_size, hidden_size, num_lags, rank_vals, DEFAULT_INIT_SCALE, device)
    }

    /// Like [`TensorRnnCell::new`], with parameters drawn from `U(-init_scale, init_scale)`.
    pub fn new_scaled(
        input_size: usize,
        hidden_size: usize,
        num_lags: usize,
        rank_vals: &[usize],
        init_scale: f64,
        device: &B::Device,
    ) -> Result<Self> {
        if input_size == 0 || num_lags == 0 {
            return Err(crate::TensorRnnError::config(
                "input_size and num_lags must be positive",
            ));
        }
        let layout = TtLayout::new(augmented_size(hidden_size, num_lags), rank_vals, hidden_size)?;

        Ok(Self {
            input_size,
            hidden_size,
            num_lags,
            activation: Activation::Tanh,
            contraction: Contraction::Factored,
            input_map: uniform_linear(input_size, hidden_size, init_scale, device),
            cores: TtCores::new(layout, init_scale, device),
        })
    }

    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    /// Fails with a configuration error when `Dense` is asked for and the
    /// state tensor is too large to materialise.
    pub fn with_contraction(mut self, contraction: Contraction) -> Result<Self> {
        if contraction == Contraction::Dense {
            dense_state_len(self.cores.layout().dim(), self.order())?;
        }
        self.contraction = contraction;
        Ok(self)
    }

    /// Replace the core chain with explicit flat storage.
    pub fn with_cores(mut self, flat: Tensor<B, 1>) -> Result<Self> {
        self.cores = TtCores::from_flat(self.cores.layout().clone(), flat)?;
        Ok(self)
    }

    /// Replace `W_x` (`[input_size, hidden_size]`) and the bias (`[hidden_size]`).
    pub fn with_input_weights(mut self, weight: Tensor<B, 2>, bias: Tensor<B, 1>) -> Result<Self> {
        assign_linear(&mut self.input_map, weight, bias, "TensorRnnCell::with_input_weights")?;
        Ok(self)
    }

    /// Tensor order `K`
    pub fn order(&self) -> usize {
        self.cores.layout().order()
    }

    /// Full rank list `[1, r_1, ..., H]`
    pub fn ranks(&self) -> &[usize] {
        self.cores.layout().ranks()
    }

    pub fn cores(&self) -> &TtCores<B> {
        &self.cores
    }

    pub fn input_map(&self) -> &Linear<B> {
        &self.input_map
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn contraction(&self) -> Contraction {
        self.contraction
    }

    /// The recurrent term `out_h` alone, `[batch, hidden_size]`.
    pub fn recurrent_term(&self, lags: &[Tensor<B, 2>]) -> Result<Tensor<B, 2>> {
        let augmented = augmented_state(lags)?;
        match self.contraction {
            Contraction::Dense => {
                let state = high_order_state(augmented, self.order())?;
                tt_contract(state.into_flat(), &self.cores)
            }
            Contraction::Factored => tt_contract_factored(augmented, &self.cores),
        }
    }
}

impl<B: Backend> RecurrentCell<B> for TensorRnnCell<B> {
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
            "TensorRnnCell::forward",
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

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::backend::Backend as BurnBackend;
    use burn::tensor::Distribution;

    type TestBackend = NdArray<f32>;
    type TestDevice = <TestBackend as BurnBackend>::Device;

    fn get_test_device() -> TestDevice {
        Default::default()
    }

    #[test]
    fn test_tensor_cell_creation() {
        let device = get_test_device();
        let cell = TensorRnnCell::<TestBackend>::new(2, 4, 2, &[3], &device).unwrap();

        assert_eq!(cell.input_size(), 2);
        assert_eq!(cell.hidden_size(), 4);
        assert_eq!(cell.num_lags(), 2);
        assert_eq!(cell.order(), 2);
        assert_eq!(cell.ranks(), &[1, 3, 4]);
        assert_eq!(cell.cores().layout().storage_size(), 9 * 3 + 3 * 9 * 4);
    }

    #[test]
    fn test_tensor_cell_rejects_zero_rank() {
        let device = get_test_device();
        assert!(TensorRnnCell::<TestBackend>::new(2, 4, 2, &[3, 0], &device).is_err());
        assert!(TensorRnnCell::<TestBackend>::new(2, 4, 0, &[3], &device).is_err());
    }

    #[test]
    fn test_tensor_cell_forward_shapes() {
        let device = get_test_device();
        let cell = TensorRnnCell::<TestBackend>::new(2, 4, 3, &[3, 2], &device).unwrap();

        for batch in [1, 5] {
            let input = Tensor::<TestBackend, 2>::ones([batch, 2], &device);
            let lags = vec![
                Tensor::<TestBackend, 2>::random([batch, 4], Distribution::Default, &device);
                3
            ];
            let (output, state) = cell.forward(input, &lags).unwrap();
            assert_eq!(output.dims(), [batch, 4]);
            assert_eq!(state.dims(), [batch, 4]);
        }
    }

    #[test]
    fn test_dense_and_factored_agree() {
        let device = get_test_device();
        let cell = TensorRnnCell::<TestBackend>::new_scaled(2, 3, 2, &[4, 2], 0.5, &device).unwrap();
        let lags: Vec<_> = (0..2)
            .map(|_| {
                Tensor::<TestBackend, 2>::random([3, 3], Distribution::Uniform(-1.0, 1.0), &device)
            })
            .collect();

        let factored = cell.recurrent_term(&lags).unwrap();
        let cell = cell.with_contraction(Contraction::Dense).unwrap();
        let dense = cell.recurrent_term(&lags).unwrap();

        let diff = (dense - factored).abs().max().into_scalar();
        assert!(diff < 1e-4, "contractions differ by {}", diff);
    }

    #[test]
    fn test_high_order_cell_defaults_to_factored() {
        let device = get_test_device();
        // D = 64 * 2 + 1 = 129, D^6 is far beyond any dense state
        let cell = TensorRnnCell::<TestBackend>::new(3, 64, 2, &[4; 5], &device).unwrap();
        assert_eq!(cell.contraction(), Contraction::Factored);

        let input = Tensor::<TestBackend, 2>::ones([1, 3], &device);
        let lags = vec![Tensor::<TestBackend, 2>::zeros([1, 64], &device); 2];
        let (output, _) = cell.forward(input, &lags).unwrap();
        assert_eq!(output.dims(), [1, 64]);

        assert!(matches!(
            cell.with_contraction(Contraction::Dense),
            Err(crate::TensorRnnError::Config(_))
        ));
    }

    #[test]
    fn test_tensor_cell_wrong_input_width() {
        let device = get_test_device();
        let cell = TensorRnnCell::<TestBackend>::new(2, 4, 2, &[3], &device).unwrap();
        let input = Tensor::<TestBackend, 2>::ones([1, 3], &device);
        let lags = vec![Tensor::<TestBackend, 2>::zeros([1, 4], &device); 2];
        assert!(matches!(
            cell.forward(input, &lags),
            Err(crate::TensorRnnError::Shape { .. })
        ));
    }
}
