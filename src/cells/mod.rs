//! # High-Order Recurrent Cells
//!
//! Single-timestep cells that condition on a window of the last `L` hidden
//! states instead of only the previous one. They are unrolled over a sequence
//! by [`crate::rnn::tensor_rnn`].
//!
//! ## Cell Types
//!
//! | Cell | Recurrent term | Parameters |
//! |------|----------------|------------|
//! | [`TensorRnnCell`] | tensor-train contraction of `s ⊗ ... ⊗ s` | `O(K · D · r²)` |
//! | [`MatrixRnnCell`] | linear map of the concatenated lags | `O(L · H²)` |
//! | [`FullTensorRnnCell`] | dense contraction of `s ⊗ ... ⊗ s` | `O(D^K · H)` |
//!
//! Here `s = [h_{t-L}, ..., h_{t-1}, 1]` is the augmented state of length
//! `D = H · L + 1`, and the step is
//!
//! ```text
//! h_t = activation(x_t · W_x + f(s) + b)
//! ```
//!
//! The output equals the new state; there is no separate cell memory.
//!
//! ## Tensor Shapes
//!
//! | Tensor | Shape | Description |
//! |--------|-------|-------------|
//! | `input` | `[batch, input_size]` | Input features |
//! | `lags[i]` | `[batch, hidden_size]` | Lag state `i`, oldest first |
//! | `output` | `[batch, hidden_size]` | Cell output |
//! | `new_state` | `[batch, hidden_size]` | Updated hidden state |
//!
//! ## Example: Using TensorRnnCell Directly
//!
//! ```ignore
//! use tensor_rnn::cells::{RecurrentCell, TensorRnnCell};
//!
//! let cell = TensorRnnCell::<Backend>::new(3, 16, 2, &[4], &device)?;
//!
//! let input: Tensor<Backend, 2> = /* [batch, 3] */;
//! let lags = vec![Tensor::zeros([batch, 16], &device); 2];
//!
//! let (output, new_state) = cell.forward(input, &lags)?;
//! ```

pub mod full_tensor_cell;
pub mod layer_cell;
pub mod matrix_cell;
pub mod stack;
pub mod tensor_cell;

pub use full_tensor_cell::FullTensorRnnCell;
pub use layer_cell::{CellKind, LayerCell};
pub use matrix_cell::MatrixRnnCell;
pub use stack::CellStack;
pub use tensor_cell::{Contraction, TensorRnnCell};

use crate::error::{ensure_dims, Result, TensorRnnError};
use crate::rnn::LagWindow;
use burn::module::Param;
use burn::nn::{Initializer, Linear, LinearConfig};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Scale of the uniform initialiser used when none is given.
pub const DEFAULT_INIT_SCALE: f64 = 0.1;

/// One step of a single-layer recurrence over a lag window.
pub trait RecurrentCell<B: Backend> {
    fn input_size(&self) -> usize;

    fn hidden_size(&self) -> usize;

    /// Number of lag states consumed per step.
    fn num_lags(&self) -> usize;

    /// Run one step.
    ///
    /// `lags` holds exactly `num_lags()` states, oldest first. Returns
    /// `(output, new_state)`, which are the same tensor for these cells.
    fn forward(
        &self,
        input: Tensor<B, 2>,
        lags: &[Tensor<B, 2>],
    ) -> Result<(Tensor<B, 2>, Tensor<B, 2>)>;
}

/// Anything the sequence driver can unroll: one step over a whole lag window,
/// possibly spanning several layers.
pub trait StepCell<B: Backend> {
    fn num_layers(&self) -> usize;

    /// Hidden size of each layer, bottom first.
    fn state_sizes(&self) -> Vec<usize>;

    /// Lag window length the cell expects.
    fn window_len(&self) -> usize;

    /// Returns the top-layer output and the new state of every layer.
    fn step(&self, input: Tensor<B, 2>, window: &LagWindow<B>)
        -> Result<(Tensor<B, 2>, Vec<Tensor<B, 2>>)>;
}

macro_rules! single_layer_step_cell {
    ($($cell:ident),* $(,)?) => {
        $(
            impl<B: Backend> StepCell<B> for $cell<B> {
                fn num_layers(&self) -> usize {
                    1
                }

                fn state_sizes(&self) -> Vec<usize> {
                    vec![RecurrentCell::hidden_size(self)]
                }

                fn window_len(&self) -> usize {
                    RecurrentCell::num_lags(self)
                }

                fn step(
                    &self,
                    input: Tensor<B, 2>,
                    window: &LagWindow<B>,
                ) -> Result<(Tensor<B, 2>, Vec<Tensor<B, 2>>)> {
                    let lags = window.layer(0)?;
                    let (output, state) = RecurrentCell::forward(self, input, &lags)?;
                    Ok((output, vec![state]))
                }
            }
        )*
    };
}

single_layer_step_cell!(MatrixRnnCell, TensorRnnCell, FullTensorRnnCell, LayerCell);

/// Validate one step's inputs and return the batch size.
pub(crate) fn check_step_inputs<B: Backend>(
    context: &'static str,
    input: &Tensor<B, 2>,
    lags: &[Tensor<B, 2>],
    input_size: usize,
    hidden_size: usize,
    num_lags: usize,
) -> Result<usize> {
    let [batch, features] = input.dims();
    ensure_dims(context, &[batch, input_size], &[batch, features])?;
    if lags.len() != num_lags {
        return Err(TensorRnnError::Shape {
            context,
            expected: vec![num_lags],
            actual: vec![lags.len()],
        });
    }
    for lag in lags {
        ensure_dims(context, &[batch, hidden_size], &lag.dims())?;
    }
    Ok(batch)
}

/// Affine map with `U(-scale, scale)` initialisation.
pub(crate) fn uniform_linear<B: Backend>(
    d_input: usize,
    d_output: usize,
    scale: f64,
    device: &B::Device,
) -> Linear<B> {
    LinearConfig::new(d_input, d_output)
        .with_bias(true)
        .with_initializer(Initializer::Uniform {
            min: -scale,
            max: scale,
        })
        .init(device)
}

/// Overwrite an affine map's weight `[d_in, d_out]` and bias `[d_out]`.
pub(crate) fn assign_linear<B: Backend>(
    linear: &mut Linear<B>,
    weight: Tensor<B, 2>,
    bias: Tensor<B, 1>,
    context: &'static str,
) -> Result<()> {
    let expected = linear.weight.val().dims();
    ensure_dims(context, &expected, &weight.dims())?;
    ensure_dims(context, &[expected[1]], &bias.dims())?;
    linear.weight = Param::from_tensor(weight);
    linear.bias = Some(Param::from_tensor(bias));
    Ok(())
}
