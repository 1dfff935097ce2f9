//! Activation functions for the recurrent cells
//!
//! Every cell ends its step with `activation(out_x + out_h + bias)`. The choice
//! is part of the model configuration and is fixed once the cell is built.

use burn::tensor::activation;
use burn::tensor::{backend::Backend, Tensor};
use serde::{Deserialize, Serialize};

/// Element-wise nonlinearity applied to the pre-activation of a cell.
#[derive(burn::module::Module, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Activation {
    /// Hyperbolic tangent (the usual choice for these cells)
    #[default]
    Tanh,
    Relu,
    Sigmoid,
    /// `1.7159 * tanh(0.666 * x)`, see [`LeCun`]
    LeCunTanh,
    /// No nonlinearity. Makes the cell a pure linear/multilinear map,
    /// which is handy when checking contractions against each other.
    Identity,
}

impl Activation {
    /// Apply the activation to a tensor of any rank.
    pub fn apply<B: Backend, const D: usize>(&self, x: Tensor<B, D>) -> Tensor<B, D> {
        match self {
            Activation::Tanh => x.tanh(),
            Activation::Relu => activation::relu(x),
            Activation::Sigmoid => activation::sigmoid(x),
            Activation::LeCunTanh => LeCun::forward(x),
            Activation::Identity => x,
        }
    }
}

impl std::str::FromStr for Activation {
    type Err = crate::TensorRnnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tanh" => Ok(Activation::Tanh),
            "relu" => Ok(Activation::Relu),
            "sigmoid" => Ok(Activation::Sigmoid),
            "lecun_tanh" => Ok(Activation::LeCunTanh),
            "identity" | "linear" => Ok(Activation::Identity),
            other => Err(crate::TensorRnnError::config(format!(
                "Unknown activation: {}. Valid options are [\"tanh\", \"relu\", \"sigmoid\", \"lecun_tanh\", \"identity\"]",
                other
            ))),
        }
    }
}

/// LeCun's tanh activation function.
///
/// `f(x) = 1.7159 * tanh(0.666 * x)`
///
/// Approximately the identity near the origin, with outputs bounded by
/// ±1.7159.
///
/// # Example
///
/// ```rust
/// use burn::backend::NdArray;
/// use burn::tensor::Tensor;
/// use tensor_rnn::activation::LeCun;
///
/// type Backend = NdArray<f32>;
/// let device = Default::default();
///
/// let x = Tensor::<Backend, 1>::from_floats([0.0, 1.0, -1.0], &device);
/// let y = LeCun::forward(x);
/// ```
pub struct LeCun;

impl LeCun {
    pub fn forward<B: Backend, const D: usize>(x: Tensor<B, D>) -> Tensor<B, D> {
        let scaled = x * 0.666f32;
        scaled.tanh() * 1.7159f32
    }
}
