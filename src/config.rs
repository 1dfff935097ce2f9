//! Model configuration
//!
//! Every hyperparameter that shapes the network lives in [`ModelConfig`], an
//! immutable value handed to the constructors by reference. It serialises to
//! JSON through burn's [`Config`] trait.

use crate::activation::Activation;
use crate::cells::{CellKind, Contraction};
use crate::error::TensorRnnError;
use crate::network::{augmented_size, dense_rows, dense_state_len, TtLayout};
use burn::config::Config;

/// Architecture of a (possibly stacked) high-order recurrent forecaster.
#[derive(Config, Debug)]
pub struct ModelConfig {
    /// Number of input channels per time step.
    pub input_size: usize,
    /// Number of predicted channels per time step.
    pub output_size: usize,
    /// Recurrent width `H` of every layer.
    #[config(default = 64)]
    pub hidden_size: usize,
    /// Length `L` of the lag window.
    #[config(default = 2)]
    pub num_lags: usize,
    /// Tensor order `K` of the recurrent term.
    #[config(default = 2)]
    pub num_orders: usize,
    /// Inner tensor-train ranks `r_1 ... r_{K-1}`; must hold `num_orders - 1` values.
    #[config(default = "vec![3]")]
    pub rank_vals: Vec<usize>,
    #[config(default = 1)]
    pub num_layers: usize,
    #[config(default = "CellKind::TensorTrain")]
    pub cell: CellKind,
    #[config(default = "Activation::Tanh")]
    pub activation: Activation,
    #[config(default = "Contraction::Factored")]
    pub contraction: Contraction,
    /// Probability of keeping an activation under dropout (1.0 disables it).
    #[config(default = 1.0)]
    pub keep_prob: f64,
    /// Parameters are drawn from `U(-init_scale, init_scale)`.
    #[config(default = 0.1)]
    pub init_scale: f64,
}

impl ModelConfig {
    /// Set `num_orders` and use the same inner rank for every bond.
    pub fn with_uniform_rank(mut self, num_orders: usize, rank: usize) -> Self {
        self.num_orders = num_orders;
        self.rank_vals = vec![rank; num_orders.saturating_sub(1)];
        self
    }

    /// Augmented state length `D = H * L + 1`.
    pub fn augmented_size(&self) -> usize {
        augmented_size(self.hidden_size, self.num_lags)
    }

    /// Core chain layout for the tensor-train cell.
    pub fn tt_layout(&self) -> crate::error::Result<TtLayout> {
        if self.rank_vals.len() + 1 != self.num_orders {
            return Err(TensorRnnError::config(format!(
                "tensor order {} needs {} inner ranks, got rank_vals {:?}",
                self.num_orders,
                self.num_orders.saturating_sub(1),
                self.rank_vals
            )));
        }
        TtLayout::new(self.augmented_size(), &self.rank_vals, self.hidden_size)
    }

    /// Input width of layer `layer`: the raw input for the first layer, the
    /// hidden state of the layer below otherwise.
    pub fn layer_input_size(&self, layer: usize) -> usize {
        if layer == 0 {
            self.input_size
        } else {
            self.hidden_size
        }
    }

    /// Check the configuration before anything is allocated.
    pub fn validate(&self) -> crate::error::Result<()> {
        for (name, value) in [
            ("input_size", self.input_size),
            ("output_size", self.output_size),
            ("hidden_size", self.hidden_size),
            ("num_lags", self.num_lags),
            ("num_orders", self.num_orders),
            ("num_layers", self.num_layers),
        ] {
            if value == 0 {
                return Err(TensorRnnError::config(format!("{} must be positive", name)));
            }
        }
        if !(self.keep_prob > 0.0 && self.keep_prob <= 1.0) {
            return Err(TensorRnnError::config(format!(
                "keep_prob must be in (0, 1], got {}",
                self.keep_prob
            )));
        }
        if !(self.init_scale.is_finite() && self.init_scale > 0.0) {
            return Err(TensorRnnError::config(format!(
                "init_scale must be positive, got {}",
                self.init_scale
            )));
        }

        match self.cell {
            CellKind::Matrix => Ok(()),
            CellKind::TensorTrain => {
                self.tt_layout()?;
                if self.contraction == Contraction::Dense {
                    dense_state_len(self.augmented_size(), self.num_orders)?;
                }
                Ok(())
            }
            CellKind::FullTensor => {
                dense_rows(self.augmented_size(), self.num_orders, self.hidden_size).map(|_| ())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = ModelConfig::new(1, 1);
        assert_eq!(config.hidden_size, 64);
        assert_eq!(config.num_orders, 2);
        assert_eq!(config.rank_vals, vec![3]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_order_rank_mismatch() {
        let config = ModelConfig::new(2, 2).with_num_orders(3).with_rank_vals(vec![3]);
        assert!(matches!(config.validate(), Err(TensorRnnError::Config(_))));
    }

    #[test]
    fn test_uniform_rank() {
        let config = ModelConfig::new(2, 2).with_uniform_rank(4, 5);
        assert_eq!(config.rank_vals, vec![5, 5, 5]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_sizes_rejected() {
        assert!(ModelConfig::new(0, 1).validate().is_err());
        assert!(ModelConfig::new(1, 1).with_num_lags(0).validate().is_err());
        assert!(ModelConfig::new(1, 1).with_keep_prob(0.0).validate().is_err());
    }

    #[test]
    fn test_full_tensor_intractable() {
        let config = ModelConfig::new(1, 1)
            .with_cell(CellKind::FullTensor)
            .with_hidden_size(128)
            .with_uniform_rank(4, 2);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_dense_contraction_bounded() {
        let config = ModelConfig::new(3, 3)
            .with_hidden_size(64)
            .with_uniform_rank(6, 4);
        assert_eq!(config.contraction, Contraction::Factored);
        assert!(config.validate().is_ok());

        let dense = config.with_contraction(Contraction::Dense);
        assert!(matches!(dense.validate(), Err(TensorRnnError::Config(_))));
    }

    #[test]
    fn test_matrix_ignores_ranks() {
        let config = ModelConfig::new(1, 1)
            .with_cell(CellKind::Matrix)
            .with_num_orders(5)
            .with_rank_vals(vec![]);
        assert!(config.validate().is_ok());
    }
}
