//! Training hyperparameters and the learning-rate schedule.

use crate::cells::CellKind;
use crate::config::ModelConfig;
use crate::error::TensorRnnError;
use burn::config::Config;

/// Everything the training driver needs besides the data.
#[derive(Config, Debug)]
pub struct TrainingConfig {
    pub model: ModelConfig,
    #[config(default = 0.01)]
    pub learning_rate: f64,
    /// Per-epoch decay factor once `max_epoch` is reached.
    #[config(default = 0.9)]
    pub lr_decay: f64,
    /// Epochs trained at the base learning rate.
    #[config(default = 10)]
    pub max_epoch: usize,
    /// Total epochs.
    #[config(default = 20)]
    pub max_max_epoch: usize,
    /// Global gradient-norm clipping threshold.
    #[config(default = 10.0)]
    pub max_grad_norm: f32,
    #[config(default = 20)]
    pub batch_size: usize,
    /// Truncated backpropagation length.
    #[config(default = 12)]
    pub num_steps: usize,
    #[config(default = 1)]
    pub eval_batch_size: usize,
    #[config(default = 12)]
    pub eval_num_steps: usize,
    #[config(default = 0.8)]
    pub train_fraction: f64,
    #[config(default = 0.1)]
    pub valid_fraction: f64,
}

impl TrainingConfig {
    /// Small two-layer tensor-train setup for a series with `num_channels`
    /// channels, predicting every channel.
    pub fn tiny(num_channels: usize) -> Self {
        let model = ModelConfig::new(num_channels, num_channels)
            .with_cell(CellKind::TensorTrain)
            .with_hidden_size(64)
            .with_num_layers(2)
            .with_num_lags(2)
            .with_uniform_rank(2, 3)
            .with_keep_prob(1.0)
            .with_init_scale(1.0);
        Self::new(model)
    }

    /// `learning_rate * lr_decay^max(epoch + 1 - max_epoch, 0)`, epochs counted
    /// from zero.
    pub fn learning_rate_for_epoch(&self, epoch: usize) -> f64 {
        let exponent = (epoch + 1).saturating_sub(self.max_epoch);
        self.learning_rate * self.lr_decay.powi(exponent as i32)
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        self.model.validate()?;
        if self.model.input_size != self.model.output_size {
            return Err(TensorRnnError::config(format!(
                "next-step forecasting needs input_size == output_size, got {} and {}",
                self.model.input_size, self.model.output_size
            )));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(TensorRnnError::config("learning_rate must be positive"));
        }
        if !(self.lr_decay > 0.0 && self.lr_decay <= 1.0) {
            return Err(TensorRnnError::config("lr_decay must be in (0, 1]"));
        }
        if !(self.max_grad_norm > 0.0) {
            return Err(TensorRnnError::config("max_grad_norm must be positive"));
        }
        for (name, value) in [
            ("max_max_epoch", self.max_max_epoch),
            ("batch_size", self.batch_size),
            ("num_steps", self.num_steps),
            ("eval_batch_size", self.eval_batch_size),
            ("eval_num_steps", self.eval_num_steps),
        ] {
            if value == 0 {
                return Err(TensorRnnError::config(format!("{} must be positive", name)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_holds_then_decays() {
        let config = TrainingConfig::tiny(1)
            .with_learning_rate(1.0)
            .with_lr_decay(0.5)
            .with_max_epoch(3);
        assert_eq!(config.learning_rate_for_epoch(0), 1.0);
        assert_eq!(config.learning_rate_for_epoch(1), 1.0);
        assert_eq!(config.learning_rate_for_epoch(2), 1.0);
        assert_eq!(config.learning_rate_for_epoch(3), 0.5);
        assert_eq!(config.learning_rate_for_epoch(5), 0.125);
    }

    #[test]
    fn test_tiny_matches_reference_setup() {
        let config = TrainingConfig::tiny(3);
        assert_eq!(config.model.num_layers, 2);
        assert_eq!(config.model.hidden_size, 64);
        assert_eq!(config.model.rank_vals, vec![3]);
        assert_eq!(config.num_steps, 12);
        assert_eq!(config.batch_size, 20);
        assert_eq!(config.max_max_epoch, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_channel_mismatch_rejected() {
        let config = TrainingConfig::new(ModelConfig::new(2, 1));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_json_round_trip() {
        let config = TrainingConfig::tiny(2).with_num_steps(5);
        let json = serde_json::to_string(&config).unwrap();
        let back: TrainingConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.num_steps, 5);
        assert_eq!(back.model.input_size, 2);
    }
}
