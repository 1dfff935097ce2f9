//! Training Demo - Logistic Map Forecasting
//!
//! Generates a chaotic logistic-map series and trains a small tensor-train
//! RNN to predict the next value. Set `RUST_LOG=debug` for per-batch losses.

use burn::backend::{Autodiff, NdArray};
use tensor_rnn::config::ModelConfig;
use tensor_rnn::data::logistic_series;
use tensor_rnn::train::{train, TrainingConfig};

fn main() -> tensor_rnn::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    println!("=== Tensor RNN Training Example ===\n");

    type Backend = Autodiff<NdArray<f32>>;
    let device = Default::default();

    let series = logistic_series(0.2, 2_000, 1)?;
    println!("Series: {} rows x {} channel(s)", series.nrows(), series.ncols());

    let model = ModelConfig::new(1, 1)
        .with_hidden_size(16)
        .with_num_lags(3)
        .with_uniform_rank(2, 4);
    let config = TrainingConfig::new(model)
        .with_learning_rate(0.01)
        .with_max_epoch(3)
        .with_max_max_epoch(5)
        .with_batch_size(10)
        .with_num_steps(12);

    let out_dir = std::env::temp_dir().join("tensor_rnn_training_demo");
    let report = train::<Backend>(&config, &series, &out_dir, &device)?;

    println!("\nEpoch  LR       Train     Valid");
    for summary in &report.epochs {
        println!(
            "{:>5}  {:.5}  {:.6}  {:.6}{}",
            summary.epoch,
            summary.learning_rate,
            summary.train_error,
            summary.valid_error,
            if summary.diverged { "  (diverged)" } else { "" }
        );
    }
    println!("\nTest error: {:.6}", report.test_error);
    println!("Checkpoint:  {}", report.checkpoint.display());
    println!("Predictions: {}", report.predictions.display());

    Ok(())
}
