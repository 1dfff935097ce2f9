//! Save and Load Example
//!
//! Writes a model with burn's file recorder and restores it into a fresh
//! instance built from the same configuration.

use burn::backend::NdArray;
use burn::module::Module;
use burn::record::{BinFileRecorder, FullPrecisionSettings};
use burn::tensor::Tensor;
use tensor_rnn::prelude::*;

fn main() -> Result<()> {
    println!("=== Model Save/Load Example ===\n");

    type Backend = NdArray<f32>;
    let device = Default::default();

    let config = ModelConfig::new(3, 3)
        .with_hidden_size(16)
        .with_num_lags(2)
        .with_uniform_rank(3, 4);
    let model = TensorRnnModel::<Backend>::new(&config, &device)?;

    let inputs = Tensor::<Backend, 3>::random(
        [1, 10, 3],
        burn::tensor::Distribution::Uniform(-1.0, 1.0),
        &device,
    );
    let (before, _) = model.forward(inputs.clone(), model.zero_window(1, &device)?)?;

    let path = std::env::temp_dir().join("tensor_rnn_save_load");
    let recorder = BinFileRecorder::<FullPrecisionSettings>::new();
    model
        .save_file(path.clone(), &recorder)
        .map_err(TensorRnnError::record)?;
    println!("Saved to {}.bin", path.display());

    let restored = TensorRnnModel::<Backend>::new(&config, &device)?
        .load_file(path, &recorder, &device)
        .map_err(TensorRnnError::record)?;
    let (after, _) = restored.forward(inputs, restored.zero_window(1, &device)?)?;

    let diff = (before - after).abs().max().into_scalar();
    println!("Max difference after reload: {}", diff);

    println!("\n=== Example completed successfully! ===");
    Ok(())
}
