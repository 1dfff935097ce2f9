//! Basic Tensor RNN Usage Example
//!
//! Builds the three cell types on the same lag window and unrolls a
//! tensor-train cell over a short sequence.

use burn::backend::NdArray;
use burn::tensor::Tensor;
use tensor_rnn::prelude::*;

fn main() -> Result<()> {
    println!("=== Tensor RNN Basic Example ===\n");

    type Backend = NdArray<f32>;
    let device = Default::default();

    let (input_size, hidden_size, num_lags) = (3, 8, 2);
    let batch_size = 4;

    // Example 1: one step of each cell
    println!("1. Single step of each cell");
    let tt = TensorRnnCell::<Backend>::new(input_size, hidden_size, num_lags, &[4], &device)?;
    let matrix = MatrixRnnCell::<Backend>::new(input_size, hidden_size, num_lags, &device)?;
    let full = FullTensorRnnCell::<Backend>::new(input_size, hidden_size, num_lags, 2, &device)?;

    let input = Tensor::<Backend, 2>::random(
        [batch_size, input_size],
        burn::tensor::Distribution::Uniform(-1.0, 1.0),
        &device,
    );
    let lags = vec![Tensor::<Backend, 2>::zeros([batch_size, hidden_size], &device); num_lags];

    let (out_tt, _) = tt.forward(input.clone(), &lags)?;
    let (out_matrix, _) = matrix.forward(input.clone(), &lags)?;
    let (out_full, _) = full.forward(input, &lags)?;
    println!("   TensorRnnCell output:     {:?}", out_tt.dims());
    println!("   MatrixRnnCell output:     {:?}", out_matrix.dims());
    println!("   FullTensorRnnCell output: {:?}", out_full.dims());
    println!(
        "   Core chain: ranks {:?}, {} parameters (dense tensor: {})",
        tt.ranks(),
        tt.cores().layout().storage_size(),
        full.recurrent_weights().dims()[0] * hidden_size
    );
    println!();

    // Example 2: unroll over a sequence
    println!("2. Unrolling over 10 steps");
    let inputs = Tensor::<Backend, 3>::random(
        [batch_size, 10, input_size],
        burn::tensor::Distribution::Uniform(-1.0, 1.0),
        &device,
    );
    let window = LagWindow::zeros(num_lags, batch_size, &tt.state_sizes(), &device)?;
    let (outputs, window) = tensor_rnn(&tt, inputs, num_lags, window)?;
    println!("   {} outputs of {:?}", outputs.len(), outputs[0].dims());
    println!(
        "   Window: {} lags x {} layer(s)",
        window.num_lags(),
        window.num_layers()
    );
    println!();

    // Example 3: stacked model from a config
    println!("3. Two-layer forecaster");
    let config = ModelConfig::new(input_size, input_size)
        .with_hidden_size(hidden_size)
        .with_num_layers(2)
        .with_uniform_rank(3, 2);
    let model = TensorRnnModel::<Backend>::new(&config, &device)?;
    let inputs = Tensor::<Backend, 3>::zeros([batch_size, 6, input_size], &device);
    let (predictions, _) = model.forward(inputs, model.zero_window(batch_size, &device)?)?;
    println!("   Predictions: {:?}", predictions.dims());

    println!("\n=== Example completed successfully! ===");
    Ok(())
}
