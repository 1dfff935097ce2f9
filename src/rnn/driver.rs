//! Sequence driver for lag-window recurrences

use super::LagWindow;
use crate::cells::StepCell;
use crate::error::{ensure_dims, Result, TensorRnnError};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Unroll `cell` over `inputs` (`[batch, num_steps, features]`).
///
/// Every step reads the current window, runs the cell once and pushes the new
/// per-layer states, evicting the oldest lag. The same cell, and so the same
/// parameters, serves every step. Returns one `[batch, output]` tensor per
/// step and the final window.
pub fn tensor_rnn<B: Backend, C: StepCell<B>>(
    cell: &C,
    inputs: Tensor<B, 3>,
    num_lags: usize,
    initial: LagWindow<B>,
) -> Result<(Vec<Tensor<B, 2>>, LagWindow<B>)> {
    if num_lags != cell.window_len() {
        return Err(TensorRnnError::config(format!(
            "driver asked for {} lags but the cell expects {}",
            num_lags,
            cell.window_len()
        )));
    }
    ensure_dims("tensor_rnn(window lags)", &[num_lags], &[initial.num_lags()])?;
    ensure_dims(
        "tensor_rnn(window layers)",
        &[cell.num_layers()],
        &[initial.num_layers()],
    )?;

    let [batch_size, num_steps, features] = inputs.dims();
    let mut window = initial;
    let mut outputs = Vec::with_capacity(num_steps);

    for t in 0..num_steps {
        let step_input = inputs
            .clone()
            .narrow(1, t, 1)
            .reshape([batch_size, features]);
        let (output, states) = cell.step(step_input, &window)?;
        window.push(states)?;
        outputs.push(output);
    }

    Ok((outputs, window))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cells::MatrixRnnCell;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_driver_output_count() {
        let device = Default::default();
        let cell = MatrixRnnCell::<TestBackend>::new(3, 4, 2, &device).unwrap();
        let inputs = Tensor::<TestBackend, 3>::ones([2, 5, 3], &device);
        let window = LagWindow::zeros(2, 2, &[4], &device).unwrap();

        let (outputs, window) = tensor_rnn(&cell, inputs, 2, window).unwrap();
        assert_eq!(outputs.len(), 5);
        assert_eq!(outputs[4].dims(), [2, 4]);
        assert_eq!(window.num_lags(), 2);
    }

    #[test]
    fn test_driver_rejects_lag_mismatch() {
        let device = Default::default();
        let cell = MatrixRnnCell::<TestBackend>::new(3, 4, 2, &device).unwrap();
        let inputs = Tensor::<TestBackend, 3>::ones([2, 5, 3], &device);

        let window = LagWindow::zeros(3, 2, &[4], &device).unwrap();
        assert!(tensor_rnn(&cell, inputs.clone(), 3, window).is_err());

        let window = LagWindow::zeros(3, 2, &[4], &device).unwrap();
        assert!(tensor_rnn(&cell, inputs, 2, window).is_err());
    }
}
