//! Dense full-tensor reference contraction
//!
//! Stores the high-order weight tensor as one `[D^K, H]` matrix. This grows
//! exponentially with the order and is only meant as a baseline for small
//! orders, to check the tensor-train path against.

use crate::error::{ensure_dims, Result, TensorRnnError};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Largest `D^K * H` a dense weight tensor may have.
pub const MAX_DENSE_ENTRIES: usize = 1 << 24;

fn checked_power(dim: usize, order: usize) -> Result<usize> {
    (0..order)
        .try_fold(1usize, |acc, _| acc.checked_mul(dim))
        .ok_or_else(|| TensorRnnError::config("dense state tensor size overflows usize"))
}

/// `D^K` for a dense weight tensor, failing when it is not tractable.
pub fn dense_rows(dim: usize, order: usize, output_size: usize) -> Result<usize> {
    let rows = checked_power(dim, order)?;
    match rows.checked_mul(output_size) {
        Some(entries) if entries <= MAX_DENSE_ENTRIES => Ok(rows),
        _ => Err(TensorRnnError::config(format!(
            "dense weight tensor {}^{} x {} exceeds {} entries; use the tensor-train cell",
            dim, order, output_size, MAX_DENSE_ENTRIES
        ))),
    }
}

/// `D^K` entries of one example's materialised state tensor, failing when
/// that is not tractable.
pub fn dense_state_len(dim: usize, order: usize) -> Result<usize> {
    let len = checked_power(dim, order)?;
    if len > MAX_DENSE_ENTRIES {
        return Err(TensorRnnError::config(format!(
            "dense state tensor {}^{} exceeds {} entries per example; use the factored contraction",
            dim, order, MAX_DENSE_ENTRIES
        )));
    }
    Ok(len)
}

/// `state [batch, D^K] · weights [D^K, H] -> [batch, H]`.
pub fn full_contract<B: Backend>(state: Tensor<B, 2>, weights: Tensor<B, 2>) -> Result<Tensor<B, 2>> {
    let [batch, len] = state.dims();
    let [rows, _] = weights.dims();
    ensure_dims("full_contract(state)", &[batch, rows], &[batch, len])?;
    Ok(state.matmul(weights))
}
