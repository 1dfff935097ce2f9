//! Tensor-train core chain and its contraction against the state tensor
//!
//! A dense weight tensor `W[j_1, ..., j_K, o]` over `K` state axes of size `D`
//! has `D^K * H` entries. In tensor-train form it becomes a chain of 3-way cores
//!
//! ```text
//! W[j_1, ..., j_K, o] = G_1[0, j_1, :] · G_2[:, j_2, :] · ... · G_K[:, j_K, o]
//! ```
//!
//! where `G_i` has shape `(r_{i-1}, D, r_i)`, `r_0 = 1` and `r_K = H`. All cores
//! live in one flat parameter vector; core `i` occupies
//! `offsets[i]..offsets[i + 1]`, with `offsets` the running sum of
//! `r_{i-1} * D * r_i`.
//!
//! ## Contraction
//!
//! [`tt_contract`] consumes a materialised state tensor `[batch, D^K]`. The batch
//! axis is moved last, then each core is applied as one matrix product:
//!
//! ```text
//! R <- reshape(R, [r_{i-1} * D, -1])
//! R <- reshape(G_i, [r_{i-1} * D, r_i])^T · R
//! ```
//!
//! leaving `[H, batch]`, which is transposed back. [`tt_contract_factored`]
//! exploits that the state tensor is the outer power of one vector and never
//! forms it: every core is first collapsed against the vector into a
//! `[batch, r_{i-1}, r_i]` matrix, and the matrices are chained.

use crate::error::{ensure_dims, Result, TensorRnnError};
use burn::module::{Module, Param};
use burn::tensor::backend::Backend;
use burn::tensor::{Distribution, Tensor};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Shape bookkeeping for a tensor-train core chain.
///
/// Built only through [`TtLayout::new`], which guarantees that adjacent ranks
/// match and that the offsets tile the flat storage exactly.
#[derive(Module, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtLayout {
    dim: usize,
    ranks: Vec<usize>,
    offsets: Vec<usize>,
}

impl TtLayout {
    /// Lay out a chain of `rank_vals.len() + 1` cores over axes of size `dim`.
    ///
    /// `rank_vals` are the inner bond dimensions `r_1 ... r_{K-1}`; the outer
    /// ranks are fixed to `1` and `output_size`.
    pub fn new(dim: usize, rank_vals: &[usize], output_size: usize) -> Result<Self> {
        if dim == 0 {
            return Err(TensorRnnError::config("core mode size must be positive"));
        }
        if output_size == 0 {
            return Err(TensorRnnError::config("output size must be positive"));
        }
        if let Some(pos) = rank_vals.iter().position(|&r| r == 0) {
            return Err(TensorRnnError::config(format!(
                "rank_vals[{}] is zero; every tensor-train rank must be positive",
                pos
            )));
        }

        let mut ranks = Vec::with_capacity(rank_vals.len() + 2);
        ranks.push(1);
        ranks.extend_from_slice(rank_vals);
        ranks.push(output_size);

        let mut offsets = Vec::with_capacity(ranks.len());
        offsets.push(0usize);
        for window in ranks.windows(2) {
            let size = window[0]
                .checked_mul(dim)
                .and_then(|n| n.checked_mul(window[1]))
                .ok_or_else(|| TensorRnnError::config("core size overflows usize"))?;
            let last = *offsets.last().unwrap_or(&0);
            let next = last
                .checked_add(size)
                .ok_or_else(|| TensorRnnError::config("core chain size overflows usize"))?;
            offsets.push(next);
        }

        Ok(Self {
            dim,
            ranks,
            offsets,
        })
    }

    /// Number of cores, i.e. the tensor order.
    pub fn order(&self) -> usize {
        self.ranks.len() - 1
    }

    /// Mode size `D` shared by every core.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Full rank list `[1, r_1, ..., r_{K-1}, H]`.
    pub fn ranks(&self) -> &[usize] {
        &self.ranks
    }

    /// Cumulative core offsets, `order() + 1` entries starting at zero.
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    pub fn output_size(&self) -> usize {
        self.ranks[self.ranks.len() - 1]
    }

    /// Total number of stored core parameters.
    pub fn storage_size(&self) -> usize {
        self.offsets[self.offsets.len() - 1]
    }

    /// `(r_{i-1}, D, r_i)` for core `i` (zero-based).
    pub fn core_shape(&self, i: usize) -> [usize; 3] {
        [self.ranks[i], self.dim, self.ranks[i + 1]]
    }

    /// Slice of the flat storage holding core `i`.
    pub fn core_range(&self, i: usize) -> Range<usize> {
        self.offsets[i]..self.offsets[i + 1]
    }

    /// `D^K`, the length of a flattened state tensor, if it fits in `usize`.
    pub fn dense_size(&self) -> Option<usize> {
        (0..self.order()).try_fold(1usize, |acc, _| acc.checked_mul(self.dim))
    }

    /// Check that a flat storage vector has exactly the laid-out length.
    pub fn check_storage(&self, len: usize) -> Result<()> {
        if len != self.storage_size() {
            return Err(TensorRnnError::config(format!(
                "core chain storage has {} entries but ranks {:?} over mode size {} need {}",
                len,
                self.ranks,
                self.dim,
                self.storage_size()
            )));
        }
        Ok(())
    }
}

/// Trainable tensor-train core chain.
///
/// All cores share one flat parameter vector so that the chain is a single
/// weight, created once and reused by every time step.
#[derive(Module, Debug)]
pub struct TtCores<B: Backend> {
    weights: Param<Tensor<B, 1>>,
    #[module(skip)]
    layout: TtLayout,
}

impl<B: Backend> TtCores<B> {
    /// Randomly initialise a core chain with `U(-init_scale, init_scale)`.
    pub fn new(layout: TtLayout, init_scale: f64, device: &B::Device) -> Self {
        let weights = Tensor::<B, 1>::random(
            [layout.storage_size()],
            Distribution::Uniform(-init_scale, init_scale),
            device,
        );
        Self {
            weights: Param::from_tensor(weights),
            layout,
        }
    }

    /// Use explicit core values laid out as `layout` describes.
    pub fn from_flat(layout: TtLayout, weights: Tensor<B, 1>) -> Result<Self> {
        layout.check_storage(weights.dims()[0])?;
        Ok(Self {
            weights: Param::from_tensor(weights),
            layout,
        })
    }

    pub fn layout(&self) -> &TtLayout {
        &self.layout
    }

    /// The flat storage of every core.
    pub fn flat(&self) -> Tensor<B, 1> {
        self.weights.val()
    }

    /// Core `i` as a `(r_{i-1}, D, r_i)` tensor.
    pub fn core(&self, i: usize) -> Tensor<B, 3> {
        let range = self.layout.core_range(i);
        self.weights.val().slice([range]).reshape(self.layout.core_shape(i))
    }
}

/// Contract a flattened state tensor `[batch, D^K]` against the core chain.
///
/// Returns `[batch, H]`.
pub fn tt_contract<B: Backend>(state: Tensor<B, 2>, cores: &TtCores<B>) -> Result<Tensor<B, 2>> {
    let layout = cores.layout();
    let [batch, len] = state.dims();
    let dense = layout.dense_size().ok_or_else(|| {
        TensorRnnError::config("state tensor size D^K overflows usize")
    })?;
    ensure_dims("tt_contract(state)", &[batch, dense], &[batch, len])?;

    let d = layout.dim();
    let ranks = layout.ranks();
    let weights = cores.weights.val();

    // Batch goes on the trailing axis so each reshape groups (rank, mode) rows
    // and leaves the columns enumerating (remaining modes, batch).
    let mut remainder = state.transpose();
    let mut total = len * batch;
    for i in 0..layout.order() {
        let rows = ranks[i] * d;
        remainder = remainder.reshape([rows, total / rows]);
        let core = weights
            .clone()
            .slice([layout.core_range(i)])
            .reshape([rows, ranks[i + 1]])
            .transpose();
        remainder = core.matmul(remainder);
        total = ranks[i + 1] * (total / rows);
    }

    Ok(remainder.reshape([layout.output_size(), batch]).transpose())
}

/// Contract the rank-one tensor `v ⊗ ... ⊗ v` (order K) against the chain
/// without materialising it. `vector` is `[batch, D]`, the result `[batch, H]`.
pub fn tt_contract_factored<B: Backend>(
    vector: Tensor<B, 2>,
    cores: &TtCores<B>,
) -> Result<Tensor<B, 2>> {
    let layout = cores.layout();
    let [batch, d] = vector.dims();
    ensure_dims("tt_contract_factored(vector)", &[batch, layout.dim()], &[batch, d])?;

    let ranks = layout.ranks();
    let mut chain: Option<Tensor<B, 3>> = None;
    for i in 0..layout.order() {
        let (r_in, r_out) = (ranks[i], ranks[i + 1]);
        // (r_in, D, r_out) -> (D, r_in * r_out)
        let core = cores
            .core(i)
            .swap_dims(0, 1)
            .reshape([d, r_in * r_out]);
        let collapsed = vector.clone().matmul(core).reshape([batch, r_in, r_out]);
        chain = Some(match chain {
            None => collapsed,
            Some(acc) => acc.matmul(collapsed),
        });
    }

    let chain = chain.ok_or_else(|| TensorRnnError::config("core chain is empty"))?;
    Ok(chain.reshape([batch, layout.output_size()]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::TensorData;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_layout_offsets() {
        // D = 9 (hidden 4, lags 2), order 2, rank 3, output 4
        let layout = TtLayout::new(9, &[3], 4).unwrap();
        assert_eq!(layout.order(), 2);
        assert_eq!(layout.ranks(), &[1, 3, 4]);
        assert_eq!(layout.offsets(), &[0, 27, 135]);
        assert_eq!(layout.storage_size(), 135);
        assert_eq!(layout.core_shape(1), [3, 9, 4]);
        assert_eq!(layout.dense_size(), Some(81));
    }

    #[test]
    fn test_layout_rejects_zero_rank() {
        assert!(matches!(
            TtLayout::new(9, &[3, 0], 4),
            Err(TensorRnnError::Config(_))
        ));
        assert!(TtLayout::new(0, &[3], 4).is_err());
        assert!(TtLayout::new(9, &[3], 0).is_err());
    }

    #[test]
    fn test_from_flat_checks_storage() {
        let device = Default::default();
        let layout = TtLayout::new(5, &[2], 3).unwrap();
        let wrong = Tensor::<TestBackend, 1>::zeros([layout.storage_size() - 1], &device);
        assert!(TtCores::from_flat(layout.clone(), wrong).is_err());

        let right = Tensor::<TestBackend, 1>::zeros([layout.storage_size()], &device);
        assert!(TtCores::from_flat(layout, right).is_ok());
    }

    #[test]
    fn test_core_views() {
        let device = Default::default();
        let layout = TtLayout::new(2, &[2], 1).unwrap();
        let flat: Vec<f32> = (0..layout.storage_size()).map(|v| v as f32).collect();
        let cores = TtCores::<TestBackend>::from_flat(
            layout,
            Tensor::from_data(TensorData::new(flat, [8]), &device),
        )
        .unwrap();

        assert_eq!(cores.core(0).dims(), [1, 2, 2]);
        assert_eq!(cores.core(1).dims(), [2, 2, 1]);
        let second: Vec<f32> = cores.core(1).into_data().iter::<f32>().collect();
        assert_eq!(second, vec![4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_contract_rejects_wrong_state_length() {
        let device = Default::default();
        let cores = TtCores::<TestBackend>::new(TtLayout::new(3, &[2], 2).unwrap(), 0.1, &device);
        let state = Tensor::<TestBackend, 2>::ones([4, 8], &device);
        assert!(matches!(
            tt_contract(state, &cores),
            Err(TensorRnnError::Shape { .. })
        ));
    }
}
