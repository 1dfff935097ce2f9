//! Outer-product builder for the high-order state tensor
//!
//! The recurrent term of a high-order cell is a multilinear function of the
//! augmented state vector `s = [h_{t-L}, ..., h_{t-1}, 1]`. Its input is the
//! order-way tensor `s ⊗ s ⊗ ... ⊗ s`, built here one axis at a time.
//!
//! Burn tensors carry their rank as a const generic, while the order of the
//! state tensor is a runtime configuration value. [`StateTensor`] therefore
//! stores the data flattened to `[batch, prod(dims)]` next to its logical
//! shape. Flattening is row-major: the first axis added is the most
//! significant.

use crate::error::{ensure_dims, Result, TensorRnnError};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// A batched tensor of logical shape `[batch, dims...]`, stored flat.
#[derive(Debug, Clone)]
pub struct StateTensor<B: Backend> {
    flat: Tensor<B, 2>,
    dims: Vec<usize>,
}

impl<B: Backend> StateTensor<B> {
    /// Wrap a batch of vectors `[batch, d]` as an order-1 state tensor.
    pub fn from_vector(vector: Tensor<B, 2>) -> Self {
        let [_, d] = vector.dims();
        Self {
            flat: vector,
            dims: vec![d],
        }
    }

    /// Wrap flat data `[batch, prod(dims)]` with its logical non-batch shape.
    pub fn from_flat(flat: Tensor<B, 2>, dims: Vec<usize>) -> Result<Self> {
        let [batch, len] = flat.dims();
        let expected = dims.iter().product::<usize>();
        if dims.is_empty() || expected != len {
            let mut shape = vec![batch];
            shape.extend_from_slice(&dims);
            return Err(TensorRnnError::shape(
                "StateTensor::from_flat",
                &shape,
                &[batch, len],
            ));
        }
        Ok(Self { flat, dims })
    }

    pub fn batch_size(&self) -> usize {
        self.flat.dims()[0]
    }

    /// Non-batch axis sizes.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Full logical shape, batch first.
    pub fn shape(&self) -> Vec<usize> {
        let mut shape = Vec::with_capacity(self.dims.len() + 1);
        shape.push(self.batch_size());
        shape.extend_from_slice(&self.dims);
        shape
    }

    /// Number of non-batch axes.
    pub fn order(&self) -> usize {
        self.dims.len()
    }

    pub fn flat(&self) -> &Tensor<B, 2> {
        &self.flat
    }

    pub fn into_flat(self) -> Tensor<B, 2> {
        self.flat
    }

    /// Materialise the tensor with a compile-time rank `D = order + 1`.
    pub fn into_tensor<const D: usize>(self) -> Result<Tensor<B, D>> {
        let shape = self.shape();
        if shape.len() != D {
            return Err(TensorRnnError::Shape {
                context: "StateTensor::into_tensor",
                expected: vec![D],
                actual: vec![shape.len()],
            });
        }
        let mut dims = [0usize; D];
        dims.copy_from_slice(&shape);
        Ok(self.flat.reshape(dims))
    }
}

/// Batched tensor-vector outer product.
///
/// `tensor` has shape `[batch_size, dims...]`, `vector` has shape
/// `[batch_size, d]`; the result has shape `[batch_size, dims..., d]` with
/// `result[b, i..., j] = tensor[b, i...] * vector[b, j]`.
pub fn outer_product<B: Backend>(
    batch_size: usize,
    tensor: StateTensor<B>,
    vector: Tensor<B, 2>,
) -> Result<StateTensor<B>> {
    let [vec_batch, d] = vector.dims();
    ensure_dims("outer_product(vector)", &[batch_size], &[vec_batch])?;
    ensure_dims(
        "outer_product(tensor)",
        &[batch_size],
        &[tensor.batch_size()],
    )?;

    let StateTensor { flat, mut dims } = tensor;
    let [_, len] = flat.dims();

    // [B, P, 1] x [B, 1, d] -> [B, P, d]
    let column = flat.reshape([batch_size, len, 1]);
    let row = vector.reshape([batch_size, 1, d]);
    let product = column.matmul(row).reshape([batch_size, len * d]);

    dims.push(d);
    Ok(StateTensor {
        flat: product,
        dims,
    })
}

/// Build the order-way tensor `v ⊗ v ⊗ ... ⊗ v` by `order - 1` outer products.
pub fn high_order_state<B: Backend>(vector: Tensor<B, 2>, order: usize) -> Result<StateTensor<B>> {
    if order == 0 {
        return Err(TensorRnnError::config("tensor order must be at least 1"));
    }
    let [batch_size, _] = vector.dims();
    let mut state = StateTensor::from_vector(vector.clone());
    for _ in 1..order {
        state = outer_product(batch_size, state, vector.clone())?;
    }
    Ok(state)
}

/// Concatenate lag states (oldest first) and append the constant 1 channel.
///
/// Each lag must be `[batch, hidden]` with the same batch and hidden size; the
/// result is `[batch, hidden * lags + 1]`.
pub fn augmented_state<B: Backend>(lags: &[Tensor<B, 2>]) -> Result<Tensor<B, 2>> {
    let first = lags
        .first()
        .ok_or_else(|| TensorRnnError::config("at least one lag state is required"))?;
    let [batch, hidden] = first.dims();
    for lag in lags {
        ensure_dims("augmented_state", &[batch, hidden], &lag.dims())?;
    }

    let ones = Tensor::<B, 2>::ones([batch, 1], &first.device());
    let mut parts = lags.to_vec();
    parts.push(ones);
    Ok(Tensor::cat(parts, 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::{Distribution, TensorData};

    type TestBackend = NdArray<f32>;

    fn values(t: Tensor<TestBackend, 2>) -> Vec<f32> {
        t.into_data().iter::<f32>().collect()
    }

    #[test]
    fn test_outer_product_shape() {
        let device = Default::default();
        let tensor = Tensor::<TestBackend, 2>::ones([3, 4], &device);
        let vector = Tensor::<TestBackend, 2>::ones([3, 5], &device);

        let out = outer_product(3, StateTensor::from_vector(tensor), vector).unwrap();
        assert_eq!(out.shape(), vec![3, 4, 5]);
        assert_eq!(out.flat().dims(), [3, 20]);
    }

    #[test]
    fn test_outer_product_values_unbatched() {
        let device = Default::default();
        let a = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![1.0f32, 2.0], [1, 2]),
            &device,
        );
        let b = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![3.0f32, 4.0, 5.0], [1, 3]),
            &device,
        );

        let out = outer_product(1, StateTensor::from_vector(a), b).unwrap();
        assert_eq!(
            values(out.into_flat()),
            vec![3.0, 4.0, 5.0, 6.0, 8.0, 10.0]
        );
    }

    #[test]
    fn test_outer_product_batch_mismatch() {
        let device = Default::default();
        let tensor = Tensor::<TestBackend, 2>::ones([2, 4], &device);
        let vector = Tensor::<TestBackend, 2>::ones([3, 4], &device);

        let result = outer_product(2, StateTensor::from_vector(tensor), vector);
        assert!(matches!(result, Err(TensorRnnError::Shape { .. })));
    }

    #[test]
    fn test_high_order_state_dims() {
        let device = Default::default();
        let v = Tensor::<TestBackend, 2>::random([2, 3], Distribution::Default, &device);
        let state = high_order_state(v, 3).unwrap();
        assert_eq!(state.shape(), vec![2, 3, 3, 3]);

        let dense: Tensor<TestBackend, 4> = state.into_tensor().unwrap();
        assert_eq!(dense.dims(), [2, 3, 3, 3]);
    }

    #[test]
    fn test_augmented_state_appends_one() {
        let device = Default::default();
        let lags = vec![
            Tensor::<TestBackend, 2>::zeros([2, 3], &device),
            Tensor::<TestBackend, 2>::ones([2, 3], &device),
        ];
        let s = augmented_state(&lags).unwrap();
        assert_eq!(s.dims(), [2, 7]);
        assert_eq!(
            values(s),
            vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0]
        );
    }

    #[test]
    fn test_augmented_state_rejects_mismatched_lags() {
        let device = Default::default();
        let lags = vec![
            Tensor::<TestBackend, 2>::zeros([2, 3], &device),
            Tensor::<TestBackend, 2>::zeros([2, 4], &device),
        ];
        assert!(augmented_state(&lags).is_err());
    }
}
