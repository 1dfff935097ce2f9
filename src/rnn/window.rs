//! Fixed-capacity lag window
//!
//! Holds the last `L` hidden states of every layer, indexed `[lag][layer]`
//! with lag 0 the oldest. Backed by a ring buffer: a push overwrites the
//! oldest slot and advances the head, so the length never changes.

use crate::error::{ensure_dims, Result, TensorRnnError};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// The `[lag][layer]` history threaded through a recurrence.
#[derive(Debug, Clone)]
pub struct LagWindow<B: Backend> {
    slots: Vec<Vec<Tensor<B, 2>>>,
    /// Physical index of the oldest lag.
    head: usize,
}

impl<B: Backend> LagWindow<B> {
    /// Build a window from externally supplied states, oldest lag first.
    ///
    /// Every lag must hold the same number of layers, and each layer the same
    /// shape across lags.
    pub fn new(states: Vec<Vec<Tensor<B, 2>>>) -> Result<Self> {
        let first = states
            .first()
            .ok_or_else(|| TensorRnnError::config("lag window needs at least one lag"))?;
        if first.is_empty() {
            return Err(TensorRnnError::config("lag window needs at least one layer"));
        }
        let shapes: Vec<[usize; 2]> = first.iter().map(|t| t.dims()).collect();
        for lag in &states {
            ensure_dims("LagWindow::new(layers)", &[shapes.len()], &[lag.len()])?;
            for (state, shape) in lag.iter().zip(&shapes) {
                ensure_dims("LagWindow::new(state)", shape, &state.dims())?;
            }
        }
        Ok(Self {
            slots: states,
            head: 0,
        })
    }

    /// `num_lags` lags of zero states, one `[batch, size]` per layer.
    pub fn zeros(
        num_lags: usize,
        batch_size: usize,
        state_sizes: &[usize],
        device: &B::Device,
    ) -> Result<Self> {
        if num_lags == 0 {
            return Err(TensorRnnError::config("num_lags must be positive"));
        }
        let lag: Vec<Tensor<B, 2>> = state_sizes
            .iter()
            .map(|&size| Tensor::zeros([batch_size, size], device))
            .collect();
        Self::new(vec![lag; num_lags])
    }

    pub fn num_lags(&self) -> usize {
        self.slots.len()
    }

    pub fn num_layers(&self) -> usize {
        self.slots[0].len()
    }

    fn physical(&self, lag: usize) -> usize {
        (self.head + lag) % self.slots.len()
    }

    /// State of `layer` at `lag` (0 is the oldest), if both exist.
    pub fn get(&self, lag: usize, layer: usize) -> Option<&Tensor<B, 2>> {
        if lag >= self.num_lags() {
            return None;
        }
        self.slots[self.physical(lag)].get(layer)
    }

    /// Lags in time order, oldest first; each item holds every layer.
    pub fn iter(&self) -> impl Iterator<Item = &[Tensor<B, 2>]> + '_ {
        (0..self.num_lags()).map(move |lag| self.slots[self.physical(lag)].as_slice())
    }

    /// The `L` states of one layer, oldest first.
    pub fn layer(&self, layer: usize) -> Result<Vec<Tensor<B, 2>>> {
        if layer >= self.num_layers() {
            return Err(TensorRnnError::shape(
                "LagWindow::layer",
                &[self.num_layers()],
                &[layer + 1],
            ));
        }
        Ok(self.iter().map(|lag| lag[layer].clone()).collect())
    }

    /// The most recent lag.
    pub fn newest(&self) -> &[Tensor<B, 2>] {
        &self.slots[self.physical(self.num_lags() - 1)]
    }

    /// Append one step's states (one per layer) and evict the oldest lag.
    pub fn push(&mut self, states: Vec<Tensor<B, 2>>) -> Result<()> {
        ensure_dims("LagWindow::push(layers)", &[self.num_layers()], &[states.len()])?;
        for (state, current) in states.iter().zip(self.newest()) {
            ensure_dims("LagWindow::push(state)", &current.dims(), &state.dims())?;
        }
        let head = self.head;
        self.slots[head] = states;
        self.head = (head + 1) % self.slots.len();
        Ok(())
    }

    /// Unroll into `[lag][layer]`, oldest lag first.
    pub fn into_states(self) -> Vec<Vec<Tensor<B, 2>>> {
        let Self { mut slots, head } = self;
        slots.rotate_left(head);
        slots
    }
}
