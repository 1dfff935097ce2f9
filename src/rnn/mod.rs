//! # Multi-Lag Recurrence
//!
//! Unrolls any [`StepCell`](crate::cells::StepCell) over a sequence while
//! keeping a sliding window of the last `L` hidden states of every layer.
//!
//! ## Quick Start
//!
//! ```ignore
//! use tensor_rnn::prelude::*;
//!
//! let cell = TensorRnnCell::<Backend>::new(3, 16, 2, &[4], &device)?;
//! let window = LagWindow::zeros(2, batch, &cell.state_sizes(), &device)?;
//!
//! // inputs: [batch, seq_len, 3]
//! let (outputs, window) = tensor_rnn(&cell, inputs, 2, window)?;
//! // outputs: seq_len tensors of [batch, 16]
//! ```
//!
//! ## Window Layout
//!
//! | Index | Meaning |
//! |-------|---------|
//! | `lag` | `0` is the oldest state, `L - 1` the newest |
//! | `layer` | `0` is the bottom layer of a stack |
//!
//! After `N >= L` steps the window holds exactly the last `L` states in time
//! order. Pass the returned window back in to continue a sequence.

mod driver;
mod window;

pub use driver::tensor_rnn;
pub use window::LagWindow;
