//! # Tensor RNN - High-Order Recurrent Forecasting (Rust)
//!
//! Recurrent networks whose state update conditions on a window of the last
//! `L` hidden states through a high-order tensor product, with the weight
//! tensor held in tensor-train form. Built on the Burn framework.
//!
//! ## Features
//!
//! - **TensorRnnCell**: tensor-train contraction of the lag-window outer power
//! - **MatrixRnnCell**: linear baseline over the concatenated lags
//! - **FullTensorRnnCell**: dense high-order baseline for small orders
//! - **Lag window**: fixed-size `[lag][layer]` ring buffer threaded by the driver
//! - **Stacking**: multi-layer cells with dropout between layers
//! - **Datasets**: logistic-map and Lorenz generators, batching, JSON files
//! - **Training**: Adam with gradient clipping, stepped learning-rate decay,
//!   checkpoints and prediction dumps
//!
//! ## Quick Start
//!
//! ```rust
//! use tensor_rnn::prelude::*;
//!
//! // 3 channels, 8 hidden units, 2 lags, order 2 with rank 3
//! let config = ModelConfig::new(3, 3).with_hidden_size(8);
//! assert_eq!(config.augmented_size(), 17);
//!
//! let layout = config.tt_layout().unwrap();
//! assert_eq!(layout.ranks(), &[1, 3, 8]);
//! assert_eq!(layout.offsets(), &[0, 51, 459]);
//! ```
//!
//! ## Model-level Usage
//!
//! ```ignore
//! use tensor_rnn::prelude::*;
//!
//! let model = TensorRnnModel::<Backend>::new(&config, &device)?;
//! let window = model.zero_window(batch, &device)?;
//! let (predictions, window) = model.forward(inputs, window)?;
//! ```

pub mod activation;
pub mod cells;
pub mod config;
pub mod data;
pub mod error;
pub mod model;
pub mod network;
pub mod rnn;
pub mod train;

pub use error::{Result, TensorRnnError};

pub mod prelude {
    pub use crate::activation::{Activation, LeCun};
    pub use crate::cells::{
        CellKind, CellStack, Contraction, FullTensorRnnCell, LayerCell, MatrixRnnCell,
        RecurrentCell, StepCell, TensorRnnCell,
    };
    pub use crate::config::ModelConfig;
    pub use crate::data::{SeqBatcher, SeriesFile};
    pub use crate::error::{Result, TensorRnnError};
    pub use crate::model::TensorRnnModel;
    pub use crate::network::{TtCores, TtLayout};
    pub use crate::rnn::{tensor_rnn, LagWindow};
    pub use crate::train::{train, TrainingConfig, TrainingReport};
}
