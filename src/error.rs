//! Error types for the tensor RNN crate.
//!
//! Configuration problems are caught when a model is built, shape problems
//! when a forward pass is run. Numeric divergence is not an error here: it is
//! reported by the training driver and left to the operator.

use thiserror::Error;

/// Errors raised while building, running or training a tensor RNN.
#[derive(Error, Debug)]
pub enum TensorRnnError {
    /// Inconsistent model or training configuration (order vs. ranks, zero
    /// sizes, core-chain storage that does not tile, intractable dense tensors).
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A tensor reached an operation with the wrong shape.
    #[error("Shape mismatch in {context}: expected {expected:?}, got {actual:?}")]
    Shape {
        context: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// A series or split cannot feed the requested batching.
    #[error("Invalid data: {0}")]
    Data(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing or reading a model checkpoint failed.
    #[error("Checkpoint error: {0}")]
    Record(String),
}

impl TensorRnnError {
    #[inline]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    #[inline]
    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    #[inline]
    pub fn shape(context: &'static str, expected: &[usize], actual: &[usize]) -> Self {
        Self::Shape {
            context,
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }

    /// Wrap a recorder failure.
    pub fn record<E: std::fmt::Debug>(err: E) -> Self {
        Self::Record(format!("{:?}", err))
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, TensorRnnError>;

/// Fail with a [`TensorRnnError::Shape`] unless `actual == expected`.
pub(crate) fn ensure_dims(context: &'static str, expected: &[usize], actual: &[usize]) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(TensorRnnError::shape(context, expected, actual))
    }
}
