//! # Datasets
//!
//! | Item | Description |
//! |------|-------------|
//! | [`logistic_series`] / [`lorenz_series`] | One chaotic trajectory |
//! | [`logistic_dataset`] / [`lorenz_dataset`] | Seeded samples side by side, `[rows, C * samples]` |
//! | [`logistic_ensemble`] / [`lorenz_ensemble`] | Seeded samples stacked, `[samples, rows, C]` |
//! | [`split_raw_data`] | Contiguous train/valid/test split |
//! | [`SeqBatcher`] | Next-step input/target batches |
//! | [`SeriesFile`] | JSON file holding a generated series |

pub mod batch;
pub mod io;
pub mod synth;

pub use batch::{array_to_tensor, split_raw_data, RawData, SeqBatch, SeqBatcher};
pub use io::{load_series, save_series, SeriesFile, SeriesKind};
pub use synth::{
    logistic_dataset, logistic_ensemble, logistic_series, lorenz_dataset, lorenz_ensemble,
    lorenz_series, lorenz_series_with, LorenzParams,
};
