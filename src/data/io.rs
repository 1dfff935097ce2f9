//! JSON persistence for generated series and prediction dumps.

use crate::error::Result;
use ndarray::Array2;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::info;

/// Which generator produced a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    Logistic,
    Lorenz,
}

/// A generated dataset: `[rows, channels]` plus how it was made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesFile {
    pub kind: SeriesKind,
    pub num_steps: usize,
    pub num_freq: usize,
    pub num_samples: usize,
    pub seed: u64,
    pub series: Array2<f32>,
}

impl SeriesFile {
    pub fn num_channels(&self) -> usize {
        self.series.ncols()
    }
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(writer, value)?;
    Ok(())
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

pub fn save_series(path: impl AsRef<Path>, file: &SeriesFile) -> Result<()> {
    let path = path.as_ref();
    write_json(path, file)?;
    info!(
        path = %path.display(),
        rows = file.series.nrows(),
        channels = file.num_channels(),
        "series written"
    );
    Ok(())
}

pub fn load_series(path: impl AsRef<Path>) -> Result<SeriesFile> {
    read_json(path.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::synth::logistic_dataset;

    #[test]
    fn test_series_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("logistic.json");
        let file = SeriesFile {
            kind: SeriesKind::Logistic,
            num_steps: 12,
            num_freq: 2,
            num_samples: 2,
            seed: 3,
            series: logistic_dataset(2, 12, 2, 3).unwrap(),
        };

        save_series(&path, &file).unwrap();
        let loaded = load_series(&path).unwrap();
        assert_eq!(loaded, file);
        assert_eq!(loaded.num_channels(), 2);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_series(dir.path().join("absent.json")),
            Err(crate::TensorRnnError::Io(_))
        ));
    }
}
