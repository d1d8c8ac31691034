// projeto: fireemissionsai
// file: src/error.rs
// Error type shared by the GFED readers, dataset writers and the network

use std::path::PathBuf;

use ndarray::ShapeError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GfedError>;

#[derive(Error, Debug)]
pub enum GfedError {
    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid file '{path}': {reason}")]
    InvalidFile { path: PathBuf, reason: String },

    #[error("Grid shape {found:?} in file {file} does not match {expected:?}")]
    GridShapeMismatch {
        file: usize,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("No four digit year in file name '{0}'")]
    MissingYear(PathBuf),

    #[error("Cursor has no further state to advance to")]
    Exhausted,

    #[error("Data processing error: {0}")]
    DataProcessing(String),

    #[error("Model configuration error: {0}")]
    ModelConfiguration(String),

    #[error("Training error: {0}")]
    Training(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Shape error: {0}")]
    Shape(String),
}

impl From<ShapeError> for GfedError {
    fn from(err: ShapeError) -> Self {
        GfedError::Shape(err.to_string())
    }
}

impl From<bincode::error::EncodeError> for GfedError {
    fn from(err: bincode::error::EncodeError) -> Self {
        GfedError::Serialization(format!("Failed to encode weights: {}", err))
    }
}

impl From<bincode::error::DecodeError> for GfedError {
    fn from(err: bincode::error::DecodeError) -> Self {
        GfedError::Serialization(format!("Failed to decode weights: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_error_conversion() {
        let err = ndarray::Array2::<f64>::from_shape_vec((2, 2), vec![1.0]).unwrap_err();
        let converted: GfedError = err.into();
        assert!(matches!(converted, GfedError::Shape(_)));
    }

    #[test]
    fn test_error_messages() {
        let err = GfedError::GridShapeMismatch { file: 1, expected: (10, 9), found: (4, 4) };
        assert_eq!(err.to_string(), "Grid shape (4, 4) in file 1 does not match (10, 9)");
        let err = GfedError::MissingYear(PathBuf::from("GFED.hdf5"));
        assert!(err.to_string().contains("GFED.hdf5"));
    }
}
