//! Error types for dataset loading, model fitting and persistence.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading data, fitting or persisting a model.
#[derive(Error, Debug)]
pub enum ForestError {
    /// I/O error while reading or writing a model artifact.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Malformed record in a bundled or user-supplied CSV table.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Encoding or decoding of model parameters failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Record matrix could not be built from the flat buffer.
    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// Empty data provided where non-empty was required.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Data violates a structural requirement (length mismatch, bad label).
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Invalid hyperparameter value.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Writing the human-readable report failed.
    #[error("Failed to write report: {0}")]
    Report(#[source] std::io::Error),

    /// Feature dimension mismatch between the model and its input.
    #[error("Feature mismatch: expected {expected} features, got {got}")]
    FeatureMismatch {
        /// Number of features the model was fitted on.
        expected: usize,
        /// Number of features in the offending input.
        got: usize,
    },
}

impl ForestError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ForestError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for this crate.
pub type Result<T> = std::result::Result<T, ForestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_io() {
        let err = ForestError::io(
            "model.pkl",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("I/O error"));
        assert!(msg.contains("model.pkl"));
    }

    #[test]
    fn test_error_display_feature_mismatch() {
        let err = ForestError::FeatureMismatch {
            expected: 4,
            got: 3,
        };
        assert_eq!(
            err.to_string(),
            "Feature mismatch: expected 4 features, got 3"
        );
    }

    #[test]
    fn test_error_display_invalid_parameter() {
        let err = ForestError::InvalidParameter("n_estimators must be positive".to_string());
        assert!(err.to_string().contains("Invalid parameter"));
    }

    #[test]
    fn test_error_from_bincode_error() {
        let bad_bytes: &[u8] = &[0xff, 0xff, 0xff, 0xff];
        let result: std::result::Result<String, bincode::Error> = bincode::deserialize(bad_bytes);
        if let Err(e) = result {
            let err: ForestError = e.into();
            assert!(matches!(err, ForestError::Serialization(_)));
        }
    }

    #[test]
    fn test_error_is_std_error() {
        let err = ForestError::EmptyData("no rows".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
