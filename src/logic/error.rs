//! Error types for the detection pipeline.
//!
//! Missing and out-of-range samples are not errors: they are recovered inside
//! the controller as forced anomalies. Everything here either aborts startup
//! (configuration) or terminates the run (models, I/O of the data source).

use thiserror::Error;

pub type DetectorResult<T> = Result<T, DetectorError>;

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("It is mandatory to set a minimal (system) threshold")]
    MissingSystemThreshold,

    #[error("No valid feature columns found in the data source")]
    NoFeatureColumns,

    #[error("Sample has {actual} components, expected {expected}")]
    SampleWidth { expected: usize, actual: usize },

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures raised by forecast / threshold model implementations.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Not enough data to train: have {have}, need more than {need}")]
    InsufficientData { have: usize, need: usize },

    #[error("Input shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    #[error("Model used before training")]
    NotTrained,

    #[error("Non-finite value produced during {0}")]
    NonFinite(&'static str),
}
