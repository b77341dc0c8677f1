//! Error types for the agri_forecast crate

use thiserror::Error;

/// Custom error types for the agri_forecast crate
#[derive(Debug, Error)]
pub enum AgriForecastError {
    /// Insufficient or malformed input data; fatal for the affected variable only
    #[error("Data quality error: {0}")]
    DataQuality(String),

    /// A split is too small to fit or evaluate meaningfully
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// A candidate model failed to converge; excludes that candidate, not the run
    #[error("Model fit error: {0}")]
    ModelFit(String),

    /// A rule references a variable with no corresponding forecast
    #[error("Missing variable: no forecast supplied for '{0}'")]
    MissingVariable(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error reading or writing CSV tables
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error serializing artifacts to JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Error parsing configuration files
    #[error("Config error: {0}")]
    Config(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, AgriForecastError>;

impl From<toml::de::Error> for AgriForecastError {
    fn from(err: toml::de::Error) -> Self {
        AgriForecastError::Config(err.to_string())
    }
}
