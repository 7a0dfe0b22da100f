//! Error types for the chart engine

use thiserror::Error;
use tickrange_math::MathError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChartError {
    #[error("Math error: {0}")]
    Math(#[from] MathError),

    #[error("Invalid viewport: {0}")]
    InvalidViewport(String),

    #[error("Invalid bound input: {0:?}")]
    InvalidBoundInput(String),

    #[error("Invalid range: lower {lower} must be below upper {upper}")]
    InvalidRange { lower: f64, upper: f64 },

    #[error("A gesture is in progress")]
    GestureInProgress,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to access config file: {0}")]
    ConfigIo(String),

    #[error("Failed to parse config: {0}")]
    ConfigParse(String),
}

impl From<std::io::Error> for ChartError {
    fn from(err: std::io::Error) -> Self {
        ChartError::ConfigIo(err.to_string())
    }
}

impl From<toml::de::Error> for ChartError {
    fn from(err: toml::de::Error) -> Self {
        ChartError::ConfigParse(err.to_string())
    }
}

impl From<toml::ser::Error> for ChartError {
    fn from(err: toml::ser::Error) -> Self {
        ChartError::ConfigParse(err.to_string())
    }
}

/// Result type for chart operations
pub type ChartResult<T> = Result<T, ChartError>;
