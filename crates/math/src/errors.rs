//! # Math Error Types

use thiserror::Error;

/// Errors raised by tick and price conversions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MathError {
    #[error("Tick {0} outside supported range")]
    TickOutOfRange(i32),

    #[error("Invalid tick spacing {0}")]
    InvalidTickSpacing(i32),

    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Conversion error")]
    ConversionError,
}

/// Result type for math operations
pub type MathResult<T> = Result<T, MathError>;
