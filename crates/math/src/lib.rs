//! # Tick Range Math
//!
//! Conversions between discrete ticks and continuous prices, computed with
//! arbitrary-precision decimals so results stay exact across the full tick
//! range and for tokens with up to 18 (or more) decimals.
//!
//! - `constants`: tick bounds and precision policy
//! - `tick_math`: usable-tick rounding and `1.0001^tick` powers
//! - `price_math`: `PriceTickConverter`, decimal normalization and inversion
//! - `decimal_format`: fixed and significant-digit rendering of decimals

pub mod constants;
pub mod decimal_format;
pub mod errors;
pub mod price_math;
pub mod tick_math;

// Re-export commonly used items
pub use constants::*;
pub use decimal_format::*;
pub use errors::{MathError, MathResult};
pub use price_math::*;
pub use tick_math::*;
