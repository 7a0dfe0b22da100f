//! # Tick Constants
//!
//! Tick bounds and the precision policy used by every price conversion.

// ============================================================================
// Tick Bounds
// ============================================================================

/// Minimum tick supported by the pool contracts
pub const MIN_TICK: i32 = -887_272;

/// Maximum tick supported by the pool contracts
pub const MAX_TICK: i32 = 887_272;

/// Price ratio between two adjacent ticks, as `mantissa * 10^-scale`
pub const TICK_BASE_MANTISSA: i64 = 10_001;
pub const TICK_BASE_SCALE: i64 = 4;

/// `1.0001` as a float, for estimates and pixel-space separation only
pub const TICK_BASE_F64: f64 = 1.0001;

// ============================================================================
// Precision Policy
// ============================================================================

/// Significant digits carried through intermediate decimal arithmetic
pub const WORKING_PRECISION: u64 = 80;

/// Relative slack, in decimal digits, when mapping a ratio back to its tick
pub const RATIO_TOLERANCE_DIGITS: i64 = 30;

/// Significant digits kept on a computed price
pub const PRICE_PRECISION: u64 = 40;

/// Decimal places of the curve's price strings
pub const PRICE_FIXED_DIGITS: u32 = 8;

/// Significant digits of amount labels
pub const DEFAULT_SIGNIFICANT_DIGITS: u32 = 5;
