//! # Tick Math
//!
//! Powers of the tick base and usable-tick rounding. A tick `t` represents the
//! raw price ratio `1.0001^t`; all ratios are computed with `BigDecimal` at
//! [`WORKING_PRECISION`] significant digits, so the result for a given tick
//! is identical on every call.

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::{One, ToPrimitive, Zero};

use crate::constants::{
    MAX_TICK, MIN_TICK, RATIO_TOLERANCE_DIGITS, TICK_BASE_F64, TICK_BASE_MANTISSA,
    TICK_BASE_SCALE, WORKING_PRECISION,
};
use crate::errors::{MathError, MathResult};

/// `1.0001` as an exact decimal
pub fn tick_base() -> BigDecimal {
    BigDecimal::new(BigInt::from(TICK_BASE_MANTISSA), TICK_BASE_SCALE)
}

/// Check if a tick is within the supported range
pub fn is_tick_valid(tick: i32) -> bool {
    (MIN_TICK..=MAX_TICK).contains(&tick)
}

/// Tick spacing must be positive and no wider than the tick range
pub fn validate_tick_spacing(tick_spacing: i32) -> MathResult<()> {
    if tick_spacing <= 0 || tick_spacing > MAX_TICK {
        return Err(MathError::InvalidTickSpacing(tick_spacing));
    }
    Ok(())
}

/// Smallest multiple of `tick_spacing` that is not below `MIN_TICK`
pub fn min_usable_tick(tick_spacing: i32) -> MathResult<i32> {
    validate_tick_spacing(tick_spacing)?;
    // integer division truncates toward zero, i.e. ceils negative quotients
    Ok((MIN_TICK / tick_spacing) * tick_spacing)
}

/// Largest multiple of `tick_spacing` that is not above `MAX_TICK`
pub fn max_usable_tick(tick_spacing: i32) -> MathResult<i32> {
    validate_tick_spacing(tick_spacing)?;
    Ok((MAX_TICK / tick_spacing) * tick_spacing)
}

pub fn is_usable_tick(tick: i32, tick_spacing: i32) -> bool {
    match (min_usable_tick(tick_spacing), max_usable_tick(tick_spacing)) {
        (Ok(min), Ok(max)) => tick % tick_spacing == 0 && (min..=max).contains(&tick),
        _ => false,
    }
}

/// Round a tick to the nearest multiple of `tick_spacing` (ties round up),
/// then clamp into `[min_usable_tick, max_usable_tick]`
pub fn nearest_usable_tick(tick: i32, tick_spacing: i32) -> MathResult<i32> {
    let min = min_usable_tick(tick_spacing)?;
    let max = max_usable_tick(tick_spacing)?;

    let spacing = i64::from(tick_spacing);
    let quotient = (2 * i64::from(tick) + spacing).div_euclid(2 * spacing);
    let rounded = quotient * spacing;

    Ok(rounded.clamp(i64::from(min), i64::from(max)) as i32)
}

/// `1.0001^exponent` by square-and-multiply, rounded at every step
pub fn tick_base_pow(exponent: u32) -> BigDecimal {
    let mut result = BigDecimal::one();
    let mut base = tick_base();
    let mut remaining = exponent;

    while remaining > 0 {
        if remaining & 1 == 1 {
            result = (&result * &base).with_prec(WORKING_PRECISION);
        }
        remaining >>= 1;
        if remaining > 0 {
            base = (&base * &base).with_prec(WORKING_PRECISION);
        }
    }

    result
}

/// Raw price ratio `1.0001^tick`, before any token decimal adjustment
pub fn tick_to_ratio(tick: i32) -> MathResult<BigDecimal> {
    if !is_tick_valid(tick) {
        return Err(MathError::TickOutOfRange(tick));
    }

    let magnitude = tick_base_pow(tick.unsigned_abs());
    if tick < 0 {
        reciprocal(&magnitude)
    } else {
        Ok(magnitude)
    }
}

/// Greatest tick whose ratio does not exceed `ratio`.
///
/// A ratio within [`RATIO_TOLERANCE_DIGITS`] relative digits below a tick
/// boundary counts as on the boundary, so prices that went through rounding
/// or inversion map back to the tick they came from. Ratios outside the
/// representable range clamp to `MIN_TICK` / `MAX_TICK`.
pub fn ratio_to_tick_floor(ratio: &BigDecimal) -> MathResult<i32> {
    if *ratio <= BigDecimal::zero() {
        return Err(MathError::InvalidPrice(ratio.to_string()));
    }

    let tolerance = BigDecimal::one() + BigDecimal::new(BigInt::one(), RATIO_TOLERANCE_DIGITS);
    let ratio = &(ratio * &tolerance).with_prec(WORKING_PRECISION);

    // Float estimate, then exact correction against the decimal ratios
    let estimate = match ratio.to_f64() {
        Some(value) if value.is_finite() && value > 0.0 => {
            (value.ln() / TICK_BASE_F64.ln()).floor()
        }
        Some(value) if value.is_infinite() => f64::from(MAX_TICK),
        _ if *ratio > BigDecimal::one() => f64::from(MAX_TICK),
        _ => f64::from(MIN_TICK),
    };
    let mut tick = estimate.clamp(f64::from(MIN_TICK), f64::from(MAX_TICK)) as i32;

    while tick < MAX_TICK && tick_to_ratio(tick + 1)? <= *ratio {
        tick += 1;
    }
    while tick > MIN_TICK && tick_to_ratio(tick)? > *ratio {
        tick -= 1;
    }

    Ok(tick)
}

pub(crate) fn reciprocal(value: &BigDecimal) -> MathResult<BigDecimal> {
    if value.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    Ok(value.inverse().with_prec(WORKING_PRECISION))
}
