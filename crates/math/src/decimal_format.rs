//! # Decimal Formatting
//!
//! Plain-notation rendering of `BigDecimal` values. Rounding is done on the
//! underlying integer mantissa (half away from zero), so the same decimal
//! always renders to the same string regardless of magnitude.

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::{FromPrimitive, Signed, Zero};
use serde::{Deserialize, Serialize};

/// Digit policy for rendering a price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "digits", rename_all = "snake_case")]
pub enum DigitPolicy {
    /// Exactly `n` decimal places
    Fixed(u32),
    /// `n` significant digits, trailing zeros removed
    Significant(u32),
}

impl DigitPolicy {
    pub fn format(&self, value: &BigDecimal) -> String {
        match *self {
            DigitPolicy::Fixed(places) => to_fixed(value, places),
            DigitPolicy::Significant(digits) => to_significant(value, digits),
        }
    }

    pub fn digits(&self) -> u32 {
        match *self {
            DigitPolicy::Fixed(n) | DigitPolicy::Significant(n) => n,
        }
    }
}

/// Integer `q` such that `value ≈ q * 10^-places`
pub fn round_to_places(value: &BigDecimal, places: i64) -> BigInt {
    let (mantissa, scale) = value.as_bigint_and_exponent();

    if scale <= places {
        return mantissa * BigInt::from(10).pow((places - scale) as u32);
    }

    let factor = BigInt::from(10).pow((scale - places) as u32);
    let quotient = &mantissa / &factor;
    let remainder = &mantissa % &factor;

    if remainder.abs() * 2 >= factor {
        quotient + mantissa.signum()
    } else {
        quotient
    }
}

/// Render with exactly `places` decimal places
pub fn to_fixed(value: &BigDecimal, places: u32) -> String {
    let scaled = round_to_places(value, i64::from(places));
    format_scaled(&scaled, places)
}

/// Render with `digits` significant digits in plain notation
pub fn to_significant(value: &BigDecimal, digits: u32) -> String {
    if value.is_zero() {
        return "0".to_string();
    }

    let digits = i64::from(digits.max(1));
    let (mantissa, scale) = value.as_bigint_and_exponent();
    let length = mantissa.magnitude().to_string().len() as i64;
    // value lies in [10^exponent, 10^(exponent + 1))
    let exponent = length - 1 - scale;
    let places = digits - 1 - exponent;

    let scaled = round_to_places(value, places);
    let text = if places >= 0 {
        format_scaled(&scaled, places as u32)
    } else {
        format!("{}{}", scaled, "0".repeat((-places) as usize))
    };

    strip_trailing_zeros(text)
}

pub fn to_fixed_f64(value: f64, places: u32) -> String {
    match BigDecimal::from_f64(value) {
        Some(decimal) => to_fixed(&decimal, places),
        None => value.to_string(),
    }
}

pub fn to_significant_f64(value: f64, digits: u32) -> String {
    match BigDecimal::from_f64(value) {
        Some(decimal) => to_significant(&decimal, digits),
        None => value.to_string(),
    }
}

fn format_scaled(scaled: &BigInt, places: u32) -> String {
    let sign = if scaled.is_negative() { "-" } else { "" };
    let mut digits = scaled.magnitude().to_string();

    if places == 0 {
        return format!("{}{}", sign, digits);
    }

    let places = places as usize;
    if digits.len() <= places {
        digits = format!("{}{}", "0".repeat(places + 1 - digits.len()), digits);
    }
    let (integer, fraction) = digits.split_at(digits.len() - places);
    format!("{}{}.{}", sign, integer, fraction)
}

fn strip_trailing_zeros(text: String) -> String {
    if !text.contains('.') {
        return text;
    }
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}
