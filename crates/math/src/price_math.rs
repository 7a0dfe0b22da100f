//! # Price Math
//!
//! Decimal-aware conversions between ticks and display prices.
//!
//! A tick's display price is `1.0001^tick * 10^(decimals0 - decimals1)`,
//! inverted when the pair is shown in reverse orientation. Ticks are always
//! expressed in the pool's raw orientation, so with `revert` set a higher
//! tick means a lower display price.

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::{FromPrimitive, One, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{PRICE_PRECISION, WORKING_PRECISION};
use crate::errors::{MathError, MathResult};
use crate::tick_math::{
    max_usable_tick, min_usable_tick, nearest_usable_tick, ratio_to_tick_floor, reciprocal,
    tick_to_ratio, validate_tick_spacing,
};

/// Token decimals and price orientation for one pool view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceTickConverter {
    pub decimals0: u8,
    pub decimals1: u8,
    /// Show token0 per token1 instead of token1 per token0
    #[serde(default)]
    pub revert: bool,
}

impl PriceTickConverter {
    pub fn new(decimals0: u8, decimals1: u8, revert: bool) -> Self {
        Self {
            decimals0,
            decimals1,
            revert,
        }
    }

    /// Same pair, opposite orientation
    pub fn inverted(&self) -> Self {
        Self {
            revert: !self.revert,
            ..*self
        }
    }

    /// `10^(decimals0 - decimals1)`
    fn decimal_shift(&self) -> BigDecimal {
        let exponent = i64::from(self.decimals0) - i64::from(self.decimals1);
        BigDecimal::new(BigInt::one(), -exponent)
    }

    /// Display price at `tick`
    pub fn tick_to_price(&self, tick: i32) -> MathResult<BigDecimal> {
        let ratio = tick_to_ratio(tick)?;
        let price = (&ratio * &self.decimal_shift()).with_prec(WORKING_PRECISION);
        let price = if self.revert {
            reciprocal(&price)?
        } else {
            price
        };
        Ok(price.with_prec(PRICE_PRECISION).normalized())
    }

    /// Display price at `tick` as a float, for pixel mapping
    pub fn tick_to_price_f64(&self, tick: i32) -> MathResult<f64> {
        let price = self.tick_to_price(tick)?;
        match price.to_f64() {
            Some(value) if value.is_finite() && value > 0.0 => Ok(value),
            _ => Err(MathError::ConversionError),
        }
    }

    /// Greatest raw tick whose display price does not pass `price`
    /// in the raw orientation
    pub fn price_to_tick(&self, price: &BigDecimal) -> MathResult<i32> {
        if *price <= BigDecimal::zero() {
            return Err(MathError::InvalidPrice(price.to_string()));
        }

        let unshifted = if self.revert {
            reciprocal(price)?
        } else {
            price.clone()
        };
        let ratio = (&unshifted / &self.decimal_shift()).with_prec(WORKING_PRECISION);

        ratio_to_tick_floor(&ratio)
    }

    /// Snap a display price to the nearest usable tick.
    ///
    /// Prices beyond the representable range, including `0` and `+inf`,
    /// fall back to the closest usable limit. `NaN` is rejected.
    pub fn price_to_nearest_usable_tick(&self, price: f64, tick_spacing: i32) -> MathResult<i32> {
        validate_tick_spacing(tick_spacing)?;
        if price.is_nan() {
            return Err(MathError::InvalidPrice(price.to_string()));
        }

        let min = min_usable_tick(tick_spacing)?;
        let max = max_usable_tick(tick_spacing)?;
        // display price approaches zero toward min tick, or max tick when reverted
        let (low_limit, high_limit) = if self.revert { (max, min) } else { (min, max) };

        if price <= 0.0 || price.is_infinite() {
            debug!(price, "price outside representable range, using usable limit");
            return Ok(if price <= 0.0 { low_limit } else { high_limit });
        }

        let decimal = BigDecimal::from_f64(price).ok_or(MathError::ConversionError)?;
        let tick = self.price_to_tick(&decimal)?;
        nearest_usable_tick(tick, tick_spacing)
    }

    /// Display prices of the two usable limits, lowest first
    pub fn usable_price_bounds(&self, tick_spacing: i32) -> MathResult<(f64, f64)> {
        let at_min = self.tick_to_price_f64(min_usable_tick(tick_spacing)?)?;
        let at_max = self.tick_to_price_f64(max_usable_tick(tick_spacing)?)?;
        Ok(if at_min <= at_max {
            (at_min, at_max)
        } else {
            (at_max, at_min)
        })
    }
}

/// Display price at `tick` for the given decimals and orientation
pub fn tick_to_price(tick: i32, decimals0: u8, decimals1: u8, revert: bool) -> MathResult<BigDecimal> {
    PriceTickConverter::new(decimals0, decimals1, revert).tick_to_price(tick)
}

/// Nearest usable tick for a display price
pub fn price_to_nearest_usable_tick(
    price: f64,
    tick_spacing: i32,
    decimals0: u8,
    decimals1: u8,
    revert: bool,
) -> MathResult<i32> {
    PriceTickConverter::new(decimals0, decimals1, revert)
        .price_to_nearest_usable_tick(price, tick_spacing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{MAX_TICK, MIN_TICK};
    use approx::assert_relative_eq;

    #[test]
    fn test_tick_zero_is_decimal_shift() {
        let same = PriceTickConverter::new(18, 18, false);
        assert_eq!(same.tick_to_price(0).unwrap(), BigDecimal::one());

        // WETH (18) / USDC (6)
        let weth_usdc = PriceTickConverter::new(18, 6, false);
        assert_eq!(weth_usdc.tick_to_price_f64(0).unwrap(), 1e12);

        let usdc_weth = PriceTickConverter::new(6, 18, false);
        assert_relative_eq!(usdc_weth.tick_to_price_f64(0).unwrap(), 1e-12, max_relative = 1e-15);
    }

    #[test]
    fn test_revert_inverts_price() {
        let converter = PriceTickConverter::new(6, 18, false);
        for tick in [-200_000, -1, 0, 193_335, 500_000] {
            let forward = converter.tick_to_price_f64(tick).unwrap();
            let reverse = converter.inverted().tick_to_price_f64(tick).unwrap();
            assert_relative_eq!(forward * reverse, 1.0, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_conversion_is_stable_between_calls() {
        let converter = PriceTickConverter::new(18, 6, true);
        let first = converter.tick_to_price(-193_320).unwrap();
        let second = converter.tick_to_price(-193_320).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.to_string(), second.to_string());
    }

    #[test]
    fn test_extreme_ticks_with_eighteen_decimals() {
        let converter = PriceTickConverter::new(18, 0, false);
        let high = converter.tick_to_price_f64(MAX_TICK).unwrap();
        let low = converter.tick_to_price_f64(MIN_TICK).unwrap();
        assert_relative_eq!(high, 3.402567868363881e56, max_relative = 1e-12);
        assert_relative_eq!(low, 2.938956807585585e-21, max_relative = 1e-12);
    }

    #[test]
    fn test_price_to_tick_inverts_tick_to_price() {
        for revert in [false, true] {
            let converter = PriceTickConverter::new(18, 6, revert);
            for tick in [MIN_TICK, -276_324, -60, 0, 1, 198_000, MAX_TICK] {
                let price = converter.tick_to_price(tick).unwrap();
                let recovered = converter.price_to_tick(&price).unwrap();
                assert_eq!(recovered, tick, "tick {} (revert {})", tick, revert);
            }
        }
    }

    #[test]
    fn test_nearest_usable_tick_from_price() {
        let converter = PriceTickConverter::new(18, 18, false);

        // 1.0001^61 ~ 1.00612; nearest multiple of 60 is 60
        let tick = converter.price_to_nearest_usable_tick(1.00612, 60).unwrap();
        assert_eq!(tick, 60);

        assert_eq!(converter.price_to_nearest_usable_tick(1.0, 60).unwrap(), 0);
        assert_eq!(converter.price_to_nearest_usable_tick(0.0, 60).unwrap(), -887_220);
        assert_eq!(converter.price_to_nearest_usable_tick(-5.0, 60).unwrap(), -887_220);
        assert_eq!(
            converter.price_to_nearest_usable_tick(f64::INFINITY, 60).unwrap(),
            887_220
        );
        assert_eq!(converter.price_to_nearest_usable_tick(1e300, 60).unwrap(), 887_220);
        assert!(converter.price_to_nearest_usable_tick(f64::NAN, 60).is_err());
        assert!(converter.price_to_nearest_usable_tick(1.0, 0).is_err());
    }

    #[test]
    fn test_reverted_limits_swap() {
        let converter = PriceTickConverter::new(18, 18, true);
        assert_eq!(converter.price_to_nearest_usable_tick(0.0, 10).unwrap(), 887_270);
        assert_eq!(
            converter.price_to_nearest_usable_tick(f64::INFINITY, 10).unwrap(),
            -887_270
        );

        let (low, high) = converter.usable_price_bounds(10).unwrap();
        assert!(low < 1e-30 && high > 1e30);
    }

    #[test]
    fn test_free_function_wrappers() {
        assert_eq!(tick_to_price(0, 8, 8, true).unwrap(), BigDecimal::one());
        assert_eq!(price_to_nearest_usable_tick(1.0, 10, 8, 8, false).unwrap(), 0);
    }
}
