//! Serde adapters for arbitrary-precision integers.
//!
//! Liquidity values routinely exceed what JSON numbers can carry losslessly,
//! so they travel as decimal strings. Plain integers are still accepted on
//! input for hand-written fixtures.

use std::fmt;
use std::str::FromStr;

use num_bigint::{BigInt, BigUint};
use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};

/// `BigInt` <-> decimal string
pub mod bigint_string {
    use super::*;

    pub fn serialize<S>(value: &BigInt, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BigInt, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(BigIntVisitor)
    }

    struct BigIntVisitor;

    impl<'de> Visitor<'de> for BigIntVisitor {
        type Value = BigInt;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a signed integer or a decimal integer string")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<BigInt, E> {
            BigInt::from_str(v.trim()).map_err(E::custom)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<BigInt, E> {
            Ok(BigInt::from(v))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<BigInt, E> {
            Ok(BigInt::from(v))
        }
    }
}

/// `BigUint` <-> decimal string
pub mod biguint_string {
    use super::*;

    pub fn serialize<S>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BigUint, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(BigUintVisitor)
    }

    struct BigUintVisitor;

    impl<'de> Visitor<'de> for BigUintVisitor {
        type Value = BigUint;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an unsigned integer or a decimal integer string")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<BigUint, E> {
            BigUint::from_str(v.trim()).map_err(E::custom)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<BigUint, E> {
            u64::try_from(v)
                .map(BigUint::from)
                .map_err(|_| E::custom(format!("negative value {} for unsigned field", v)))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<BigUint, E> {
            Ok(BigUint::from(v))
        }
    }
}
