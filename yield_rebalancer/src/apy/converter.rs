//! Exact rate ratios to compounded APY.
//!
//! On-chain rates are fixed point integers (RAY for Aave, per-second WAD for
//! Comet). The ratio is formed in rational arithmetic and only then turned into
//! a float, so the low decimals of a 27 decimal rate survive the conversion.

use alloy_primitives::U256;
use num_bigint::{BigInt, Sign};
use num_rational::BigRational;
use num_traits::{Signed, ToPrimitive, Zero};

use crate::{
    constants::{MAX_APR, RAY_DECIMALS, SECONDS_PER_YEAR, WAD_DECIMALS},
    utils::error::{arithmetic_err, ManagerError, ManagerResult},
};

/// Converts an APR ratio (0.05 => 5%) into the APY of per-second compounding:
/// `(1 + APR / secondsPerYear) ^ secondsPerYear - 1`.
///
/// A zero or negative APR yields exactly `0.0`.
pub fn apr_to_apy(apr: Option<&BigRational>) -> ManagerResult<f64> {
    let apr = apr.ok_or(ManagerError::InvalidInput)?;

    if !apr.is_positive() {
        return Ok(0.0);
    }

    if *apr > BigRational::from_integer(BigInt::from(MAX_APR)) {
        return Err(ManagerError::AprOutOfRange(apr.to_string()));
    }

    let apr_float = apr
        .to_f64()
        .ok_or_else(|| arithmetic_err("APR could not be represented as f64."))?;

    let periods = SECONDS_PER_YEAR as f64;
    let per_second = apr_float / periods;
    Ok((1.0 + per_second).powf(periods) - 1.0)
}

/// `rate / 10^27`
pub fn ray_to_ratio(rate: U256) -> BigRational {
    BigRational::new(u256_to_bigint(rate), pow10(RAY_DECIMALS))
}

/// Annualizes a per-second WAD rate: `rate * secondsPerYear / 10^18`.
pub fn wad_per_second_to_ratio(rate: u64) -> BigRational {
    BigRational::new(
        BigInt::from(rate) * BigInt::from(SECONDS_PER_YEAR),
        pow10(WAD_DECIMALS),
    )
}

pub fn u256_to_bigint(value: U256) -> BigInt {
    if value.is_zero() {
        return BigInt::zero();
    }
    BigInt::from_bytes_be(Sign::Plus, &value.to_be_bytes::<32>())
}

fn pow10(exponent: u32) -> BigInt {
    BigInt::from(10_u8).pow(exponent)
}
