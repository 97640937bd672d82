//! Conversions between on-chain fixed-point integers and human decimals.

use alloy_primitives::U256;
use rust_decimal::Decimal;

/// Largest scale `rust_decimal` can represent.
pub const MAX_SCALE: u32 = 28;

/// Converts a signed fixed-point integer with `decimals` digits of precision into a decimal.
///
/// Exact as long as `raw` fits into the 96 bit decimal mantissa, which holds for every packed
/// case field. Returns `None` otherwise.
pub fn to_decimal(raw: i128, decimals: u32) -> Option<Decimal> {
    if decimals > MAX_SCALE {
        return None;
    }
    Decimal::try_from_i128_with_scale(raw, decimals).ok()
}

/// Converts a token amount with `decimals` digits of precision into a decimal.
pub fn u256_to_decimal(raw: U256, decimals: u32) -> Option<Decimal> {
    let raw = i128::try_from(raw).ok()?;
    to_decimal(raw, decimals)
}
