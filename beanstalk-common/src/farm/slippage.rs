use alloy_primitives::{Bytes, U256};
use num_traits::ToPrimitive;
use rust_decimal::Decimal;

use crate::farm::{
    errors::FarmError,
    step::{StepCall, StepResult},
};

/// Resolution slippage is applied at: one millionth.
pub const SLIPPAGE_PRECISION: u64 = 1_000_000;

/// Returns the minimum acceptable output for `amount` under `slippage`.
///
/// Computes `amount * floor(PRECISION * (1 - slippage)) / PRECISION` in integer arithmetic,
/// truncating. `slippage` is a fraction, `0.001` being 0.1%.
pub fn slip(amount: U256, slippage: Decimal) -> Result<U256, FarmError> {
    if slippage.is_sign_negative() || slippage > Decimal::ONE {
        return Err(FarmError::InvalidSlippage(slippage));
    }
    let factor = ((Decimal::ONE - slippage) * Decimal::from(SLIPPAGE_PRECISION))
        .floor()
        .to_u64()
        .ok_or(FarmError::InvalidSlippage(slippage))?;
    let scaled = amount
        .checked_mul(U256::from(factor))
        .ok_or(FarmError::Overflow)?;
    Ok(scaled / U256::from(SLIPPAGE_PRECISION))
}

/// Orders a pair for the estimation direction: unchanged going forward, swapped going backward.
pub fn direction<T>(a: T, b: T, forward: bool) -> (T, T) {
    if forward {
        (a, b)
    } else {
        (b, a)
    }
}

/// Encodes every step with its estimated output reduced by `slippage` as minimum output.
pub fn encode_steps_with_slippage<C: StepCall>(
    steps: &[StepResult<C>],
    slippage: Decimal,
) -> Result<Vec<Bytes>, FarmError> {
    steps
        .iter()
        .map(|step| Ok(step.encode(slip(step.amount_out, slippage)?)))
        .collect()
}
