//! Calldata of the Beanstalk calls a farm step turns into.

use alloy::{
    primitives::{Address, Bytes, U256},
    sol_types::{SolCall, SolInterface},
};
use beanstalk_common::{
    farm::StepCall,
    models::{FarmFromMode, FarmToMode, InvalidModeError},
};
use thiserror::Error;

use crate::abi::IBeanstalk::{self, IBeanstalkCalls};

#[derive(Error, Debug)]
pub enum AbiError {
    #[error("Failed to decode farm calldata: {0}")]
    Decode(#[from] alloy::sol_types::Error),
    #[error(transparent)]
    InvalidMode(#[from] InvalidModeError),
    #[error("Nested farm calls are not supported")]
    NestedFarm,
}

/// One call batched into Beanstalk's `farm` entry point, without its minimum output.
///
/// Amounts are the step's input in forward terms: for a step estimated backward they hold the
/// estimated input required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FarmCall {
    Exchange {
        pool: Address,
        registry: Address,
        from_token: Address,
        to_token: Address,
        amount_in: U256,
        from_mode: FarmFromMode,
        to_mode: FarmToMode,
    },
    ExchangeUnderlying {
        pool: Address,
        from_token: Address,
        to_token: Address,
        amount_in: U256,
        from_mode: FarmFromMode,
        to_mode: FarmToMode,
    },
    AddLiquidity {
        pool: Address,
        registry: Address,
        amounts: Vec<U256>,
        from_mode: FarmFromMode,
        to_mode: FarmToMode,
    },
    RemoveLiquidityOneToken {
        pool: Address,
        registry: Address,
        to_token: Address,
        amount_in: U256,
        from_mode: FarmFromMode,
        to_mode: FarmToMode,
    },
    WrapEth {
        amount: U256,
        to_mode: FarmToMode,
    },
    UnwrapEth {
        amount: U256,
        from_mode: FarmFromMode,
    },
    TransferToken {
        token: Address,
        recipient: Address,
        amount: U256,
        from_mode: FarmFromMode,
        to_mode: FarmToMode,
    },
}

/// A farm call recovered from calldata, with the minimum output it was encoded with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedCall {
    pub call: FarmCall,
    /// `None` for calls that carry no minimum output.
    pub min_amount_out: Option<U256>,
}

impl StepCall for FarmCall {
    fn encode(&self, min_amount_out: U256) -> Bytes {
        let calldata = match self.clone() {
            FarmCall::Exchange {
                pool,
                registry,
                from_token,
                to_token,
                amount_in,
                from_mode,
                to_mode,
            } => IBeanstalk::exchangeCall {
                pool,
                registry,
                fromToken: from_token,
                toToken: to_token,
                amountIn: amount_in,
                minAmountOut: min_amount_out,
                fromMode: from_mode.into(),
                toMode: to_mode.into(),
            }
            .abi_encode(),
            FarmCall::ExchangeUnderlying {
                pool,
                from_token,
                to_token,
                amount_in,
                from_mode,
                to_mode,
            } => IBeanstalk::exchangeUnderlyingCall {
                pool,
                fromToken: from_token,
                toToken: to_token,
                amountIn: amount_in,
                minAmountOut: min_amount_out,
                fromMode: from_mode.into(),
                toMode: to_mode.into(),
            }
            .abi_encode(),
            FarmCall::AddLiquidity { pool, registry, amounts, from_mode, to_mode } => {
                IBeanstalk::addLiquidityCall {
                    pool,
                    registry,
                    amounts,
                    minAmountOut: min_amount_out,
                    fromMode: from_mode.into(),
                    toMode: to_mode.into(),
                }
                .abi_encode()
            }
            FarmCall::RemoveLiquidityOneToken {
                pool,
                registry,
                to_token,
                amount_in,
                from_mode,
                to_mode,
            } => IBeanstalk::removeLiquidityOneTokenCall {
                pool,
                registry,
                toToken: to_token,
                amountIn: amount_in,
                minAmountOut: min_amount_out,
                fromMode: from_mode.into(),
                toMode: to_mode.into(),
            }
            .abi_encode(),
            FarmCall::WrapEth { amount, to_mode } => {
                IBeanstalk::wrapEthCall { amount, mode: to_mode.into() }.abi_encode()
            }
            FarmCall::UnwrapEth { amount, from_mode } => {
                IBeanstalk::unwrapEthCall { amount, mode: from_mode.into() }.abi_encode()
            }
            FarmCall::TransferToken { token, recipient, amount, from_mode, to_mode } => {
                IBeanstalk::transferTokenCall {
                    token,
                    recipient,
                    amount,
                    fromMode: from_mode.into(),
                    toMode: to_mode.into(),
                }
                .abi_encode()
            }
        };
        calldata.into()
    }
}

impl FarmCall {
    /// Recovers a call from its calldata by selector.
    pub fn decode(data: &[u8]) -> Result<DecodedCall, AbiError> {
        let decoded = match IBeanstalkCalls::abi_decode(data)? {
            IBeanstalkCalls::exchange(c) => DecodedCall {
                call: FarmCall::Exchange {
                    pool: c.pool,
                    registry: c.registry,
                    from_token: c.fromToken,
                    to_token: c.toToken,
                    amount_in: c.amountIn,
                    from_mode: c.fromMode.try_into()?,
                    to_mode: c.toMode.try_into()?,
                },
                min_amount_out: Some(c.minAmountOut),
            },
            IBeanstalkCalls::exchangeUnderlying(c) => DecodedCall {
                call: FarmCall::ExchangeUnderlying {
                    pool: c.pool,
                    from_token: c.fromToken,
                    to_token: c.toToken,
                    amount_in: c.amountIn,
                    from_mode: c.fromMode.try_into()?,
                    to_mode: c.toMode.try_into()?,
                },
                min_amount_out: Some(c.minAmountOut),
            },
            IBeanstalkCalls::addLiquidity(c) => DecodedCall {
                call: FarmCall::AddLiquidity {
                    pool: c.pool,
                    registry: c.registry,
                    amounts: c.amounts,
                    from_mode: c.fromMode.try_into()?,
                    to_mode: c.toMode.try_into()?,
                },
                min_amount_out: Some(c.minAmountOut),
            },
            IBeanstalkCalls::removeLiquidityOneToken(c) => DecodedCall {
                call: FarmCall::RemoveLiquidityOneToken {
                    pool: c.pool,
                    registry: c.registry,
                    to_token: c.toToken,
                    amount_in: c.amountIn,
                    from_mode: c.fromMode.try_into()?,
                    to_mode: c.toMode.try_into()?,
                },
                min_amount_out: Some(c.minAmountOut),
            },
            IBeanstalkCalls::wrapEth(c) => DecodedCall {
                call: FarmCall::WrapEth { amount: c.amount, to_mode: c.mode.try_into()? },
                min_amount_out: None,
            },
            IBeanstalkCalls::unwrapEth(c) => DecodedCall {
                call: FarmCall::UnwrapEth { amount: c.amount, from_mode: c.mode.try_into()? },
                min_amount_out: None,
            },
            IBeanstalkCalls::transferToken(c) => DecodedCall {
                call: FarmCall::TransferToken {
                    token: c.token,
                    recipient: c.recipient,
                    amount: c.amount,
                    from_mode: c.fromMode.try_into()?,
                    to_mode: c.toMode.try_into()?,
                },
                min_amount_out: None,
            },
            IBeanstalkCalls::farm(_) => return Err(AbiError::NestedFarm),
        };
        Ok(decoded)
    }
}

/// Wraps encoded calls into a single `farm(bytes[])` call.
pub fn encode_farm(calls: Vec<Bytes>) -> Bytes {
    IBeanstalk::farmCall { data: calls }
        .abi_encode()
        .into()
}

/// Decodes every call batched in a `farm(bytes[])` call.
pub fn decode_farm(data: &[u8]) -> Result<Vec<DecodedCall>, AbiError> {
    IBeanstalk::farmCall::abi_decode(data)?
        .data
        .iter()
        .map(|call| FarmCall::decode(call))
        .collect()
}
