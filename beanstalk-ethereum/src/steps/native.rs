//! Steps that move tokens one to one and need no quote.

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use beanstalk_common::{
    farm::{ChainableStep, StepError, StepResult},
    models::{FarmFromMode, FarmToMode},
};

use crate::steps::call::FarmCall;

/// Wraps ETH sent with the transaction into WETH. Reports the wrapped amount as value.
pub struct WrapEthStep {
    to_mode: FarmToMode,
}

impl WrapEthStep {
    pub(crate) fn new(to_mode: FarmToMode) -> Self {
        Self { to_mode }
    }
}

#[async_trait]
impl ChainableStep for WrapEthStep {
    type Call = FarmCall;

    fn name(&self) -> &str {
        "wrap_eth"
    }

    async fn estimate(
        &self,
        amount_in: U256,
        _forward: bool,
    ) -> Result<StepResult<FarmCall>, StepError> {
        Ok(StepResult {
            name: self.name().to_string(),
            amount_out: amount_in,
            value: Some(amount_in),
            call: FarmCall::WrapEth { amount: amount_in, to_mode: self.to_mode },
        })
    }
}

pub struct UnwrapEthStep {
    from_mode: FarmFromMode,
}

impl UnwrapEthStep {
    pub(crate) fn new(from_mode: FarmFromMode) -> Self {
        Self { from_mode }
    }
}

#[async_trait]
impl ChainableStep for UnwrapEthStep {
    type Call = FarmCall;

    fn name(&self) -> &str {
        "unwrap_eth"
    }

    async fn estimate(
        &self,
        amount_in: U256,
        _forward: bool,
    ) -> Result<StepResult<FarmCall>, StepError> {
        Ok(StepResult {
            name: self.name().to_string(),
            amount_out: amount_in,
            value: None,
            call: FarmCall::UnwrapEth { amount: amount_in, from_mode: self.from_mode },
        })
    }
}

/// Moves a token between balances, e.g. from the farmer's internal balance to a recipient's
/// wallet.
pub struct TransferTokenStep {
    token: Address,
    recipient: Address,
    from_mode: FarmFromMode,
    to_mode: FarmToMode,
}

impl TransferTokenStep {
    pub(crate) fn new(
        token: Address,
        recipient: Address,
        from_mode: FarmFromMode,
        to_mode: FarmToMode,
    ) -> Self {
        Self { token, recipient, from_mode, to_mode }
    }
}

#[async_trait]
impl ChainableStep for TransferTokenStep {
    type Call = FarmCall;

    fn name(&self) -> &str {
        "transfer_token"
    }

    async fn estimate(
        &self,
        amount_in: U256,
        _forward: bool,
    ) -> Result<StepResult<FarmCall>, StepError> {
        Ok(StepResult {
            name: self.name().to_string(),
            amount_out: amount_in,
            value: None,
            call: FarmCall::TransferToken {
                token: self.token,
                recipient: self.recipient,
                amount: amount_in,
                from_mode: self.from_mode,
                to_mode: self.to_mode,
            },
        })
    }
}
