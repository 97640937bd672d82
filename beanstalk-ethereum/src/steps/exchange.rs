use std::sync::Arc;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use beanstalk_common::{
    farm::{direction, ChainableStep, StepError, StepResult},
    models::{pool::PoolSpec, FarmFromMode, FarmToMode},
    traits::PoolQuoter,
};

use crate::steps::call::FarmCall;

/// Swaps between two coins of a pool.
///
/// Backward estimates quote the reverse swap: how much `token_in` the pool gives for the
/// requested amount of `token_out`.
pub struct ExchangeStep {
    pool: PoolSpec,
    token_in: Address,
    token_out: Address,
    i: usize,
    j: usize,
    from_mode: FarmFromMode,
    to_mode: FarmToMode,
    quoter: Arc<dyn PoolQuoter>,
}

impl ExchangeStep {
    pub(crate) fn new(
        pool: PoolSpec,
        token_in: Address,
        token_out: Address,
        from_mode: FarmFromMode,
        to_mode: FarmToMode,
        quoter: Arc<dyn PoolQuoter>,
    ) -> Result<Self, StepError> {
        let index = |token: Address| {
            pool.coin_index(&token)
                .ok_or(StepError::UnknownToken { pool: pool.address, token })
        };
        let (i, j) = (index(token_in)?, index(token_out)?);
        Ok(Self { pool, token_in, token_out, i, j, from_mode, to_mode, quoter })
    }
}

#[async_trait]
impl ChainableStep for ExchangeStep {
    type Call = FarmCall;

    fn name(&self) -> &str {
        "exchange"
    }

    async fn estimate(
        &self,
        amount_in: U256,
        forward: bool,
    ) -> Result<StepResult<FarmCall>, StepError> {
        let (i, j) = direction(self.i, self.j, forward);
        let amount_out = self
            .quoter
            .get_dy(&self.pool, i, j, amount_in)
            .await?;
        let (step_in, _) = direction(amount_in, amount_out, forward);

        Ok(StepResult {
            name: self.name().to_string(),
            amount_out,
            value: None,
            call: FarmCall::Exchange {
                pool: self.pool.address,
                registry: self.pool.registry,
                from_token: self.token_in,
                to_token: self.token_out,
                amount_in: step_in,
                from_mode: self.from_mode,
                to_mode: self.to_mode,
            },
        })
    }
}

/// Swaps between two underlying coins of a metapool, e.g. BEAN for USDC through BEAN:3CRV.
pub struct ExchangeUnderlyingStep {
    pool: PoolSpec,
    token_in: Address,
    token_out: Address,
    i: usize,
    j: usize,
    from_mode: FarmFromMode,
    to_mode: FarmToMode,
    quoter: Arc<dyn PoolQuoter>,
}

impl ExchangeUnderlyingStep {
    pub(crate) fn new(
        pool: PoolSpec,
        token_in: Address,
        token_out: Address,
        from_mode: FarmFromMode,
        to_mode: FarmToMode,
        quoter: Arc<dyn PoolQuoter>,
    ) -> Result<Self, StepError> {
        if !pool.kind.supports_underlying() {
            return Err(StepError::UnsupportedPool { pool: pool.address, registry: pool.registry });
        }
        let index = |token: Address| {
            pool.underlying_index(&token)
                .ok_or(StepError::UnknownToken { pool: pool.address, token })
        };
        let (i, j) = (index(token_in)?, index(token_out)?);
        Ok(Self { pool, token_in, token_out, i, j, from_mode, to_mode, quoter })
    }
}

#[async_trait]
impl ChainableStep for ExchangeUnderlyingStep {
    type Call = FarmCall;

    fn name(&self) -> &str {
        "exchange_underlying"
    }

    async fn estimate(
        &self,
        amount_in: U256,
        forward: bool,
    ) -> Result<StepResult<FarmCall>, StepError> {
        let (i, j) = direction(self.i, self.j, forward);
        let amount_out = self
            .quoter
            .get_dy_underlying(&self.pool, i, j, amount_in)
            .await?;
        let (step_in, _) = direction(amount_in, amount_out, forward);

        Ok(StepResult {
            name: self.name().to_string(),
            amount_out,
            value: None,
            call: FarmCall::ExchangeUnderlying {
                pool: self.pool.address,
                from_token: self.token_in,
                to_token: self.token_out,
                amount_in: step_in,
                from_mode: self.from_mode,
                to_mode: self.to_mode,
            },
        })
    }
}
