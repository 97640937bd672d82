use std::sync::Arc;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use beanstalk_common::{
    farm::{ChainableStep, StepError, StepResult},
    models::{pool::PoolSpec, FarmFromMode, FarmToMode},
    traits::PoolQuoter,
};

use crate::steps::call::FarmCall;

/// Deposits into a pool, minting LP tokens.
///
/// The input amount is spread over the pool's coins by `multipliers`: coin `k` receives
/// `amount_in * multipliers[k]`. Depositing a single coin uses a multiplier of one for that coin
/// and zero for the others.
pub struct AddLiquidityStep {
    pool: PoolSpec,
    multipliers: Vec<U256>,
    from_mode: FarmFromMode,
    to_mode: FarmToMode,
    quoter: Arc<dyn PoolQuoter>,
}

impl AddLiquidityStep {
    pub(crate) fn new(
        pool: PoolSpec,
        multipliers: Vec<U256>,
        from_mode: FarmFromMode,
        to_mode: FarmToMode,
        quoter: Arc<dyn PoolQuoter>,
    ) -> Result<Self, StepError> {
        if multipliers.len() != pool.kind.n_coins() {
            return Err(StepError::InvalidConfiguration(format!(
                "Pool {} holds {} coins, got {} multipliers",
                pool.address,
                pool.kind.n_coins(),
                multipliers.len()
            )));
        }
        Ok(Self { pool, multipliers, from_mode, to_mode, quoter })
    }
}

#[async_trait]
impl ChainableStep for AddLiquidityStep {
    type Call = FarmCall;

    fn name(&self) -> &str {
        "add_liquidity"
    }

    async fn estimate(
        &self,
        amount_in: U256,
        forward: bool,
    ) -> Result<StepResult<FarmCall>, StepError> {
        if !forward {
            return Err(StepError::UnsupportedDirection(self.name().to_string()));
        }
        let amounts = self
            .multipliers
            .iter()
            .map(|multiplier| {
                amount_in
                    .checked_mul(*multiplier)
                    .ok_or_else(|| StepError::Overflow(self.name().to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let amount_out = self
            .quoter
            .calc_token_amount(&self.pool, amounts.clone(), true)
            .await?;

        Ok(StepResult {
            name: self.name().to_string(),
            amount_out,
            value: None,
            call: FarmCall::AddLiquidity {
                pool: self.pool.address,
                registry: self.pool.registry,
                amounts,
                from_mode: self.from_mode,
                to_mode: self.to_mode,
            },
        })
    }
}

/// Burns LP tokens for a single coin of the pool.
pub struct RemoveLiquidityOneTokenStep {
    pool: PoolSpec,
    token_out: Address,
    i: usize,
    from_mode: FarmFromMode,
    to_mode: FarmToMode,
    quoter: Arc<dyn PoolQuoter>,
}

impl RemoveLiquidityOneTokenStep {
    pub(crate) fn new(
        pool: PoolSpec,
        token_out: Address,
        from_mode: FarmFromMode,
        to_mode: FarmToMode,
        quoter: Arc<dyn PoolQuoter>,
    ) -> Result<Self, StepError> {
        let i = pool
            .coin_index(&token_out)
            .ok_or(StepError::UnknownToken { pool: pool.address, token: token_out })?;
        Ok(Self { pool, token_out, i, from_mode, to_mode, quoter })
    }
}

#[async_trait]
impl ChainableStep for RemoveLiquidityOneTokenStep {
    type Call = FarmCall;

    fn name(&self) -> &str {
        "remove_liquidity_one_token"
    }

    async fn estimate(
        &self,
        amount_in: U256,
        forward: bool,
    ) -> Result<StepResult<FarmCall>, StepError> {
        if !forward {
            return Err(StepError::UnsupportedDirection(self.name().to_string()));
        }
        let amount_out = self
            .quoter
            .calc_withdraw_one_coin(&self.pool, amount_in, self.i)
            .await?;

        Ok(StepResult {
            name: self.name().to_string(),
            amount_out,
            value: None,
            call: FarmCall::RemoveLiquidityOneToken {
                pool: self.pool.address,
                registry: self.pool.registry,
                to_token: self.token_out,
                amount_in,
                from_mode: self.from_mode,
                to_mode: self.to_mode,
            },
        })
    }
}
