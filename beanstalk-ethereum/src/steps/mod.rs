//! Beanstalk farm steps.
//!
//! [`Farm`] builds the steps of a farm transaction. Each pool referenced by a step is resolved
//! against the [`PoolRegistry`] when the step is built, so an unknown pool or token fails before
//! anything is estimated. The estimated steps are turned into a single `farm(bytes[])` call with
//! [`Farm::build_transaction`].

pub mod call;
pub mod exchange;
pub mod liquidity;
pub mod native;

use std::sync::Arc;

use alloy::primitives::{Address, Bytes, U256};
use beanstalk_common::{
    farm::{ChainableStep, Estimate, FarmError, StepError},
    models::{
        pool::{PoolRegistry, PoolSpec},
        FarmFromMode, FarmToMode,
    },
    traits::PoolQuoter,
};
use rust_decimal::Decimal;
use tracing::debug;

pub use call::{decode_farm, encode_farm, AbiError, DecodedCall, FarmCall};
use exchange::{ExchangeStep, ExchangeUnderlyingStep};
use liquidity::{AddLiquidityStep, RemoveLiquidityOneTokenStep};
use native::{TransferTokenStep, UnwrapEthStep, WrapEthStep};

pub type FarmStep = Box<dyn ChainableStep<Call = FarmCall>>;

/// A ready to submit call to Beanstalk's `farm` entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FarmTransaction {
    pub to: Address,
    pub calldata: Bytes,
    /// ETH to send along, needed when the farm wraps ETH.
    pub value: U256,
}

/// Factory for the steps of a farm transaction against one Beanstalk deployment.
#[derive(Clone)]
pub struct Farm {
    beanstalk: Address,
    pools: Arc<PoolRegistry>,
    quoter: Arc<dyn PoolQuoter>,
}

impl Farm {
    pub fn new(beanstalk: Address, pools: PoolRegistry, quoter: Arc<dyn PoolQuoter>) -> Self {
        Self { beanstalk, pools: Arc::new(pools), quoter }
    }

    pub fn beanstalk(&self) -> Address {
        self.beanstalk
    }

    fn pool(&self, pool: Address, registry: Address) -> Result<PoolSpec, StepError> {
        self.pools
            .lookup(&pool, &registry)
            .cloned()
            .ok_or(StepError::UnsupportedPool { pool, registry })
    }

    pub fn exchange(
        &self,
        pool: Address,
        registry: Address,
        token_in: Address,
        token_out: Address,
        from_mode: FarmFromMode,
        to_mode: FarmToMode,
    ) -> Result<FarmStep, StepError> {
        let spec = self.pool(pool, registry)?;
        let step =
            ExchangeStep::new(spec, token_in, token_out, from_mode, to_mode, self.quoter.clone())?;
        Ok(Box::new(step))
    }

    /// Swap between underlying coins of a metapool. Metapools are looked up in the registry they
    /// were deployed by, `registry`.
    pub fn exchange_underlying(
        &self,
        pool: Address,
        registry: Address,
        token_in: Address,
        token_out: Address,
        from_mode: FarmFromMode,
        to_mode: FarmToMode,
    ) -> Result<FarmStep, StepError> {
        let spec = self.pool(pool, registry)?;
        let step = ExchangeUnderlyingStep::new(
            spec,
            token_in,
            token_out,
            from_mode,
            to_mode,
            self.quoter.clone(),
        )?;
        Ok(Box::new(step))
    }

    pub fn add_liquidity(
        &self,
        pool: Address,
        registry: Address,
        multipliers: Vec<U256>,
        from_mode: FarmFromMode,
        to_mode: FarmToMode,
    ) -> Result<FarmStep, StepError> {
        let spec = self.pool(pool, registry)?;
        let step =
            AddLiquidityStep::new(spec, multipliers, from_mode, to_mode, self.quoter.clone())?;
        Ok(Box::new(step))
    }

    /// Add liquidity with a single coin of the pool.
    pub fn add_liquidity_single(
        &self,
        pool: Address,
        registry: Address,
        token_in: Address,
        from_mode: FarmFromMode,
        to_mode: FarmToMode,
    ) -> Result<FarmStep, StepError> {
        let spec = self.pool(pool, registry)?;
        let index = spec
            .coin_index(&token_in)
            .ok_or(StepError::UnknownToken { pool, token: token_in })?;
        let multipliers = (0..spec.kind.n_coins())
            .map(|k| if k == index { U256::from(1u64) } else { U256::ZERO })
            .collect();
        let step =
            AddLiquidityStep::new(spec, multipliers, from_mode, to_mode, self.quoter.clone())?;
        Ok(Box::new(step))
    }

    pub fn remove_liquidity_one_token(
        &self,
        pool: Address,
        registry: Address,
        token_out: Address,
        from_mode: FarmFromMode,
        to_mode: FarmToMode,
    ) -> Result<FarmStep, StepError> {
        let spec = self.pool(pool, registry)?;
        let step = RemoveLiquidityOneTokenStep::new(
            spec,
            token_out,
            from_mode,
            to_mode,
            self.quoter.clone(),
        )?;
        Ok(Box::new(step))
    }

    pub fn wrap_eth(&self, to_mode: FarmToMode) -> FarmStep {
        Box::new(WrapEthStep::new(to_mode))
    }

    pub fn unwrap_eth(&self, from_mode: FarmFromMode) -> FarmStep {
        Box::new(UnwrapEthStep::new(from_mode))
    }

    pub fn transfer_token(
        &self,
        token: Address,
        recipient: Address,
        from_mode: FarmFromMode,
        to_mode: FarmToMode,
    ) -> FarmStep {
        Box::new(TransferTokenStep::new(token, recipient, from_mode, to_mode))
    }

    /// Encodes an estimate into a `farm` call, each step protected by `slippage`.
    pub fn build_transaction(
        &self,
        estimate: &Estimate<FarmCall>,
        slippage: Decimal,
    ) -> Result<FarmTransaction, FarmError> {
        let calls = estimate.encode_with_slippage(slippage)?;
        debug!(steps = calls.len(), value = %estimate.value, %slippage, "BuiltFarmTransaction");
        Ok(FarmTransaction {
            to: self.beanstalk,
            calldata: encode_farm(calls),
            value: estimate.value,
        })
    }
}
