//! Pool quotes read from chain through `eth_call`.

use alloy::{
    primitives::{Address, U256},
    rpc::types::BlockNumberOrTag,
    sol_types::SolCall,
};
use async_trait::async_trait;
use beanstalk_common::{
    models::pool::{PoolKind, PoolSpec},
    traits::{PoolQuoter, QuoteError},
};
use tracing::{instrument, trace};

use crate::{
    abi::{ICryptoFactoryPool, IMetaPool, IStableSwap3, ITricrypto},
    rpc::{errors::RPCError, EthereumRpcClient},
};

/// [`PoolQuoter`] calling the pools' view functions on a node.
///
/// The call shape is chosen from the pool's [`PoolKind`]: `int128` or `uint256` coin indices,
/// two or three element amount arrays.
#[derive(Clone, Debug)]
pub struct RpcPoolQuoter {
    client: EthereumRpcClient,
    block: BlockNumberOrTag,
}

impl RpcPoolQuoter {
    pub fn new(client: EthereumRpcClient) -> Self {
        Self { client, block: BlockNumberOrTag::Latest }
    }

    /// Quotes against a fixed block instead of the latest one.
    pub fn at_block(mut self, block: BlockNumberOrTag) -> Self {
        self.block = block;
        self
    }

    async fn call<C>(&self, pool: Address, call: C) -> Result<U256, QuoteError>
    where
        C: SolCall<Return = U256> + Send,
    {
        let output = self
            .client
            .eth_call(pool, call.abi_encode().into(), self.block)
            .await?;
        let amount = C::abi_decode_returns(&output).map_err(|e| {
            RPCError::DecodeError(format!("{} returned by {pool}: {e}", C::SIGNATURE))
        })?;
        trace!(%pool, signature = C::SIGNATURE, %amount, "Quoted");
        Ok(amount)
    }
}

fn int128_index(i: usize) -> Result<i128, QuoteError> {
    i128::try_from(i).map_err(|_| QuoteError::Fatal(format!("Coin index {i} out of range")))
}

fn fixed_amounts<const N: usize>(
    pool: &PoolSpec,
    amounts: Vec<U256>,
) -> Result<[U256; N], QuoteError> {
    <[U256; N]>::try_from(amounts).map_err(|amounts| {
        QuoteError::Fatal(format!(
            "Pool {} takes {N} amounts, got {}",
            pool.address,
            amounts.len()
        ))
    })
}

#[async_trait]
impl PoolQuoter for RpcPoolQuoter {
    #[instrument(level = "debug", skip(self, pool), fields(pool = %pool.address, kind = %pool.kind))]
    async fn get_dy(
        &self,
        pool: &PoolSpec,
        i: usize,
        j: usize,
        dx: U256,
    ) -> Result<U256, QuoteError> {
        match pool.kind {
            PoolKind::StablePlain => {
                let call = IStableSwap3::get_dyCall { i: int128_index(i)?, j: int128_index(j)?, dx };
                self.call(pool.address, call).await
            }
            PoolKind::MetaPool => {
                let call = IMetaPool::get_dyCall { i: int128_index(i)?, j: int128_index(j)?, dx };
                self.call(pool.address, call).await
            }
            PoolKind::Tricrypto => {
                let call = ITricrypto::get_dyCall { i: U256::from(i), j: U256::from(j), dx };
                self.call(pool.address, call).await
            }
            PoolKind::CryptoFactory => {
                let call =
                    ICryptoFactoryPool::get_dyCall { i: U256::from(i), j: U256::from(j), dx };
                self.call(pool.address, call).await
            }
        }
    }

    #[instrument(level = "debug", skip(self, pool), fields(pool = %pool.address, kind = %pool.kind))]
    async fn get_dy_underlying(
        &self,
        pool: &PoolSpec,
        i: usize,
        j: usize,
        dx: U256,
    ) -> Result<U256, QuoteError> {
        match pool.kind {
            PoolKind::MetaPool => {
                let call = IMetaPool::get_dy_underlyingCall {
                    i: int128_index(i)?,
                    j: int128_index(j)?,
                    dx,
                };
                self.call(pool.address, call).await
            }
            kind => Err(QuoteError::Fatal(format!(
                "Pool {} of kind {kind} has no underlying coins",
                pool.address
            ))),
        }
    }

    #[instrument(level = "debug", skip(self, pool), fields(pool = %pool.address, kind = %pool.kind))]
    async fn calc_token_amount(
        &self,
        pool: &PoolSpec,
        amounts: Vec<U256>,
        is_deposit: bool,
    ) -> Result<U256, QuoteError> {
        match pool.kind {
            PoolKind::StablePlain => {
                let call = IStableSwap3::calc_token_amountCall {
                    amounts: fixed_amounts(pool, amounts)?,
                    is_deposit,
                };
                self.call(pool.address, call).await
            }
            PoolKind::Tricrypto => {
                let call = ITricrypto::calc_token_amountCall {
                    amounts: fixed_amounts(pool, amounts)?,
                    is_deposit,
                };
                self.call(pool.address, call).await
            }
            PoolKind::MetaPool => {
                let call = IMetaPool::calc_token_amountCall {
                    amounts: fixed_amounts(pool, amounts)?,
                    is_deposit,
                };
                self.call(pool.address, call).await
            }
            PoolKind::CryptoFactory => {
                let call = ICryptoFactoryPool::calc_token_amountCall {
                    amounts: fixed_amounts(pool, amounts)?,
                };
                self.call(pool.address, call).await
            }
        }
    }

    #[instrument(level = "debug", skip(self, pool), fields(pool = %pool.address, kind = %pool.kind))]
    async fn calc_withdraw_one_coin(
        &self,
        pool: &PoolSpec,
        token_amount: U256,
        i: usize,
    ) -> Result<U256, QuoteError> {
        match pool.kind {
            PoolKind::StablePlain => {
                let call =
                    IStableSwap3::calc_withdraw_one_coinCall { token_amount, i: int128_index(i)? };
                self.call(pool.address, call).await
            }
            PoolKind::MetaPool => {
                let call =
                    IMetaPool::calc_withdraw_one_coinCall { token_amount, i: int128_index(i)? };
                self.call(pool.address, call).await
            }
            PoolKind::Tricrypto => {
                let call = ITricrypto::calc_withdraw_one_coinCall { token_amount, i: U256::from(i) };
                self.call(pool.address, call).await
            }
            PoolKind::CryptoFactory => {
                let call =
                    ICryptoFactoryPool::calc_withdraw_one_coinCall { token_amount, i: U256::from(i) };
                self.call(pool.address, call).await
            }
        }
    }
}
