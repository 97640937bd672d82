use alloy_primitives::U256;
use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use thiserror::Error;

use crate::models::pool::PoolSpec;

/// Failure of a quote lookup.
///
/// - `Recoverable`: the lookup failed for a transient reason, e.g. the node was unreachable.
///   Asking again later may succeed.
/// - `Fatal`: the pool rejected the request or returned garbage. Asking again will not help.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuoteError {
    #[error("Fatal quote error: {0}")]
    Fatal(String),
    #[error("Recoverable quote error: {0}")]
    Recoverable(String),
}

impl QuoteError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, QuoteError::Recoverable(_))
    }
}

/// Read-only access to the quote functions of on-chain liquidity pools.
///
/// Every method receives the registered [`PoolSpec`] so implementations can choose the call
/// shape matching the pool's kind. Coin indices refer to the pool's coin list, or its underlying
/// coin list for [`PoolQuoter::get_dy_underlying`].
#[cfg_attr(feature = "test-utils", mockall::automock)]
#[async_trait]
pub trait PoolQuoter: Send + Sync {
    /// Amount of coin `j` received for `dx` of coin `i`.
    async fn get_dy(&self, pool: &PoolSpec, i: usize, j: usize, dx: U256)
        -> Result<U256, QuoteError>;

    /// Amount of underlying coin `j` received for `dx` of underlying coin `i`.
    async fn get_dy_underlying(
        &self,
        pool: &PoolSpec,
        i: usize,
        j: usize,
        dx: U256,
    ) -> Result<U256, QuoteError>;

    /// LP tokens minted (or burned) for the given per-coin amounts.
    async fn calc_token_amount(
        &self,
        pool: &PoolSpec,
        amounts: Vec<U256>,
        is_deposit: bool,
    ) -> Result<U256, QuoteError>;

    /// Amount of coin `i` received for burning `token_amount` LP tokens.
    async fn calc_withdraw_one_coin(
        &self,
        pool: &PoolSpec,
        token_amount: U256,
        i: usize,
    ) -> Result<U256, QuoteError>;
}

/// Source of the current time, injectable so expiry logic can be tested.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().naive_utc()
    }
}
