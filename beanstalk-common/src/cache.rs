use std::{future::Future, num::NonZeroUsize};

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime};
use lru::LruCache;
use metrics::counter;
use tokio::sync::Mutex;
use tracing::{instrument, trace, Level};

use crate::{
    models::pool::PoolSpec,
    traits::{Clock, PoolQuoter, QuoteError, SystemClock},
};

/// Entries kept by a [`CachedQuoter`] unless configured otherwise.
pub const DEFAULT_CACHE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(10_000) {
    Some(capacity) => capacity,
    None => NonZeroUsize::MIN,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum QuoteRequest {
    Dy { pool: Address, i: usize, j: usize, dx: U256 },
    DyUnderlying { pool: Address, i: usize, j: usize, dx: U256 },
    TokenAmount { pool: Address, amounts: Vec<U256>, is_deposit: bool },
    WithdrawOneCoin { pool: Address, token_amount: U256, i: usize },
}

/// Memoizes the quotes of another [`PoolQuoter`] for a fixed time to live.
///
/// Only successful quotes are cached. At most `capacity` quotes are kept, the least recently used
/// one is evicted first. Expired entries are dropped when they are looked up.
pub struct CachedQuoter<Q, K = SystemClock> {
    name: String,
    inner: Q,
    clock: K,
    ttl: Duration,
    entries: Mutex<LruCache<QuoteRequest, (U256, NaiveDateTime)>>,
}

impl<Q: PoolQuoter> CachedQuoter<Q, SystemClock> {
    pub fn new(name: &str, inner: Q, ttl: Duration) -> Self {
        Self::with_clock(name, inner, ttl, SystemClock)
    }
}

impl<Q: PoolQuoter, K: Clock> CachedQuoter<Q, K> {
    pub fn with_clock(name: &str, inner: Q, ttl: Duration, clock: K) -> Self {
        Self {
            name: name.to_string(),
            inner,
            clock,
            ttl,
            entries: Mutex::new(LruCache::new(DEFAULT_CACHE_CAPACITY)),
        }
    }

    pub fn with_capacity(mut self, capacity: NonZeroUsize) -> Self {
        self.entries = Mutex::new(LruCache::new(capacity));
        self
    }

    /// Drops every cached quote.
    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    pub async fn entry_count(&self) -> usize {
        self.entries.lock().await.len()
    }

    #[instrument(
        name = "quote.cache.get",
        level = Level::TRACE,
        fields(miss, resource = self.name),
        skip(self, fallback))
    ]
    async fn get<Fut>(&self, request: QuoteRequest, fallback: Fut) -> Result<U256, QuoteError>
    where
        Fut: Future<Output = Result<U256, QuoteError>> + Send,
    {
        let now = self.clock.now();
        let cached = {
            let mut entries = self.entries.lock().await;
            match entries.get(&request).copied() {
                Some((amount, expires_at)) if expires_at > now => Some(amount),
                Some(_) => {
                    entries.pop(&request);
                    None
                }
                None => None,
            }
        };
        if let Some(amount) = cached {
            tracing::Span::current().record("miss", false);
            trace!("CacheHit");
            counter!("quote_cache_hits", "cache" => self.name.clone()).increment(1);
            return Ok(amount);
        }

        tracing::Span::current().record("miss", true);
        trace!("CacheMiss");
        counter!("quote_cache_misses", "cache" => self.name.clone()).increment(1);

        let amount = fallback
            .await
            .inspect_err(|_| trace!("FallbackFailure"))?;
        // A ttl reaching past the representable range never expires.
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(self.ttl)
            .unwrap_or(NaiveDateTime::MAX);
        self.entries
            .lock()
            .await
            .put(request, (amount, expires_at));
        Ok(amount)
    }
}

#[async_trait]
impl<Q: PoolQuoter, K: Clock> PoolQuoter for CachedQuoter<Q, K> {
    async fn get_dy(
        &self,
        pool: &PoolSpec,
        i: usize,
        j: usize,
        dx: U256,
    ) -> Result<U256, QuoteError> {
        let request = QuoteRequest::Dy { pool: pool.address, i, j, dx };
        self.get(request, self.inner.get_dy(pool, i, j, dx))
            .await
    }

    async fn get_dy_underlying(
        &self,
        pool: &PoolSpec,
        i: usize,
        j: usize,
        dx: U256,
    ) -> Result<U256, QuoteError> {
        let request = QuoteRequest::DyUnderlying { pool: pool.address, i, j, dx };
        self.get(request, self.inner.get_dy_underlying(pool, i, j, dx))
            .await
    }

    async fn calc_token_amount(
        &self,
        pool: &PoolSpec,
        amounts: Vec<U256>,
        is_deposit: bool,
    ) -> Result<U256, QuoteError> {
        let request =
            QuoteRequest::TokenAmount { pool: pool.address, amounts: amounts.clone(), is_deposit };
        self.get(request, self.inner.calc_token_amount(pool, amounts, is_deposit))
            .await
    }

    async fn calc_withdraw_one_coin(
        &self,
        pool: &PoolSpec,
        token_amount: U256,
        i: usize,
    ) -> Result<U256, QuoteError> {
        let request = QuoteRequest::WithdrawOneCoin { pool: pool.address, token_amount, i };
        self.get(request, self.inner.calc_withdraw_one_coin(pool, token_amount, i))
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use chrono::NaiveDate;

    use super::*;
    use crate::models::pool::PoolKind;

    /// Quotes `dx + 1` and counts how often it was asked.
    struct CountingQuoter {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl CountingQuoter {
        fn quote(&self, amount: U256) -> Result<U256, QuoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(QuoteError::Recoverable("timeout".to_string()));
            }
            Ok(amount + U256::from(1u64))
        }
    }

    #[async_trait]
    impl PoolQuoter for CountingQuoter {
        async fn get_dy(
            &self,
            _: &PoolSpec,
            _: usize,
            _: usize,
            dx: U256,
        ) -> Result<U256, QuoteError> {
            self.quote(dx)
        }

        async fn get_dy_underlying(
            &self,
            _: &PoolSpec,
            _: usize,
            _: usize,
            dx: U256,
        ) -> Result<U256, QuoteError> {
            self.quote(dx)
        }

        async fn calc_token_amount(
            &self,
            _: &PoolSpec,
            amounts: Vec<U256>,
            _: bool,
        ) -> Result<U256, QuoteError> {
            self.quote(
                amounts
                    .into_iter()
                    .fold(U256::ZERO, |acc, amount| acc + amount),
            )
        }

        async fn calc_withdraw_one_coin(
            &self,
            _: &PoolSpec,
            token_amount: U256,
            _: usize,
        ) -> Result<U256, QuoteError> {
            self.quote(token_amount)
        }
    }

    #[derive(Clone)]
    struct ManualClock(Arc<std::sync::Mutex<NaiveDateTime>>);

    impl ManualClock {
        fn new() -> Self {
            let start = NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap();
            Self(Arc::new(std::sync::Mutex::new(start)))
        }

        fn advance(&self, by: Duration) {
            let mut now = self.0.lock().unwrap();
            *now += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> NaiveDateTime {
            *self.0.lock().unwrap()
        }
    }

    fn pool() -> PoolSpec {
        PoolSpec::new(Address::ZERO, Address::ZERO, PoolKind::StablePlain, vec![])
    }

    type TestQuoter = CachedQuoter<CountingQuoter, ManualClock>;

    fn cached(fail: bool) -> (TestQuoter, Arc<AtomicUsize>, ManualClock) {
        let calls = Arc::new(AtomicUsize::new(0));
        let clock = ManualClock::new();
        let quoter = CachedQuoter::with_clock(
            "test",
            CountingQuoter { calls: calls.clone(), fail },
            Duration::seconds(12),
            clock.clone(),
        );
        (quoter, calls, clock)
    }

    #[test_log::test(tokio::test)]
    async fn test_repeated_quote_is_served_from_cache() {
        let (quoter, calls, _) = cached(false);
        let pool = pool();

        let first = quoter
            .get_dy(&pool, 0, 1, U256::from(10u64))
            .await
            .unwrap();
        let second = quoter
            .get_dy(&pool, 0, 1, U256::from(10u64))
            .await
            .unwrap();

        assert_eq!(first, U256::from(11u64));
        assert_eq!(second, first);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_distinct_requests_are_cached_separately() {
        let (quoter, calls, _) = cached(false);
        let pool = pool();

        quoter
            .get_dy(&pool, 0, 1, U256::from(10u64))
            .await
            .unwrap();
        quoter
            .get_dy(&pool, 1, 0, U256::from(10u64))
            .await
            .unwrap();
        quoter
            .get_dy_underlying(&pool, 0, 1, U256::from(10u64))
            .await
            .unwrap();
        quoter
            .calc_token_amount(&pool, vec![U256::from(1u64), U256::from(2u64)], true)
            .await
            .unwrap();
        quoter
            .calc_withdraw_one_coin(&pool, U256::from(10u64), 0)
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(quoter.entry_count().await, 5);
    }

    #[tokio::test]
    async fn test_expired_quote_is_refreshed() {
        let (quoter, calls, clock) = cached(false);
        let pool = pool();

        quoter
            .calc_withdraw_one_coin(&pool, U256::from(10u64), 0)
            .await
            .unwrap();
        clock.advance(Duration::seconds(11));
        quoter
            .calc_withdraw_one_coin(&pool, U256::from(10u64), 0)
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        clock.advance(Duration::seconds(1));
        quoter
            .calc_withdraw_one_coin(&pool, U256::from(10u64), 0)
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let (quoter, calls, _) = cached(true);
        let pool = pool();

        for _ in 0..2 {
            let err = quoter
                .get_dy(&pool, 0, 1, U256::from(10u64))
                .await
                .unwrap_err();
            assert!(err.is_recoverable());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(quoter.entry_count().await, 0);
    }

    #[tokio::test]
    async fn test_capacity_bounds_entries() {
        let (quoter, calls, clock) = cached(false);
        let quoter = quoter.with_capacity(NonZeroUsize::new(100).unwrap());
        let pool = pool();

        for dx in 0..1_000u64 {
            quoter
                .get_dy(&pool, 0, 1, U256::from(dx))
                .await
                .unwrap();
            clock.advance(Duration::seconds(13));
        }

        assert_eq!(quoter.entry_count().await, 100);
        assert_eq!(calls.load(Ordering::SeqCst), 1_000);
    }

    #[tokio::test]
    async fn test_least_recently_used_quote_is_evicted() {
        let (quoter, calls, _) = cached(false);
        let quoter = quoter.with_capacity(NonZeroUsize::new(2).unwrap());
        let pool = pool();

        for dx in [1u64, 2, 1, 3, 1] {
            quoter
                .get_dy(&pool, 0, 1, U256::from(dx))
                .await
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        quoter
            .get_dy(&pool, 0, 1, U256::from(2u64))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_ttl_past_calendar_range_never_expires() {
        let calls = Arc::new(AtomicUsize::new(0));
        let clock = ManualClock::new();
        let quoter = CachedQuoter::with_clock(
            "test",
            CountingQuoter { calls: calls.clone(), fail: false },
            Duration::seconds(10_000_000_000_000),
            clock.clone(),
        );
        let pool = pool();

        for _ in 0..2 {
            let amount = quoter
                .get_dy(&pool, 0, 1, U256::from(10u64))
                .await
                .unwrap();
            assert_eq!(amount, U256::from(11u64));
            clock.advance(Duration::days(365 * 100));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_clear() {
        let (quoter, calls, _) = cached(false);
        let pool = pool();

        quoter
            .get_dy(&pool, 0, 1, U256::from(10u64))
            .await
            .unwrap();
        quoter.clear().await;
        quoter
            .get_dy(&pool, 0, 1, U256::from(10u64))
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
