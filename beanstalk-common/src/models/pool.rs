//! Liquidity pool descriptors used to route quote lookups.
//!
//! Curve pool implementations expose differently shaped quote functions (`int128` vs `uint256`
//! coin indices, fixed size amount arrays of different lengths). Instead of comparing addresses
//! on every lookup, each known pool is registered once with its [`PoolKind`] and the kind is
//! resolved when a step is built.

use std::collections::HashMap;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// The shape of a pool's quote interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PoolKind {
    /// Curve plain stable pool with three coins (3pool). `int128` indices.
    StablePlain,
    /// Curve tricrypto pool. `uint256` indices, three coins.
    Tricrypto,
    /// Curve metapool deployed by the meta factory. `int128` indices, two coins, exposes the
    /// underlying coins of its base pool.
    MetaPool,
    /// Two coin pool deployed by the crypto factory. `uint256` indices.
    CryptoFactory,
}

impl PoolKind {
    /// Number of coins held by pools of this kind.
    pub fn n_coins(&self) -> usize {
        match self {
            PoolKind::StablePlain | PoolKind::Tricrypto => 3,
            PoolKind::MetaPool | PoolKind::CryptoFactory => 2,
        }
    }

    /// Whether coin indices are passed as `uint256` rather than `int128`.
    pub fn uses_uint_indices(&self) -> bool {
        matches!(self, PoolKind::Tricrypto | PoolKind::CryptoFactory)
    }

    pub fn supports_underlying(&self) -> bool {
        matches!(self, PoolKind::MetaPool)
    }
}

/// A registered pool: where it lives, which registry deployed it and which coins it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSpec {
    pub address: Address,
    pub registry: Address,
    pub kind: PoolKind,
    /// Coins in pool index order.
    pub coins: Vec<Address>,
    /// Underlying coins in index order, for pools that support underlying exchanges.
    #[serde(default)]
    pub underlying_coins: Vec<Address>,
}

impl PoolSpec {
    pub fn new(address: Address, registry: Address, kind: PoolKind, coins: Vec<Address>) -> Self {
        Self { address, registry, kind, coins, underlying_coins: Vec::new() }
    }

    pub fn with_underlying(mut self, underlying_coins: Vec<Address>) -> Self {
        self.underlying_coins = underlying_coins;
        self
    }

    pub fn coin_index(&self, token: &Address) -> Option<usize> {
        self.coins
            .iter()
            .position(|coin| coin == token)
    }

    pub fn underlying_index(&self, token: &Address) -> Option<usize> {
        self.underlying_coins
            .iter()
            .position(|coin| coin == token)
    }
}

/// Pools known to the farm, keyed by pool address.
#[derive(Debug, Clone, Default)]
pub struct PoolRegistry {
    pools: HashMap<Address, PoolSpec>,
}

impl PoolRegistry {
    pub fn new(pools: impl IntoIterator<Item = PoolSpec>) -> Self {
        Self {
            pools: pools
                .into_iter()
                .map(|pool| (pool.address, pool))
                .collect(),
        }
    }

    pub fn insert(&mut self, pool: PoolSpec) -> Option<PoolSpec> {
        self.pools.insert(pool.address, pool)
    }

    pub fn get(&self, pool: &Address) -> Option<&PoolSpec> {
        self.pools.get(pool)
    }

    /// Returns the pool only if it was deployed by the given registry.
    pub fn lookup(&self, pool: &Address, registry: &Address) -> Option<&PoolSpec> {
        self.get(pool)
            .filter(|spec| &spec.registry == registry)
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::address;

    use super::*;

    const POOL: Address = address!("c9C32cd16Bf7eFB85Ff14e0c8603cc90F6F2eE49");
    const REGISTRY: Address = address!("B9fC157394Af804a3578134A6585C0dc9cc990d4");
    const BEAN: Address = address!("BEA0000029AD1c77D3d5D23Ba2D8893dB9d1Efab");
    const CRV3: Address = address!("6c3F90f043a72FA612cbac8115EE7e52BDe6E490");

    fn registry() -> PoolRegistry {
        PoolRegistry::new([PoolSpec::new(POOL, REGISTRY, PoolKind::MetaPool, vec![BEAN, CRV3])])
    }

    #[test]
    fn test_lookup_requires_matching_registry() {
        let registry = registry();

        assert_eq!(
            registry
                .lookup(&POOL, &REGISTRY)
                .map(|p| p.kind),
            Some(PoolKind::MetaPool)
        );
        assert!(registry
            .lookup(&POOL, &Address::ZERO)
            .is_none());
        assert!(registry
            .lookup(&Address::ZERO, &REGISTRY)
            .is_none());
    }

    #[test]
    fn test_coin_index() {
        let registry = registry();
        let pool = registry.get(&POOL).unwrap();

        assert_eq!(pool.coin_index(&CRV3), Some(1));
        assert_eq!(pool.coin_index(&Address::ZERO), None);
        assert_eq!(pool.underlying_index(&BEAN), None);
    }

    #[test]
    fn test_pool_kind_shapes() {
        assert_eq!(PoolKind::StablePlain.n_coins(), 3);
        assert_eq!(PoolKind::CryptoFactory.n_coins(), 2);
        assert!(PoolKind::Tricrypto.uses_uint_indices());
        assert!(!PoolKind::MetaPool.uses_uint_indices());
        assert!(PoolKind::MetaPool.supports_underlying());
        assert_eq!(PoolKind::CryptoFactory.to_string(), "crypto_factory");
    }
}
