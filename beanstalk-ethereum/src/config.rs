//! Deployment configuration: where Beanstalk lives and which pools its farm steps may route
//! through.

use std::{fs::File, io::Read, num::NonZeroUsize, sync::Arc};

use alloy::primitives::{address, Address};
use beanstalk_common::{
    cache::{CachedQuoter, DEFAULT_CACHE_CAPACITY},
    models::pool::{PoolKind, PoolRegistry, PoolSpec},
    traits::PoolQuoter,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::{
    rpc::{config::RPCRetryConfig, errors::RPCError, quoter::RpcPoolQuoter, EthereumRpcClient},
    steps::Farm,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
    #[error(transparent)]
    Rpc(#[from] RPCError),
}

/// Addresses of the Curve registries pools can be registered under.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Registries {
    pub native: Address,
    pub crypto_registry: Address,
    pub meta_factory: Address,
    pub crypto_factory: Address,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CacheConfig {
    /// How long a quote stays valid, in seconds (default: 12, one block)
    #[serde(default = "CacheConfig::default_ttl_secs")]
    pub ttl_secs: u64,
    /// Maximum number of cached quotes (default: 10000)
    #[serde(default = "CacheConfig::default_capacity")]
    pub capacity: usize,
}

impl CacheConfig {
    fn default_ttl_secs() -> u64 {
        12
    }

    fn default_capacity() -> usize {
        DEFAULT_CACHE_CAPACITY.get()
    }

    pub fn ttl(&self) -> Result<chrono::Duration, ConfigError> {
        i64::try_from(self.ttl_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .ok_or_else(|| {
                ConfigError::Invalid(format!("cache ttl_secs {} is too large", self.ttl_secs))
            })
    }

    pub fn capacity(&self) -> Result<NonZeroUsize, ConfigError> {
        NonZeroUsize::new(self.capacity)
            .ok_or_else(|| ConfigError::Invalid("cache capacity must be positive".to_string()))
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: Self::default_ttl_secs(), capacity: Self::default_capacity() }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeploymentConfig {
    pub beanstalk: Address,
    pub registries: Registries,
    #[serde(default)]
    pub pools: Vec<PoolSpec>,
    /// Fraction, `0.001` being 0.1%.
    pub default_slippage: Decimal,
    #[serde(default)]
    pub retry: Option<RPCRetryConfig>,
    #[serde(default)]
    pub cache: Option<CacheConfig>,
}

impl DeploymentConfig {
    pub fn from_yaml(path: &str) -> Result<Self, ConfigError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: DeploymentConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_slippage.is_sign_negative() || self.default_slippage > Decimal::ONE {
            return Err(ConfigError::Invalid(format!(
                "default_slippage must be within [0, 1], got {}",
                self.default_slippage
            )));
        }
        if let Some(cache) = &self.cache {
            cache.ttl()?;
            cache.capacity()?;
        }
        for pool in &self.pools {
            if pool.coins.len() != pool.kind.n_coins() {
                return Err(ConfigError::Invalid(format!(
                    "Pool {} of kind {} lists {} coins",
                    pool.address,
                    pool.kind,
                    pool.coins.len()
                )));
            }
        }
        Ok(())
    }

    /// Beanstalk on Ethereum mainnet with the Curve pools its farm steps route through.
    pub fn mainnet() -> Self {
        let registries = Registries {
            native: address!("90E00ACe148ca3b23Ac1bC8C240C2a7Dd9c2d7f5"),
            crypto_registry: address!("8F942C20D02bEfc377D41445793068908E2250D0"),
            meta_factory: address!("B9fC157394Af804a3578134A6585C0dc9cc990d4"),
            crypto_factory: address!("F18056Bbd320E96A48e3Fbf8bC061322531aac99"),
        };
        let bean = address!("BEA0000029AD1c77D3d5D23Ba2D8893dB9d1Efab");
        let crv3 = address!("6c3F90f043a72FA612cbac8115EE7e52BDe6E490");
        let dai = address!("6B175474E89094C44Da98b954EedeAC495271d0F");
        let usdc = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
        let usdt = address!("dAC17F958D2ee523a2206206994597C13D831ec7");
        let wbtc = address!("2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599");
        let weth = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");

        let pools = vec![
            PoolSpec::new(
                address!("bEbc44782C7dB0a1A60Cb6fe97d0b483032FF1C7"),
                registries.native,
                PoolKind::StablePlain,
                vec![dai, usdc, usdt],
            ),
            PoolSpec::new(
                address!("c9C32cd16Bf7eFB85Ff14e0c8603cc90F6F2eE49"),
                registries.meta_factory,
                PoolKind::MetaPool,
                vec![bean, crv3],
            )
            .with_underlying(vec![bean, dai, usdc, usdt]),
            PoolSpec::new(
                address!("D51a44d3FaE010294C616388b506AcdA1bfAAE46"),
                registries.crypto_registry,
                PoolKind::Tricrypto,
                vec![usdt, wbtc, weth],
            ),
        ];

        Self {
            beanstalk: address!("C1E088fC1323b20BCBee9bd1B9fC9546db5624C5"),
            registries,
            pools,
            default_slippage: Decimal::new(1, 3),
            retry: None,
            cache: None,
        }
    }

    pub fn pool_registry(&self) -> PoolRegistry {
        PoolRegistry::new(self.pools.iter().cloned())
    }

    pub fn farm(&self, quoter: Arc<dyn PoolQuoter>) -> Farm {
        Farm::new(self.beanstalk, self.pool_registry(), quoter)
    }

    pub fn retry_config(&self) -> RPCRetryConfig {
        self.retry.clone().unwrap_or_default()
    }

    /// Builds the JSON-RPC quoter for `rpc_url`, cached when a cache section is configured.
    pub fn quoter(&self, rpc_url: &str) -> Result<Arc<dyn PoolQuoter>, ConfigError> {
        let client = EthereumRpcClient::new(rpc_url)?.with_retry(self.retry_config());
        let quoter = RpcPoolQuoter::new(client);
        Ok(match self.cache {
            Some(cache) => Arc::new(
                CachedQuoter::new("rpc", quoter, cache.ttl()?).with_capacity(cache.capacity()?),
            ),
            None => Arc::new(quoter),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use rstest::rstest;
    use rust_decimal_macros::dec;

    use super::*;

    const YAML: &str = r#"
beanstalk: "0xC1E088fC1323b20BCBee9bd1B9fC9546db5624C5"
registries:
  native: "0x90E00ACe148ca3b23Ac1bC8C240C2a7Dd9c2d7f5"
  crypto_registry: "0x8F942C20D02bEfc377D41445793068908E2250D0"
  meta_factory: "0xB9fC157394Af804a3578134A6585C0dc9cc990d4"
  crypto_factory: "0xF18056Bbd320E96A48e3Fbf8bC061322531aac99"
pools:
  - address: "0xc9C32cd16Bf7eFB85Ff14e0c8603cc90F6F2eE49"
    registry: "0xB9fC157394Af804a3578134A6585C0dc9cc990d4"
    kind: meta_pool
    coins:
      - "0xBEA0000029AD1c77D3d5D23Ba2D8893dB9d1Efab"
      - "0x6c3F90f043a72FA612cbac8115EE7e52BDe6E490"
    underlying_coins:
      - "0xBEA0000029AD1c77D3d5D23Ba2D8893dB9d1Efab"
      - "0x6B175474E89094C44Da98b954EedeAC495271d0F"
      - "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"
      - "0xdAC17F958D2ee523a2206206994597C13D831ec7"
default_slippage: "0.005"
retry:
  max_retries: 5
cache:
  ttl_secs: 30
"#;

    #[test]
    fn test_parse_yaml() {
        let config = DeploymentConfig::from_yaml_str(YAML).unwrap();

        assert_eq!(config.beanstalk, DeploymentConfig::mainnet().beanstalk);
        assert_eq!(config.registries, DeploymentConfig::mainnet().registries);
        assert_eq!(config.default_slippage, dec!(0.005));
        assert_eq!(config.retry_config(), RPCRetryConfig::new(5, 100, 5000));
        assert_eq!(
            config.cache.map(|c| c.ttl().unwrap()),
            Some(chrono::Duration::seconds(30))
        );

        let registry = config.pool_registry();
        let pool = registry
            .lookup(&config.pools[0].address, &config.registries.meta_factory)
            .unwrap();
        assert_eq!(pool.kind, PoolKind::MetaPool);
        assert_eq!(pool.underlying_coins.len(), 4);
    }

    #[test]
    fn test_optional_sections_default() {
        let yaml = r#"
beanstalk: "0xC1E088fC1323b20BCBee9bd1B9fC9546db5624C5"
registries:
  native: "0x90E00ACe148ca3b23Ac1bC8C240C2a7Dd9c2d7f5"
  crypto_registry: "0x8F942C20D02bEfc377D41445793068908E2250D0"
  meta_factory: "0xB9fC157394Af804a3578134A6585C0dc9cc990d4"
  crypto_factory: "0xF18056Bbd320E96A48e3Fbf8bC061322531aac99"
default_slippage: "0.001"
cache: {}
"#;
        let config = DeploymentConfig::from_yaml_str(yaml).unwrap();

        assert!(config.pools.is_empty());
        assert_eq!(config.retry_config(), RPCRetryConfig::default());
        assert_eq!(config.cache, Some(CacheConfig { ttl_secs: 12, capacity: 10_000 }));
    }

    #[test]
    fn test_rejects_invalid_slippage() {
        let yaml = YAML.replace("\"0.005\"", "\"1.5\"");

        let err = DeploymentConfig::from_yaml_str(&yaml).unwrap_err();

        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[rstest]
    #[case::beyond_i64("18446744073709551615")]
    #[case::beyond_chrono("9223372036854775807")]
    fn test_rejects_oversized_cache_ttl(#[case] ttl_secs: &str) {
        let yaml = YAML.replace("ttl_secs: 30", &format!("ttl_secs: {ttl_secs}"));

        let err = DeploymentConfig::from_yaml_str(&yaml).unwrap_err();

        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("ttl_secs")));
    }

    #[test]
    fn test_rejects_zero_cache_capacity() {
        let yaml = YAML.replace("ttl_secs: 30", "ttl_secs: 30\n  capacity: 0");

        let err = DeploymentConfig::from_yaml_str(&yaml).unwrap_err();

        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_quoter_rejects_oversized_ttl_built_in_code() {
        let mut config = DeploymentConfig::mainnet();
        config.cache = Some(CacheConfig { ttl_secs: u64::MAX, capacity: 10 });

        assert!(matches!(
            config.quoter("http://localhost:8545"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_rejects_wrong_coin_count() {
        let yaml = YAML.replace("kind: meta_pool", "kind: tricrypto");

        let err = DeploymentConfig::from_yaml_str(&yaml).unwrap_err();

        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_from_yaml_file() {
        let path = std::env::temp_dir().join("beanstalk-deployment-config-test.yaml");
        File::create(&path)
            .unwrap()
            .write_all(YAML.as_bytes())
            .unwrap();

        let config = DeploymentConfig::from_yaml(path.to_str().unwrap()).unwrap();

        assert_eq!(config.pools.len(), 1);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_missing_file() {
        let err = DeploymentConfig::from_yaml("/nonexistent/deployment.yaml").unwrap_err();

        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[tokio::test]
    async fn test_quoter_for_deployment() {
        let config = DeploymentConfig::from_yaml_str(YAML).unwrap();

        assert!(config
            .quoter("http://localhost:8545")
            .is_ok());
        assert!(matches!(
            config.quoter("not a url"),
            Err(ConfigError::Rpc(RPCError::SetupError(_)))
        ));
    }

    #[test]
    fn test_mainnet_registry() {
        let config = DeploymentConfig::mainnet();
        let registry = config.pool_registry();

        assert_eq!(registry.len(), 3);
        assert!(config.validate().is_ok());
        assert_eq!(config.default_slippage, dec!(0.001));
        for pool in &config.pools {
            assert!(registry
                .lookup(&pool.address, &pool.registry)
                .is_some());
        }
    }
}
