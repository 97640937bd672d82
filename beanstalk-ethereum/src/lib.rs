//! Ethereum side of Beanstalk farm estimation.
//!
//! Provides the concrete farm steps (Curve exchanges, liquidity, ETH wrapping and transfers),
//! the ABI encoding of Beanstalk's `farm` calls, and a JSON-RPC backed
//! [`PoolQuoter`](beanstalk_common::traits::PoolQuoter).

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

pub mod abi;
pub mod config;
pub mod rpc;
pub mod steps;

pub use config::{CacheConfig, ConfigError, DeploymentConfig, Registries};
pub use rpc::{
    config::RPCRetryConfig,
    errors::{RPCError, RequestError},
    quoter::RpcPoolQuoter,
    EthereumRpcClient,
};
pub use steps::{
    decode_farm, encode_farm, AbiError, DecodedCall, Farm, FarmCall, FarmStep, FarmTransaction,
};
