//! Core Beanstalk protocol logic shared by every Beanstalk consumer.
//!
//! Two engines live here:
//!
//! - [`cases`]: the deterministic classifier that maps the protocol's economic state (pod rate,
//!   price, soil demand trend, liquidity to supply ratio) onto one of the packed seasonal cases,
//!   and decodes the temperature and Bean to max LP gauge point ratio adjustments of that case.
//! - [`farm`]: the chainable step estimation engine that composes quote-producing steps into a
//!   single forward or backward estimate and encodes the steps into calldata for Beanstalk's
//!   batched `farm` entry point.
//!
//! Chain access is abstracted behind [`traits::PoolQuoter`]; concrete implementations live in
//! `beanstalk-ethereum`.

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

pub mod cache;
pub mod cases;
pub mod decimal;
pub mod farm;
pub mod models;
pub mod traits;

pub use alloy_primitives::{Address, Bytes, U256};
