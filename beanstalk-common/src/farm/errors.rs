//! Error types for step estimation.

use alloy_primitives::Address;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::traits::QuoteError;

/// Errors raised by a single step, either while it is built or while it estimates.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    /// The pool is not registered, or not under the given registry.
    #[error("Unsupported pool {pool} for registry {registry}")]
    UnsupportedPool { pool: Address, registry: Address },
    #[error("Token {token} is not a coin of pool {pool}")]
    UnknownToken { pool: Address, token: Address },
    /// The step can only be estimated forwards.
    #[error("Step {0} does not support backward estimation")]
    UnsupportedDirection(String),
    #[error("Invalid step configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Arithmetic overflow in step {0}")]
    Overflow(String),
    #[error(transparent)]
    Quote(#[from] QuoteError),
}

/// Errors surfaced by the estimation engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FarmError {
    /// A step of the chain failed. `index` is the step's position in the chain as it was built,
    /// independent of the estimation direction.
    #[error("Estimation failed at step {index} ({name}): {source}")]
    StepEstimationFailure { index: usize, name: String, source: StepError },
    #[error("Slippage must be within [0, 1], got {0}")]
    InvalidSlippage(Decimal),
    #[error("Arithmetic overflow")]
    Overflow,
}
