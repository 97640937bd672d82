//! Farm step estimation.
//!
//! A farm is a batch of Beanstalk calls executed in one transaction. Before submitting it, each
//! call is estimated against current pool state: forward to learn what a given input yields, or
//! backward to learn what input a desired output needs. The estimated outputs, reduced by a
//! slippage tolerance, become the minimum outputs encoded into the calls.

pub mod chain;
pub mod errors;
pub mod slippage;
pub mod step;

pub use chain::{Estimate, StepChain};
pub use errors::{FarmError, StepError};
pub use slippage::{direction, encode_steps_with_slippage, slip, SLIPPAGE_PRECISION};
pub use step::{ChainableStep, StepCall, StepResult};
