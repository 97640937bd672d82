//! Step definitions for farm chains.

use std::fmt::Debug;

use alloy_primitives::{Bytes, U256};
use async_trait::async_trait;

use crate::farm::errors::StepError;

/// The on-chain call a step turns into once its minimum output is known.
pub trait StepCall: Clone + Debug + Send + Sync {
    /// Encodes the call with the given minimum output amount.
    ///
    /// Calls without a minimum output (wraps, transfers) ignore the argument.
    fn encode(&self, min_amount_out: U256) -> Bytes;
}

/// Outcome of estimating a single step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResult<C> {
    pub name: String,
    /// In a forward estimate the amount produced by the step, in a backward estimate the amount
    /// the step needs to consume.
    pub amount_out: U256,
    /// Native currency the step must be sent along with the transaction.
    pub value: Option<U256>,
    pub call: C,
}

impl<C: StepCall> StepResult<C> {
    pub fn encode(&self, min_amount_out: U256) -> Bytes {
        self.call.encode(min_amount_out)
    }
}

/// A single quote-producing unit of a farm chain.
///
/// Steps are immutable once built: estimating never changes the step, so the same step can be
/// estimated concurrently from several chains.
#[async_trait]
pub trait ChainableStep: Send + Sync {
    type Call: StepCall;

    fn name(&self) -> &str;

    /// Estimates the step for `amount_in`.
    ///
    /// With `forward == false` the step answers the inverse question: how much input is needed
    /// to obtain `amount_in` as output.
    async fn estimate(
        &self,
        amount_in: U256,
        forward: bool,
    ) -> Result<StepResult<Self::Call>, StepError>;
}
