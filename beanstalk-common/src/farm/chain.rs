//! Sequential estimation of a chain of steps.

use alloy_primitives::{Bytes, U256};
use rust_decimal::Decimal;
use tracing::{debug, instrument};

use crate::farm::{
    errors::FarmError,
    slippage::encode_steps_with_slippage,
    step::{ChainableStep, StepCall, StepResult},
};

/// Result of estimating a whole chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Estimate<C> {
    /// Output of the last executed step, or the input if the chain is empty.
    pub amount_out: U256,
    /// Sum of the native currency reported by the steps.
    pub value: U256,
    /// Step results in execution order.
    pub steps: Vec<StepResult<C>>,
}

impl<C: StepCall> Estimate<C> {
    /// Encodes all steps, protecting each one's output with `slippage`.
    pub fn encode_with_slippage(&self, slippage: Decimal) -> Result<Vec<Bytes>, FarmError> {
        encode_steps_with_slippage(&self.steps, slippage)
    }
}

/// An ordered list of steps estimated one after another, each consuming the previous output.
pub struct StepChain<C> {
    steps: Vec<Box<dyn ChainableStep<Call = C>>>,
}

impl<C: StepCall> Default for StepChain<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: StepCall> StepChain<C> {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn add_step(&mut self, step: Box<dyn ChainableStep<Call = C>>) -> &mut Self {
        self.steps.push(step);
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Estimates the chain for `amount_in`.
    ///
    /// Going forward the steps run in the order they were added. Going backward they run in
    /// reverse and each step answers how much input it needs for the requested output. The first
    /// failing step aborts the estimate, later steps are never invoked.
    #[instrument(level = "debug", skip(self), fields(steps = self.steps.len()))]
    pub async fn estimate(&self, amount_in: U256, forward: bool) -> Result<Estimate<C>, FarmError> {
        let order: Vec<usize> = if forward {
            (0..self.steps.len()).collect()
        } else {
            (0..self.steps.len()).rev().collect()
        };

        let mut amount = amount_in;
        let mut value = U256::ZERO;
        let mut results = Vec::with_capacity(self.steps.len());
        for index in order {
            let step = &self.steps[index];
            let result = step
                .estimate(amount, forward)
                .await
                .map_err(|source| FarmError::StepEstimationFailure {
                    index,
                    name: step.name().to_string(),
                    source,
                })?;
            debug!(
                index,
                name = %result.name,
                %amount,
                amount_out = %result.amount_out,
                "EstimatedStep"
            );

            if let Some(step_value) = result.value {
                value = value
                    .checked_add(step_value)
                    .ok_or(FarmError::Overflow)?;
            }
            amount = result.amount_out;
            results.push(result);
        }

        Ok(Estimate { amount_out: amount, value, steps: results })
    }
}
