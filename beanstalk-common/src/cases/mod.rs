//! Seasonal case evaluation.
//!
//! Each season Beanstalk classifies its economic state along four independent axes and sums the
//! bucket ids into a case id. The case id indexes a fixed table of packed records describing how
//! temperature and the Bean to max LP gauge point per BDV ratio change this season.
//!
//! The evaluation is pure: no I/O, no shared state, identical inputs give identical outputs.

pub mod evaluate;
pub mod table;

use thiserror::Error;

pub use evaluate::{
    evaluate, evaluate_delta_pod_demand, evaluate_l2sr, evaluate_pod_rate, evaluate_price,
    AxisEvaluation, BeanstalkCaseState, CaseDeltas, CaseEvaluation, CaseStateLabels, DemandTrend,
    Level, PriceBucket,
};
pub use table::{case_data, CaseData, CASE_COUNT, MAX_CASE_ID};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaseError {
    /// The summed axis ids fell outside the case table. Indicates a bug in the bucket
    /// thresholds, never a recoverable input problem.
    #[error("Invariant violation: case id {case_id} outside of [0, {}]", MAX_CASE_ID)]
    InvariantViolation { case_id: usize },
    #[error("Unknown case: {0}")]
    UnknownCase(usize),
}
