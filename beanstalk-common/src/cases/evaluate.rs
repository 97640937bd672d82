use std::fmt;

use alloy_primitives::Address;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace, warn};

use crate::cases::{
    table::{case_data, CaseData, MAX_CASE_ID},
    CaseError,
};

/// Pod rate bucket boundaries, in percent.
pub const POD_RATE_BOUNDS: [Decimal; 3] = [dec!(5), dec!(15), dec!(25)];
/// Liquidity to supply ratio bucket boundaries, as fractions.
pub const L2SR_BOUNDS: [Decimal; 3] = [dec!(0.12), dec!(0.40), dec!(0.80)];
pub const DELTA_POD_DEMAND_LOWER_BOUND: Decimal = dec!(0.95);
pub const DELTA_POD_DEMAND_UPPER_BOUND: Decimal = dec!(1.05);
/// Bean price above which the price is considered excessively high ("Q").
pub const EXCESSIVE_PRICE_THRESHOLD: Decimal = dec!(1.05);

const POD_RATE_STEP: usize = 9;
const L2SR_STEP: usize = 36;

/// The protocol state a season is classified on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeanstalkCaseState {
    /// Outstanding Pods over Bean supply, in percent.
    pub pod_rate: Decimal,
    /// Change in demand for Soil, season over season.
    pub delta_pod_demand: Decimal,
    /// Liquidity to supply ratio, as a fraction.
    pub l2sr: Decimal,
    /// Informational, not used by the classification.
    pub largest_liq_well: Address,
    pub oracle_failure: bool,
}

/// Result of classifying one axis: the id it contributes to the case id and its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AxisEvaluation {
    pub id: usize,
    pub label: &'static str,
}

/// Four way bucket shared by the pod rate and L2SR axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    ExcessivelyLow,
    ReasonablyLow,
    ReasonablyHigh,
    ExcessivelyHigh,
}

impl Level {
    /// Classifies `value` against ascending bounds. A value equal to a bound falls into the
    /// higher bucket.
    fn classify(value: Decimal, bounds: &[Decimal; 3]) -> Self {
        if value >= bounds[2] {
            Level::ExcessivelyHigh
        } else if value >= bounds[1] {
            Level::ReasonablyHigh
        } else if value >= bounds[0] {
            Level::ReasonablyLow
        } else {
            Level::ExcessivelyLow
        }
    }

    fn index(&self) -> usize {
        match self {
            Level::ExcessivelyLow => 0,
            Level::ReasonablyLow => 1,
            Level::ReasonablyHigh => 2,
            Level::ExcessivelyHigh => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Level::ExcessivelyLow => "Excessively Low",
            Level::ReasonablyLow => "Reasonably Low",
            Level::ReasonablyHigh => "Reasonably High",
            Level::ExcessivelyHigh => "Excessively High",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceBucket {
    BelowPeg,
    AbovePeg,
    AboveQ,
}

impl PriceBucket {
    pub fn id(&self) -> usize {
        match self {
            PriceBucket::BelowPeg => 0,
            PriceBucket::AbovePeg => 3,
            PriceBucket::AboveQ => 5,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PriceBucket::BelowPeg => "P < 1",
            PriceBucket::AbovePeg => "P > 1",
            PriceBucket::AboveQ => "P > Q",
        }
    }
}

impl From<PriceBucket> for AxisEvaluation {
    fn from(bucket: PriceBucket) -> Self {
        AxisEvaluation { id: bucket.id(), label: bucket.label() }
    }
}

/// Soil demand trend. The labels follow the ids as Beanstalk reports them: id 1 is labelled
/// "Decreasing" even though it is the middle bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemandTrend {
    Steady,
    Decreasing,
    Increasing,
}

impl DemandTrend {
    pub fn id(&self) -> usize {
        match self {
            DemandTrend::Steady => 0,
            DemandTrend::Decreasing => 1,
            DemandTrend::Increasing => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DemandTrend::Steady => "Steady",
            DemandTrend::Decreasing => "Decreasing",
            DemandTrend::Increasing => "Increasing",
        }
    }
}

impl From<DemandTrend> for AxisEvaluation {
    fn from(trend: DemandTrend) -> Self {
        AxisEvaluation { id: trend.id(), label: trend.label() }
    }
}

pub fn evaluate_pod_rate(pod_rate: Decimal) -> AxisEvaluation {
    let level = Level::classify(pod_rate, &POD_RATE_BOUNDS);
    AxisEvaluation { id: level.index() * POD_RATE_STEP, label: level.label() }
}

/// Classifies the Bean price.
///
/// Once `delta_b` is positive the bucket is always "P > 1": the "P > Q" check runs first and is
/// then overridden. Beanstalk's own evaluation behaves this way, so the result is kept
/// identical to it.
pub fn evaluate_price(
    delta_b: Decimal,
    largest_liquidity_well_bean_price: Decimal,
) -> AxisEvaluation {
    let price = largest_liquidity_well_bean_price;
    let mut bucket = PriceBucket::BelowPeg;
    if delta_b > Decimal::ZERO {
        if price > Decimal::ONE && price > EXCESSIVE_PRICE_THRESHOLD {
            bucket = PriceBucket::AboveQ;
            trace!(%price, ?bucket, "Price above excessive threshold");
        }
        bucket = PriceBucket::AbovePeg;
    }
    bucket.into()
}

pub fn evaluate_delta_pod_demand(delta_pod_demand: Decimal) -> AxisEvaluation {
    let trend = if delta_pod_demand >= DELTA_POD_DEMAND_UPPER_BOUND {
        DemandTrend::Increasing
    } else if delta_pod_demand >= DELTA_POD_DEMAND_LOWER_BOUND {
        DemandTrend::Decreasing
    } else {
        DemandTrend::Steady
    };
    trend.into()
}

pub fn evaluate_l2sr(l2sr: Decimal) -> AxisEvaluation {
    let level = Level::classify(l2sr, &L2SR_BOUNDS);
    AxisEvaluation { id: level.index() * L2SR_STEP, label: level.label() }
}

/// Per-season parameter changes derived from the selected case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CaseDeltas {
    /// Temperature change in percentage points.
    pub temperature: Decimal,
    pub bean_to_max_lp_gp_per_bdv_ratio: Decimal,
}

impl From<&CaseData> for CaseDeltas {
    fn from(case: &CaseData) -> Self {
        Self {
            temperature: case.temperature_delta(),
            bean_to_max_lp_gp_per_bdv_ratio: case.bean_to_max_lp_gp_per_bdv_ratio_delta(),
        }
    }
}

/// Human readable description of the evaluated state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseStateLabels {
    pub pod_rate: String,
    pub price: String,
    pub soil_demand: String,
    pub l2sr: String,
}

impl fmt::Display for CaseStateLabels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}, {}, {}", self.pod_rate, self.price, self.soil_demand, self.l2sr)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseEvaluation {
    pub pod_rate: AxisEvaluation,
    pub price: AxisEvaluation,
    pub delta_pod_demand: AxisEvaluation,
    pub l2sr: AxisEvaluation,
    pub case_id: usize,
    pub case: CaseData,
    pub deltas: CaseDeltas,
    pub labels: CaseStateLabels,
    pub largest_liq_well: Address,
}

/// Rejects case ids the table does not cover.
pub(crate) fn check_case_id(case_id: usize) -> Result<usize, CaseError> {
    if case_id > MAX_CASE_ID {
        return Err(CaseError::InvariantViolation { case_id });
    }
    Ok(case_id)
}

/// Classifies the protocol state and decodes the matching case.
#[instrument(level = "debug", skip(state), fields(case_id))]
pub fn evaluate(
    state: &BeanstalkCaseState,
    delta_b: Decimal,
    largest_liquidity_well_bean_price: Decimal,
) -> Result<CaseEvaluation, CaseError> {
    if state.oracle_failure {
        warn!(well = %state.largest_liq_well, "Evaluating case while the oracle reports a failure");
    }

    let pod_rate = evaluate_pod_rate(state.pod_rate);
    let price = evaluate_price(delta_b, largest_liquidity_well_bean_price);
    let delta_pod_demand = evaluate_delta_pod_demand(state.delta_pod_demand);
    let l2sr = evaluate_l2sr(state.l2sr);

    let case_id = check_case_id(pod_rate.id + price.id + delta_pod_demand.id + l2sr.id)?;
    tracing::Span::current().record("case_id", case_id);

    let case = *case_data(case_id)?;
    let deltas = CaseDeltas::from(&case);
    debug!(
        temperature = %deltas.temperature,
        ratio = %deltas.bean_to_max_lp_gp_per_bdv_ratio,
        "Evaluated case"
    );

    let labels = CaseStateLabels {
        pod_rate: format!("Pod Rate: {}", pod_rate.label),
        price: format!("Price: {}", price.label),
        soil_demand: format!("Soil Demand: {}", delta_pod_demand.label),
        l2sr: format!("L2SR: {}", l2sr.label),
    };

    Ok(CaseEvaluation {
        pod_rate,
        price,
        delta_pod_demand,
        l2sr,
        case_id,
        case,
        deltas,
        labels,
        largest_liq_well: state.largest_liq_well,
    })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::cases::table::{CaseData, T_MINUS_3_L_MINUS_ONE, T_PLUS_3_L_MINUS_FIFTY};

    fn state(pod_rate: Decimal, delta_pod_demand: Decimal, l2sr: Decimal) -> BeanstalkCaseState {
        BeanstalkCaseState {
            pod_rate,
            delta_pod_demand,
            l2sr,
            largest_liq_well: Address::ZERO,
            oracle_failure: false,
        }
    }

    #[rstest]
    #[case(dec!(0), 0, "Excessively Low")]
    #[case(dec!(4.999), 0, "Excessively Low")]
    #[case(dec!(5), 9, "Reasonably Low")]
    #[case(dec!(14.99), 9, "Reasonably Low")]
    #[case(dec!(15), 18, "Reasonably High")]
    #[case(dec!(24.999), 18, "Reasonably High")]
    #[case(dec!(25), 27, "Excessively High")]
    #[case(dec!(100), 27, "Excessively High")]
    fn test_evaluate_pod_rate_boundaries(
        #[case] pod_rate: Decimal,
        #[case] id: usize,
        #[case] label: &str,
    ) {
        let evaluation = evaluate_pod_rate(pod_rate);

        assert_eq!(evaluation.id, id);
        assert_eq!(evaluation.label, label);
    }

    #[rstest]
    #[case(dec!(0), 0, "Excessively Low")]
    #[case(dec!(0.1199), 0, "Excessively Low")]
    #[case(dec!(0.12), 36, "Reasonably Low")]
    #[case(dec!(0.3999), 36, "Reasonably Low")]
    #[case(dec!(0.40), 72, "Reasonably High")]
    #[case(dec!(0.7999), 72, "Reasonably High")]
    #[case(dec!(0.80), 108, "Excessively High")]
    #[case(dec!(1), 108, "Excessively High")]
    fn test_evaluate_l2sr_boundaries(#[case] l2sr: Decimal, #[case] id: usize, #[case] label: &str) {
        let evaluation = evaluate_l2sr(l2sr);

        assert_eq!(evaluation.id, id);
        assert_eq!(evaluation.label, label);
    }

    #[rstest]
    #[case(dec!(0), 0, "Steady")]
    #[case(dec!(0.9499), 0, "Steady")]
    #[case(dec!(0.95), 1, "Decreasing")]
    #[case(dec!(1.0499), 1, "Decreasing")]
    #[case(dec!(1.05), 2, "Increasing")]
    #[case(dec!(2), 2, "Increasing")]
    fn test_evaluate_delta_pod_demand_boundaries(
        #[case] demand: Decimal,
        #[case] id: usize,
        #[case] label: &str,
    ) {
        let evaluation = evaluate_delta_pod_demand(demand);

        assert_eq!(evaluation.id, id);
        assert_eq!(evaluation.label, label);
    }

    #[rstest]
    #[case::negative_delta_b(dec!(-100), dec!(0.98), 0, "P < 1")]
    #[case::zero_delta_b(dec!(0), dec!(1.2), 0, "P < 1")]
    #[case::above_peg(dec!(100), dec!(1.01), 3, "P > 1")]
    #[case::at_threshold(dec!(100), dec!(1.05), 3, "P > 1")]
    #[case::above_q_still_reported_above_peg(dec!(100), dec!(1.2), 3, "P > 1")]
    #[case::positive_delta_b_below_peg_price(dec!(1), dec!(0.9), 3, "P > 1")]
    fn test_evaluate_price(
        #[case] delta_b: Decimal,
        #[case] price: Decimal,
        #[case] id: usize,
        #[case] label: &str,
    ) {
        let evaluation = evaluate_price(delta_b, price);

        assert_eq!(evaluation.id, id);
        assert_eq!(evaluation.label, label);
    }

    #[test]
    fn test_price_above_q_bucket_id() {
        assert_eq!(
            AxisEvaluation::from(PriceBucket::AboveQ),
            AxisEvaluation { id: 5, label: "P > Q" }
        );
    }

    #[test]
    fn test_evaluate_lowest_case() {
        let evaluation = evaluate(&state(dec!(1), dec!(0.5), dec!(0.05)), dec!(-10), dec!(0.97))
            .expect("evaluation failed");

        assert_eq!(evaluation.case_id, 0);
        assert_eq!(evaluation.case, CaseData::decode(&T_PLUS_3_L_MINUS_FIFTY));
        assert_eq!(
            evaluation.deltas,
            CaseDeltas { temperature: dec!(3), bean_to_max_lp_gp_per_bdv_ratio: dec!(-25) }
        );
        assert_eq!(
            evaluation.labels.to_string(),
            "Pod Rate: Excessively Low, Price: P < 1, Soil Demand: Steady, L2SR: Excessively Low"
        );
    }

    #[test]
    fn test_evaluate_highest_reachable_case() {
        let evaluation = evaluate(&state(dec!(30), dec!(1.5), dec!(0.9)), dec!(10), dec!(1.3))
            .expect("evaluation failed");

        assert_eq!(evaluation.pod_rate.id, 27);
        assert_eq!(evaluation.price.id, 3);
        assert_eq!(evaluation.delta_pod_demand.id, 2);
        assert_eq!(evaluation.l2sr.id, 108);
        assert_eq!(evaluation.case_id, 140);
        assert_eq!(evaluation.case, CaseData::decode(&T_MINUS_3_L_MINUS_ONE));
        assert_eq!(evaluation.deltas.temperature, dec!(-3));
        assert_eq!(evaluation.deltas.bean_to_max_lp_gp_per_bdv_ratio, dec!(-0.5));
    }

    #[test]
    fn test_evaluate_with_oracle_failure_still_yields_case() {
        let mut failing = state(dec!(10), dec!(1), dec!(0.5));
        failing.oracle_failure = true;

        let evaluation = evaluate(&failing, dec!(0), dec!(1)).expect("evaluation failed");

        assert_eq!(evaluation.case_id, 9 + 1 + 72);
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let input = state(dec!(17.3), dec!(0.99), dec!(0.41));

        assert_eq!(
            evaluate(&input, dec!(5), dec!(1.02)).unwrap(),
            evaluate(&input, dec!(5), dec!(1.02)).unwrap()
        );
    }

    #[test]
    fn test_case_id_totality() {
        for pod_rate in (0..=100i64).map(Decimal::from) {
            for demand in (0..=20).map(|d| Decimal::new(d, 1)) {
                for l2sr in (0..=20).map(|l| Decimal::new(l * 5, 2)) {
                    for delta_b in [dec!(-1), dec!(0), dec!(1)] {
                        let evaluation = evaluate(&state(pod_rate, demand, l2sr), delta_b, dec!(1.1))
                            .expect("case id out of range");
                        assert!(evaluation.case_id <= MAX_CASE_ID);
                    }
                }
            }
        }
    }

    #[test]
    fn test_check_case_id_rejects_out_of_range() {
        assert_eq!(check_case_id(144), Ok(144));
        assert_eq!(check_case_id(145), Err(CaseError::InvariantViolation { case_id: 145 }));
    }
}
