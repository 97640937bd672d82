//! Packed case records and their decoded form.
//!
//! Every case is stored as a 32 byte word:
//!
//! | bytes  | field | type   | precision        |
//! |--------|-------|--------|------------------|
//! | 0..4   | `mT`  | uint32 | 1% = 1e6         |
//! | 4      | `bT`  | int8   | 1% = 1           |
//! | 5..15  | `mL`  | int80  | 1% = 1e18        |
//! | 15..25 | `bL`  | int80  | 1% = 1e18        |
//! | 25..32 | -     | zero   | reserved         |
//!
//! Temperature and the Bean to max LP gauge point per BDV ratio are updated as
//! `T_n = mT * T_n-1 + bT` and `L_n = mL * L_n-1 + bL`.

use hex_literal::hex;
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{cases::CaseError, decimal::to_decimal};

/// Number of entries in the case table. Valid case ids are `0..=MAX_CASE_ID`.
pub const CASE_COUNT: usize = 145;
pub const MAX_CASE_ID: usize = CASE_COUNT - 1;

const TEMPERATURE_MULTIPLIER_DECIMALS: u32 = 6;
const RATIO_DECIMALS: u32 = 18;

/// Upper and lower bound of the Bean to max LP gauge point per BDV ratio, 18 decimals.
pub const MAX_BEAN_MAX_LP_GP_PER_BDV_RATIO: i128 = 100_000_000_000_000_000_000;
pub const MIN_BEAN_MAX_LP_GP_PER_BDV_RATIO: i128 = 50_000_000_000_000_000_000;
const BEAN_MAX_LP_GP_RATIO_RANGE: i128 =
    MAX_BEAN_MAX_LP_GP_PER_BDV_RATIO - MIN_BEAN_MAX_LP_GP_PER_BDV_RATIO;

/// A decoded case record. Fields keep their raw fixed-point values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CaseData {
    /// Relative temperature multiplier, 100% = 100e6.
    pub m_t: u32,
    /// Absolute temperature change in percentage points.
    pub b_t: i8,
    /// Relative Bean to max LP gauge point per BDV ratio multiplier, 100% = 100e18.
    pub m_l: i128,
    /// Absolute Bean to max LP gauge point per BDV ratio change, 1% = 1e18.
    pub b_l: i128,
}

impl CaseData {
    pub const fn decode(raw: &[u8; 32]) -> Self {
        Self {
            m_t: u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]),
            b_t: raw[4] as i8,
            m_l: read_i80(raw, 5),
            b_l: read_i80(raw, 15),
        }
    }

    pub fn temperature_multiplier(&self) -> Decimal {
        Decimal::new(self.m_t as i64, TEMPERATURE_MULTIPLIER_DECIMALS)
    }

    pub fn temperature_delta(&self) -> Decimal {
        Decimal::from(self.b_t)
    }

    pub fn ratio_multiplier(&self) -> Decimal {
        scale_ratio(self.m_l)
    }

    pub fn ratio_delta(&self) -> Decimal {
        scale_ratio(self.b_l)
    }

    /// The absolute ratio change remapped onto the `[50, 100]` range the ratio lives in:
    /// `bL * (100e18 - 50e18) / 100e18`, truncated toward zero.
    pub fn bean_to_max_lp_gp_per_bdv_ratio_delta(&self) -> Decimal {
        let remapped = BigInt::from(self.b_l) * BigInt::from(BEAN_MAX_LP_GP_RATIO_RANGE) /
            BigInt::from(MAX_BEAN_MAX_LP_GP_PER_BDV_RATIO);
        // |remapped| <= |bL|, which always fits.
        scale_ratio(remapped.to_i128().unwrap_or_default())
    }
}

const fn read_i80(raw: &[u8; 32], offset: usize) -> i128 {
    let mut value: i128 = 0;
    let mut i = 0;
    while i < 10 {
        value = (value << 8) | raw[offset + i] as i128;
        i += 1;
    }
    // sign extend from bit 79
    (value << 48) >> 48
}

fn scale_ratio(raw: i128) -> Decimal {
    // int80 values stay far below the 96 bit decimal mantissa.
    to_decimal(raw, RATIO_DECIMALS).unwrap_or_default()
}

// Naming: T_PLUS_3 increments temperature by 3 percentage points, L_MINUS_FIFTY decrements the
// Bean to max LP gauge point per BDV ratio by 50. Multipliers are always 100%.
//
//////////////////////////////////////////////////////////
//                     | mT     |bT|        mL          |        bL          | reserved
//////////////////////////////////////////////////////////
pub const T_PLUS_3_L_MINUS_FIFTY: [u8; 32] =
    hex!("05F5E1000300056BC75E2D63100000FFFD4A1C50E94E78000000000000000000");
pub const T_PLUS_1_L_MINUS_FIFTY: [u8; 32] =
    hex!("05F5E1000100056BC75E2D63100000FFFD4A1C50E94E78000000000000000000");
pub const T_PLUS_0_L_MINUS_FIFTY: [u8; 32] =
    hex!("05F5E1000000056BC75E2D63100000FFFD4A1C50E94E78000000000000000000");
pub const T_MINUS_1_L_MINUS_FIFTY: [u8; 32] =
    hex!("05F5E100FF00056BC75E2D63100000FFFD4A1C50E94E78000000000000000000");
pub const T_MINUS_3_L_MINUS_FIFTY: [u8; 32] =
    hex!("05F5E100FD00056BC75E2D63100000FFFD4A1C50E94E78000000000000000000");
//////////////////////////////////////////////////////////
pub const T_PLUS_3_L_MINUS_ONE: [u8; 32] =
    hex!("05F5E1000300056BC75E2D63100000FFFFF21F494C589C000000000000000000");
pub const T_PLUS_1_L_MINUS_ONE: [u8; 32] =
    hex!("05F5E1000100056BC75E2D63100000FFFFF21F494C589C000000000000000000");
pub const T_PLUS_0_L_MINUS_ONE: [u8; 32] =
    hex!("05F5E1000000056BC75E2D63100000FFFFF21F494C589C000000000000000000");
pub const T_MINUS_1_L_MINUS_ONE: [u8; 32] =
    hex!("05F5E100FF00056BC75E2D63100000FFFFF21F494C589C000000000000000000");
pub const T_MINUS_3_L_MINUS_ONE: [u8; 32] =
    hex!("05F5E100FD00056BC75E2D63100000FFFFF21F494C589C000000000000000000");
//////////////////////////////////////////////////////////
pub const T_PLUS_3_L_PLUS_ONE: [u8; 32] =
    hex!("05F5E1000300056BC75E2D6310000000000DE0B6B3A764000000000000000000");
pub const T_PLUS_1_L_PLUS_ONE: [u8; 32] =
    hex!("05F5E1000100056BC75E2D6310000000000DE0B6B3A764000000000000000000");
pub const T_PLUS_0_L_PLUS_ONE: [u8; 32] =
    hex!("05F5E1000000056BC75E2D6310000000000DE0B6B3A764000000000000000000");
//////////////////////////////////////////////////////////
pub const T_PLUS_3_L_PLUS_TWO: [u8; 32] =
    hex!("05F5E1000300056BC75E2D6310000000001BC16D674EC8000000000000000000");
pub const T_PLUS_1_L_PLUS_TWO: [u8; 32] =
    hex!("05F5E1000100056BC75E2D6310000000001BC16D674EC8000000000000000000");
pub const T_PLUS_0_L_PLUS_TWO: [u8; 32] =
    hex!("05F5E1000000056BC75E2D6310000000001BC16D674EC8000000000000000000");
//////////////////////////////////////////////////////////

/// The packed seasonal cases, indexed by case id.
///
/// case id = pod rate bucket (0, 9, 18, 27) + price bucket (0, 3, 5) + soil demand bucket
/// (0, 1, 2) + L2SR bucket (0, 36, 72, 108). The trailing entry is reserved and neutral.
#[rustfmt::skip]
pub const CASE_TABLE: [[u8; 32]; CASE_COUNT] = [
    //////////////////////////////// Excessively Low L2SR ////////////////////////////////
    //   Dsc soil demand,        Steady soil demand,      Inc soil demand
    // Exs Low: P < 1
    T_PLUS_3_L_MINUS_FIFTY, T_PLUS_1_L_MINUS_FIFTY, T_PLUS_0_L_MINUS_FIFTY,
    // Exs Low: P > 1
    T_MINUS_1_L_MINUS_FIFTY, T_MINUS_3_L_MINUS_FIFTY, T_MINUS_3_L_MINUS_FIFTY,
    // Exs Low: P > Q
    T_MINUS_1_L_MINUS_FIFTY, T_MINUS_3_L_MINUS_FIFTY, T_MINUS_3_L_MINUS_FIFTY,
    // Rea Low: P < 1
    T_PLUS_3_L_MINUS_FIFTY, T_PLUS_1_L_MINUS_FIFTY, T_PLUS_0_L_MINUS_FIFTY,
    // Rea Low: P > 1
    T_MINUS_1_L_MINUS_FIFTY, T_MINUS_3_L_MINUS_FIFTY, T_MINUS_3_L_MINUS_FIFTY,
    // Rea Low: P > Q
    T_MINUS_1_L_MINUS_FIFTY, T_MINUS_3_L_MINUS_FIFTY, T_MINUS_3_L_MINUS_FIFTY,
    // Rea Hgh: P < 1
    T_PLUS_3_L_MINUS_FIFTY, T_PLUS_3_L_MINUS_FIFTY, T_PLUS_1_L_MINUS_FIFTY,
    // Rea Hgh: P > 1
    T_PLUS_0_L_MINUS_FIFTY, T_MINUS_1_L_MINUS_FIFTY, T_MINUS_3_L_MINUS_FIFTY,
    // Rea Hgh: P > Q
    T_PLUS_0_L_MINUS_FIFTY, T_MINUS_1_L_MINUS_FIFTY, T_MINUS_3_L_MINUS_FIFTY,
    // Exs Hgh: P < 1
    T_PLUS_3_L_MINUS_FIFTY, T_PLUS_3_L_MINUS_FIFTY, T_PLUS_1_L_MINUS_FIFTY,
    // Exs Hgh: P > 1
    T_PLUS_0_L_MINUS_FIFTY, T_MINUS_1_L_MINUS_FIFTY, T_MINUS_3_L_MINUS_FIFTY,
    // Exs Hgh: P > Q
    T_PLUS_0_L_MINUS_FIFTY, T_MINUS_1_L_MINUS_FIFTY, T_MINUS_3_L_MINUS_FIFTY,
    //////////////////////////////// Reasonably Low L2SR ////////////////////////////////
    //   Dsc soil demand,        Steady soil demand,      Inc soil demand
    // Exs Low: P < 1
    T_PLUS_3_L_MINUS_ONE, T_PLUS_1_L_MINUS_ONE, T_PLUS_0_L_MINUS_ONE,
    // Exs Low: P > 1
    T_MINUS_1_L_MINUS_ONE, T_MINUS_3_L_MINUS_ONE, T_MINUS_3_L_MINUS_ONE,
    // Exs Low: P > Q
    T_MINUS_1_L_MINUS_FIFTY, T_MINUS_3_L_MINUS_FIFTY, T_MINUS_3_L_MINUS_FIFTY,
    // Rea Low: P < 1
    T_PLUS_3_L_MINUS_ONE, T_PLUS_1_L_MINUS_ONE, T_PLUS_0_L_MINUS_ONE,
    // Rea Low: P > 1
    T_MINUS_1_L_MINUS_ONE, T_MINUS_3_L_MINUS_ONE, T_MINUS_3_L_MINUS_ONE,
    // Rea Low: P > Q
    T_MINUS_1_L_MINUS_FIFTY, T_MINUS_3_L_MINUS_FIFTY, T_MINUS_3_L_MINUS_FIFTY,
    // Rea Hgh: P < 1
    T_PLUS_3_L_MINUS_ONE, T_PLUS_3_L_MINUS_ONE, T_PLUS_1_L_MINUS_ONE,
    // Rea Hgh: P > 1
    T_PLUS_0_L_MINUS_ONE, T_MINUS_1_L_MINUS_ONE, T_MINUS_3_L_MINUS_ONE,
    // Rea Hgh: P > Q
    T_PLUS_0_L_MINUS_FIFTY, T_MINUS_1_L_MINUS_FIFTY, T_MINUS_3_L_MINUS_FIFTY,
    // Exs Hgh: P < 1
    T_PLUS_3_L_MINUS_ONE, T_PLUS_3_L_MINUS_ONE, T_PLUS_1_L_MINUS_ONE,
    // Exs Hgh: P > 1
    T_PLUS_0_L_MINUS_ONE, T_MINUS_1_L_MINUS_ONE, T_MINUS_3_L_MINUS_ONE,
    // Exs Hgh: P > Q
    T_PLUS_0_L_MINUS_FIFTY, T_MINUS_1_L_MINUS_FIFTY, T_MINUS_3_L_MINUS_FIFTY,
    //////////////////////////////// Reasonably High L2SR ////////////////////////////////
    //   Dsc soil demand,        Steady soil demand,      Inc soil demand
    // Exs Low: P < 1
    T_PLUS_3_L_PLUS_ONE, T_PLUS_1_L_PLUS_ONE, T_PLUS_0_L_PLUS_ONE,
    // Exs Low: P > 1
    T_MINUS_1_L_MINUS_ONE, T_MINUS_3_L_MINUS_ONE, T_MINUS_3_L_MINUS_ONE,
    // Exs Low: P > Q
    T_MINUS_1_L_MINUS_FIFTY, T_MINUS_3_L_MINUS_FIFTY, T_MINUS_3_L_MINUS_FIFTY,
    // Rea Low: P < 1
    T_PLUS_3_L_PLUS_ONE, T_PLUS_1_L_PLUS_ONE, T_PLUS_0_L_PLUS_ONE,
    // Rea Low: P > 1
    T_MINUS_1_L_MINUS_ONE, T_MINUS_3_L_MINUS_ONE, T_MINUS_3_L_MINUS_ONE,
    // Rea Low: P > Q
    T_MINUS_1_L_MINUS_FIFTY, T_MINUS_3_L_MINUS_FIFTY, T_MINUS_3_L_MINUS_FIFTY,
    // Rea Hgh: P < 1
    T_PLUS_3_L_PLUS_ONE, T_PLUS_3_L_PLUS_ONE, T_PLUS_1_L_PLUS_ONE,
    // Rea Hgh: P > 1
    T_PLUS_0_L_MINUS_ONE, T_MINUS_1_L_MINUS_ONE, T_MINUS_3_L_MINUS_ONE,
    // Rea Hgh: P > Q
    T_PLUS_0_L_MINUS_FIFTY, T_MINUS_1_L_MINUS_FIFTY, T_MINUS_3_L_MINUS_FIFTY,
    // Exs Hgh: P < 1
    T_PLUS_3_L_PLUS_ONE, T_PLUS_3_L_PLUS_ONE, T_PLUS_1_L_PLUS_ONE,
    // Exs Hgh: P > 1
    T_PLUS_0_L_MINUS_ONE, T_MINUS_1_L_MINUS_ONE, T_MINUS_3_L_MINUS_ONE,
    // Exs Hgh: P > Q
    T_PLUS_0_L_MINUS_FIFTY, T_MINUS_1_L_MINUS_FIFTY, T_MINUS_3_L_MINUS_FIFTY,
    //////////////////////////////// Excessively High L2SR ////////////////////////////////
    //   Dsc soil demand,        Steady soil demand,      Inc soil demand
    // Exs Low: P < 1
    T_PLUS_3_L_PLUS_TWO, T_PLUS_1_L_PLUS_TWO, T_PLUS_0_L_PLUS_TWO,
    // Exs Low: P > 1
    T_MINUS_1_L_MINUS_ONE, T_MINUS_3_L_MINUS_ONE, T_MINUS_3_L_MINUS_ONE,
    // Exs Low: P > Q
    T_MINUS_1_L_MINUS_FIFTY, T_MINUS_3_L_MINUS_FIFTY, T_MINUS_3_L_MINUS_FIFTY,
    // Rea Low: P < 1
    T_PLUS_3_L_PLUS_TWO, T_PLUS_1_L_PLUS_TWO, T_PLUS_0_L_PLUS_TWO,
    // Rea Low: P > 1
    T_MINUS_1_L_MINUS_ONE, T_MINUS_3_L_MINUS_ONE, T_MINUS_3_L_MINUS_ONE,
    // Rea Low: P > Q
    T_MINUS_1_L_MINUS_FIFTY, T_MINUS_3_L_MINUS_FIFTY, T_MINUS_3_L_MINUS_FIFTY,
    // Rea Hgh: P < 1
    T_PLUS_3_L_PLUS_TWO, T_PLUS_3_L_PLUS_TWO, T_PLUS_1_L_PLUS_TWO,
    // Rea Hgh: P > 1
    T_PLUS_0_L_MINUS_ONE, T_MINUS_1_L_MINUS_ONE, T_MINUS_3_L_MINUS_ONE,
    // Rea Hgh: P > Q
    T_PLUS_0_L_MINUS_FIFTY, T_MINUS_1_L_MINUS_FIFTY, T_MINUS_3_L_MINUS_FIFTY,
    // Exs Hgh: P < 1
    T_PLUS_3_L_PLUS_TWO, T_PLUS_3_L_PLUS_TWO, T_PLUS_1_L_PLUS_TWO,
    // Exs Hgh: P > 1
    T_PLUS_0_L_MINUS_ONE, T_MINUS_1_L_MINUS_ONE, T_MINUS_3_L_MINUS_ONE,
    // Exs Hgh: P > Q
    T_PLUS_0_L_MINUS_FIFTY, T_MINUS_1_L_MINUS_FIFTY, T_MINUS_3_L_MINUS_FIFTY,
    //////////////////////////////// Reserved ////////////////////////////////
    T_PLUS_0_L_MINUS_FIFTY,
];

static CASES: Lazy<[CaseData; CASE_COUNT]> =
    Lazy::new(|| CASE_TABLE.map(|raw| CaseData::decode(&raw)));

/// Checked access into the decoded case table.
pub fn case_data(case_id: usize) -> Result<&'static CaseData, CaseError> {
    CASES
        .get(case_id)
        .ok_or(CaseError::UnknownCase(case_id))
}
