pub mod pool;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use thiserror::Error;

/// Raised when an on-chain transfer mode byte does not map onto a known mode.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Invalid transfer mode: {0}")]
pub struct InvalidModeError(pub u8);

/// Where Beanstalk pulls the tokens of a farm step from.
///
/// The discriminants are the values of Beanstalk's `LibTransfer.From` enum and are encoded as
/// `uint8` in calldata.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    EnumString,
    Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum FarmFromMode {
    /// The caller's wallet.
    #[default]
    External = 0,
    /// The caller's internal Beanstalk balance.
    Internal = 1,
    /// Internal balance first, the remainder from the wallet.
    InternalExternal = 2,
    /// Internal balance, tolerating a shortfall.
    InternalTolerant = 3,
}

impl From<FarmFromMode> for u8 {
    fn from(mode: FarmFromMode) -> Self {
        mode as u8
    }
}

impl TryFrom<u8> for FarmFromMode {
    type Error = InvalidModeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::External),
            1 => Ok(Self::Internal),
            2 => Ok(Self::InternalExternal),
            3 => Ok(Self::InternalTolerant),
            other => Err(InvalidModeError(other)),
        }
    }
}

/// Where Beanstalk sends the tokens produced by a farm step.
///
/// Mirrors Beanstalk's `LibTransfer.To` enum, encoded as `uint8`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    EnumString,
    Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum FarmToMode {
    #[default]
    External = 0,
    Internal = 1,
}

impl From<FarmToMode> for u8 {
    fn from(mode: FarmToMode) -> Self {
        mode as u8
    }
}

impl TryFrom<u8> for FarmToMode {
    type Error = InvalidModeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::External),
            1 => Ok(Self::Internal),
            other => Err(InvalidModeError(other)),
        }
    }
}
