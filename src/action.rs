//! Trade action: Buy, Sell, Short, or Cover

use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Kind of transaction the game accepts.
///
/// `Buy`/`Sell` open and close long positions, `Short`/`Cover` open and
/// close short positions. Margin is assumed, so `Short` is always allowed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Action {
    Buy,
    Sell,
    Short,
    Cover,
}

impl Action {
    /// Every action the game recognizes.
    pub const ALL: [Action; 4] = [Action::Buy, Action::Sell, Action::Short, Action::Cover];

    /// Wire name expected by the order endpoint.
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Buy => "Buy",
            Action::Sell => "Sell",
            Action::Short => "Short",
            Action::Cover => "Cover",
        }
    }

    /// Change in signed shares when `shares` of this action fill.
    ///
    /// Buy and Cover add shares, Sell and Short remove them.
    #[inline]
    pub fn signed_delta(self, shares: u64) -> i64 {
        let shares = shares.min(i64::MAX as u64) as i64;
        match self {
            Action::Buy | Action::Cover => shares,
            Action::Sell | Action::Short => -shares,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ValidationError;

    /// Parse a wire or CLI action name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::InvalidAction(s.to_string()))
    }
}
