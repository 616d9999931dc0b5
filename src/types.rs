//! Identifier types: Ticker, TradingSymbol, GameId

use std::fmt;

use crate::error::ValidationError;

/// Standard exchange ticker (e.g., `AAPL`), as used in target weights and quotes.
///
/// Tickers are stored upper-cased and trimmed so that `aapl` and `AAPL`
/// refer to the same position.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Ticker(String);

impl Ticker {
    /// Create a ticker, normalizing case.
    ///
    /// # Panics
    ///
    /// Panics if `s` is empty after trimming. Use [`Ticker::try_new`] for
    /// untrusted input.
    #[track_caller]
    pub fn new(s: &str) -> Self {
        match Self::try_new(s) {
            Ok(t) => t,
            Err(e) => panic!("invalid ticker {s:?}: {e}"),
        }
    }

    /// Create a ticker, rejecting empty input.
    pub fn try_new(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyTicker);
        }
        Ok(Ticker(trimmed.to_ascii_uppercase()))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Venue-specific identifier required for order submission.
///
/// Distinct from the [`Ticker`]: the game resolves a ticker to its own
/// symbol (e.g., `STOCK-XNAS-AAPL`). Stored verbatim.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct TradingSymbol(String);

impl TradingSymbol {
    pub fn new(s: impl Into<String>) -> Self {
        TradingSymbol(s.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the venue returned no usable symbol.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for TradingSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Identifier of one trading game (the portfolio being rebalanced).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct GameId(String);

impl GameId {
    pub fn new(s: impl Into<String>) -> Self {
        GameId(s.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
