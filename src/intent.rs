//! Transaction intent: one order the rebalancer wants submitted.

use std::fmt;

use crate::action::Action;
use crate::types::Ticker;

/// A single order to submit: ticker, share count, action.
///
/// Ephemeral. Constructed by the resolver, submitted, then discarded.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransactionIntent {
    pub ticker: Ticker,
    pub shares: u64,
    pub action: Action,
}

impl TransactionIntent {
    pub fn new(ticker: Ticker, shares: u64, action: Action) -> Self {
        Self {
            ticker,
            shares,
            action,
        }
    }

    /// Zero-share intents are never submitted.
    #[inline]
    pub fn is_noop(&self) -> bool {
        self.shares == 0
    }

    /// Signed position change if this intent fills completely.
    #[inline]
    pub fn signed_delta(&self) -> i64 {
        self.action.signed_delta(self.shares)
    }
}

impl fmt::Display for TransactionIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.action, self.shares, self.ticker)
    }
}
