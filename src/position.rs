//! Positions and immutable position snapshots.

use std::collections::BTreeMap;

use crate::intent::TransactionIntent;
use crate::types::{Ticker, TradingSymbol};

/// A holding in a single ticker, as read from the game.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub ticker: Ticker,
    /// Net shares: positive = long, negative = short
    pub signed_shares: i64,
    /// Venue symbol, when the holdings page reports it
    pub trading_symbol: Option<TradingSymbol>,
}

impl Position {
    pub fn new(ticker: Ticker, signed_shares: i64) -> Self {
        Self {
            ticker,
            signed_shares,
            trading_symbol: None,
        }
    }

    pub fn with_trading_symbol(mut self, symbol: TradingSymbol) -> Self {
        self.trading_symbol = Some(symbol);
        self
    }

    #[inline]
    pub fn is_short(&self) -> bool {
        self.signed_shares < 0
    }
}

/// Immutable view of every open position in a game at one instant.
///
/// Snapshots are re-read from the position store at each phase boundary
/// rather than patched in place. Flat (zero-share) rows are dropped on
/// construction, so "absent" and "flat" are the same thing.
///
/// Iteration is in ticker order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PositionSnapshot {
    positions: BTreeMap<Ticker, Position>,
}

impl PositionSnapshot {
    /// An empty snapshot (fresh portfolio).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot from holdings rows.
    ///
    /// Rows for the same ticker are netted (a game may report a long and a
    /// short lot separately); the first non-empty trading symbol wins.
    pub fn from_positions(rows: impl IntoIterator<Item = Position>) -> Self {
        let mut positions: BTreeMap<Ticker, Position> = BTreeMap::new();
        for row in rows {
            match positions.get_mut(&row.ticker) {
                Some(existing) => {
                    existing.signed_shares =
                        existing.signed_shares.saturating_add(row.signed_shares);
                    if existing.trading_symbol.is_none() {
                        existing.trading_symbol = row.trading_symbol;
                    }
                }
                None => {
                    positions.insert(row.ticker.clone(), row);
                }
            }
        }
        positions.retain(|_, p| p.signed_shares != 0);
        Self { positions }
    }

    /// Signed shares held in `ticker` (0 when absent).
    #[inline]
    pub fn shares(&self, ticker: &Ticker) -> i64 {
        self.positions.get(ticker).map_or(0, |p| p.signed_shares)
    }

    #[inline]
    pub fn contains(&self, ticker: &Ticker) -> bool {
        self.positions.contains_key(ticker)
    }

    pub fn get(&self, ticker: &Ticker) -> Option<&Position> {
        self.positions.get(ticker)
    }

    /// Venue symbol for a held ticker, if the store reported one.
    pub fn trading_symbol(&self, ticker: &Ticker) -> Option<&TradingSymbol> {
        self.positions
            .get(ticker)
            .and_then(|p| p.trading_symbol.as_ref())
            .filter(|s| !s.is_empty())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    pub fn tickers(&self) -> impl Iterator<Item = &Ticker> {
        self.positions.keys()
    }

    /// Project the snapshot forward as if `intent` had filled completely.
    ///
    /// Returns a new snapshot; `self` is untouched. A position that nets to
    /// zero is removed.
    pub fn apply(&self, intent: &TransactionIntent) -> PositionSnapshot {
        let mut next = self.clone();
        if intent.is_noop() {
            return next;
        }
        let delta = intent.signed_delta();
        let entry = next
            .positions
            .entry(intent.ticker.clone())
            .or_insert_with(|| Position::new(intent.ticker.clone(), 0));
        entry.signed_shares = entry.signed_shares.saturating_add(delta);
        if entry.signed_shares == 0 {
            next.positions.remove(&intent.ticker);
        }
        next
    }
}

impl FromIterator<Position> for PositionSnapshot {
    fn from_iter<I: IntoIterator<Item = Position>>(iter: I) -> Self {
        Self::from_positions(iter)
    }
}
