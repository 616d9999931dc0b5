//! Game collaborator traits and implementations for vsebook.
//!
//! The rebalancer consumes a game through three narrow traits:
//!
//! - [`PositionStore`]: portfolio value and current holdings
//! - [`QuoteProvider`]: prices and venue trading symbols
//! - [`OrderExecutor`]: order submission
//!
//! Implementations:
//!
//! - **Mock** ([`mock::MockGame`]): in-memory game that fills orders, for tests
//! - **MarketWatch** (feature `marketwatch`): MarketWatch Virtual Stock Exchange over HTTP

pub mod error;
pub mod mock;
pub mod types;

#[cfg(feature = "marketwatch")]
pub mod marketwatch;

pub use error::BrokerError;
pub use types::*;

use vsebook::{Action, GameId, Position, Ticker, TradingSymbol};

/// Read access to a game's account state.
pub trait PositionStore {
    /// Total marked-to-market worth of the game account.
    fn portfolio_value(&self, game: &GameId) -> Result<f64, BrokerError>;

    /// Current holdings, one row per lot (rows may repeat a ticker).
    fn positions(&self, game: &GameId) -> Result<Vec<Position>, BrokerError>;
}

/// Price and symbol lookups.
pub trait QuoteProvider {
    /// Latest price for a ticker. Fails with [`BrokerError::QuoteUnavailable`]
    /// when no price can be resolved.
    fn price(&self, ticker: &Ticker) -> Result<f64, BrokerError>;

    /// Venue symbol the game needs to trade `ticker`.
    fn trading_symbol(&self, game: &GameId, ticker: &Ticker) -> Result<TradingSymbol, BrokerError>;
}

/// Order submission.
pub trait OrderExecutor {
    /// Submit one order. `Ok` with `success == false` is a game-side rejection.
    fn submit_order(
        &self,
        game: &GameId,
        symbol: &TradingSymbol,
        shares: u64,
        action: Action,
    ) -> Result<OrderReceipt, BrokerError>;
}

/// Everything the rebalancer needs from one venue.
pub trait Game: PositionStore + QuoteProvider + OrderExecutor {}

impl<T: PositionStore + QuoteProvider + OrderExecutor> Game for T {}
