//! Mock game for testing: implements every collaborator trait in memory.
//!
//! Accepted orders fill immediately against an internal position book, so
//! a rebalance against a `MockGame` can be followed by a second one that
//! sees the results. Every call is recorded for ordering assertions.
//!
//! ```ignore
//! use vsebook::Ticker;
//! use vsebook_broker::mock::{MockGame, FillMode};
//!
//! let game = MockGame::builder()
//!     .with_value(1000.0)
//!     .with_position(Ticker::new("X"), 20)
//!     .with_price(Ticker::new("X"), 10.0)
//!     .fill_mode(FillMode::ImmediateFull)
//!     .build();
//! ```

use std::collections::BTreeMap;
use std::sync::Mutex;

use vsebook::{Action, GameId, Position, Ticker, TradingSymbol};

use crate::error::BrokerError;
use crate::types::*;
use crate::{OrderExecutor, PositionStore, QuoteProvider};

/// Prefix of the trading symbols the mock invents for unconfigured tickers.
pub const MOCK_SYMBOL_PREFIX: &str = "MOCK-";

/// How the mock game handles submitted orders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FillMode {
    /// Orders are accepted and fill completely.
    ImmediateFull,
    /// Orders are accepted but never fill (positions stay unchanged).
    AcceptNoFill,
    /// All orders are rejected by the game.
    Reject,
}

/// One collaborator call, in the order it happened.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    PortfolioValue,
    Positions,
    Price(Ticker),
    TradingSymbol(Ticker),
    SubmitOrder(SubmittedOrder),
}

/// Builder for `MockGame`.
pub struct MockGameBuilder {
    value: f64,
    positions: Vec<(Ticker, i64)>,
    prices: Vec<(Ticker, f64)>,
    symbols: Vec<(Ticker, TradingSymbol)>,
    unknown_symbols: Vec<Ticker>,
    rejected: Vec<Ticker>,
    fill_mode: FillMode,
    fail_positions_on_read: Option<usize>,
    fail_value: bool,
    session_lost_on_submit: bool,
}

impl MockGameBuilder {
    pub fn with_value(mut self, value: f64) -> Self {
        self.value = value;
        self
    }

    pub fn with_position(mut self, ticker: Ticker, signed_shares: i64) -> Self {
        self.positions.push((ticker, signed_shares));
        self
    }

    pub fn with_price(mut self, ticker: Ticker, price: f64) -> Self {
        self.prices.push((ticker, price));
        self
    }

    /// Use a specific venue symbol for `ticker` instead of the generated one.
    pub fn with_trading_symbol(mut self, ticker: Ticker, symbol: TradingSymbol) -> Self {
        self.symbols.push((ticker, symbol));
        self
    }

    /// Symbol search for `ticker` finds nothing.
    pub fn without_trading_symbol(mut self, ticker: Ticker) -> Self {
        self.unknown_symbols.push(ticker);
        self
    }

    /// The game rejects every order for `ticker`, regardless of fill mode.
    pub fn reject_ticker(mut self, ticker: Ticker) -> Self {
        self.rejected.push(ticker);
        self
    }

    pub fn fill_mode(mut self, mode: FillMode) -> Self {
        self.fill_mode = mode;
        self
    }

    /// The `n`th call to `positions()` (1-based) fails with a connection error.
    pub fn fail_positions_on_read(mut self, n: usize) -> Self {
        self.fail_positions_on_read = Some(n);
        self
    }

    /// `portfolio_value()` fails with a connection error.
    pub fn fail_value(mut self) -> Self {
        self.fail_value = true;
        self
    }

    /// Every submission fails as if the session expired.
    pub fn session_lost_on_submit(mut self) -> Self {
        self.session_lost_on_submit = true;
        self
    }

    pub fn build(self) -> MockGame {
        let mut book = BTreeMap::new();
        for (ticker, shares) in self.positions {
            *book.entry(ticker).or_insert(0) += shares;
        }
        book.retain(|_, s| *s != 0);

        MockGame {
            value: self.value,
            prices: self.prices,
            symbols: self.symbols,
            unknown_symbols: self.unknown_symbols,
            rejected: self.rejected,
            fill_mode: self.fill_mode,
            fail_positions_on_read: self.fail_positions_on_read,
            fail_value: self.fail_value,
            session_lost_on_submit: self.session_lost_on_submit,
            state: Mutex::new(MockState {
                book,
                calls: Vec::new(),
                position_reads: 0,
            }),
        }
    }
}

struct MockState {
    book: BTreeMap<Ticker, i64>,
    calls: Vec<Call>,
    position_reads: usize,
}

/// An in-memory game that records calls and fills accepted orders.
pub struct MockGame {
    value: f64,
    prices: Vec<(Ticker, f64)>,
    symbols: Vec<(Ticker, TradingSymbol)>,
    unknown_symbols: Vec<Ticker>,
    rejected: Vec<Ticker>,
    fill_mode: FillMode,
    fail_positions_on_read: Option<usize>,
    fail_value: bool,
    session_lost_on_submit: bool,
    state: Mutex<MockState>,
}

impl MockGame {
    pub fn builder() -> MockGameBuilder {
        MockGameBuilder {
            value: 1000.0,
            positions: Vec::new(),
            prices: Vec::new(),
            symbols: Vec::new(),
            unknown_symbols: Vec::new(),
            rejected: Vec::new(),
            fill_mode: FillMode::ImmediateFull,
            fail_positions_on_read: None,
            fail_value: false,
            session_lost_on_submit: false,
        }
    }

    /// Every call made so far, oldest first.
    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Orders that reached the executor (accepted or rejected).
    pub fn submitted_orders(&self) -> Vec<SubmittedOrder> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::SubmitOrder(o) => Some(o.clone()),
                _ => None,
            })
            .collect()
    }

    /// Forget recorded calls (the position book is kept).
    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// Current signed shares for `ticker` in the mock book.
    pub fn shares(&self, ticker: &Ticker) -> i64 {
        self.state
            .lock()
            .unwrap()
            .book
            .get(ticker)
            .copied()
            .unwrap_or(0)
    }

    /// Symbol the mock reports for `ticker`.
    pub fn symbol_for(&self, ticker: &Ticker) -> TradingSymbol {
        self.symbols
            .iter()
            .find(|(t, _)| t == ticker)
            .map(|(_, s)| s.clone())
            .unwrap_or_else(|| TradingSymbol::new(format!("{MOCK_SYMBOL_PREFIX}{ticker}")))
    }

    fn ticker_for(&self, symbol: &TradingSymbol) -> Option<Ticker> {
        if let Some((t, _)) = self.symbols.iter().find(|(_, s)| s == symbol) {
            return Some(t.clone());
        }
        symbol
            .as_str()
            .strip_prefix(MOCK_SYMBOL_PREFIX)
            .and_then(|s| Ticker::try_new(s).ok())
    }
}

impl PositionStore for MockGame {
    fn portfolio_value(&self, _game: &GameId) -> Result<f64, BrokerError> {
        self.state.lock().unwrap().calls.push(Call::PortfolioValue);
        if self.fail_value {
            return Err(BrokerError::Connection("mock: value page unreachable".into()));
        }
        Ok(self.value)
    }

    fn positions(&self, _game: &GameId) -> Result<Vec<Position>, BrokerError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Positions);
        state.position_reads += 1;
        if self.fail_positions_on_read == Some(state.position_reads) {
            return Err(BrokerError::Connection("mock: holdings page unreachable".into()));
        }
        Ok(state
            .book
            .iter()
            .map(|(t, s)| Position::new(t.clone(), *s).with_trading_symbol(self.symbol_for(t)))
            .collect())
    }
}

impl QuoteProvider for MockGame {
    fn price(&self, ticker: &Ticker) -> Result<f64, BrokerError> {
        self.state
            .lock()
            .unwrap()
            .calls
            .push(Call::Price(ticker.clone()));
        self.prices
            .iter()
            .find(|(t, _)| t == ticker)
            .map(|(_, p)| *p)
            .ok_or_else(|| BrokerError::QuoteUnavailable(ticker.as_str().to_string()))
    }

    fn trading_symbol(
        &self,
        _game: &GameId,
        ticker: &Ticker,
    ) -> Result<TradingSymbol, BrokerError> {
        self.state
            .lock()
            .unwrap()
            .calls
            .push(Call::TradingSymbol(ticker.clone()));
        if self.unknown_symbols.contains(ticker) {
            return Err(BrokerError::SymbolNotFound(ticker.as_str().to_string()));
        }
        Ok(self.symbol_for(ticker))
    }
}

impl OrderExecutor for MockGame {
    fn submit_order(
        &self,
        game: &GameId,
        symbol: &TradingSymbol,
        shares: u64,
        action: Action,
    ) -> Result<OrderReceipt, BrokerError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::SubmitOrder(SubmittedOrder {
            game: game.clone(),
            trading_symbol: symbol.clone(),
            shares,
            action,
        }));

        if self.session_lost_on_submit {
            return Err(BrokerError::NotLoggedIn);
        }

        let Some(ticker) = self.ticker_for(symbol) else {
            return Ok(OrderReceipt::rejected(format!("unknown symbol {symbol}")));
        };
        if self.rejected.contains(&ticker) {
            return Ok(OrderReceipt::rejected(format!("mock: {ticker} rejected")));
        }

        match self.fill_mode {
            FillMode::Reject => Ok(OrderReceipt::rejected("mock: order rejected")),
            FillMode::AcceptNoFill => Ok(OrderReceipt::accepted()),
            FillMode::ImmediateFull => {
                let entry = state.book.entry(ticker.clone()).or_insert(0);
                *entry += action.signed_delta(shares);
                if *entry == 0 {
                    state.book.remove(&ticker);
                }
                Ok(OrderReceipt::accepted())
            }
        }
    }
}
