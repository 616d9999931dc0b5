//! MarketWatch Virtual Stock Exchange implementation.

pub mod client;
pub mod html;
pub mod types;
pub mod urls;

use std::time::Duration;

use log::debug;
use vsebook::{Action, GameId, Position, Ticker, TradingSymbol};
use zeroize::Zeroizing;

use crate::error::BrokerError;
use crate::types::OrderReceipt;
use crate::{OrderExecutor, PositionStore, QuoteProvider};
use client::MarketWatchClient;
use types::OrderLine;
use urls::Endpoints;

/// Default HTTP timeout for page fetches and order posts.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A MarketWatch VSE account implementing every collaborator trait.
///
/// Game pages require [`connect`](Self::connect) first; price lookups use the
/// public stock pages and work without a session.
pub struct MarketWatch {
    username: String,
    password: Zeroizing<String>,
    client: MarketWatchClient,
    logged_in: bool,
}

impl MarketWatch {
    /// Create a handle against the public site (not yet logged in).
    pub fn new(username: &str, password: Zeroizing<String>) -> Result<Self, BrokerError> {
        Self::with_endpoints(username, password, Endpoints::default(), DEFAULT_TIMEOUT)
    }

    /// Create a handle against custom hosts (staging, test servers).
    pub fn with_endpoints(
        username: &str,
        password: Zeroizing<String>,
        endpoints: Endpoints,
        timeout: Duration,
    ) -> Result<Self, BrokerError> {
        Ok(Self {
            username: username.to_string(),
            password,
            client: MarketWatchClient::new(endpoints, timeout)?,
            logged_in: false,
        })
    }

    /// Log in. Fails with [`BrokerError::Auth`] on bad credentials.
    pub fn connect(&mut self) -> Result<(), BrokerError> {
        self.client.login(&self.username, &self.password)?;
        self.logged_in = true;
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.logged_in
    }

    fn require_session(&self) -> Result<&MarketWatchClient, BrokerError> {
        if self.logged_in {
            Ok(&self.client)
        } else {
            Err(BrokerError::NotLoggedIn)
        }
    }
}

impl PositionStore for MarketWatch {
    fn portfolio_value(&self, game: &GameId) -> Result<f64, BrokerError> {
        let client = self.require_session()?;
        let page = client.get_game_page(&client.endpoints().value(game))?;
        html::parse_portfolio_value(&page)
    }

    fn positions(&self, game: &GameId) -> Result<Vec<Position>, BrokerError> {
        let client = self.require_session()?;
        let page = client.get_game_page(&client.endpoints().holdings(game))?;
        let positions = html::parse_holdings(&page)?;
        debug!("{} holdings rows in {game}", positions.len());
        Ok(positions)
    }
}

impl QuoteProvider for MarketWatch {
    fn price(&self, ticker: &Ticker) -> Result<f64, BrokerError> {
        let page = self
            .client
            .get_page(&self.client.endpoints().stock_info(ticker))
            .map_err(|e| BrokerError::QuoteUnavailable(format!("{ticker}: {e}")))?;
        html::parse_last_price(&page)
            .ok_or_else(|| BrokerError::QuoteUnavailable(ticker.as_str().to_string()))
    }

    fn trading_symbol(&self, game: &GameId, ticker: &Ticker) -> Result<TradingSymbol, BrokerError> {
        let client = self.require_session()?;
        let page = client.search_trade(game, ticker)?;
        html::parse_trading_symbol(&page)
            .ok_or_else(|| BrokerError::SymbolNotFound(ticker.as_str().to_string()))
    }
}

impl OrderExecutor for MarketWatch {
    fn submit_order(
        &self,
        game: &GameId,
        symbol: &TradingSymbol,
        shares: u64,
        action: Action,
    ) -> Result<OrderReceipt, BrokerError> {
        let client = self.require_session()?;
        let line = OrderLine {
            fuid: symbol.as_str().to_string(),
            shares: shares.to_string(),
            kind: action.as_str().to_string(),
        };
        let resp = client.submit_order(game, &[line])?;
        Ok(OrderReceipt {
            success: resp.succeeded,
            message: resp.message.unwrap_or_default(),
        })
    }
}
