//! MarketWatch VSE HTTP client.

use std::time::Duration;

use log::{debug, info, warn};
use reqwest::Url;
use reqwest::blocking::Client;
use vsebook::{GameId, Ticker};

use super::types::{LoginResponse, OrderLine, OrderResponse};
use super::urls::Endpoints;
use crate::error::BrokerError;

const ORDER_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Blocking MarketWatch client. Holds the session cookies after [`login`](Self::login).
pub struct MarketWatchClient {
    client: Client,
    endpoints: Endpoints,
}

impl MarketWatchClient {
    /// Create a client with its own cookie jar.
    pub fn new(endpoints: Endpoints, timeout: Duration) -> Result<Self, BrokerError> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .map_err(|e| BrokerError::Connection(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, endpoints })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Log in and confirm the session.
    ///
    /// The identity host answers with a validation URL; visiting it sets the
    /// session cookies. Success is confirmed by the status page redirecting to
    /// the profile page.
    pub fn login(&self, username: &str, password: &str) -> Result<(), BrokerError> {
        let resp = self
            .client
            .get(self.endpoints.login())
            .query(&[("username", username), ("password", password)])
            .send()
            .map_err(|e| BrokerError::Connection(format!("login request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(BrokerError::Auth(format!("login returned {}", resp.status())));
        }

        let login: LoginResponse = resp
            .json()
            .map_err(|e| BrokerError::Auth(format!("unexpected login response: {e}")))?;

        // The confirmation hop is known to drop connections during trading
        // hours even when the session cookie was set.
        if let Err(e) = self.client.get(&login.url).send() {
            warn!("login confirmation request failed, continuing: {e}");
        }

        let status = self
            .client
            .get(self.endpoints.status())
            .send()
            .map_err(|e| BrokerError::Connection(format!("login status request failed: {e}")))?;

        if !same_page(status.url(), &self.endpoints.profile()) {
            return Err(BrokerError::Auth("invalid username/password combination".into()));
        }

        info!("Logged in to MarketWatch as {username}");
        Ok(())
    }

    /// GET a public page and return its body.
    pub fn get_page(&self, url: &str) -> Result<String, BrokerError> {
        let (_, body) = self.fetch(url)?;
        Ok(body)
    }

    /// GET a page that needs the session.
    ///
    /// An expired session redirects game pages to the login form with a 200,
    /// so a response from any other page is `NotLoggedIn`, never an empty page.
    pub fn get_game_page(&self, url: &str) -> Result<String, BrokerError> {
        let (landed, body) = self.fetch(url)?;
        require_same_page(&landed, url)?;
        Ok(body)
    }

    fn fetch(&self, url: &str) -> Result<(Url, String), BrokerError> {
        debug!("GET {url}");
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| BrokerError::Connection(format!("request to {url} failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            return Err(BrokerError::Connection(format!("{url} returned {status}")));
        }

        let landed = resp.url().clone();
        let body = resp
            .text()
            .map_err(|e| BrokerError::Connection(format!("failed to read {url}: {e}")))?;
        Ok((landed, body))
    }

    /// Run the trade page symbol search for `ticker` and return the result fragment.
    pub fn search_trade(&self, game: &GameId, ticker: &Ticker) -> Result<String, BrokerError> {
        let url = self.endpoints.trade(game);
        let resp = self
            .client
            .post(&url)
            .query(&[("search", ticker.as_str()), ("view", "grid"), ("partial", "true")])
            .send()
            .map_err(|e| BrokerError::Connection(format!("symbol search failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            return Err(BrokerError::Connection(format!("symbol search returned {status}")));
        }
        require_same_page(resp.url(), &url)?;

        resp.text()
            .map_err(|e| BrokerError::Connection(format!("failed to read search result: {e}")))
    }

    /// POST an order batch to the game.
    pub fn submit_order(
        &self,
        game: &GameId,
        lines: &[OrderLine],
    ) -> Result<OrderResponse, BrokerError> {
        let body = serde_json::to_string(lines)
            .map_err(|e| BrokerError::Order(format!("failed to encode order: {e}")))?;

        debug!("Submitting order to {game}: {body}");

        let resp = self
            .client
            .post(self.endpoints.submit_order(game))
            .header(reqwest::header::CONTENT_TYPE, ORDER_CONTENT_TYPE)
            .body(body)
            .send()
            .map_err(|e| BrokerError::Connection(format!("order request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().unwrap_or_default();
            return Err(BrokerError::Order(format!("order returned {status}: {body}")));
        }

        resp.json::<OrderResponse>()
            .map_err(|e| BrokerError::Parse(format!("failed to parse order response: {e}")))
    }
}

fn require_same_page(landed: &Url, requested: &str) -> Result<(), BrokerError> {
    if same_page(landed, requested) {
        Ok(())
    } else {
        warn!("expected {requested}, landed on {landed}");
        Err(BrokerError::NotLoggedIn)
    }
}

/// Compare host and path, ignoring scheme, port and query (the site
/// bounces between http and https).
fn same_page(actual: &Url, expected: &str) -> bool {
    match Url::parse(expected) {
        Ok(expected) => {
            actual.host_str() == expected.host_str()
                && actual.path().trim_end_matches('/') == expected.path().trim_end_matches('/')
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_page_ignores_trailing_slash() {
        let actual = Url::parse("http://www.marketwatch.com/my/").unwrap();
        assert!(same_page(&actual, "http://www.marketwatch.com/my"));
    }

    #[test]
    fn same_page_ignores_query() {
        let holdings = "http://localhost:8080/game/g/portfolio/Holdings";
        let actual = Url::parse(&format!("{holdings}?partial=true")).unwrap();
        assert!(same_page(&actual, holdings));
        assert!(require_same_page(&actual, holdings).is_ok());
    }

    #[test]
    fn redirect_elsewhere_is_not_logged_in() {
        let landed = Url::parse("http://localhost:8080/login").unwrap();
        assert!(matches!(
            require_same_page(&landed, "http://localhost:8080/game/g/portfolio/Holdings"),
            Err(BrokerError::NotLoggedIn)
        ));
    }

    #[test]
    fn same_page_rejects_other_path() {
        let actual = Url::parse("http://www.marketwatch.com/login").unwrap();
        assert!(!same_page(&actual, "http://www.marketwatch.com/my"));
    }
}
