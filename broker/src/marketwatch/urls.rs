//! MarketWatch VSE endpoint templates.

use vsebook::{GameId, Ticker};

/// Default public site.
pub const DEFAULT_BASE_URL: &str = "http://www.marketwatch.com";
/// Default identity (login) host.
pub const DEFAULT_ID_URL: &str = "https://id.marketwatch.com";

/// Base hosts plus the path templates hanging off them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base_url: String,
    id_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, DEFAULT_ID_URL)
    }
}

impl Endpoints {
    /// Trailing slashes are dropped so templates can always add `/path`.
    pub fn new(base_url: &str, id_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            id_url: id_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn login(&self) -> String {
        format!("{}/auth/submitlogin.json", self.id_url)
    }

    pub fn status(&self) -> String {
        format!("{}/user/login/status", self.base_url)
    }

    pub fn profile(&self) -> String {
        format!("{}/my", self.base_url)
    }

    pub fn trade(&self, game: &GameId) -> String {
        format!("{}/game/{game}/trade?week=1", self.base_url)
    }

    pub fn submit_order(&self, game: &GameId) -> String {
        format!("{}/game/{game}/trade/submitorder?week=1", self.base_url)
    }

    pub fn holdings(&self, game: &GameId) -> String {
        format!("{}/game/{game}/portfolio/Holdings?partial=true", self.base_url)
    }

    pub fn value(&self, game: &GameId) -> String {
        format!("{}/game/{game}/portfolio/Holdings", self.base_url)
    }

    pub fn stock_info(&self, ticker: &Ticker) -> String {
        format!(
            "{}/investing/stock/{}",
            self.base_url,
            ticker.as_str().to_ascii_lowercase()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_templates() {
        let e = Endpoints::default();
        let g = GameId::new("my-game");
        assert_eq!(e.login(), "https://id.marketwatch.com/auth/submitlogin.json");
        assert_eq!(e.status(), "http://www.marketwatch.com/user/login/status");
        assert_eq!(e.profile(), "http://www.marketwatch.com/my");
        assert_eq!(e.trade(&g), "http://www.marketwatch.com/game/my-game/trade?week=1");
        assert_eq!(
            e.submit_order(&g),
            "http://www.marketwatch.com/game/my-game/trade/submitorder?week=1"
        );
        assert_eq!(
            e.holdings(&g),
            "http://www.marketwatch.com/game/my-game/portfolio/Holdings?partial=true"
        );
        assert_eq!(
            e.stock_info(&Ticker::new("AAPL")),
            "http://www.marketwatch.com/investing/stock/aapl"
        );
    }

    #[test]
    fn trailing_slash_trimmed() {
        let e = Endpoints::new("http://localhost:8080/", "http://localhost:9090//");
        assert_eq!(e.profile(), "http://localhost:8080/my");
        assert_eq!(e.login(), "http://localhost:9090/auth/submitlogin.json");
    }
}
