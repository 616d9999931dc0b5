//! Tests for MarketWatch page parsing and the HTTP flow, against a local
//! mock server. No live connection needed.

#[cfg(feature = "marketwatch")]
mod marketwatch_tests {
    use std::time::Duration;

    use httpmock::prelude::*;
    use serde_json::json;
    use vsebook::{Action, GameId, Ticker, TradingSymbol};
    use vsebook_broker::marketwatch::MarketWatch;
    use vsebook_broker::marketwatch::html;
    use vsebook_broker::marketwatch::urls::Endpoints;
    use vsebook_broker::{BrokerError, OrderExecutor, PositionStore, QuoteProvider};
    use zeroize::Zeroizing;

    const HOLDINGS: &str = r#"
        <div class="element element--holdings">
          <table class="table highlight">
            <thead><tr><th>Symbol</th><th>Qty</th></tr></thead>
            <tbody>
              <tr class="table__row" data-ticker="AAPL" data-symbol="STOCK-XNAS-AAPL" data-shares="10" data-type="Buy">
                <td>AAPL</td><td>10</td>
              </tr>
              <tr class="table__row" data-ticker="TSLA" data-symbol="STOCK-XNAS-TSLA" data-shares="1,200" data-type="Short">
                <td>TSLA</td><td>1,200</td>
              </tr>
            </tbody>
          </table>
        </div>"#;

    const VALUE_PAGE: &str = r#"
        <header><span class="data">ignored</span></header>
        <ul class="list list--kv list--col50 performance">
          <li class="kv__item"><small class="kv__label">Net Worth</small>
            <span class="kv__value kv__primary data">$1,034,567.89</span></li>
          <li class="kv__item"><span class="data">$12.00</span></li>
        </ul>"#;

    const SEARCH_RESULT: &str = r#"
        <div class="search__results">
          <div class="chip" data-symbol="STOCK-XNYS-IBM" data-name="IBM">IBM</div>
          <div class="chip" data-symbol="STOCK-XNAS-IBMX">IBMX</div>
        </div>"#;

    const STOCK_PAGE: &str = r#"
        <div class="intraday__data">
          <p class="data bgLast">1,045.25</p>
        </div>"#;

    fn endpoints(server: &MockServer) -> Endpoints {
        Endpoints::new(&server.base_url(), &server.base_url())
    }

    fn account(server: &MockServer) -> MarketWatch {
        MarketWatch::with_endpoints(
            "trader@example.com",
            Zeroizing::new("hunter2".to_string()),
            endpoints(server),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    /// Mount the login handshake; `landing` is where the status page redirects.
    fn mount_login(server: &MockServer, landing: &str) {
        let validate = server.url("/auth/validate");
        server.mock(|when, then| {
            when.method(GET)
                .path("/auth/submitlogin.json")
                .query_param("username", "trader@example.com")
                .query_param("password", "hunter2");
            then.status(200).json_body(json!({ "url": validate }));
        });
        server.mock(|when, then| {
            when.method(GET).path("/auth/validate");
            then.status(200).body("ok");
        });
        let location = server.url(landing);
        server.mock(|when, then| {
            when.method(GET).path("/user/login/status");
            then.status(302).header("Location", location.as_str());
        });
        server.mock(|when, then| {
            when.method(GET).path(landing);
            then.status(200).body("<html></html>");
        });
    }

    fn connected(server: &MockServer) -> MarketWatch {
        mount_login(server, "/my");
        let mut mw = account(server);
        mw.connect().unwrap();
        mw
    }

    // ========================================================================
    // Page parsing
    // ========================================================================

    #[test]
    fn holdings_rows_signed_by_type() {
        let positions = html::parse_holdings(HOLDINGS).unwrap();
        assert_eq!(positions.len(), 2);

        assert_eq!(positions[0].ticker, Ticker::new("AAPL"));
        assert_eq!(positions[0].signed_shares, 10);
        assert_eq!(
            positions[0].trading_symbol,
            Some(TradingSymbol::new("STOCK-XNAS-AAPL"))
        );

        assert_eq!(positions[1].ticker, Ticker::new("TSLA"));
        assert_eq!(positions[1].signed_shares, -1200);
    }

    #[test]
    fn holdings_without_table_is_flat() {
        let positions = html::parse_holdings("<div>You have no holdings.</div>").unwrap();
        assert!(positions.is_empty());
    }

    #[test]
    fn holdings_bad_share_count_is_error() {
        let page = r#"<table class="highlight"><tr data-ticker="X" data-shares="lots"></tr></table>"#;
        assert!(matches!(
            html::parse_holdings(page),
            Err(BrokerError::Parse(_))
        ));
    }

    #[test]
    fn portfolio_value_scoped_to_performance_list() {
        let value = html::parse_portfolio_value(VALUE_PAGE).unwrap();
        assert!((value - 1_034_567.89).abs() < 1e-6);
    }

    #[test]
    fn portfolio_value_missing_is_error() {
        assert!(html::parse_portfolio_value("<ul class=\"other\"></ul>").is_err());
    }

    #[test]
    fn trading_symbol_first_chip() {
        assert_eq!(
            html::parse_trading_symbol(SEARCH_RESULT),
            Some(TradingSymbol::new("STOCK-XNYS-IBM"))
        );
        assert_eq!(html::parse_trading_symbol("<div>No results</div>"), None);
    }

    #[test]
    fn last_price() {
        assert_eq!(html::parse_last_price(STOCK_PAGE), Some(1045.25));
        assert_eq!(html::parse_last_price("<p class=\"data\">1.0</p>"), None);
    }

    // ========================================================================
    // HTTP flow
    // ========================================================================

    #[test]
    fn login_succeeds_when_status_lands_on_profile() {
        let server = MockServer::start();
        let mw = connected(&server);
        assert!(mw.is_connected());
    }

    #[test]
    fn login_rejected_when_status_lands_elsewhere() {
        let server = MockServer::start();
        mount_login(&server, "/login");
        let mut mw = account(&server);
        let err = mw.connect().unwrap_err();
        assert!(matches!(err, BrokerError::Auth(_)), "got {err:?}");
        assert!(!mw.is_connected());
    }

    #[test]
    fn game_pages_require_login() {
        let server = MockServer::start();
        let mw = account(&server);
        let game = GameId::new("g");
        assert!(matches!(
            mw.positions(&game),
            Err(BrokerError::NotLoggedIn)
        ));
        assert!(matches!(
            mw.portfolio_value(&game),
            Err(BrokerError::NotLoggedIn)
        ));
        assert!(
            mw.submit_order(&game, &TradingSymbol::new("S"), 1, Action::Buy)
                .unwrap_err()
                .is_session_lost()
        );
    }

    #[test]
    fn positions_fetched_from_partial_holdings() {
        let server = MockServer::start();
        let holdings = server.mock(|when, then| {
            when.method(GET)
                .path("/game/spring-cup/portfolio/Holdings")
                .query_param("partial", "true");
            then.status(200).body(HOLDINGS);
        });
        let mw = connected(&server);

        let positions = mw.positions(&GameId::new("spring-cup")).unwrap();
        assert_eq!(positions.len(), 2);
        holdings.assert();
    }

    #[test]
    fn value_fetched_from_holdings_page() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/game/spring-cup/portfolio/Holdings");
            then.status(200).body(VALUE_PAGE);
        });
        let mw = connected(&server);

        let value = mw.portfolio_value(&GameId::new("spring-cup")).unwrap();
        assert!((value - 1_034_567.89).abs() < 1e-6);
    }

    #[test]
    fn server_error_is_connection_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/game/g/portfolio/Holdings");
            then.status(503);
        });
        let mw = connected(&server);

        let err = mw.positions(&GameId::new("g")).unwrap_err();
        assert!(err.is_session_lost(), "got {err:?}");
    }

    /// Game pages bounce to the login form once the session cookie expires.
    fn expire_session(server: &MockServer, path: &str) {
        let login = server.url("/login");
        server.mock(|when, then| {
            when.path(path);
            then.status(302).header("Location", login.as_str());
        });
        server.mock(|when, then| {
            when.method(GET).path("/login");
            then.status(200).body(r#"<form id="login">Sign in</form>"#);
        });
    }

    #[test]
    fn expired_session_is_not_an_empty_portfolio() {
        let server = MockServer::start();
        expire_session(&server, "/game/g/portfolio/Holdings");
        let mw = connected(&server);

        let err = mw.positions(&GameId::new("g")).unwrap_err();
        assert!(matches!(err, BrokerError::NotLoggedIn), "got {err:?}");
        assert!(err.is_session_lost());
    }

    #[test]
    fn expired_session_fails_value_read() {
        let server = MockServer::start();
        expire_session(&server, "/game/g/portfolio/Holdings");
        let mw = connected(&server);

        assert!(matches!(
            mw.portfolio_value(&GameId::new("g")),
            Err(BrokerError::NotLoggedIn)
        ));
    }

    #[test]
    fn expired_session_fails_symbol_search() {
        let server = MockServer::start();
        expire_session(&server, "/game/g/trade");
        let mw = connected(&server);

        let err = mw
            .trading_symbol(&GameId::new("g"), &Ticker::new("IBM"))
            .unwrap_err();
        assert!(err.is_session_lost(), "got {err:?}");
    }

    #[test]
    fn empty_holdings_page_is_flat() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/game/g/portfolio/Holdings");
            then.status(200).body("<div>You have no holdings.</div>");
        });
        let mw = connected(&server);

        assert!(mw.positions(&GameId::new("g")).unwrap().is_empty());
    }

    #[test]
    fn price_from_public_stock_page() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/investing/stock/ibm");
            then.status(200).body(STOCK_PAGE);
        });
        server.mock(|when, then| {
            when.method(GET).path("/investing/stock/nope");
            then.status(404);
        });
        let mw = account(&server);

        assert_eq!(mw.price(&Ticker::new("IBM")).unwrap(), 1045.25);
        assert!(matches!(
            mw.price(&Ticker::new("NOPE")),
            Err(BrokerError::QuoteUnavailable(_))
        ));
    }

    #[test]
    fn trading_symbol_via_trade_search() {
        let server = MockServer::start();
        let search = server.mock(|when, then| {
            when.method(POST)
                .path("/game/g/trade")
                .query_param("week", "1")
                .query_param("search", "IBM")
                .query_param("view", "grid")
                .query_param("partial", "true");
            then.status(200).body(SEARCH_RESULT);
        });
        let mw = connected(&server);

        let symbol = mw.trading_symbol(&GameId::new("g"), &Ticker::new("IBM")).unwrap();
        assert_eq!(symbol, TradingSymbol::new("STOCK-XNYS-IBM"));
        search.assert();
    }

    #[test]
    fn submit_order_posts_json_line() {
        let server = MockServer::start();
        let order = server.mock(|when, then| {
            when.method(POST)
                .path("/game/g/trade/submitorder")
                .query_param("week", "1")
                .header("content-type", "application/json; charset=utf-8")
                .json_body(json!([
                    { "Fuid": "STOCK-XNYS-IBM", "Shares": "15", "Type": "Cover" }
                ]));
            then.status(200).json_body(json!({ "succeeded": true, "message": "" }));
        });
        let mw = connected(&server);

        let receipt = mw
            .submit_order(
                &GameId::new("g"),
                &TradingSymbol::new("STOCK-XNYS-IBM"),
                15,
                Action::Cover,
            )
            .unwrap();
        assert!(receipt.success);
        order.assert();
    }

    #[test]
    fn submit_order_game_rejection_is_receipt() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/game/g/trade/submitorder");
            then.status(200)
                .json_body(json!({ "succeeded": false, "message": "Insufficient funds" }));
        });
        let mw = connected(&server);

        let receipt = mw
            .submit_order(&GameId::new("g"), &TradingSymbol::new("S"), 1, Action::Buy)
            .unwrap();
        assert!(!receipt.success);
        assert_eq!(receipt.message, "Insufficient funds");
    }
}
