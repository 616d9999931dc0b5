//! Broker error types.

/// Errors that can occur while talking to a game.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("not logged in")]
    NotLoggedIn,

    #[error("quote unavailable for {0}")]
    QuoteUnavailable(String),

    #[error("trading symbol not found for {0}")]
    SymbolNotFound(String),

    #[error("order error: {0}")]
    Order(String),

    #[error("failed to parse response: {0}")]
    Parse(String),

    #[error("{0}")]
    Other(String),
}

impl BrokerError {
    /// True when the session or transport is gone, so every further call
    /// to the same game would fail the same way.
    pub fn is_session_lost(&self) -> bool {
        matches!(
            self,
            BrokerError::Connection(_) | BrokerError::Auth(_) | BrokerError::NotLoggedIn
        )
    }
}
