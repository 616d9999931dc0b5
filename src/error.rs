//! Validation errors for trade sizing and action parsing.

/// Errors returned by the pure core (no I/O involved).
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Action string outside `Buy`, `Sell`, `Short`, `Cover`.
    #[error("invalid stock action: {0:?}")]
    InvalidAction(String),

    /// Price must be finite and greater than zero.
    #[error("price must be finite and > 0, got {0}")]
    InvalidPrice(f64),

    /// Target weight is NaN or infinite.
    #[error("weight for {0} is not finite")]
    NonFiniteWeight(String),

    /// Portfolio value is NaN or infinite.
    #[error("portfolio value must be finite, got {0}")]
    NonFiniteValue(f64),

    /// The same ticker was given two target weights.
    #[error("duplicate target for {0}")]
    DuplicateTicker(String),

    /// Ticker is empty after trimming.
    #[error("ticker must not be empty")]
    EmptyTicker,
}
