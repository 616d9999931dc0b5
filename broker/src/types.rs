//! Shared broker types: order receipts and recorded calls.

use vsebook::{Action, GameId, TradingSymbol};

/// Game response to one order submission.
///
/// `success == false` is a rejection by the game (insufficient cash,
/// market closed, unknown symbol); transport failures are `BrokerError`s
/// instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderReceipt {
    pub success: bool,
    pub message: String,
}

impl OrderReceipt {
    pub fn accepted() -> Self {
        Self {
            success: true,
            message: String::new(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// An order as it reached the executor, for assertions in tests and audit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedOrder {
    pub game: GameId,
    pub trading_symbol: TradingSymbol,
    pub shares: u64,
    pub action: Action,
}
