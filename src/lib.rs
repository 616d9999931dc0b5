//! # vsebook
//!
//! Core types and trade resolution for rebalancing a virtual stock exchange
//! portfolio (MarketWatch VSE style games).
//!
//! This crate is pure: no network, no clock, no files. The broker adapters
//! live in `vsebook-broker` and the three-phase rebalancer in
//! `vsebook-rebalancer`.
//!
//! ## Features
//!
//! - **Closed action set**: [`Action`] is exactly Buy, Sell, Short, Cover
//! - **Signed shares**: positive = long, negative = short, absent = flat
//! - **Immutable snapshots**: [`PositionSnapshot`] is re-read, never patched
//! - **Truncating sizing**: whole shares, rounded toward zero
//!
//! ## Quick Start
//!
//! ```
//! use vsebook::{resolve_action, desired_shares, Action};
//!
//! // 20 shares of X @ $10 in a $1000 portfolio, target weight 0.5
//! let desired = desired_shares(0.5, 1000.0, 10.0).unwrap();
//! assert_eq!(desired, 50);
//!
//! let (action, shares) = resolve_action(20, desired);
//! assert_eq!(action, Action::Buy);
//! assert_eq!(shares, 30);
//! ```
//!
//! ## Short Positions
//!
//! Short holdings are negative. Moving from short to long is a single Cover:
//!
//! ```
//! use vsebook::{resolve_action, Action};
//!
//! assert_eq!(resolve_action(-10, 5), (Action::Cover, 15));
//! assert_eq!(resolve_action(-10, -25), (Action::Short, 15));
//! ```
//!
//! ## Snapshots
//!
//! ```
//! use vsebook::{Action, Position, PositionSnapshot, Ticker, TransactionIntent};
//!
//! let snap = PositionSnapshot::from_positions([
//!     Position::new(Ticker::new("A"), 10),
//!     Position::new(Ticker::new("B"), -5),
//! ]);
//! let next = snap.apply(&TransactionIntent::new(Ticker::new("B"), 5, Action::Cover));
//!
//! assert_eq!(snap.shares(&Ticker::new("B")), -5); // unchanged
//! assert!(!next.contains(&Ticker::new("B")));
//! ```

mod action;
mod error;
mod intent;
mod position;
pub mod resolve;
mod types;
mod weights;

// Re-export public API
pub use action::Action;
pub use error::ValidationError;
pub use intent::TransactionIntent;
pub use position::{Position, PositionSnapshot};
pub use resolve::{desired_shares, entry_action, exit_action, resolve_action};
pub use types::{GameId, Ticker, TradingSymbol};
pub use weights::TargetWeights;
