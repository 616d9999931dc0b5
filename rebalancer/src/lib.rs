//! vsebook-rebalancer: three-phase portfolio rebalancer for MarketWatch VSE games.
//!
//! Reads target weights from a JSON file, logs in to the game, previews the
//! exit/adjust/entry orders needed to reach the target, and executes them
//! with an audit trail and a post-run reconciliation.

pub mod audit;
pub mod config;
pub mod error;
pub mod execution;
pub mod plan;
pub mod rebalance;
pub mod reconcile;
pub mod session;
pub mod target;

pub use rebalance::{RebalanceSummary, Rebalancer};
