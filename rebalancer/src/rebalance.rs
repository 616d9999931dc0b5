//! The three-phase rebalance pass against a live game.
//!
//! Portfolio value is read once and fixed for the whole pass. Positions are
//! re-read after the exit phase and after the adjust phase, so each phase
//! sizes against what the game actually holds rather than what the previous
//! phase intended. A fresh read at the end becomes the summary's final
//! positions.
//!
//! Individual orders may fail without ending the pass: a rejected order, a
//! ticker without a usable price or an unknown trading symbol is recorded in
//! [`RebalanceSummary::failures`] and the pass moves on. Two things are
//! fatal: failing to read portfolio value or positions
//! ([`Error::StateRead`]), and losing the session while submitting
//! ([`Error::OrderSubmission`]).

use std::thread;
use std::time::Duration;

use log::{debug, info, warn};
use serde::Serialize;
use vsebook::{
    Action, GameId, PositionSnapshot, TargetWeights, Ticker, TradingSymbol, TransactionIntent,
    desired_shares, entry_action, resolve_action,
};
use vsebook_broker::{BrokerError, Game, OrderExecutor, PositionStore, QuoteProvider};

use crate::error::{Error, Result};
use crate::plan::{self, Phase};

/// Why one trade was skipped or refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    /// The game answered the submission with `success == false`, or
    /// refused it with a non-session error.
    OrderRejected(String),
    /// No usable price, so the ticker could not be sized this pass.
    QuoteUnavailable(String),
    /// The game could not resolve the ticker to a trading symbol.
    SymbolNotFound(String),
    /// The intent did not move the position to its target and was not sent.
    InvalidAction(String),
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::OrderRejected(m) => write!(f, "order rejected: {m}"),
            FailureReason::QuoteUnavailable(m) => write!(f, "quote unavailable: {m}"),
            FailureReason::SymbolNotFound(m) => write!(f, "symbol not found: {m}"),
            FailureReason::InvalidAction(m) => write!(f, "invalid action: {m}"),
        }
    }
}

/// A trade that was skipped or refused. The pass continued past it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeFailure {
    pub phase: Phase,
    pub ticker: Ticker,
    /// `None` when the ticker failed before an action could be resolved.
    pub action: Option<Action>,
    pub shares: u64,
    pub reason: FailureReason,
}

/// A trade the game accepted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutedTrade {
    pub phase: Phase,
    pub intent: TransactionIntent,
    pub trading_symbol: TradingSymbol,
    pub message: String,
}

/// Progress notification for each trade, in submission order.
#[derive(Debug, Clone, Copy)]
pub enum TradeEvent<'a> {
    Executed(&'a ExecutedTrade),
    Failed(&'a TradeFailure),
}

/// Outcome of a completed pass.
#[derive(Debug, Clone)]
pub struct RebalanceSummary {
    pub portfolio_value: f64,
    pub executed: Vec<ExecutedTrade>,
    pub failures: Vec<TradeFailure>,
    pub final_positions: PositionSnapshot,
}

impl RebalanceSummary {
    /// True when every planned trade went through.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn attempted(&self) -> usize {
        self.executed.len() + self.failures.len()
    }
}

/// Runs rebalance passes against one game's collaborators.
pub struct Rebalancer<'a> {
    store: &'a dyn PositionStore,
    quotes: &'a dyn QuoteProvider,
    executor: &'a dyn OrderExecutor,
    order_interval: Duration,
}

impl<'a> Rebalancer<'a> {
    pub fn new(
        store: &'a dyn PositionStore,
        quotes: &'a dyn QuoteProvider,
        executor: &'a dyn OrderExecutor,
    ) -> Self {
        Self {
            store,
            quotes,
            executor,
            order_interval: Duration::ZERO,
        }
    }

    /// Use one object for all three collaborators.
    pub fn for_game<G: Game>(game: &'a G) -> Self {
        Self::new(game, game, game)
    }

    /// Pause between consecutive order submissions.
    pub fn with_order_interval(mut self, interval: Duration) -> Self {
        self.order_interval = interval;
        self
    }

    /// Move `game` toward `weights`.
    pub fn rebalance(&self, game: &GameId, weights: &TargetWeights) -> Result<RebalanceSummary> {
        self.rebalance_with(game, weights, &mut |_| {})
    }

    /// Like [`rebalance`](Self::rebalance), calling `on_trade` after every
    /// submission attempt or skip.
    pub fn rebalance_with(
        &self,
        game: &GameId,
        weights: &TargetWeights,
        on_trade: &mut dyn FnMut(TradeEvent<'_>),
    ) -> Result<RebalanceSummary> {
        let value = self
            .store
            .portfolio_value(game)
            .map_err(|e| state_read("portfolio value", e))?;
        if !value.is_finite() {
            return Err(Error::StateRead {
                what: "portfolio value",
                reason: format!("non-finite value {value}"),
            });
        }

        let mut pass = Pass {
            rebalancer: self,
            game,
            value,
            executed: Vec::new(),
            failures: Vec::new(),
            submitted: 0,
            on_trade,
        };

        let snapshot = self.read_positions(game)?;
        info!(
            "Rebalancing {game}: value ${value:.2}, {} held, {} targeted",
            snapshot.len(),
            weights.len()
        );

        if snapshot.is_empty() {
            debug!("No holdings; skipping exit and adjust phases");
            pass.entry(&snapshot, weights)?;
        } else {
            pass.exit(&snapshot, weights)?;
            let snapshot = self.read_positions(game)?;
            pass.adjust(&snapshot, weights)?;
            let snapshot = self.read_positions(game)?;
            pass.entry(&snapshot, weights)?;
        }

        let final_positions = self.read_positions(game)?;
        let Pass {
            executed, failures, ..
        } = pass;
        info!(
            "Rebalance of {game} done: {} executed, {} failed",
            executed.len(),
            failures.len()
        );

        Ok(RebalanceSummary {
            portfolio_value: value,
            executed,
            failures,
            final_positions,
        })
    }

    fn read_positions(&self, game: &GameId) -> Result<PositionSnapshot> {
        let rows = self
            .store
            .positions(game)
            .map_err(|e| state_read("positions", e))?;
        Ok(PositionSnapshot::from_positions(rows))
    }
}

fn state_read(what: &'static str, e: BrokerError) -> Error {
    Error::StateRead {
        what,
        reason: e.to_string(),
    }
}

/// Mutable state of one pass.
struct Pass<'r, 'a> {
    rebalancer: &'r Rebalancer<'a>,
    game: &'r GameId,
    value: f64,
    executed: Vec<ExecutedTrade>,
    failures: Vec<TradeFailure>,
    submitted: usize,
    on_trade: &'r mut dyn FnMut(TradeEvent<'_>),
}

impl Pass<'_, '_> {
    fn exit(&mut self, snapshot: &PositionSnapshot, weights: &TargetWeights) -> Result<()> {
        for intent in plan::exit_intents(snapshot, weights) {
            let symbol = snapshot.trading_symbol(&intent.ticker).cloned();
            self.submit(Phase::Exit, intent, 0, snapshot, symbol)?;
        }
        Ok(())
    }

    fn adjust(&mut self, snapshot: &PositionSnapshot, weights: &TargetWeights) -> Result<()> {
        for (ticker, weight) in plan::adjust_targets(snapshot, weights) {
            let Some(desired) = self.size(Phase::Adjust, ticker, weight) else {
                continue;
            };
            let current = snapshot.shares(ticker);
            let (action, shares) = resolve_action(current, desired);
            if shares == 0 {
                debug!("{ticker} already at {current} shares");
                continue;
            }
            let intent = TransactionIntent::new(ticker.clone(), shares, action);
            let symbol = snapshot.trading_symbol(ticker).cloned();
            self.submit(Phase::Adjust, intent, desired, snapshot, symbol)?;
        }
        Ok(())
    }

    fn entry(&mut self, snapshot: &PositionSnapshot, weights: &TargetWeights) -> Result<()> {
        for (ticker, weight) in plan::entry_targets(snapshot, weights) {
            let Some(desired) = self.size(Phase::Entry, ticker, weight) else {
                continue;
            };
            let Some((action, shares)) = entry_action(desired) else {
                debug!("{ticker} target sizes to zero shares");
                continue;
            };
            let intent = TransactionIntent::new(ticker.clone(), shares, action);
            self.submit(Phase::Entry, intent, desired, snapshot, None)?;
        }
        Ok(())
    }

    /// Desired signed shares for `ticker`, or `None` after recording why it
    /// cannot be sized.
    fn size(&mut self, phase: Phase, ticker: &Ticker, weight: f64) -> Option<i64> {
        let quote = self.rebalancer.quotes.price(ticker);
        let sized = quote
            .map_err(|e| e.to_string())
            .and_then(|price| desired_shares(weight, self.value, price).map_err(|e| e.to_string()));
        match sized {
            Ok(desired) => Some(desired),
            Err(msg) => {
                self.fail(phase, ticker, None, 0, FailureReason::QuoteUnavailable(msg));
                None
            }
        }
    }

    fn submit(
        &mut self,
        phase: Phase,
        intent: TransactionIntent,
        desired: i64,
        snapshot: &PositionSnapshot,
        known_symbol: Option<TradingSymbol>,
    ) -> Result<()> {
        let current = snapshot.shares(&intent.ticker);
        if let Err(msg) = plan::check_intent(&intent, current, desired) {
            self.fail_intent(phase, &intent, FailureReason::InvalidAction(msg));
            return Ok(());
        }

        let symbol = match known_symbol.filter(|s| !s.is_empty()) {
            Some(s) => s,
            None => match self.lookup_symbol(&intent.ticker) {
                Ok(s) if !s.is_empty() => s,
                Ok(_) => {
                    let reason = FailureReason::SymbolNotFound(intent.ticker.to_string());
                    self.fail_intent(phase, &intent, reason);
                    return Ok(());
                }
                Err(e) if e.is_session_lost() => {
                    return Err(Error::OrderSubmission(format!(
                        "symbol lookup for {}: {e}",
                        intent.ticker
                    )));
                }
                Err(e) => {
                    self.fail_intent(phase, &intent, FailureReason::SymbolNotFound(e.to_string()));
                    return Ok(());
                }
            },
        };

        self.pace();
        info!("[{phase}] {intent} ({symbol})");
        let result = self.rebalancer.executor.submit_order(
            self.game,
            &symbol,
            intent.shares,
            intent.action,
        );
        self.submitted += 1;

        match result {
            Ok(receipt) if receipt.success => {
                let trade = ExecutedTrade {
                    phase,
                    intent,
                    trading_symbol: symbol,
                    message: receipt.message,
                };
                (self.on_trade)(TradeEvent::Executed(&trade));
                self.executed.push(trade);
                Ok(())
            }
            Ok(receipt) => {
                self.fail_intent(phase, &intent, FailureReason::OrderRejected(receipt.message));
                Ok(())
            }
            Err(e) if e.is_session_lost() => Err(Error::OrderSubmission(format!("{intent}: {e}"))),
            Err(e) => {
                self.fail_intent(phase, &intent, FailureReason::OrderRejected(e.to_string()));
                Ok(())
            }
        }
    }

    fn lookup_symbol(&self, ticker: &Ticker) -> std::result::Result<TradingSymbol, BrokerError> {
        self.rebalancer.quotes.trading_symbol(self.game, ticker)
    }

    /// Sleep between submissions, never before the first.
    fn pace(&self) {
        let interval = self.rebalancer.order_interval;
        if self.submitted > 0 && !interval.is_zero() {
            thread::sleep(interval);
        }
    }

    fn fail_intent(&mut self, phase: Phase, intent: &TransactionIntent, reason: FailureReason) {
        self.fail(phase, &intent.ticker, Some(intent.action), intent.shares, reason);
    }

    fn fail(
        &mut self,
        phase: Phase,
        ticker: &Ticker,
        action: Option<Action>,
        shares: u64,
        reason: FailureReason,
    ) {
        warn!("[{phase}] {ticker} skipped: {reason}");
        let failure = TradeFailure {
            phase,
            ticker: ticker.clone(),
            action,
            shares,
            reason,
        };
        (self.on_trade)(TradeEvent::Failed(&failure));
        self.failures.push(failure);
    }
}
