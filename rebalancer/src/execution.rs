//! Execution orchestrator: preview → confirm → rebalance → reconcile.
//!
//! This is the workflow behind each CLI command. The `*_on` variants take an
//! already connected game so they can run against a mock.

use std::collections::BTreeSet;

use log::{info, warn};
use rustc_hash::FxHashMap;
use vsebook::{Action, GameId, PositionSnapshot, TargetWeights, Ticker};
use vsebook_broker::{Game, OrderExecutor, OrderReceipt, PositionStore, QuoteProvider};

use crate::audit::{self, AuditLog};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::plan::{self, Plan};
use crate::rebalance::{RebalanceSummary, Rebalancer, TradeEvent};
use crate::reconcile;
use crate::session;
use crate::target::TargetSpec;

/// Options for a rebalance run.
pub struct RunOptions {
    pub dry_run: bool,
    pub force: bool,
    pub target_file: String,
}

/// How a `run` ended, short of a fatal error.
#[derive(Debug)]
pub enum RunOutcome {
    /// The portfolio already matches the target.
    NothingToDo,
    DryRun,
    /// The operator answered no at the prompt.
    Declined,
    Completed(RebalanceSummary),
}

impl RunOutcome {
    /// Trades that were skipped or refused during the pass.
    pub fn failures(&self) -> usize {
        match self {
            RunOutcome::Completed(summary) => summary.failures.len(),
            _ => 0,
        }
    }
}

/// A manual single order from the command line.
pub struct OrderRequest {
    pub action: String,
    pub ticker: String,
    pub shares: u64,
    pub force: bool,
}

/// Execute a full rebalance run.
pub fn run(config: &Config, target: &TargetSpec, opts: &RunOptions) -> Result<RunOutcome> {
    let game = session::connect(config)?;
    let mut audit = AuditLog::open(&config.audit_path())?;
    run_on(&game, config, target, opts, &mut audit)
}

/// Execute a rebalance run against a connected game.
pub fn run_on<G: Game>(
    game: &G,
    config: &Config,
    target: &TargetSpec,
    opts: &RunOptions,
    audit: &mut AuditLog,
) -> Result<RunOutcome> {
    let game_id = config.game_id();
    let weights = target.weights()?;
    audit::log_run_started(audit, &opts.target_file, &game_id)?;

    // 1. Current state
    let value = read_value(game, &game_id)?;
    let snapshot = read_snapshot(game, &game_id)?;
    audit::log_positions(audit, &snapshot, value)?;

    println!("Game {game_id}: ${value:.2} portfolio value");
    display_positions(&snapshot);

    // 2. Offline plan
    let prices = fetch_prices(game, weights.tickers());
    let plan = plan::preview(&snapshot, &weights, value, &prices);
    audit::log_plan(audit, &plan)?;

    if plan.is_empty() {
        display_unpriced(&plan);
        println!("\nNo rebalancing needed: portfolio matches target.");
        audit.log_simple("no_rebalance_needed")?;
        return Ok(RunOutcome::NothingToDo);
    }

    display_plan(&plan);
    enforce_max_orders_per_run(plan.len(), config.execution.max_orders_per_run)?;

    if opts.dry_run {
        println!("\n[DRY RUN] No orders submitted.");
        return Ok(RunOutcome::DryRun);
    }

    // 3. Confirm
    if !opts.force {
        let approved = confirm("Execute?")?;
        audit.log("user_confirmed", serde_json::json!({ "approved": approved }))?;
        if !approved {
            println!("Aborted.");
            return Ok(RunOutcome::Declined);
        }
    }

    // 4. Live pass
    let rebalancer = Rebalancer::for_game(game).with_order_interval(config.order_interval());
    let mut audit_error = None;
    let result = rebalancer.rebalance_with(&game_id, &weights, &mut |event| {
        print_event(event);
        if audit_error.is_none() {
            audit_error = audit::log_trade(audit, event).err();
        }
    });
    if let Some(e) = audit_error {
        warn!("Audit trail is missing trade events: {e}");
    }

    let summary = match result {
        Ok(summary) => summary,
        Err(e) => {
            audit.log("run_aborted", serde_json::json!({ "error": e.to_string() }))?;
            return Err(e);
        }
    };

    audit::log_run_completed(audit, &summary)?;
    println!(
        "\n{} executed, {} failed. Audit logged to {}",
        summary.executed.len(),
        summary.failures.len(),
        config.audit_path().display()
    );
    for failure in &summary.failures {
        println!("  {} {}: {}", failure.phase, failure.ticker, failure.reason);
    }

    // 5. Reconcile
    info!("Running post-execution reconciliation...");
    let tickers = collect_all_tickers(&summary.final_positions, &weights);
    let final_prices = fetch_prices(game, &tickers);
    let report = reconcile::reconcile(
        &summary.final_positions,
        &weights,
        &final_prices,
        summary.portfolio_value,
    );
    print!("\n{report}");

    Ok(RunOutcome::Completed(summary))
}

/// Show current game positions.
pub fn show_positions(config: &Config) -> Result<()> {
    let game = session::connect(config)?;
    let game_id = config.game_id();
    let value = read_value(&game, &game_id)?;
    let snapshot = read_snapshot(&game, &game_id)?;

    println!("Game {game_id}: ${value:.2} portfolio value\n");
    display_positions(&snapshot);
    Ok(())
}

/// Check that the login works and the game is readable.
pub fn check_status(config: &Config) -> Result<()> {
    print!(
        "Logging in to {} as {}... ",
        config.endpoints.base_url, config.session.username
    );

    let game = session::connect(config)?;
    println!("OK");

    let game_id = config.game_id();
    let value = read_value(&game, &game_id)?;
    println!("Game {game_id}: ${value:.2} portfolio value");
    Ok(())
}

/// Compare current positions against a target without trading.
pub fn run_reconcile(config: &Config, target: &TargetSpec) -> Result<()> {
    let game = session::connect(config)?;
    let report = reconcile_on(&game, &config.game_id(), &target.weights()?)?;
    print!("{report}");
    Ok(())
}

pub fn reconcile_on<G: Game>(
    game: &G,
    game_id: &GameId,
    weights: &TargetWeights,
) -> Result<reconcile::ReconcileReport> {
    let value = read_value(game, game_id)?;
    let snapshot = read_snapshot(game, game_id)?;
    let prices = fetch_prices(game, &collect_all_tickers(&snapshot, weights));
    Ok(reconcile::reconcile(&snapshot, weights, &prices, value))
}

/// Submit one manual order.
///
/// The action is parsed before connecting, so a typo never reaches the game.
pub fn place_order(config: &Config, req: &OrderRequest) -> Result<OrderReceipt> {
    let action: Action = req.action.parse()?;
    let ticker = Ticker::try_new(&req.ticker)?;
    if req.shares == 0 {
        return Err(Error::InvalidOrder("share count must be positive".into()));
    }

    let game = session::connect(config)?;
    let mut audit = AuditLog::open(&config.audit_path())?;
    place_order_on(
        &game,
        &config.game_id(),
        action,
        &ticker,
        req.shares,
        req.force,
        &mut audit,
    )
}

pub fn place_order_on<G: Game>(
    game: &G,
    game_id: &GameId,
    action: Action,
    ticker: &Ticker,
    shares: u64,
    force: bool,
    audit: &mut AuditLog,
) -> Result<OrderReceipt> {
    let symbol = game.trading_symbol(game_id, ticker).map_err(|e| {
        if e.is_session_lost() {
            Error::OrderSubmission(e.to_string())
        } else {
            Error::InvalidOrder(format!("no trading symbol for {ticker}: {e}"))
        }
    })?;

    println!("{action} {shares} {ticker} ({symbol}) in {game_id}");
    if !force && !confirm("Submit?")? {
        println!("Aborted.");
        return Err(Error::Aborted("order not submitted".into()));
    }

    let receipt = game
        .submit_order(game_id, &symbol, shares, action)
        .map_err(|e| Error::OrderSubmission(e.to_string()))?;

    let data = serde_json::json!({
        "phase": "manual",
        "ticker": ticker,
        "action": action,
        "shares": shares,
        "symbol": symbol,
        "message": receipt.message,
    });
    if receipt.success {
        println!("Accepted.");
        audit.log("order_submitted", data)?;
    } else {
        println!("Rejected: {}", receipt.message);
        audit.log("order_failed", data)?;
    }
    Ok(receipt)
}

/// Refuse plans larger than the configured per-run cap.
pub fn enforce_max_orders_per_run(planned: usize, max: usize) -> Result<()> {
    if planned > max {
        return Err(Error::TooManyOrders { planned, max });
    }
    Ok(())
}

// === Helpers ===

/// Held and targeted tickers, sorted, without duplicates.
pub fn collect_all_tickers(positions: &PositionSnapshot, weights: &TargetWeights) -> Vec<Ticker> {
    positions
        .tickers()
        .chain(weights.tickers())
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Prices for `tickers`; lookups that fail are logged and left out.
pub fn fetch_prices<'t, Q: QuoteProvider + ?Sized>(
    quotes: &Q,
    tickers: impl IntoIterator<Item = &'t Ticker>,
) -> FxHashMap<Ticker, f64> {
    let mut prices = FxHashMap::default();
    for ticker in tickers {
        match quotes.price(ticker) {
            Ok(p) => {
                prices.insert(ticker.clone(), p);
            }
            Err(e) => warn!("No price for {ticker}: {e}"),
        }
    }
    prices
}

fn read_value<S: PositionStore + ?Sized>(store: &S, game_id: &GameId) -> Result<f64> {
    store
        .portfolio_value(game_id)
        .map_err(|e| Error::StateRead {
            what: "portfolio value",
            reason: e.to_string(),
        })
}

fn read_snapshot<S: PositionStore + ?Sized>(
    store: &S,
    game_id: &GameId,
) -> Result<PositionSnapshot> {
    let rows = store.positions(game_id).map_err(|e| Error::StateRead {
        what: "positions",
        reason: e.to_string(),
    })?;
    Ok(PositionSnapshot::from_positions(rows))
}

fn confirm(prompt: &str) -> Result<bool> {
    let approved = dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?;
    Ok(approved)
}

fn print_event(event: TradeEvent<'_>) {
    match event {
        TradeEvent::Executed(trade) => {
            println!("  [{}] {} ... OK", trade.phase, trade.intent);
        }
        TradeEvent::Failed(failure) => match failure.action {
            Some(action) => println!(
                "  [{}] {} {} {} ... FAILED ({})",
                failure.phase, action, failure.shares, failure.ticker, failure.reason
            ),
            None => println!(
                "  [{}] {} ... SKIPPED ({})",
                failure.phase, failure.ticker, failure.reason
            ),
        },
    }
}

fn display_positions(positions: &PositionSnapshot) {
    if positions.is_empty() {
        println!("No positions.");
        return;
    }

    println!("CURRENT PORTFOLIO:");
    for pos in positions.iter() {
        let side = if pos.is_short() { "short" } else { "long" };
        println!(
            "  {:8} {:>5} {:>8}   {}",
            pos.ticker,
            side,
            pos.signed_shares.unsigned_abs(),
            pos.trading_symbol.as_ref().map(|s| s.as_str()).unwrap_or("-"),
        );
    }
}

fn display_plan(plan: &Plan) {
    println!("\nREBALANCE ORDERS:");
    println!(
        "  {:>3}  {:7} {:6} {:8} {:>8} {:>10} {:>12}",
        "#", "Phase", "Action", "Ticker", "Shares", "Price", "Notional"
    );

    for (i, trade) in plan.trades.iter().enumerate() {
        let price = trade
            .price
            .map(|p| format!("${p:.2}"))
            .unwrap_or_else(|| "-".into());
        let notional = trade
            .notional()
            .map(|n| format!("${n:.2}"))
            .unwrap_or_else(|| "-".into());
        println!(
            "  {:>3}  {:7} {:6} {:8} {:>8} {:>10} {:>12}",
            i + 1,
            trade.phase,
            trade.intent.action,
            trade.intent.ticker,
            trade.intent.shares,
            price,
            notional,
        );
    }
    display_unpriced(plan);
}

fn display_unpriced(plan: &Plan) {
    for (phase, ticker) in &plan.unpriced {
        println!("  {phase}: {ticker} skipped, no usable price");
    }
}
