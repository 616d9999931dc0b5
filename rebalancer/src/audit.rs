//! JSONL audit trail logging.
//!
//! Each rebalancer run appends events to an audit.jsonl file, one JSON
//! object per line. The trail is written for operators; nothing reads it
//! back.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use vsebook::{GameId, PositionSnapshot};

use crate::error::Result;
use crate::plan::Plan;
use crate::rebalance::{RebalanceSummary, TradeEvent};

/// An audit event written to the JSONL trail.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub event: &'static str,
    pub ts: DateTime<Utc>,
    #[serde(flatten)]
    pub data: serde_json::Value,
}

/// Append-only audit logger.
pub struct AuditLog {
    writer: BufWriter<std::fs::File>,
}

impl AuditLog {
    /// Open (or create) the audit log file for appending.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Log an event with arbitrary JSON data.
    pub fn log(&mut self, event: &'static str, data: serde_json::Value) -> Result<()> {
        let entry = AuditEvent {
            event,
            ts: Utc::now(),
            data,
        };
        let json = serde_json::to_string(&entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writeln!(self.writer, "{json}")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Log a simple event with no additional data.
    pub fn log_simple(&mut self, event: &'static str) -> Result<()> {
        self.log(event, serde_json::json!({}))
    }
}

pub fn log_run_started(audit: &mut AuditLog, target_file: &str, game: &GameId) -> Result<()> {
    audit.log(
        "run_started",
        serde_json::json!({
            "target_file": target_file,
            "game": game.as_str(),
        }),
    )
}

pub fn log_positions(
    audit: &mut AuditLog,
    positions: &PositionSnapshot,
    portfolio_value: f64,
) -> Result<()> {
    let pos_data: Vec<_> = positions
        .iter()
        .map(|p| {
            serde_json::json!({
                "ticker": p.ticker.as_str(),
                "shares": p.signed_shares,
                "symbol": p.trading_symbol.as_ref().map(|s| s.as_str()),
            })
        })
        .collect();

    audit.log(
        "positions_fetched",
        serde_json::json!({
            "positions": pos_data,
            "value": portfolio_value,
        }),
    )
}

pub fn log_plan(audit: &mut AuditLog, plan: &Plan) -> Result<()> {
    let unpriced: Vec<_> = plan
        .unpriced
        .iter()
        .map(|(phase, ticker)| serde_json::json!({ "phase": phase, "ticker": ticker }))
        .collect();

    audit.log(
        "plan_computed",
        serde_json::json!({
            "orders": plan.trades,
            "unpriced": unpriced,
        }),
    )
}

/// `order_submitted` for accepted trades, `order_failed` for everything else.
pub fn log_trade(audit: &mut AuditLog, event: TradeEvent<'_>) -> Result<()> {
    match event {
        TradeEvent::Executed(trade) => audit.log(
            "order_submitted",
            serde_json::json!({
                "phase": trade.phase,
                "ticker": trade.intent.ticker,
                "action": trade.intent.action,
                "shares": trade.intent.shares,
                "symbol": trade.trading_symbol,
                "message": trade.message,
            }),
        ),
        TradeEvent::Failed(failure) => {
            let data = serde_json::to_value(failure)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            audit.log("order_failed", data)
        }
    }
}

pub fn log_run_completed(audit: &mut AuditLog, summary: &RebalanceSummary) -> Result<()> {
    audit.log(
        "run_completed",
        serde_json::json!({
            "executed": summary.executed.len(),
            "failed": summary.failures.len(),
            "final_positions": summary.final_positions.len(),
        }),
    )
}
