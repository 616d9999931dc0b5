//! Post-execution reconciliation: compare actual positions vs target.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;
use serde::Serialize;
use vsebook::{PositionSnapshot, TargetWeights, Ticker};

/// Reconciliation report comparing actual vs target.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub entries: Vec<ReconcileEntry>,
    pub tracking_error_pct: f64,
}

/// One ticker's reconciliation entry.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileEntry {
    pub ticker: Ticker,
    pub target_weight: f64,
    pub actual_weight: f64,
    pub diff_weight: f64,
    pub target_shares: i64,
    pub actual_shares: i64,
    pub diff_shares: i64,
    /// False when no price was available; weights and target shares read 0.
    pub priced: bool,
}

/// Compare actual positions against targets.
///
/// Covers the union of held and targeted tickers. Tracking error is the
/// root-mean-square weight difference, in percent.
pub fn reconcile(
    actual: &PositionSnapshot,
    targets: &TargetWeights,
    prices: &FxHashMap<Ticker, f64>,
    portfolio_value: f64,
) -> ReconcileReport {
    let all: BTreeSet<&Ticker> = targets.tickers().chain(actual.tickers()).collect();

    let mut entries = Vec::with_capacity(all.len());
    let mut sum_sq_diff = 0.0_f64;

    for ticker in all {
        let price = prices.get(ticker).copied().filter(|p| p.is_finite() && *p > 0.0);
        let target_weight = targets.get(ticker).unwrap_or(0.0);
        let actual_shares = actual.shares(ticker);

        let actual_weight = match price {
            Some(p) if portfolio_value > 0.0 => actual_shares as f64 * p / portfolio_value,
            _ => 0.0,
        };
        let target_shares = price
            .and_then(|p| vsebook::desired_shares(target_weight, portfolio_value, p).ok())
            .unwrap_or(0);

        let diff_weight = actual_weight - target_weight;
        sum_sq_diff += diff_weight * diff_weight;

        entries.push(ReconcileEntry {
            ticker: ticker.clone(),
            target_weight,
            actual_weight,
            diff_weight,
            target_shares,
            actual_shares,
            diff_shares: actual_shares.saturating_sub(target_shares),
            priced: price.is_some(),
        });
    }

    let tracking_error_pct = (sum_sq_diff / entries.len().max(1) as f64).sqrt() * 100.0;

    ReconcileReport {
        entries,
        tracking_error_pct,
    }
}

impl ReconcileReport {
    /// Entries whose share count differs from target.
    pub fn off_target(&self) -> impl Iterator<Item = &ReconcileEntry> {
        self.entries.iter().filter(|e| e.diff_shares != 0)
    }
}

impl std::fmt::Display for ReconcileReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "RECONCILIATION:")?;
        writeln!(
            f,
            "  {:8} {:>10} {:>10} {:>10} {:>10} {:>10}",
            "Ticker", "Target%", "Actual%", "Diff%", "TargetQty", "ActualQty"
        )?;
        for e in &self.entries {
            write!(
                f,
                "  {:8} {:>9.2}% {:>9.2}% {:>+9.2}% {:>10} {:>10}",
                e.ticker,
                e.target_weight * 100.0,
                e.actual_weight * 100.0,
                e.diff_weight * 100.0,
                e.target_shares,
                e.actual_shares,
            )?;
            if !e.priced {
                write!(f, "   (no price)")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "\n  Tracking error: {:.3}%", self.tracking_error_pct)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vsebook::Position;

    fn aapl() -> Ticker {
        Ticker::new("AAPL")
    }
    fn msft() -> Ticker {
        Ticker::new("MSFT")
    }

    fn prices(pairs: &[(Ticker, f64)]) -> FxHashMap<Ticker, f64> {
        pairs.iter().cloned().collect()
    }

    #[test]
    fn perfect_match() {
        let positions: PositionSnapshot = [Position::new(aapl(), 2702)].into_iter().collect();
        let targets = TargetWeights::new([(aapl(), 0.5)]).unwrap();
        let report = reconcile(&positions, &targets, &prices(&[(aapl(), 185.0)]), 1_000_000.0);

        assert!(report.tracking_error_pct < 1.0);
        assert_eq!(report.entries[0].target_shares, 2702);
        assert_eq!(report.off_target().count(), 0);
    }

    #[test]
    fn missing_position() {
        let targets = TargetWeights::new([(aapl(), 0.5)]).unwrap();
        let report = reconcile(
            &PositionSnapshot::empty(),
            &targets,
            &prices(&[(aapl(), 185.0)]),
            1_000_000.0,
        );
        assert!(report.tracking_error_pct > 1.0);
        assert_eq!(report.entries[0].actual_shares, 0);
        assert_eq!(report.entries[0].diff_shares, -2702);
    }

    #[test]
    fn extra_position() {
        let positions: PositionSnapshot = [Position::new(aapl(), 2702), Position::new(msft(), 100)]
            .into_iter()
            .collect();
        let targets = TargetWeights::new([(aapl(), 0.5)]).unwrap();
        let report = reconcile(
            &positions,
            &targets,
            &prices(&[(aapl(), 185.0), (msft(), 410.0)]),
            1_000_000.0,
        );

        let msft_entry = report.entries.iter().find(|e| e.ticker == msft()).unwrap();
        assert_eq!(msft_entry.target_weight, 0.0);
        assert_eq!(msft_entry.actual_shares, 100);
        assert!((msft_entry.actual_weight - 0.041).abs() < 1e-9);
    }

    #[test]
    fn short_position_weight_is_negative() {
        let positions: PositionSnapshot = [Position::new(aapl(), -100)].into_iter().collect();
        let targets = TargetWeights::new([(aapl(), -0.1)]).unwrap();
        let report = reconcile(&positions, &targets, &prices(&[(aapl(), 100.0)]), 100_000.0);
        let e = &report.entries[0];
        assert!((e.actual_weight + 0.1).abs() < 1e-12);
        assert_eq!(e.target_shares, -100);
        assert_eq!(e.diff_shares, 0);
    }

    #[test]
    fn unpriced_ticker_flagged() {
        let targets = TargetWeights::new([(aapl(), 0.5)]).unwrap();
        let report = reconcile(
            &PositionSnapshot::empty(),
            &targets,
            &FxHashMap::default(),
            1000.0,
        );
        assert!(!report.entries[0].priced);
        assert!(format!("{report}").contains("(no price)"));
    }

    #[test]
    fn display_format() {
        let report = ReconcileReport {
            entries: vec![ReconcileEntry {
                ticker: aapl(),
                target_weight: 0.5,
                actual_weight: 0.49,
                diff_weight: -0.01,
                target_shares: 2702,
                actual_shares: 2648,
                diff_shares: -54,
                priced: true,
            }],
            tracking_error_pct: 1.0,
        };
        let s = format!("{report}");
        assert!(s.contains("AAPL"));
        assert!(s.contains("Tracking error"));
    }
}
