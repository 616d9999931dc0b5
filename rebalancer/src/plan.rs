//! Phase planning: which tickers each phase touches and what it does to them.
//!
//! A rebalance pass runs three phases in strict order:
//!
//! 1. **Exit**: close every held ticker that has no target.
//! 2. **Adjust**: resize every ticker that is both held and targeted.
//! 3. **Entry**: open every targeted ticker that is not held.
//!
//! The helpers here are pure and shared by the live [`Rebalancer`] and by
//! [`preview`], which projects a whole pass offline for `--dry-run` and the
//! confirmation prompt.
//!
//! [`Rebalancer`]: crate::rebalance::Rebalancer

use std::fmt;

use rustc_hash::FxHashMap;
use serde::Serialize;
use vsebook::{
    PositionSnapshot, TargetWeights, Ticker, TransactionIntent, ValidationError, desired_shares,
    entry_action, exit_action, resolve_action,
};

/// One of the three ordered rebalance phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Exit,
    Adjust,
    Entry,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Exit => "exit",
            Phase::Adjust => "adjust",
            Phase::Entry => "entry",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Closing intents for every held ticker without a target, in ticker order.
pub fn exit_intents(
    snapshot: &PositionSnapshot,
    weights: &TargetWeights,
) -> Vec<TransactionIntent> {
    snapshot
        .iter()
        .filter(|p| !weights.contains(&p.ticker))
        .filter_map(|p| {
            exit_action(p.signed_shares)
                .map(|(action, shares)| TransactionIntent::new(p.ticker.clone(), shares, action))
        })
        .collect()
}

/// Targets that are currently held, with their weights.
pub fn adjust_targets<'w>(
    snapshot: &PositionSnapshot,
    weights: &'w TargetWeights,
) -> Vec<(&'w Ticker, f64)> {
    weights
        .iter()
        .filter(|(t, _)| snapshot.contains(t))
        .collect()
}

/// Targets that are not currently held, with their weights.
pub fn entry_targets<'w>(
    snapshot: &PositionSnapshot,
    weights: &'w TargetWeights,
) -> Vec<(&'w Ticker, f64)> {
    weights
        .iter()
        .filter(|(t, _)| !snapshot.contains(t))
        .collect()
}

/// Intent resizing a held position to its target. `None` when already there.
pub fn adjust_intent(
    ticker: &Ticker,
    current: i64,
    weight: f64,
    portfolio_value: f64,
    price: f64,
) -> Result<Option<TransactionIntent>, ValidationError> {
    let desired = desired_shares(weight, portfolio_value, price)?;
    let (action, shares) = resolve_action(current, desired);
    Ok((shares > 0).then(|| TransactionIntent::new(ticker.clone(), shares, action)))
}

/// Intent opening a new position. `None` when the target sizes to zero shares.
pub fn entry_intent(
    ticker: &Ticker,
    weight: f64,
    portfolio_value: f64,
    price: f64,
) -> Result<Option<TransactionIntent>, ValidationError> {
    let desired = desired_shares(weight, portfolio_value, price)?;
    Ok(entry_action(desired)
        .map(|(action, shares)| TransactionIntent::new(ticker.clone(), shares, action)))
}

/// Check that `intent` moves `current` signed shares exactly to `desired`.
///
/// Applied right before submission. An intent that fails this check is
/// never sent to the game.
pub fn check_intent(intent: &TransactionIntent, current: i64, desired: i64) -> Result<(), String> {
    if intent.is_noop() {
        return Err(format!("zero-share {} for {}", intent.action, intent.ticker));
    }
    match current.checked_add(intent.signed_delta()) {
        Some(reached) if reached == desired => Ok(()),
        _ => Err(format!(
            "{intent} from {current} does not reach {desired} shares"
        )),
    }
}

/// One trade in an offline plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedTrade {
    pub phase: Phase,
    pub intent: TransactionIntent,
    /// Price used for sizing; `None` for exits, which close whatever is held.
    pub price: Option<f64>,
}

impl PlannedTrade {
    /// Approximate dollar size of the trade, when a price is known.
    pub fn notional(&self) -> Option<f64> {
        self.price.map(|p| p * self.intent.shares as f64)
    }
}

/// Offline projection of a full rebalance pass.
#[derive(Debug, Clone)]
pub struct Plan {
    pub trades: Vec<PlannedTrade>,
    /// Targets that would be skipped for lack of a usable price.
    pub unpriced: Vec<(Phase, Ticker)>,
    /// Positions after every planned trade fills completely.
    pub projected: PositionSnapshot,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }
}

/// Project a rebalance pass without touching the game.
///
/// Each phase works on the snapshot left by the previous one, exactly as the
/// live pass does after its refreshes, assuming every order fills.
pub fn preview(
    snapshot: &PositionSnapshot,
    weights: &TargetWeights,
    portfolio_value: f64,
    prices: &FxHashMap<Ticker, f64>,
) -> Plan {
    let mut trades = Vec::new();
    let mut unpriced = Vec::new();
    let mut projected = snapshot.clone();

    for intent in exit_intents(&projected, weights) {
        projected = projected.apply(&intent);
        trades.push(PlannedTrade {
            phase: Phase::Exit,
            intent,
            price: None,
        });
    }

    let adjusted: Vec<_> = adjust_targets(&projected, weights)
        .into_iter()
        .filter_map(|(ticker, weight)| {
            let Some(&price) = prices.get(ticker) else {
                unpriced.push((Phase::Adjust, ticker.clone()));
                return None;
            };
            match adjust_intent(ticker, projected.shares(ticker), weight, portfolio_value, price) {
                Ok(intent) => intent.map(|intent| PlannedTrade {
                    phase: Phase::Adjust,
                    intent,
                    price: Some(price),
                }),
                Err(_) => {
                    unpriced.push((Phase::Adjust, ticker.clone()));
                    None
                }
            }
        })
        .collect();
    for trade in adjusted {
        projected = projected.apply(&trade.intent);
        trades.push(trade);
    }

    let entered: Vec<_> = entry_targets(&projected, weights)
        .into_iter()
        .filter_map(|(ticker, weight)| {
            let Some(&price) = prices.get(ticker) else {
                unpriced.push((Phase::Entry, ticker.clone()));
                return None;
            };
            match entry_intent(ticker, weight, portfolio_value, price) {
                Ok(intent) => intent.map(|intent| PlannedTrade {
                    phase: Phase::Entry,
                    intent,
                    price: Some(price),
                }),
                Err(_) => {
                    unpriced.push((Phase::Entry, ticker.clone()));
                    None
                }
            }
        })
        .collect();
    for trade in entered {
        projected = projected.apply(&trade.intent);
        trades.push(trade);
    }

    Plan {
        trades,
        unpriced,
        projected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vsebook::{Action, Position};

    fn t(s: &str) -> Ticker {
        Ticker::new(s)
    }

    fn snapshot(rows: &[(&str, i64)]) -> PositionSnapshot {
        rows.iter().map(|(s, n)| Position::new(t(s), *n)).collect()
    }

    fn weights(pairs: &[(&str, f64)]) -> TargetWeights {
        TargetWeights::new(pairs.iter().map(|(s, w)| (t(s), *w))).unwrap()
    }

    fn prices(pairs: &[(&str, f64)]) -> FxHashMap<Ticker, f64> {
        pairs.iter().map(|(s, p)| (t(s), *p)).collect()
    }

    #[test]
    fn exit_closes_untargeted_longs_and_shorts() {
        let snap = snapshot(&[("A", 10), ("B", -5), ("C", 3)]);
        let w = weights(&[("C", 0.1)]);
        let intents = exit_intents(&snap, &w);
        assert_eq!(
            intents,
            vec![
                TransactionIntent::new(t("A"), 10, Action::Sell),
                TransactionIntent::new(t("B"), 5, Action::Cover),
            ]
        );
    }

    #[test]
    fn adjust_and_entry_partition_targets() {
        let snap = snapshot(&[("A", 10)]);
        let w = weights(&[("A", 0.5), ("C", 0.3)]);
        let adjust: Vec<_> = adjust_targets(&snap, &w)
            .into_iter()
            .map(|(t, _)| t.clone())
            .collect();
        let entry: Vec<_> = entry_targets(&snap, &w)
            .into_iter()
            .map(|(t, _)| t.clone())
            .collect();
        assert_eq!(adjust, vec![t("A")]);
        assert_eq!(entry, vec![t("C")]);
    }

    #[test]
    fn adjust_long_up() {
        // $1000 * 0.5 / $10 = 50 shares, holding 20
        let intent = adjust_intent(&t("X"), 20, 0.5, 1000.0, 10.0).unwrap().unwrap();
        assert_eq!(intent, TransactionIntent::new(t("X"), 30, Action::Buy));
    }

    #[test]
    fn adjust_short_to_long_is_one_cover() {
        // $1000 * 0.05 / $10 = 5 shares, holding -10
        let intent = adjust_intent(&t("Y"), -10, 0.05, 1000.0, 10.0).unwrap().unwrap();
        assert_eq!(intent, TransactionIntent::new(t("Y"), 15, Action::Cover));
    }

    #[test]
    fn adjust_at_target_is_none() {
        assert_eq!(adjust_intent(&t("X"), 50, 0.5, 1000.0, 10.0).unwrap(), None);
    }

    #[test]
    fn adjust_rejects_bad_price() {
        assert!(adjust_intent(&t("X"), 5, 0.5, 1000.0, 0.0).is_err());
        assert!(adjust_intent(&t("X"), 5, 0.5, 1000.0, f64::NAN).is_err());
    }

    #[test]
    fn entry_truncates() {
        // $50 at $7 is 7 shares
        let intent = entry_intent(&t("Z"), 0.05, 1000.0, 7.0).unwrap().unwrap();
        assert_eq!(intent, TransactionIntent::new(t("Z"), 7, Action::Buy));
    }

    #[test]
    fn entry_negative_weight_shorts() {
        let intent = entry_intent(&t("Z"), -0.1, 1000.0, 10.0).unwrap().unwrap();
        assert_eq!(intent, TransactionIntent::new(t("Z"), 10, Action::Short));
    }

    #[test]
    fn entry_too_small_is_none() {
        assert_eq!(entry_intent(&t("Z"), 0.001, 1000.0, 7.0).unwrap(), None);
    }

    #[test]
    fn check_intent_accepts_resolved_moves() {
        let i = TransactionIntent::new(t("X"), 15, Action::Sell);
        assert!(check_intent(&i, 10, -5).is_ok());
        assert!(check_intent(&i, 10, 0).is_err());
        assert!(check_intent(&TransactionIntent::new(t("X"), 0, Action::Buy), 0, 0).is_err());
    }

    #[test]
    fn preview_orders_phases() {
        // held {A:+10, B:-5}, target {A:0.5, C:0.3}
        let snap = snapshot(&[("A", 10), ("B", -5)]);
        let w = weights(&[("A", 0.5), ("C", 0.3)]);
        let p = prices(&[("A", 10.0), ("B", 20.0), ("C", 30.0)]);
        let plan = preview(&snap, &w, 1000.0, &p);

        let phases: Vec<_> = plan.trades.iter().map(|t| t.phase).collect();
        assert_eq!(phases, vec![Phase::Exit, Phase::Adjust, Phase::Entry]);
        assert_eq!(
            plan.trades[0].intent,
            TransactionIntent::new(t("B"), 5, Action::Cover)
        );
        assert_eq!(
            plan.trades[1].intent,
            TransactionIntent::new(t("A"), 40, Action::Buy)
        );
        assert_eq!(
            plan.trades[2].intent,
            TransactionIntent::new(t("C"), 10, Action::Buy)
        );
        assert_eq!(plan.projected.shares(&t("A")), 50);
        assert!(!plan.projected.contains(&t("B")));
        assert_eq!(plan.projected.shares(&t("C")), 10);
    }

    #[test]
    fn preview_fresh_portfolio_enters_everything() {
        let w = weights(&[("X", 1.0)]);
        let plan = preview(&PositionSnapshot::empty(), &w, 1000.0, &prices(&[("X", 30.0)]));
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.trades[0].phase, Phase::Entry);
        assert_eq!(plan.trades[0].intent.shares, 33);
        assert_eq!(plan.trades[0].notional(), Some(990.0));
    }

    #[test]
    fn preview_reports_unpriced_targets() {
        let snap = snapshot(&[("A", 10)]);
        let w = weights(&[("A", 0.5), ("C", 0.3)]);
        let plan = preview(&snap, &w, 1000.0, &FxHashMap::default());
        assert!(plan.is_empty());
        assert_eq!(
            plan.unpriced,
            vec![(Phase::Adjust, t("A")), (Phase::Entry, t("C"))]
        );
    }

    #[test]
    fn preview_of_projection_is_empty() {
        let snap = snapshot(&[("A", 10), ("B", -5)]);
        let w = weights(&[("A", 0.5), ("B", -0.2), ("C", 0.3)]);
        let p = prices(&[("A", 10.0), ("B", 20.0), ("C", 30.0)]);
        let first = preview(&snap, &w, 1000.0, &p);
        let second = preview(&first.projected, &w, 1000.0, &p);
        assert!(second.is_empty(), "{:?}", second.trades);
    }
}
