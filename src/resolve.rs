//! Transaction resolution: signed share deltas → (action, quantity).
//!
//! Every function here is pure. The rebalancer feeds them current signed
//! shares read from the game and desired signed shares sized from target
//! weights, and submits whatever non-zero intents come back.
//!
//! ## Resolver table
//!
//! | current | desired vs current | action |
//! |---------|--------------------|--------|
//! | `< 0`   | `desired > current`  | Cover |
//! | `< 0`   | `desired <= current` | Short |
//! | `>= 0`  | `desired > current`  | Buy   |
//! | `>= 0`  | `desired <= current` | Sell  |
//!
//! Quantity is always `|current - desired|`. A crossing through zero
//! (long to short, short to long) is one order, not a close-then-open pair.

use crate::action::Action;
use crate::error::ValidationError;

/// Resolve the single action moving `current` signed shares to `desired`.
///
/// Returns the action and the share quantity. Quantity 0 means nothing
/// should be submitted; the action is still well defined (Sell for a flat or
/// long book, Short for a short one).
#[inline]
pub fn resolve_action(current: i64, desired: i64) -> (Action, u64) {
    let action = if current < 0 {
        if desired > current {
            Action::Cover
        } else {
            Action::Short
        }
    } else if desired > current {
        Action::Buy
    } else {
        Action::Sell
    };
    (action, current.abs_diff(desired))
}

/// Action that fully closes `current` signed shares.
///
/// `None` for a flat book.
#[inline]
pub fn exit_action(current: i64) -> Option<(Action, u64)> {
    match current {
        0 => None,
        c if c > 0 => Some((Action::Sell, c.unsigned_abs())),
        c => Some((Action::Cover, c.unsigned_abs())),
    }
}

/// Action that opens `desired` signed shares from a flat book.
///
/// Buy for long targets, Short for short targets, `None` when the target
/// sizes to zero shares.
#[inline]
pub fn entry_action(desired: i64) -> Option<(Action, u64)> {
    match desired {
        0 => None,
        d if d > 0 => Some((Action::Buy, d.unsigned_abs())),
        d => Some((Action::Short, d.unsigned_abs())),
    }
}

/// Signed whole shares worth `weight * portfolio_value` at `price`.
///
/// Fractions are truncated toward zero, so a long target never over-spends
/// and a short target never over-shorts: $50 at $7 is 7 shares, not 8.
pub fn desired_shares(
    weight: f64,
    portfolio_value: f64,
    price: f64,
) -> Result<i64, ValidationError> {
    if !price.is_finite() || price <= 0.0 {
        return Err(ValidationError::InvalidPrice(price));
    }
    if !portfolio_value.is_finite() {
        return Err(ValidationError::NonFiniteValue(portfolio_value));
    }
    if !weight.is_finite() {
        return Err(ValidationError::NonFiniteWeight(weight.to_string()));
    }
    let dollars = weight * portfolio_value;
    // `as` saturates at the i64 bounds.
    Ok((dollars / price).trunc() as i64)
}
