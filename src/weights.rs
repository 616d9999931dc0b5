//! Target weights: desired fraction of portfolio value per ticker.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use crate::error::ValidationError;
use crate::types::Ticker;

/// Mapping from ticker to target weight.
///
/// Weights are not normalized and need not sum to 1.0. Negative weights are
/// short targets. Every weight is finite and every ticker appears once.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TargetWeights {
    weights: BTreeMap<Ticker, f64>,
}

impl TargetWeights {
    /// Build from (ticker, weight) pairs. A ticker listed twice is rejected.
    pub fn new(pairs: impl IntoIterator<Item = (Ticker, f64)>) -> Result<Self, ValidationError> {
        let mut weights = BTreeMap::new();
        for (ticker, weight) in pairs {
            if !weight.is_finite() {
                return Err(ValidationError::NonFiniteWeight(ticker.as_str().to_string()));
            }
            match weights.entry(ticker) {
                Entry::Vacant(slot) => {
                    slot.insert(weight);
                }
                Entry::Occupied(slot) => {
                    return Err(ValidationError::DuplicateTicker(slot.key().as_str().to_string()));
                }
            }
        }
        Ok(Self { weights })
    }

    pub fn get(&self, ticker: &Ticker) -> Option<f64> {
        self.weights.get(ticker).copied()
    }

    #[inline]
    pub fn contains(&self, ticker: &Ticker) -> bool {
        self.weights.contains_key(ticker)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Ticker, f64)> {
        self.weights.iter().map(|(t, w)| (t, *w))
    }

    pub fn tickers(&self) -> impl Iterator<Item = &Ticker> {
        self.weights.keys()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}
