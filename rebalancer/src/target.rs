//! Target portfolio specification (target.json) loading and validation.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use log::warn;
use serde::Deserialize;
use vsebook::{TargetWeights, Ticker};

use crate::error::{Error, Result};

/// A target allocation: ticker weights as fractions of portfolio value.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetSpec {
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    pub targets: Vec<TargetPosition>,
}

/// A single target position: symbol + weight. Negative weights are shorts.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetPosition {
    pub symbol: String,
    pub weight: f64,
}

impl TargetSpec {
    /// Load and validate a target.json file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::TargetRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&contents)
    }

    /// Parse from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let spec: TargetSpec = serde_json::from_str(json)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Validate the target specification.
    ///
    /// An empty list is valid: it asks for every position to be closed.
    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for t in &self.targets {
            let ticker = Ticker::try_new(&t.symbol)
                .map_err(|_| Error::Target("empty symbol".into()))?;
            if !seen.insert(ticker) {
                return Err(Error::Target(format!("duplicate symbol: {}", t.symbol)));
            }
            if !t.weight.is_finite() {
                return Err(Error::Target(format!(
                    "weight for {} is not a finite number",
                    t.symbol
                )));
            }
        }

        let gross = self.gross_weight();
        if gross > 1.0 {
            warn!("target gross weight is {gross:.4} (> 1.0); orders may exceed available cash");
        }
        Ok(())
    }

    /// Sum of absolute weights.
    pub fn gross_weight(&self) -> f64 {
        self.targets.iter().map(|t| t.weight.abs()).sum()
    }

    /// Weights for the rebalancer.
    pub fn weights(&self) -> Result<TargetWeights> {
        let pairs = self
            .targets
            .iter()
            .map(|t| -> Result<(Ticker, f64)> { Ok((Ticker::try_new(&t.symbol)?, t.weight)) })
            .collect::<Result<Vec<_>>>()?;
        Ok(TargetWeights::new(pairs)?)
    }
}
