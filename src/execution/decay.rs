//! Performance decay detector
//!
//! A strategy is decayed when its chosen metric falls strictly below a
//! configured threshold; equality is not decayed.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::research::ranking::RankingResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecayMetric {
    Sharpe,
    Robustness,
}

impl FromStr for DecayMetric {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sharpe" => Ok(DecayMetric::Sharpe),
            "robustness" => Ok(DecayMetric::Robustness),
            other => Err(EngineError::invalid(
                "metric",
                format!("must be one of sharpe, robustness; got {other:?}"),
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PerformanceDecayDetector {
    threshold: f64,
    metric: DecayMetric,
}

impl PerformanceDecayDetector {
    pub fn new(threshold: f64, metric: DecayMetric) -> Self {
        PerformanceDecayDetector { threshold, metric }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn metric(&self) -> DecayMetric {
        self.metric
    }

    /// `true` when the strategy's metric is strictly below the threshold.
    pub fn is_decayed(&self, result: &RankingResult) -> bool {
        let value = match self.metric {
            DecayMetric::Sharpe => result.backtest.sharpe_ratio,
            DecayMetric::Robustness => result.robustness,
        };
        value < self.threshold
    }
}
