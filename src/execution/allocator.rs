//! Capital weight computation for multi-strategy portfolios
//!
//! Three weighting modes: equal split, Sharpe-proportional, and
//! robustness-proportional. Proportional modes only weight strategies
//! whose metric is strictly positive and fall back to equal weighting
//! when none qualifies. Weights always sum to 1.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::research::ranking::RankingResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocationMode {
    Equal,
    Sharpe,
    Robustness,
}

impl FromStr for AllocationMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "equal" => Ok(AllocationMode::Equal),
            "sharpe" => Ok(AllocationMode::Sharpe),
            "robustness" => Ok(AllocationMode::Robustness),
            other => Err(EngineError::invalid(
                "mode",
                format!("must be one of equal, sharpe, robustness; got {other:?}"),
            )),
        }
    }
}

impl std::fmt::Display for AllocationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AllocationMode::Equal => write!(f, "equal"),
            AllocationMode::Sharpe => write!(f, "sharpe"),
            AllocationMode::Robustness => write!(f, "robustness"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CapitalAllocator {
    mode: AllocationMode,
}

impl CapitalAllocator {
    pub fn new(mode: AllocationMode) -> Self {
        CapitalAllocator { mode }
    }

    pub fn mode(&self) -> AllocationMode {
        self.mode
    }

    /// Map each strategy name to its capital weight.
    pub fn compute_weights(&self, ranking_results: &[RankingResult]) -> Result<BTreeMap<String, f64>> {
        if ranking_results.is_empty() {
            return Err(EngineError::invalid("ranking_results", "must not be empty"));
        }

        match self.mode {
            AllocationMode::Equal => Ok(Self::equal_weights(ranking_results)),
            AllocationMode::Sharpe => Ok(Self::proportional_weights(ranking_results, |r| {
                r.backtest.sharpe_ratio
            })),
            AllocationMode::Robustness => {
                Ok(Self::proportional_weights(ranking_results, |r| r.robustness))
            }
        }
    }

    fn equal_weights(results: &[RankingResult]) -> BTreeMap<String, f64> {
        let w = 1.0 / results.len() as f64;
        results
            .iter()
            .map(|r| (r.strategy_name.clone(), w))
            .collect()
    }

    fn proportional_weights(
        results: &[RankingResult],
        metric: impl Fn(&RankingResult) -> f64,
    ) -> BTreeMap<String, f64> {
        let total: f64 = results
            .iter()
            .map(&metric)
            .filter(|&v| v > 0.0)
            .sum();

        if total <= 0.0 {
            return Self::equal_weights(results);
        }

        results
            .iter()
            .map(|r| {
                let v = metric(r);
                let w = if v > 0.0 { v / total } else { 0.0 };
                (r.strategy_name.clone(), w)
            })
            .collect()
    }
}
