//! Strategy-level performance attribution
//!
//! For each strategy: absolute return, contribution to the portfolio's
//! absolute return, and an allocation effect relative to the equal-weight
//! mean return. The selection effect is reserved (always 0) pending
//! benchmark data.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{EngineError, Result};

#[derive(Debug, Clone, Serialize)]
pub struct AttributionEntry {
    pub absolute_return: f64,
    pub contribution_pct: f64,
    pub allocation_effect: f64,
    pub selection_effect: f64,
}

#[derive(Debug, Clone)]
pub struct PerformanceAttribution {
    portfolio: Vec<f64>,
    strategies: BTreeMap<String, Vec<f64>>,
}

impl PerformanceAttribution {
    /// All strategy curves must match the portfolio curve's length.
    pub fn new(
        portfolio_equity_curve: &[f64],
        strategy_equity_curves: &BTreeMap<String, Vec<f64>>,
    ) -> Result<Self> {
        if portfolio_equity_curve.is_empty() {
            return Err(EngineError::invalid(
                "portfolio_equity_curve",
                "must not be empty",
            ));
        }
        if strategy_equity_curves.is_empty() {
            return Err(EngineError::invalid(
                "strategy_equity_curves",
                "must not be empty",
            ));
        }

        let n = portfolio_equity_curve.len();
        for (name, curve) in strategy_equity_curves {
            if curve.len() != n {
                return Err(EngineError::invalid(
                    "strategy_equity_curves",
                    format!(
                        "strategy {name:?} curve length {} does not match portfolio length {n}",
                        curve.len()
                    ),
                ));
            }
        }

        Ok(PerformanceAttribution {
            portfolio: portfolio_equity_curve.to_vec(),
            strategies: strategy_equity_curves.clone(),
        })
    }

    pub fn compute(&self) -> BTreeMap<String, AttributionEntry> {
        let p_initial = self.portfolio[0];
        let p_final = self.portfolio[self.portfolio.len() - 1];
        let p_abs_return = p_final - p_initial;

        let strategy_returns: BTreeMap<&str, f64> = self
            .strategies
            .iter()
            .map(|(name, curve)| {
                let s_initial = curve[0];
                let s_final = curve[curve.len() - 1];
                let ret = if s_initial != 0.0 {
                    (s_final - s_initial) / s_initial
                } else {
                    0.0
                };
                (name.as_str(), ret)
            })
            .collect();

        let equal_weight_return =
            strategy_returns.values().sum::<f64>() / strategy_returns.len() as f64;

        self.strategies
            .iter()
            .map(|(name, curve)| {
                let s_initial = curve[0];
                let s_final = curve[curve.len() - 1];
                let s_abs_return = s_final - s_initial;

                let contribution_pct = if p_abs_return != 0.0 {
                    s_abs_return / p_abs_return
                } else {
                    0.0
                };

                let weight = if p_initial != 0.0 {
                    s_initial / p_initial
                } else {
                    0.0
                };
                let allocation_effect =
                    weight * strategy_returns[name.as_str()] - equal_weight_return;

                (
                    name.clone(),
                    AttributionEntry {
                        absolute_return: s_abs_return,
                        contribution_pct,
                        allocation_effect,
                        selection_effect: 0.0,
                    },
                )
            })
            .collect()
    }
}
