//! Portfolio analytics
//!
//! Pure functions over an equity curve: return/risk metrics, drawdown
//! analysis, rolling windows, Value at Risk, and per-strategy attribution,
//! composed by the [`PortfolioAnalytics`] wrapper.

pub mod attribution;
pub mod drawdown;
pub mod risk_metrics;
pub mod rolling;
pub mod var;

pub use attribution::{AttributionEntry, PerformanceAttribution};
pub use drawdown::DrawdownAnalytics;
pub use risk_metrics::RiskMetrics;
pub use rolling::RollingMetrics;
pub use var::ValueAtRisk;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::Result;

const ROLLING_WINDOW: usize = 20;
const VAR_CONFIDENCE: f64 = 0.95;

/// Full analytics report, one call per equity curve.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsReport {
    pub total_return: f64,
    pub cagr: f64,
    pub volatility: f64,
    pub sharpe: f64,
    pub sortino: f64,
    pub max_drawdown: f64,
    pub max_drawdown_duration: usize,
    pub var_95_hist: Option<f64>,
    pub var_95_param: Option<f64>,
    pub rolling_sharpe: Vec<Option<f64>>,
    pub rolling_volatility: Vec<Option<f64>>,
    pub attribution: Option<BTreeMap<String, AttributionEntry>>,
}

/// Master analytics wrapper composing every module above.
pub struct PortfolioAnalytics {
    risk: RiskMetrics,
    drawdown: DrawdownAnalytics,
    rolling: RollingMetrics,
    var: Option<ValueAtRisk>,
    attribution: Option<PerformanceAttribution>,
    curve_len: usize,
}

impl PortfolioAnalytics {
    /// Requires a strictly positive portfolio curve of length >= 2. When
    /// per-strategy curves are supplied they must match the portfolio
    /// curve length, and the report includes attribution.
    pub fn new(
        portfolio_equity_curve: &[f64],
        strategy_equity_curves: Option<&BTreeMap<String, Vec<f64>>>,
    ) -> Result<Self> {
        let risk = RiskMetrics::new(portfolio_equity_curve)?;
        let drawdown = DrawdownAnalytics::new(portfolio_equity_curve)?;
        let rolling = RollingMetrics::new(portfolio_equity_curve)?;

        let returns: Vec<f64> = portfolio_equity_curve
            .windows(2)
            .map(|w| (w[1] - w[0]) / w[0])
            .collect();
        let var = if returns.len() >= 2 {
            Some(ValueAtRisk::new(&returns)?)
        } else {
            None
        };

        let attribution = match strategy_equity_curves {
            Some(curves) if !curves.is_empty() => Some(PerformanceAttribution::new(
                portfolio_equity_curve,
                curves,
            )?),
            _ => None,
        };

        Ok(PortfolioAnalytics {
            risk,
            drawdown,
            rolling,
            var,
            attribution,
            curve_len: portfolio_equity_curve.len(),
        })
    }

    /// Compute the full report. The rolling window is `min(20, len - 1)`
    /// clamped to at least 2.
    pub fn full_report(&self) -> Result<AnalyticsReport> {
        let window = ROLLING_WINDOW.min(self.curve_len - 1).max(2);

        let rolling_sharpe = self.rolling.rolling_sharpe(window)?;
        let rolling_volatility = self.rolling.rolling_volatility(window)?;

        let (var_95_hist, var_95_param) = match &self.var {
            Some(var) => (
                Some(var.historical_var(VAR_CONFIDENCE)?),
                Some(var.parametric_var(VAR_CONFIDENCE)?),
            ),
            None => (None, None),
        };

        let attribution = self.attribution.as_ref().map(|a| a.compute());

        Ok(AnalyticsReport {
            total_return: self.risk.total_return(),
            cagr: self.risk.cagr(),
            volatility: self.risk.volatility(),
            sharpe: self.risk.sharpe(),
            sortino: self.risk.sortino_ratio(),
            max_drawdown: self.drawdown.max_drawdown(),
            max_drawdown_duration: self.drawdown.max_drawdown_duration(),
            var_95_hist,
            var_95_param,
            rolling_sharpe,
            rolling_volatility,
            attribution,
        })
    }
}
