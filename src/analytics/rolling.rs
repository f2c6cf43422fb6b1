//! Rolling-window metrics for an equity curve
//!
//! Every method returns a vector the same length as the equity curve.
//! Positions where a full window is not yet available hold `None`.
//! Volatility and Sharpe align to the equity index of the last return in
//! the window (`i + 1`); the rolling drawdown aligns to the equity index
//! itself.

use crate::analytics::risk_metrics::{
    check_equity_curve, mean, sample_std, simple_returns, PERIODS_PER_YEAR,
};
use crate::error::{EngineError, Result};

#[derive(Debug, Clone)]
pub struct RollingMetrics {
    curve: Vec<f64>,
    returns: Vec<f64>,
}

impl RollingMetrics {
    /// Requires length >= 1 and strictly positive values.
    pub fn new(equity_curve: &[f64]) -> Result<Self> {
        check_equity_curve(equity_curve, 1)?;
        Ok(RollingMetrics {
            returns: simple_returns(equity_curve),
            curve: equity_curve.to_vec(),
        })
    }

    fn check_window(window: usize) -> Result<()> {
        if window < 2 {
            return Err(EngineError::invalid(
                "window",
                format!("must be >= 2, got {window}"),
            ));
        }
        Ok(())
    }

    /// Annualized rolling volatility (sample std × √252). The first
    /// `window` entries are `None`.
    pub fn rolling_volatility(&self, window: usize) -> Result<Vec<Option<f64>>> {
        Self::check_window(window)?;

        let mut result = vec![None; self.curve.len()];
        for i in (window - 1)..self.returns.len() {
            let slice = &self.returns[i + 1 - window..=i];
            result[i + 1] = Some(sample_std(slice) * PERIODS_PER_YEAR.sqrt());
        }
        Ok(result)
    }

    /// Annualized rolling Sharpe; 0.0 entries where the window volatility
    /// is zero. The first `window` entries are `None`.
    pub fn rolling_sharpe(&self, window: usize) -> Result<Vec<Option<f64>>> {
        Self::check_window(window)?;

        let mut result = vec![None; self.curve.len()];
        for i in (window - 1)..self.returns.len() {
            let slice = &self.returns[i + 1 - window..=i];
            let mu = mean(slice) * PERIODS_PER_YEAR;
            let vol = sample_std(slice) * PERIODS_PER_YEAR.sqrt();
            result[i + 1] = Some(if vol == 0.0 { 0.0 } else { mu / vol });
        }
        Ok(result)
    }

    /// Maximum drawdown within each rolling window of equity values. The
    /// first `window - 1` entries are `None`.
    pub fn rolling_max_drawdown(&self, window: usize) -> Result<Vec<Option<f64>>> {
        Self::check_window(window)?;

        let mut result = vec![None; self.curve.len()];
        for i in (window - 1)..self.curve.len() {
            let slice = &self.curve[i + 1 - window..=i];
            result[i] = Some(window_max_drawdown(slice));
        }
        Ok(result)
    }
}

fn window_max_drawdown(equity_window: &[f64]) -> f64 {
    let mut peak = equity_window[0];
    let mut min_dd = 0.0_f64;
    for &v in equity_window {
        if v > peak {
            peak = v;
        }
        let dd = (v - peak) / peak;
        if dd < min_dd {
            min_dd = dd;
        }
    }
    min_dd
}
