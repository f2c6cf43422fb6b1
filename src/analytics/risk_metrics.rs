//! Core portfolio risk and return metrics over an equity curve
//!
//! All statistics use sample (Bessel-corrected) deviation and a 252
//! trading-periods-per-year annualization.

use crate::error::{EngineError, Result};

pub(crate) const PERIODS_PER_YEAR: f64 = 252.0;

/// Simple period returns `r_t = (E_t - E_{t-1}) / E_{t-1}`.
pub(crate) fn simple_returns(curve: &[f64]) -> Vec<f64> {
    curve
        .windows(2)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect()
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (divide by n-1); 0.0 when n < 2.
pub(crate) fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mu = mean(values);
    let variance = values.iter().map(|x| (x - mu).powi(2)).sum::<f64>() / (n - 1) as f64;
    variance.sqrt()
}

pub(crate) fn check_equity_curve(curve: &[f64], min_len: usize) -> Result<()> {
    if curve.len() < min_len {
        return Err(EngineError::invalid(
            "equity_curve",
            format!("must have at least {min_len} elements, got {}", curve.len()),
        ));
    }
    for (i, &v) in curve.iter().enumerate() {
        if v <= 0.0 {
            return Err(EngineError::invalid(
                "equity_curve",
                format!("values must be > 0; got {v} at index {i}"),
            ));
        }
    }
    Ok(())
}

/// Risk and return metrics for a single equity curve.
#[derive(Debug, Clone)]
pub struct RiskMetrics {
    curve: Vec<f64>,
    returns: Vec<f64>,
}

impl RiskMetrics {
    /// Requires length >= 2 and strictly positive values.
    pub fn new(equity_curve: &[f64]) -> Result<Self> {
        check_equity_curve(equity_curve, 2)?;
        Ok(RiskMetrics {
            returns: simple_returns(equity_curve),
            curve: equity_curve.to_vec(),
        })
    }

    /// `(E_final - E_initial) / E_initial`
    pub fn total_return(&self) -> f64 {
        (self.curve[self.curve.len() - 1] - self.curve[0]) / self.curve[0]
    }

    /// Compound annual growth rate, assuming 252 periods per year.
    pub fn cagr(&self) -> f64 {
        let periods = (self.curve.len() - 1) as f64;
        let years = periods / PERIODS_PER_YEAR;
        if years <= 0.0 {
            return 0.0;
        }
        let ratio = self.curve[self.curve.len() - 1] / self.curve[0];
        ratio.powf(1.0 / years) - 1.0
    }

    /// Annualized sample volatility of simple returns (× √252).
    pub fn volatility(&self) -> f64 {
        sample_std(&self.returns) * PERIODS_PER_YEAR.sqrt()
    }

    /// Annualized mean return over annualized volatility; 0 when volatility
    /// is zero.
    pub fn sharpe(&self) -> f64 {
        let mu = mean(&self.returns) * PERIODS_PER_YEAR;
        let vol = self.volatility();
        if vol == 0.0 {
            return 0.0;
        }
        mu / vol
    }

    /// Annualized sample deviation of the negative returns only; 0 when
    /// there are none.
    pub fn downside_deviation(&self) -> f64 {
        let negative: Vec<f64> = self.returns.iter().copied().filter(|&r| r < 0.0).collect();
        if negative.is_empty() {
            return 0.0;
        }
        sample_std(&negative) * PERIODS_PER_YEAR.sqrt()
    }

    /// Annualized mean return over downside deviation; 0 when the downside
    /// deviation is zero.
    pub fn sortino_ratio(&self) -> f64 {
        let mu = mean(&self.returns) * PERIODS_PER_YEAR;
        let dd = self.downside_deviation();
        if dd == 0.0 {
            return 0.0;
        }
        mu / dd
    }
}
