//! Value at Risk
//!
//! Historical VaR takes the floor-indexed `(1 - confidence)` percentile of
//! the ascending-sorted returns, clamped to the valid index range.
//! Parametric VaR assumes normal returns: `VaR = mu + z * sigma` with `z`
//! from the Abramowitz & Stegun 26.2.17 rational approximation of the
//! inverse standard normal CDF (max error ~4.5e-4).

use crate::analytics::risk_metrics::{mean, sample_std};
use crate::error::{EngineError, Result};

/// Inverse of the standard normal CDF at probability `p` in (0, 1).
///
/// Rational approximation, Abramowitz & Stegun 26.2.17.
fn inv_norm(p: f64) -> f64 {
    const C0: f64 = 2.515517;
    const C1: f64 = 0.802853;
    const C2: f64 = 0.010328;
    const D1: f64 = 1.432788;
    const D2: f64 = 0.189269;
    const D3: f64 = 0.001308;

    let (t, sign) = if p < 0.5 {
        ((-2.0 * p.ln()).sqrt(), -1.0)
    } else {
        ((-2.0 * (1.0 - p).ln()).sqrt(), 1.0)
    };

    let numerator = C0 + C1 * t + C2 * t * t;
    let denominator = 1.0 + D1 * t + D2 * t * t + D3 * t * t * t;
    sign * (t - numerator / denominator)
}

/// Value at Risk engine over a series of simple period returns.
#[derive(Debug, Clone)]
pub struct ValueAtRisk {
    returns: Vec<f64>,
}

impl ValueAtRisk {
    /// Requires at least 2 returns.
    pub fn new(returns: &[f64]) -> Result<Self> {
        if returns.len() < 2 {
            return Err(EngineError::invalid(
                "returns",
                format!("must have at least 2 elements, got {}", returns.len()),
            ));
        }
        Ok(ValueAtRisk {
            returns: returns.to_vec(),
        })
    }

    fn check_confidence(confidence: f64) -> Result<()> {
        if !(confidence > 0.0 && confidence < 1.0) {
            return Err(EngineError::invalid(
                "confidence",
                format!("must be in (0, 1), got {confidence}"),
            ));
        }
        Ok(())
    }

    /// Empirical VaR: the return at the `(1 - confidence)` percentile.
    /// Negative values indicate a loss.
    pub fn historical_var(&self, confidence: f64) -> Result<f64> {
        Self::check_confidence(confidence)?;

        let mut sorted = self.returns.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let n = sorted.len();
        let idx = ((1.0 - confidence) * n as f64).floor() as usize;
        Ok(sorted[idx.min(n - 1)])
    }

    /// Parametric VaR under a normal assumption: `mu + z * sigma` with
    /// `z = inv_norm(1 - confidence)`.
    pub fn parametric_var(&self, confidence: f64) -> Result<f64> {
        Self::check_confidence(confidence)?;

        let mu = mean(&self.returns);
        let sigma = sample_std(&self.returns);
        let z = inv_norm(1.0 - confidence);
        Ok(mu + z * sigma)
    }
}
