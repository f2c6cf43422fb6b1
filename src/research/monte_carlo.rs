//! Monte Carlo engine
//!
//! Three simulation modes over an isolated, caller-seeded RNG:
//!
//! - **returns**: bootstrap `n` samples with replacement from the returns
//!   series.
//! - **trades**: shuffle a trade-return list without replacement, once per
//!   simulation.
//! - **execution**: bootstrap as in returns, then perturb each sampled
//!   return with a multiplicative `N(1, shock_std)` shock and an additive
//!   `N(0, slippage_std)` slippage draw. When a std is zero its draw is
//!   skipped entirely, so zero-noise execution reproduces the returns-mode
//!   output bit for bit under the same seed.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use statrs::distribution::Normal;

use crate::error::{EngineError, Result};

/// Per-simulation outputs.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationOutcome {
    pub final_equity: f64,
    pub return_pct: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown_pct: f64,
}

/// Distribution-level aggregates.
#[derive(Debug, Clone, Serialize)]
pub struct MonteCarloReport {
    pub simulations_results: Vec<SimulationOutcome>,
    pub mean_sharpe: f64,
    /// Bessel-corrected; 0.0 when `simulations == 1`.
    pub sharpe_variance: f64,
    pub mean_return_pct: f64,
    /// Fraction of simulations with `return_pct < 0`; always in [0, 1].
    pub probability_of_loss: f64,
    /// Minimum per-simulation `max_drawdown_pct`.
    pub worst_drawdown: f64,
}

/// Seeded Monte Carlo engine. Each `analyze_*` call constructs its own RNG
/// from the configured seed; caller-global RNG state is never touched.
#[derive(Debug, Clone)]
pub struct MonteCarloEngine {
    initial_cash: f64,
    seed: Option<u64>,
}

impl MonteCarloEngine {
    pub fn new(initial_cash: f64, seed: Option<u64>) -> Result<Self> {
        if initial_cash <= 0.0 {
            return Err(EngineError::invalid(
                "initial_cash",
                format!("must be > 0, got {initial_cash}"),
            ));
        }
        Ok(MonteCarloEngine { initial_cash, seed })
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    fn check_simulations(simulations: usize) -> Result<()> {
        if simulations < 1 {
            return Err(EngineError::invalid(
                "simulations",
                format!("must be >= 1, got {simulations}"),
            ));
        }
        Ok(())
    }

    fn check_series(field: &'static str, series: &[f64]) -> Result<()> {
        if series.len() < 2 {
            return Err(EngineError::invalid(
                field,
                format!("must have at least 2 elements, got {}", series.len()),
            ));
        }
        Ok(())
    }

    /// Bootstrap `len(returns)` samples with replacement per simulation.
    pub fn analyze_returns(
        &self,
        returns_series: &[f64],
        simulations: usize,
    ) -> Result<MonteCarloReport> {
        Self::check_simulations(simulations)?;
        Self::check_series("returns_series", returns_series)?;

        let mut rng = self.rng();
        let n = returns_series.len();
        let mut results = Vec::with_capacity(simulations);
        for _ in 0..simulations {
            let sample: Vec<f64> = (0..n)
                .map(|_| returns_series[rng.gen_range(0..n)])
                .collect();
            results.push(metrics_from_sample(&sample, self.initial_cash));
        }
        Ok(aggregate(results))
    }

    /// Shuffle the trade list without replacement, once per simulation.
    pub fn analyze_trades(&self, trades: &[f64], simulations: usize) -> Result<MonteCarloReport> {
        Self::check_simulations(simulations)?;
        Self::check_series("trades", trades)?;

        let mut rng = self.rng();
        let mut results = Vec::with_capacity(simulations);
        for _ in 0..simulations {
            let mut sample = trades.to_vec();
            sample.shuffle(&mut rng);
            results.push(metrics_from_sample(&sample, self.initial_cash));
        }
        Ok(aggregate(results))
    }

    /// Bootstrap as in returns mode, then apply execution noise. With both
    /// stds at zero no normal draws occur, so the RNG consumes exactly the
    /// same stream as returns mode.
    pub fn analyze_execution(
        &self,
        returns_series: &[f64],
        simulations: usize,
        shock_std: f64,
        slippage_std: f64,
    ) -> Result<MonteCarloReport> {
        Self::check_simulations(simulations)?;
        Self::check_series("returns_series", returns_series)?;
        if slippage_std < 0.0 {
            return Err(EngineError::invalid(
                "slippage_std",
                format!("must be >= 0, got {slippage_std}"),
            ));
        }
        if shock_std < 0.0 {
            return Err(EngineError::invalid(
                "shock_std",
                format!("must be >= 0, got {shock_std}"),
            ));
        }

        let shock = if shock_std != 0.0 {
            Some(Normal::new(1.0, shock_std).map_err(|e| {
                EngineError::invalid("shock_std", e.to_string())
            })?)
        } else {
            None
        };
        let slippage = if slippage_std != 0.0 {
            Some(Normal::new(0.0, slippage_std).map_err(|e| {
                EngineError::invalid("slippage_std", e.to_string())
            })?)
        } else {
            None
        };

        let mut rng = self.rng();
        let n = returns_series.len();
        let mut results = Vec::with_capacity(simulations);
        for _ in 0..simulations {
            let mut sample: Vec<f64> = (0..n)
                .map(|_| returns_series[rng.gen_range(0..n)])
                .collect();

            for r in sample.iter_mut() {
                if let Some(shock) = &shock {
                    *r *= rng.sample(shock);
                }
                if let Some(slippage) = &slippage {
                    *r -= rng.sample(slippage);
                }
            }

            results.push(metrics_from_sample(&sample, self.initial_cash));
        }
        Ok(aggregate(results))
    }
}

/// Compound an equity path from an ordered sample of per-period returns
/// and compute the per-simulation statistics.
///
/// The Sharpe ratio uses `[0.0] ++ sample` with Bessel-corrected deviation
/// (0 when the deviation is zero); drawdown is running peak-to-trough as a
/// percentage of the peak.
pub fn metrics_from_sample(sample: &[f64], initial_cash: f64) -> SimulationOutcome {
    if sample.is_empty() {
        return SimulationOutcome {
            final_equity: initial_cash,
            return_pct: 0.0,
            sharpe_ratio: 0.0,
            max_drawdown_pct: 0.0,
        };
    }

    let mut equity = initial_cash;
    let mut curve = Vec::with_capacity(sample.len() + 1);
    curve.push(equity);
    for &r in sample {
        equity *= 1.0 + r;
        curve.push(equity);
    }

    let final_equity = equity;
    let return_pct = (final_equity - initial_cash) / initial_cash * 100.0;

    let m = sample.len() + 1;
    let mean_r = sample.iter().sum::<f64>() / m as f64;
    let sum_sq = (0.0 - mean_r).powi(2)
        + sample.iter().map(|r| (r - mean_r).powi(2)).sum::<f64>();
    let std_r = (sum_sq / (m - 1) as f64).sqrt();
    let sharpe_ratio = if std_r != 0.0 { mean_r / std_r } else { 0.0 };

    let mut peak = curve[0];
    let mut max_drawdown_pct = 0.0;
    for &v in &curve {
        if v > peak {
            peak = v;
        }
        let dd = (v - peak) / peak * 100.0;
        if dd < max_drawdown_pct {
            max_drawdown_pct = dd;
        }
    }

    SimulationOutcome {
        final_equity,
        return_pct,
        sharpe_ratio,
        max_drawdown_pct,
    }
}

fn aggregate(results: Vec<SimulationOutcome>) -> MonteCarloReport {
    let n = results.len();
    let mean_sharpe = results.iter().map(|s| s.sharpe_ratio).sum::<f64>() / n as f64;
    let sharpe_variance = if n > 1 {
        results
            .iter()
            .map(|s| (s.sharpe_ratio - mean_sharpe).powi(2))
            .sum::<f64>()
            / (n - 1) as f64
    } else {
        0.0
    };
    let mean_return_pct = results.iter().map(|s| s.return_pct).sum::<f64>() / n as f64;
    let probability_of_loss =
        results.iter().filter(|s| s.return_pct < 0.0).count() as f64 / n as f64;
    let worst_drawdown = results
        .iter()
        .map(|s| s.max_drawdown_pct)
        .fold(f64::INFINITY, f64::min);

    MonteCarloReport {
        simulations_results: results,
        mean_sharpe,
        sharpe_variance,
        mean_return_pct,
        probability_of_loss,
        worst_drawdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const RETURNS: [f64; 3] = [0.1, 0.2, -0.05];

    #[test]
    fn test_metrics_from_known_sample() {
        // Sample [0.2, 0.1, 0.1] from 1000: 1000 * 1.2 * 1.1 * 1.1 = 1452.
        let outcome = metrics_from_sample(&[0.2, 0.1, 0.1], 1000.0);
        assert_relative_eq!(outcome.final_equity, 1452.0, max_relative = 1e-12);
        assert_relative_eq!(outcome.return_pct, 45.2, max_relative = 1e-12);
        assert_eq!(outcome.max_drawdown_pct, 0.0);
        // Sharpe over [0.0, 0.2, 0.1, 0.1] = sqrt(6)/2.
        assert_relative_eq!(outcome.sharpe_ratio, 6.0_f64.sqrt() / 2.0, max_relative = 1e-12);
    }

    #[test]
    fn test_constant_sample_has_zero_drawdown_and_sharpe_defined() {
        let outcome = metrics_from_sample(&[0.0, 0.0], 1000.0);
        assert_eq!(outcome.sharpe_ratio, 0.0);
        assert_eq!(outcome.max_drawdown_pct, 0.0);
    }

    #[test]
    fn test_same_seed_same_report() {
        let engine = MonteCarloEngine::new(1000.0, Some(42)).unwrap();
        let a = engine.analyze_returns(&RETURNS, 50).unwrap();
        let b = engine.analyze_returns(&RETURNS, 50).unwrap();
        assert_eq!(a.mean_sharpe.to_bits(), b.mean_sharpe.to_bits());
        assert_eq!(a.mean_return_pct.to_bits(), b.mean_return_pct.to_bits());
        assert_eq!(a.worst_drawdown.to_bits(), b.worst_drawdown.to_bits());
    }

    #[test]
    fn test_zero_noise_execution_equals_returns_mode() {
        let engine = MonteCarloEngine::new(1000.0, Some(7)).unwrap();
        let returns_mode = engine.analyze_returns(&RETURNS, 25).unwrap();
        let execution_mode = engine.analyze_execution(&RETURNS, 25, 0.0, 0.0).unwrap();

        for (a, b) in returns_mode
            .simulations_results
            .iter()
            .zip(execution_mode.simulations_results.iter())
        {
            assert_eq!(a.final_equity.to_bits(), b.final_equity.to_bits());
            assert_eq!(a.sharpe_ratio.to_bits(), b.sharpe_ratio.to_bits());
        }
    }

    #[test]
    fn test_noise_changes_outcomes() {
        let engine = MonteCarloEngine::new(1000.0, Some(7)).unwrap();
        let clean = engine.analyze_returns(&RETURNS, 25).unwrap();
        let noisy = engine.analyze_execution(&RETURNS, 25, 0.05, 0.01).unwrap();
        assert_ne!(
            clean.mean_return_pct.to_bits(),
            noisy.mean_return_pct.to_bits()
        );
    }

    #[test]
    fn test_probability_of_loss_in_unit_interval() {
        let engine = MonteCarloEngine::new(1000.0, Some(3)).unwrap();
        let report = engine.analyze_returns(&[0.05, -0.04, 0.01, -0.02], 200).unwrap();
        assert!((0.0..=1.0).contains(&report.probability_of_loss));
        assert!(report.sharpe_variance >= 0.0);
    }

    #[test]
    fn test_single_simulation_variance_is_zero() {
        let engine = MonteCarloEngine::new(1000.0, Some(5)).unwrap();
        let report = engine.analyze_returns(&RETURNS, 1).unwrap();
        assert_eq!(report.sharpe_variance, 0.0);
    }

    #[test]
    fn test_trades_mode_preserves_multiset() {
        let engine = MonteCarloEngine::new(1000.0, Some(11)).unwrap();
        let trades = [0.1, -0.05, 0.2];
        let report = engine.analyze_trades(&trades, 10).unwrap();
        // Shuffling never changes the compounded product.
        let expected = 1000.0 * 1.1 * 0.95 * 1.2;
        for sim in &report.simulations_results {
            assert_relative_eq!(sim.final_equity, expected, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_parameter_domains() {
        assert!(MonteCarloEngine::new(0.0, None).is_err());
        let engine = MonteCarloEngine::new(1000.0, None).unwrap();
        assert!(engine.analyze_returns(&RETURNS, 0).is_err());
        assert!(engine.analyze_returns(&[0.1], 10).is_err());
        assert!(engine.analyze_trades(&[0.1], 10).is_err());
        assert!(engine.analyze_execution(&RETURNS, 10, -0.1, 0.0).is_err());
        assert!(engine.analyze_execution(&RETURNS, 10, 0.0, -0.1).is_err());
    }
}
