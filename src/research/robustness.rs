//! Walk-forward Monte Carlo robustness
//!
//! Combines the walk-forward fold geometry with per-fold Monte Carlo
//! simulation over the test slice's returns series. Per-fold score:
//!
//! ```text
//! R_i = mc_mean_sharpe_i - mc_sharpe_variance_i - mc_probability_of_loss_i
//! ```
//!
//! The global robustness score is the mean of the fold scores.

use serde::Serialize;

use crate::backtest::Backtester;
use crate::error::{EngineError, Result};
use crate::research::monte_carlo::{MonteCarloEngine, MonteCarloReport};
use crate::research::walk_forward::validate_geometry;
use crate::strategies::StrategyHandle;
use crate::types::Candle;

#[derive(Debug, Clone, Serialize)]
pub struct RobustnessReport {
    pub fold_scores: Vec<f64>,
    pub fold_mc_results: Vec<MonteCarloReport>,
    pub robustness_score: f64,
}

pub struct RobustnessEngine {
    strategy: StrategyHandle,
    train_size: usize,
    test_size: usize,
    step_size: usize,
    simulations: usize,
    seed: Option<u64>,
    initial_cash: f64,
}

impl RobustnessEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        strategy: StrategyHandle,
        train_size: usize,
        test_size: usize,
        step_size: usize,
        simulations: usize,
        seed: Option<u64>,
        initial_cash: f64,
    ) -> Self {
        RobustnessEngine {
            strategy,
            train_size,
            test_size,
            step_size,
            simulations,
            seed,
            initial_cash,
        }
    }

    pub fn run(&self, candles: &[Candle]) -> Result<RobustnessReport> {
        if self.simulations < 1 {
            return Err(EngineError::invalid(
                "simulations",
                format!("must be >= 1, got {}", self.simulations),
            ));
        }
        validate_geometry(
            candles.len(),
            self.train_size,
            self.test_size,
            self.step_size,
        )?;

        let backtester = Backtester::new(self.initial_cash);
        let mut fold_scores = Vec::new();
        let mut fold_mc_results = Vec::new();
        let mut pos = 0;

        loop {
            let test_start = pos + self.train_size;
            let test_end = test_start + self.test_size;
            if test_end > candles.len() {
                break;
            }

            let test_result =
                backtester.run(&candles[test_start..test_end], self.strategy.as_ref())?;

            // The test slice has >= 2 candles, so the returns series always
            // carries at least 2 points.
            let mc = MonteCarloEngine::new(self.initial_cash, self.seed)?
                .analyze_returns(&test_result.returns_series, self.simulations)?;

            let score = mc.mean_sharpe - mc.sharpe_variance - mc.probability_of_loss;
            fold_scores.push(score);
            fold_mc_results.push(mc);

            pos += self.step_size;
        }

        if fold_scores.is_empty() {
            return Err(EngineError::invalid("candles", "no valid folds produced"));
        }

        let robustness_score = fold_scores.iter().sum::<f64>() / fold_scores.len() as f64;

        Ok(RobustnessReport {
            fold_scores,
            fold_mc_results,
            robustness_score,
        })
    }
}
