//! Genome fitness evaluation
//!
//! Converts a genome into a strategy, runs it through the backtester (fast
//! mode) or the full ranking engine (full mode) and returns a scalar
//! score. Output is always a finite float: NaN metrics sanitize to zero,
//! inactive strategies and engine failures map to a strongly negative
//! penalty so one bad genome cannot derail evolution.

use std::str::FromStr;

use crate::backtest::Backtester;
use crate::error::{EngineError, Result};
use crate::genome::Genome;
use crate::research::ranking::{RankingSource, StrategyRankingEngine};
use crate::strategies::StrategyHandle;
use crate::types::Candle;

/// Penalty for strategies that never trade, and for engine failures.
pub const INACTIVITY_PENALTY: f64 = -100.0;

/// A strategy counts as inactive when its absolute return stays inside
/// this band.
const INACTIVITY_RETURN_PCT: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitnessMode {
    /// Backtester only: `sharpe - 0.5 * |max_drawdown|`.
    Fast,
    /// Composite score from the ranking engine with a reduced simulation
    /// budget.
    Full,
}

impl FromStr for FitnessMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fast" => Ok(FitnessMode::Fast),
            "full" => Ok(FitnessMode::Full),
            other => Err(EngineError::invalid(
                "fitness_mode",
                format!("must be 'fast' or 'full', got {other:?}"),
            )),
        }
    }
}

pub struct FitnessEvaluator {
    candles: Vec<Candle>,
    initial_cash: f64,
    mode: FitnessMode,
    seed: Option<u64>,
}

const FULL_MODE_SIMULATIONS: usize = 20;

impl FitnessEvaluator {
    pub fn new(candles: &[Candle], initial_cash: f64, mode: FitnessMode, seed: Option<u64>) -> Self {
        FitnessEvaluator {
            candles: candles.to_vec(),
            initial_cash,
            mode,
            seed,
        }
    }

    /// Compute the fitness score for `genome`. Higher is better; the
    /// result is always finite.
    pub fn evaluate(&self, genome: &Genome) -> f64 {
        if genome.validate().is_err() {
            return INACTIVITY_PENALTY;
        }
        let fitness = match self.mode {
            FitnessMode::Fast => self.fast_fitness(genome),
            FitnessMode::Full => self.full_fitness(genome),
        };
        if fitness.is_finite() {
            fitness
        } else {
            INACTIVITY_PENALTY
        }
    }

    fn fast_fitness(&self, genome: &Genome) -> f64 {
        let report = match Backtester::new(self.initial_cash).run(&self.candles, genome) {
            Ok(report) => report,
            Err(_) => return INACTIVITY_PENALTY,
        };

        let sharpe = sanitize(report.sharpe_ratio);
        let max_drawdown = sanitize(report.max_drawdown_pct);

        if report.return_pct.abs() < INACTIVITY_RETURN_PCT {
            return INACTIVITY_PENALTY;
        }

        sharpe - 0.5 * max_drawdown.abs()
    }

    fn full_fitness(&self, genome: &Genome) -> f64 {
        let n = self.candles.len();
        let strategies: Vec<StrategyHandle> = vec![std::sync::Arc::new(genome.clone())];

        let engine = match StrategyRankingEngine::new(
            strategies,
            self.initial_cash,
            (n / 5).max(10),
            (n / 10).max(5),
            (n / 10).max(5),
            FULL_MODE_SIMULATIONS,
            self.seed,
        ) {
            Ok(engine) => engine,
            Err(_) => return INACTIVITY_PENALTY,
        };

        match engine.run(&self.candles) {
            Ok(results) => sanitize(results[0].composite_score),
            Err(_) => INACTIVITY_PENALTY,
        }
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::test_support::candles_from_closes;

    fn trending_candles(n: usize) -> Vec<Candle> {
        let closes: Vec<f64> = (0..n)
            .map(|i| 100.0 + i as f64 + if i % 4 == 0 { -1.5 } else { 0.5 })
            .collect();
        candles_from_closes(&closes)
    }

    #[test]
    fn test_inactive_strategy_penalized() {
        // A long MA window that never fills on a short series never trades.
        let evaluator = FitnessEvaluator::new(
            &trending_candles(30),
            1000.0,
            FitnessMode::Fast,
            None,
        );
        let fitness = evaluator.evaluate(&Genome::MovingAverage { short: 40, long: 200 });
        assert_eq!(fitness, INACTIVITY_PENALTY);
    }

    #[test]
    fn test_active_strategy_scores_above_penalty() {
        let evaluator = FitnessEvaluator::new(
            &trending_candles(60),
            1000.0,
            FitnessMode::Fast,
            None,
        );
        let fitness = evaluator.evaluate(&Genome::MovingAverage { short: 2, long: 10 });
        assert!(fitness.is_finite());
        assert!(fitness > INACTIVITY_PENALTY);
    }

    #[test]
    fn test_invalid_genome_penalized_not_propagated() {
        let evaluator = FitnessEvaluator::new(
            &trending_candles(30),
            1000.0,
            FitnessMode::Fast,
            None,
        );
        assert_eq!(
            evaluator.evaluate(&Genome::Breakout { window: 1000 }),
            INACTIVITY_PENALTY
        );
    }

    #[test]
    fn test_too_few_candles_penalized() {
        let evaluator =
            FitnessEvaluator::new(&trending_candles(1), 1000.0, FitnessMode::Fast, None);
        assert_eq!(
            evaluator.evaluate(&Genome::Breakout { window: 10 }),
            INACTIVITY_PENALTY
        );
    }

    #[test]
    fn test_full_mode_is_finite(){
        let evaluator = FitnessEvaluator::new(
            &trending_candles(80),
            1000.0,
            FitnessMode::Full,
            Some(42),
        );
        let fitness = evaluator.evaluate(&Genome::MovingAverage { short: 2, long: 10 });
        assert!(fitness.is_finite());
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("fast".parse::<FitnessMode>().unwrap(), FitnessMode::Fast);
        assert_eq!("full".parse::<FitnessMode>().unwrap(), FitnessMode::Full);
        assert!("quick".parse::<FitnessMode>().is_err());
    }
}
