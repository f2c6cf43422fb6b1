//! Composite strategy ranking
//!
//! Runs every strategy through the full research stack (backtest,
//! stability, walk-forward, Monte Carlo, robustness), fuses the results
//! into one composite score, and assigns 1-based ranks after a stable
//! descending sort.
//!
//! Composite score:
//!
//! ```text
//! score = 1.0 * sharpe
//!       + 0.8 * calmar
//!       + 1.2 * stability_score
//!       + 1.5 * robustness_score
//!       - |max_drawdown_pct|
//!       - |performance_decay|
//! ```

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::backtest::Backtester;
use crate::error::{EngineError, Result};
use crate::research::monte_carlo::MonteCarloEngine;
use crate::research::regime::analyze_stability;
use crate::research::robustness::RobustnessEngine;
use crate::research::walk_forward::walk_forward_analysis;
use crate::strategies::{StrategyFactory, StrategyHandle};
use crate::types::Candle;

/// Backtest subset carried in a ranking result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestSummary {
    pub return_pct: f64,
    pub sharpe_ratio: f64,
    pub calmar_ratio: f64,
    pub max_drawdown_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StabilitySummary {
    pub stability_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkForwardSummary {
    pub mean_test_sharpe: f64,
    pub performance_decay: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloSummary {
    pub mean_sharpe: f64,
    pub sharpe_variance: f64,
    pub probability_of_loss: f64,
}

/// Per-strategy ranking entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingResult {
    pub strategy_name: String,
    pub backtest: BacktestSummary,
    pub stability: StabilitySummary,
    pub walk_forward: WalkForwardSummary,
    pub monte_carlo: MonteCarloSummary,
    pub robustness: f64,
    pub composite_score: f64,
    /// 1-based, assigned after sorting.
    pub rank: usize,
}

/// Anything the lifecycle manager can ask for a ranking: the real engine,
/// or a pre-computed wrapper.
pub trait RankingSource: Send + Sync {
    fn run(&self, candles: &[Candle]) -> Result<Vec<RankingResult>>;
}

/// The full composite ranking engine.
pub struct StrategyRankingEngine {
    strategies: Vec<StrategyHandle>,
    initial_cash: f64,
    train_size: usize,
    test_size: usize,
    step_size: usize,
    simulations: usize,
    seed: Option<u64>,
}

impl StrategyRankingEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        strategies: Vec<StrategyHandle>,
        initial_cash: f64,
        train_size: usize,
        test_size: usize,
        step_size: usize,
        simulations: usize,
        seed: Option<u64>,
    ) -> Result<Self> {
        if strategies.is_empty() {
            return Err(EngineError::invalid("strategies", "must not be empty"));
        }
        Ok(StrategyRankingEngine {
            strategies,
            initial_cash,
            train_size,
            test_size,
            step_size,
            simulations,
            seed,
        })
    }

    fn rank_one(&self, strategy: &StrategyHandle, candles: &[Candle]) -> Result<RankingResult> {
        // 1. Backtest over the full history.
        let bt = Backtester::new(self.initial_cash).run(candles, strategy.as_ref())?;
        let backtest = BacktestSummary {
            return_pct: bt.return_pct,
            sharpe_ratio: bt.sharpe_ratio,
            calmar_ratio: bt.calmar_ratio,
            max_drawdown_pct: bt.max_drawdown_pct,
        };

        // 2. Stability, with the training size as the regime window so the
        //    same candle budget is respected across engines.
        let stability = analyze_stability(
            strategy.as_ref(),
            candles,
            self.train_size,
            self.initial_cash,
        )?;

        // 3. Walk-forward.
        let walk_forward = walk_forward_analysis(
            strategy.as_ref(),
            candles,
            self.train_size,
            self.test_size,
            self.step_size,
            self.initial_cash,
        )?;

        // 4. Monte Carlo over the full-history returns series.
        let mc = MonteCarloEngine::new(self.initial_cash, self.seed)?
            .analyze_returns(&bt.returns_series, self.simulations)?;

        // 5. Robustness.
        let robustness = RobustnessEngine::new(
            strategy.clone(),
            self.train_size,
            self.test_size,
            self.step_size,
            self.simulations,
            self.seed,
            self.initial_cash,
        )
        .run(candles)?
        .robustness_score;

        // 6. Composite score.
        let composite_score = backtest.sharpe_ratio
            + 0.8 * backtest.calmar_ratio
            + 1.2 * stability.stability_score
            + 1.5 * robustness
            - backtest.max_drawdown_pct.abs()
            - walk_forward.performance_decay.abs();

        Ok(RankingResult {
            strategy_name: strategy.name(),
            backtest,
            stability: StabilitySummary {
                stability_score: stability.stability_score,
            },
            walk_forward: WalkForwardSummary {
                mean_test_sharpe: walk_forward.mean_test_sharpe,
                performance_decay: walk_forward.performance_decay,
            },
            monte_carlo: MonteCarloSummary {
                mean_sharpe: mc.mean_sharpe,
                sharpe_variance: mc.sharpe_variance,
                probability_of_loss: mc.probability_of_loss,
            },
            robustness,
            composite_score,
            rank: 0,
        })
    }
}

impl RankingSource for StrategyRankingEngine {
    /// Per-strategy work is independent and each stochastic engine owns a
    /// pre-seeded RNG, so the rayon fan-out preserves determinism; results
    /// are collected in input order before the stable sort.
    fn run(&self, candles: &[Candle]) -> Result<Vec<RankingResult>> {
        let mut results: Vec<RankingResult> = self
            .strategies
            .par_iter()
            .map(|strategy| self.rank_one(strategy, candles))
            .collect::<Result<_>>()?;

        sort_and_rank(&mut results);
        Ok(results)
    }
}

/// Stable descending sort by composite score plus 1-based rank assignment.
pub fn sort_and_rank(results: &mut [RankingResult]) {
    results.sort_by(|a, b| b.composite_score.total_cmp(&a.composite_score));
    for (i, entry) in results.iter_mut().enumerate() {
        entry.rank = i + 1;
    }
}

/// Pre-computed ranking wrapper. The lifecycle manager requires a ranking
/// source, but the orchestrator has already ranked; this returns the same
/// results regardless of the candles passed.
pub struct StaticRanking {
    results: Vec<RankingResult>,
}

impl StaticRanking {
    pub fn new(results: Vec<RankingResult>) -> Self {
        StaticRanking { results }
    }
}

impl RankingSource for StaticRanking {
    fn run(&self, _candles: &[Candle]) -> Result<Vec<RankingResult>> {
        Ok(self.results.clone())
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::ranking_result;
    use super::*;
    use crate::genome::Genome;
    use crate::strategies::test_support::candles_from_closes;
    use crate::strategies::BuyAndHold;
    use std::sync::Arc;

    fn rising(n: usize) -> Vec<Candle> {
        let closes: Vec<f64> = (0..n).map(|i| 100.0 + (i as f64) * 0.9).collect();
        candles_from_closes(&closes)
    }

    #[test]
    fn test_empty_strategy_list_rejected() {
        assert!(StrategyRankingEngine::new(vec![], 1000.0, 10, 5, 5, 10, None).is_err());
    }

    #[test]
    fn test_ranks_are_one_based_and_sorted() {
        let strategies: Vec<StrategyHandle> = vec![
            Arc::new(BuyAndHold),
            Arc::new(Genome::MovingAverage { short: 2, long: 5 }),
        ];
        let engine =
            StrategyRankingEngine::new(strategies, 1000.0, 10, 5, 5, 10, Some(42)).unwrap();
        let results = engine.run(&rising(40)).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].rank, 1);
        assert_eq!(results[1].rank, 2);
        assert!(results[0].composite_score >= results[1].composite_score);
    }

    #[test]
    fn test_deterministic_under_seed() {
        let make = || {
            let strategies: Vec<StrategyHandle> = vec![Arc::new(BuyAndHold)];
            StrategyRankingEngine::new(strategies, 1000.0, 10, 5, 5, 20, Some(9)).unwrap()
        };
        let a = make().run(&rising(40)).unwrap();
        let b = make().run(&rising(40)).unwrap();
        assert_eq!(
            a[0].composite_score.to_bits(),
            b[0].composite_score.to_bits()
        );
        assert_eq!(
            a[0].monte_carlo.mean_sharpe.to_bits(),
            b[0].monte_carlo.mean_sharpe.to_bits()
        );
    }

    #[test]
    fn test_stable_sort_preserves_tie_order() {
        let mut results = vec![
            ranking_result("first", 1.0, 0.0),
            ranking_result("second", 1.0, 0.0),
            ranking_result("third", 2.0, 0.0),
        ];
        sort_and_rank(&mut results);
        assert_eq!(results[0].strategy_name, "third");
        assert_eq!(results[1].strategy_name, "first");
        assert_eq!(results[2].strategy_name, "second");
    }

    #[test]
    fn test_static_ranking_ignores_candles() {
        let source = StaticRanking::new(vec![ranking_result("A", 1.0, 0.0)]);
        let from_empty = source.run(&[]).unwrap();
        let from_data = source.run(&rising(10)).unwrap();
        assert_eq!(from_empty.len(), 1);
        assert_eq!(from_data[0].strategy_name, "A");
    }
}
