//! Portfolio lifecycle manager
//!
//! Segmented re-simulation with periodic rebalancing, performance decay
//! detection, and permanent disabling of decayed strategies. Capital rolls
//! forward across segments and never resets to the initial amount.
//!
//! Integration flow:
//!
//! ```text
//! RankingSource -> CapitalAllocator -> PortfolioEngine
//!      ^                                     ^
//! RebalancePolicy + PerformanceDecayDetector
//! ```
//!
//! A failed ranking must not stall the simulation: ranking errors are
//! swallowed and the previous active set and weights carry over.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::error::{EngineError, Result};
use crate::execution::allocator::CapitalAllocator;
use crate::execution::decay::PerformanceDecayDetector;
use crate::execution::portfolio::PortfolioEngine;
use crate::execution::rebalance::RebalancePolicy;
use crate::research::ranking::RankingSource;
use crate::strategies::{StrategyFactory, StrategyHandle};
use crate::types::Candle;

#[derive(Debug, Clone, Serialize)]
pub struct LifecycleReport {
    pub final_portfolio_equity: f64,
    pub rebalance_steps: Vec<usize>,
    pub disabled_strategies: Vec<String>,
    pub equity_curve: Vec<f64>,
}

pub struct PortfolioLifecycleManager {
    strategies: Vec<StrategyHandle>,
    initial_capital: f64,
    ranking_engine: Box<dyn RankingSource>,
    allocator: CapitalAllocator,
    rebalance_policy: RebalancePolicy,
    decay_detector: Option<PerformanceDecayDetector>,
}

impl PortfolioLifecycleManager {
    pub fn new(
        strategies: Vec<StrategyHandle>,
        initial_capital: f64,
        ranking_engine: Box<dyn RankingSource>,
        allocator: CapitalAllocator,
        rebalance_policy: RebalancePolicy,
        decay_detector: Option<PerformanceDecayDetector>,
    ) -> Result<Self> {
        if strategies.is_empty() {
            return Err(EngineError::invalid("strategies", "must not be empty"));
        }
        if initial_capital <= 0.0 {
            return Err(EngineError::invalid(
                "initial_capital",
                format!("must be > 0, got {initial_capital}"),
            ));
        }
        Ok(PortfolioLifecycleManager {
            strategies,
            initial_capital,
            ranking_engine,
            allocator,
            rebalance_policy,
            decay_detector,
        })
    }

    /// Simulate the portfolio over `candles` with periodic rebalancing.
    /// The returned equity curve always has one entry per candle.
    pub fn run(&self, candles: &[Candle]) -> Result<LifecycleReport> {
        if candles.is_empty() {
            return Ok(LifecycleReport {
                final_portfolio_equity: self.initial_capital,
                rebalance_steps: Vec::new(),
                disabled_strategies: Vec::new(),
                equity_curve: Vec::new(),
            });
        }

        let n = candles.len();
        let mut active: Vec<StrategyHandle> = self.strategies.clone();
        let mut disabled: Vec<String> = Vec::new();
        let mut rebalance_steps = Vec::new();
        let mut equity_curve: Vec<f64> = Vec::with_capacity(n);

        let mut current_capital = self.initial_capital;
        let mut current_weights: BTreeMap<String, f64> = equal_weights(&active);

        // Segment boundaries: every rebalance point, with 0 forced as the
        // first boundary and n appended as the sentinel end.
        let mut points: Vec<usize> = (0..n)
            .filter(|&i| self.rebalance_policy.should_rebalance(i))
            .collect();
        if points.is_empty() {
            points.push(0);
        }
        if points[0] != 0 {
            points.insert(0, 0);
        }
        points.push(n);

        for boundary in points.windows(2) {
            let (seg_start, seg_end) = (boundary[0], boundary[1]);
            let seg_candles = &candles[seg_start..seg_end];
            if seg_candles.is_empty() {
                continue;
            }

            rebalance_steps.push(seg_start);

            // Re-rank on the candles seen so far. A ranking failure keeps
            // the current active set and weights.
            match self.ranking_engine.run(&candles[..seg_start + 1]) {
                Ok(ranking_results) => {
                    if let Some(detector) = &self.decay_detector {
                        for result in &ranking_results {
                            if !disabled.contains(&result.strategy_name)
                                && detector.is_decayed(result)
                            {
                                disabled.push(result.strategy_name.clone());
                            }
                        }
                    }

                    let mut new_active: Vec<StrategyHandle> = self
                        .strategies
                        .iter()
                        .filter(|s| !disabled.contains(&s.name()))
                        .cloned()
                        .collect();
                    if new_active.is_empty() {
                        new_active = self.strategies.clone();
                    }
                    active = new_active;

                    let active_names: BTreeSet<String> =
                        active.iter().map(|s| s.name()).collect();
                    let active_results: Vec<_> = ranking_results
                        .iter()
                        .filter(|r| active_names.contains(&r.strategy_name))
                        .cloned()
                        .collect();

                    current_weights = if active_results.is_empty() {
                        equal_weights(&active)
                    } else {
                        self.allocator.compute_weights(&active_results)?
                    };
                }
                Err(err) => {
                    tracing::warn!(step = seg_start, error = %err, "ranking failed, keeping previous weights");
                }
            }

            let seg_equity =
                self.run_segment(&active, &current_weights, current_capital, seg_candles)?;

            if let Some(&last) = seg_equity.last() {
                current_capital = last;
            }
            equity_curve.extend(seg_equity);
        }

        let final_equity = equity_curve
            .last()
            .copied()
            .unwrap_or(self.initial_capital);

        Ok(LifecycleReport {
            final_portfolio_equity: final_equity,
            rebalance_steps,
            disabled_strategies: disabled,
            equity_curve,
        })
    }

    /// Execute one segment: a single-strategy portfolio per weight, summed
    /// element-wise.
    fn run_segment(
        &self,
        strategies: &[StrategyHandle],
        weights: &BTreeMap<String, f64>,
        capital: f64,
        candles: &[Candle],
    ) -> Result<Vec<f64>> {
        if candles.is_empty() || capital <= 0.0 {
            return Ok(vec![capital; candles.len()]);
        }

        let mut reports = Vec::new();
        for strategy in strategies {
            let weight = weights.get(&strategy.name()).copied().unwrap_or(0.0);
            let strat_capital = capital * weight;
            if strat_capital > 0.0 {
                let engine = PortfolioEngine::new(vec![strategy.clone()], strat_capital)?;
                reports.push(engine.run(candles)?);
            }
        }

        if reports.is_empty() {
            // Every weight rounded to zero: fall back to an equal split.
            let per = capital / strategies.len() as f64;
            for strategy in strategies {
                let engine = PortfolioEngine::new(vec![strategy.clone()], per)?;
                reports.push(engine.run(candles)?);
            }
        }

        let seg_equity = (0..candles.len())
            .map(|i| reports.iter().map(|r| r.portfolio_equity_curve[i]).sum())
            .collect();
        Ok(seg_equity)
    }
}

fn equal_weights(strategies: &[StrategyHandle]) -> BTreeMap<String, f64> {
    let w = 1.0 / strategies.len() as f64;
    strategies.iter().map(|s| (s.name(), w)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::allocator::AllocationMode;
    use crate::execution::decay::DecayMetric;
    use crate::research::ranking::test_support::ranking_result;
    use crate::research::ranking::{RankingResult, StaticRanking};
    use crate::strategies::test_support::candles_from_closes;
    use crate::strategies::BuyAndHold;
    use std::sync::Arc;

    struct FailingRanking;
    impl RankingSource for FailingRanking {
        fn run(&self, _candles: &[Candle]) -> Result<Vec<RankingResult>> {
            Err(EngineError::Internal("ranking unavailable".to_string()))
        }
    }

    fn manager(
        ranking: Box<dyn RankingSource>,
        decay: Option<PerformanceDecayDetector>,
        interval: usize,
    ) -> PortfolioLifecycleManager {
        PortfolioLifecycleManager::new(
            vec![Arc::new(BuyAndHold)],
            1000.0,
            ranking,
            CapitalAllocator::new(AllocationMode::Equal),
            RebalancePolicy::new(interval).unwrap(),
            decay,
        )
        .unwrap()
    }

    fn static_ranking() -> Box<dyn RankingSource> {
        Box::new(StaticRanking::new(vec![ranking_result("BuyAndHold", 1.0, 0.5)]))
    }

    #[test]
    fn test_empty_candles_returns_initial_capital() {
        let report = manager(static_ranking(), None, 3).run(&[]).unwrap();
        assert_eq!(report.final_portfolio_equity, 1000.0);
        assert!(report.equity_curve.is_empty());
        assert!(report.rebalance_steps.is_empty());
    }

    #[test]
    fn test_equity_curve_length_matches_candles() {
        let closes: Vec<f64> = (0..10).map(|i| 100.0 + 10.0 * i as f64).collect();
        let candles = candles_from_closes(&closes);
        let report = manager(static_ranking(), None, 3).run(&candles).unwrap();
        assert_eq!(report.equity_curve.len(), candles.len());
    }

    #[test]
    fn test_capital_rolls_forward_on_rising_market() {
        // Closes 100, 110, ..., 190 with a buy-and-hold strategy: equity
        // must never fall below the initial capital.
        let closes: Vec<f64> = (0..10).map(|i| 100.0 + 10.0 * i as f64).collect();
        let candles = candles_from_closes(&closes);
        let report = manager(static_ranking(), None, 3).run(&candles).unwrap();

        assert!(report.final_portfolio_equity >= 1000.0);
        for pair in report.equity_curve.windows(2) {
            assert!(pair[1] >= pair[0] - 1e-9, "curve must be non-decreasing");
        }
        assert_eq!(report.rebalance_steps, vec![0, 3, 6, 9]);
    }

    #[test]
    fn test_ranking_failure_keeps_simulation_alive() {
        let closes: Vec<f64> = (0..6).map(|i| 100.0 + i as f64).collect();
        let candles = candles_from_closes(&closes);
        let report = manager(Box::new(FailingRanking), None, 2)
            .run(&candles)
            .unwrap();
        assert_eq!(report.equity_curve.len(), candles.len());
        assert!(report.disabled_strategies.is_empty());
    }

    #[test]
    fn test_decayed_strategy_is_disabled_but_portfolio_survives() {
        // Sharpe below the threshold: the only strategy decays, and the
        // manager falls back to the original set.
        let ranking = Box::new(StaticRanking::new(vec![ranking_result(
            "BuyAndHold",
            -2.0,
            0.0,
        )]));
        let detector = PerformanceDecayDetector::new(0.0, DecayMetric::Sharpe);
        let closes: Vec<f64> = (0..6).map(|i| 100.0 + i as f64).collect();
        let candles = candles_from_closes(&closes);

        let report = manager(ranking, Some(detector), 2).run(&candles).unwrap();
        assert_eq!(report.disabled_strategies, vec!["BuyAndHold".to_string()]);
        assert_eq!(report.equity_curve.len(), candles.len());
    }

    #[test]
    fn test_constructor_validation() {
        assert!(PortfolioLifecycleManager::new(
            vec![],
            1000.0,
            static_ranking(),
            CapitalAllocator::new(AllocationMode::Equal),
            RebalancePolicy::new(1).unwrap(),
            None,
        )
        .is_err());

        assert!(PortfolioLifecycleManager::new(
            vec![Arc::new(BuyAndHold)],
            0.0,
            static_ranking(),
            CapitalAllocator::new(AllocationMode::Equal),
            RebalancePolicy::new(1).unwrap(),
            None,
        )
        .is_err());
    }
}
