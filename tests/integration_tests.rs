//! Integration tests for the quant-research system
//!
//! These tests verify that the components work together correctly on
//! synthetic candle data, including the documented end-to-end scenarios.

use std::collections::BTreeMap;
use std::sync::Arc;

use approx::assert_relative_eq;
use chrono::{Duration, TimeZone, Utc};

use quant_research::analytics::PortfolioAnalytics;
use quant_research::backtest::Backtester;
use quant_research::data::StaticDataProvider;
use quant_research::evolution::{EvolutionConfig, EvolutionEngine};
use quant_research::execution::{
    AllocationMode, CapitalAllocator, DecayMetric, ExecutionGateway, MarketLoop, Order,
    PaperBroker, PerformanceDecayDetector, PortfolioEngine, PortfolioLifecycleManager,
    RebalancePolicy, RiskManager,
};
use quant_research::genome::Genome;
use quant_research::pipeline::{run_full_pipeline, PipelineParams};
use quant_research::research::{MonteCarloEngine, RankingSource, StaticRanking, StrategyRankingEngine};
use quant_research::strategies::{BuyAndHold, StrategyHandle};
use quant_research::types::{Candle, Side};

// =============================================================================
// Test Utilities
// =============================================================================

/// Build a daily candle series from closing prices.
fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
    let start = Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            Candle::new_unchecked(
                start + Duration::days(i as i64),
                close,
                close * 1.01,
                close * 0.99,
                close,
                1_000.0,
            )
        })
        .collect()
}

/// Generate gently trending candle data with periodic pullbacks.
fn generate_trending_candles(count: usize, base_price: f64, trend_strength: f64) -> Vec<Candle> {
    let closes: Vec<f64> = (0..count)
        .map(|i| {
            let pullback = if i % 6 == 5 { -1.8 } else { 0.0 };
            base_price + i as f64 * trend_strength + pullback
        })
        .collect();
    candles_from_closes(&closes)
}

// =============================================================================
// Documented end-to-end scenarios
// =============================================================================

#[test]
fn test_scenario_backtester_buy_and_hold() {
    let report = Backtester::new(1000.0)
        .run_buy_and_hold(&candles_from_closes(&[100.0, 110.0]))
        .unwrap();

    assert_relative_eq!(report.final_equity, 1100.0);
    assert_relative_eq!(report.return_pct, 10.0);
    assert_eq!(report.max_drawdown_pct, 0.0);
    assert_eq!(report.sharpe_ratio, 0.0);
}

#[test]
fn test_scenario_drawdown_arithmetic() {
    let report = Backtester::new(1000.0)
        .run_buy_and_hold(&candles_from_closes(&[100.0, 120.0, 90.0, 130.0]))
        .unwrap();

    assert_eq!(report.equity_curve, vec![1000.0, 1200.0, 900.0, 1300.0]);
    assert_relative_eq!(report.max_drawdown_pct, -25.0);
    assert_relative_eq!(report.calmar_ratio, 1.2);
}

#[test]
fn test_scenario_risk_cap() {
    let rm = RiskManager::new(0.5).unwrap();
    let order = Order::new(Side::Buy, 10.0, 100.0, None).unwrap();
    let original_id = order.id();

    let adjusted = rm.adjust_order(order, 1000.0).unwrap();
    assert_eq!(adjusted.side(), Side::Buy);
    assert_relative_eq!(adjusted.quantity(), 5.0);
    assert_relative_eq!(adjusted.price(), 100.0);
    assert_ne!(adjusted.id(), original_id);
}

#[test]
fn test_scenario_monte_carlo_sample_statistics() {
    // The documented sample [0.2, 0.1, 0.1] from 1000 cash.
    let outcome = quant_research::research::monte_carlo::metrics_from_sample(
        &[0.2, 0.1, 0.1],
        1000.0,
    );
    assert_relative_eq!(outcome.final_equity, 1452.0, max_relative = 1e-12);
    assert_relative_eq!(outcome.return_pct, 45.2, max_relative = 1e-12);
    assert_eq!(outcome.max_drawdown_pct, 0.0);
    assert_relative_eq!(
        outcome.sharpe_ratio,
        6.0_f64.sqrt() / 2.0,
        max_relative = 1e-12
    );
}

#[test]
fn test_scenario_sharpe_weight_split() {
    use quant_research::research::ranking::{
        BacktestSummary, MonteCarloSummary, RankingResult, StabilitySummary, WalkForwardSummary,
    };

    let entry = |name: &str, sharpe: f64| RankingResult {
        strategy_name: name.to_string(),
        backtest: BacktestSummary {
            return_pct: 0.0,
            sharpe_ratio: sharpe,
            calmar_ratio: 0.0,
            max_drawdown_pct: 0.0,
        },
        stability: StabilitySummary { stability_score: 0.0 },
        walk_forward: WalkForwardSummary {
            mean_test_sharpe: 0.0,
            performance_decay: 0.0,
        },
        monte_carlo: MonteCarloSummary {
            mean_sharpe: 0.0,
            sharpe_variance: 0.0,
            probability_of_loss: 0.5,
        },
        robustness: 0.0,
        composite_score: sharpe,
        rank: 0,
    };

    let results = vec![entry("A", 1.0), entry("B", 3.0), entry("C", 2.0)];
    let weights = CapitalAllocator::new(AllocationMode::Sharpe)
        .compute_weights(&results)
        .unwrap();

    assert_relative_eq!(weights["A"], 1.0 / 6.0);
    assert_relative_eq!(weights["B"], 3.0 / 6.0);
    assert_relative_eq!(weights["C"], 2.0 / 6.0);
    assert_relative_eq!(weights.values().sum::<f64>(), 1.0, epsilon = 1e-9);
}

#[test]
fn test_scenario_lifecycle_capital_roll_forward() {
    let closes: Vec<f64> = (0..10).map(|i| 100.0 + 10.0 * i as f64).collect();
    let candles = candles_from_closes(&closes);

    let strategies: Vec<StrategyHandle> = vec![Arc::new(BuyAndHold)];
    let ranking = StaticRanking::new(
        StrategyRankingEngine::new(strategies.clone(), 1000.0, 4, 2, 2, 5, Some(42))
            .unwrap()
            .run(&candles)
            .unwrap(),
    );

    let lifecycle = PortfolioLifecycleManager::new(
        strategies,
        1000.0,
        Box::new(ranking),
        CapitalAllocator::new(AllocationMode::Equal),
        RebalancePolicy::new(3).unwrap(),
        None,
    )
    .unwrap();

    let report = lifecycle.run(&candles).unwrap();

    assert_eq!(report.equity_curve.len(), candles.len());
    assert!(report.final_portfolio_equity >= 1000.0);
    for pair in report.equity_curve.windows(2) {
        assert!(
            pair[1] >= pair[0] - 1e-9,
            "equity must be non-decreasing on a rising market"
        );
    }
}

// =============================================================================
// Cross-component behavior
// =============================================================================

#[test]
fn test_gateway_and_market_loop_agree() {
    let candles = generate_trending_candles(30, 100.0, 0.8);

    let genome = Genome::MovingAverage { short: 3, long: 8 };
    let mut manual = ExecutionGateway::new(&genome, PaperBroker::new(5000.0, 0.0).unwrap(), None);
    for candle in &candles {
        manual.on_candle(candle).unwrap();
    }

    let mut driven = ExecutionGateway::new(&genome, PaperBroker::new(5000.0, 0.0).unwrap(), None);
    let state = MarketLoop::run(&mut driven, &candles).unwrap();

    assert_eq!(state.equity_curve, manual.equity_curve());
    assert_eq!(state.trade_history.len(), manual.trade_history().len());
}

#[test]
fn test_portfolio_engine_with_mixed_strategies() {
    let candles = generate_trending_candles(60, 100.0, 0.6);
    let strategies: Vec<StrategyHandle> = vec![
        Arc::new(BuyAndHold),
        Arc::new(Genome::MovingAverage { short: 3, long: 10 }),
        Arc::new(Genome::Breakout { window: 8 }),
    ];

    let report = PortfolioEngine::new(strategies, 30_000.0)
        .unwrap()
        .run(&candles)
        .unwrap();

    assert_eq!(report.portfolio_equity_curve.len(), candles.len());
    assert_eq!(report.strategies.len(), 3);
    let last_sum: f64 = report.strategies.iter().map(|s| s.equity).sum();
    assert_relative_eq!(report.portfolio_equity, last_sum, max_relative = 1e-9);
}

#[test]
fn test_monte_carlo_execution_mode_round_trip() {
    let candles = generate_trending_candles(40, 100.0, 0.5);
    let report = Backtester::new(1000.0)
        .run_buy_and_hold(&candles)
        .unwrap();

    let engine = MonteCarloEngine::new(1000.0, Some(1234)).unwrap();
    let returns_mode = engine.analyze_returns(&report.returns_series, 100).unwrap();
    let execution_mode = engine
        .analyze_execution(&report.returns_series, 100, 0.0, 0.0)
        .unwrap();

    assert_eq!(
        returns_mode.mean_sharpe.to_bits(),
        execution_mode.mean_sharpe.to_bits()
    );
    assert_eq!(
        returns_mode.worst_drawdown.to_bits(),
        execution_mode.worst_drawdown.to_bits()
    );
    assert!((0.0..=1.0).contains(&returns_mode.probability_of_loss));
}

#[test]
fn test_decay_detector_disables_strategy_in_lifecycle() {
    use quant_research::research::ranking::{
        BacktestSummary, MonteCarloSummary, RankingResult, StabilitySummary, WalkForwardSummary,
    };

    let candles = candles_from_closes(&[100.0, 101.0, 102.0, 103.0, 104.0, 105.0]);
    let bad_result = RankingResult {
        strategy_name: "BuyAndHold".to_string(),
        backtest: BacktestSummary {
            return_pct: -10.0,
            sharpe_ratio: -3.0,
            calmar_ratio: 0.0,
            max_drawdown_pct: -40.0,
        },
        stability: StabilitySummary { stability_score: -1.0 },
        walk_forward: WalkForwardSummary {
            mean_test_sharpe: -2.0,
            performance_decay: -1.0,
        },
        monte_carlo: MonteCarloSummary {
            mean_sharpe: -2.0,
            sharpe_variance: 0.5,
            probability_of_loss: 0.9,
        },
        robustness: -2.0,
        composite_score: -10.0,
        rank: 1,
    };

    let lifecycle = PortfolioLifecycleManager::new(
        vec![Arc::new(BuyAndHold)],
        1000.0,
        Box::new(StaticRanking::new(vec![bad_result])),
        CapitalAllocator::new(AllocationMode::Equal),
        RebalancePolicy::new(2).unwrap(),
        Some(PerformanceDecayDetector::new(0.0, DecayMetric::Sharpe)),
    )
    .unwrap();

    let report = lifecycle.run(&candles).unwrap();
    assert_eq!(report.disabled_strategies, vec!["BuyAndHold".to_string()]);
    // The fallback keeps the original set trading.
    assert_eq!(report.equity_curve.len(), candles.len());
}

#[test]
fn test_analytics_on_portfolio_output() {
    let candles = generate_trending_candles(50, 100.0, 0.7);
    let strategies: Vec<StrategyHandle> = vec![Arc::new(BuyAndHold), Arc::new(BuyAndHold)];
    let report = PortfolioEngine::new(strategies, 10_000.0)
        .unwrap()
        .run(&candles)
        .unwrap();

    let strategy_curves: BTreeMap<String, Vec<f64>> = report
        .strategies
        .iter()
        .enumerate()
        .map(|(i, s)| (format!("{}_{i}", s.name), s.equity_curve.clone()))
        .collect();

    let analytics =
        PortfolioAnalytics::new(&report.portfolio_equity_curve, Some(&strategy_curves)).unwrap();
    let full = analytics.full_report().unwrap();

    assert!(full.total_return.is_finite());
    assert_eq!(full.rolling_sharpe.len(), candles.len());
    let attribution = full.attribution.unwrap();
    assert_eq!(attribution.len(), 2);
    let contribution: f64 = attribution.values().map(|a| a.contribution_pct).sum();
    assert_relative_eq!(contribution, 1.0, epsilon = 1e-9);
}

#[test]
fn test_evolution_determinism_end_to_end() {
    let candles = generate_trending_candles(60, 100.0, 0.5);
    let config = EvolutionConfig {
        population_size: 8,
        generations: 3,
        seed: Some(99),
        ..EvolutionConfig::default()
    };

    let a = EvolutionEngine::new(&candles, config.clone())
        .unwrap()
        .run()
        .unwrap();
    let b = EvolutionEngine::new(&candles, config).unwrap().run().unwrap();

    assert_eq!(a.best_genome, b.best_genome);
    assert_eq!(a.best_fitness.to_bits(), b.best_fitness.to_bits());
}

#[test]
fn test_full_pipeline_over_static_provider() {
    let candles = generate_trending_candles(90, 100.0, 0.5);
    let provider = StaticDataProvider::new().with_candles("TEST", candles);

    let params = PipelineParams {
        population_size: 6,
        generations: 2,
        rebalance_interval: 30,
        ..PipelineParams::default()
    };

    let report = run_full_pipeline(
        "TEST",
        "2023-01-01".parse().unwrap(),
        "2023-12-31".parse().unwrap(),
        &provider,
        &params,
    )
    .unwrap();

    assert!(report.error.is_none());
    assert_eq!(report.candle_count, 90);
    assert!(report.best_genome.is_some());
    assert!(!report.ranking_results.is_empty());
    assert_eq!(
        report.portfolio_result.as_ref().unwrap().equity_curve.len(),
        90
    );
}
