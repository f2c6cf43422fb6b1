//! Research pipeline orchestrator
//!
//! Single entry point threading every subsystem together: fetch candles,
//! evolve genomes, pick the top unique strategies, rank them, allocate
//! capital, simulate the portfolio lifecycle, and aggregate analytics.
//!
//! The orchestrator degrades gracefully: a fallback backtester-only
//! ranking is always computed first, the full ranking engine replaces it
//! only when it produces non-trivial scores, and analytics failures leave
//! the report's analytics section empty rather than failing the run.

use std::sync::Arc;

use chrono::NaiveDate;
use itertools::Itertools;
use serde::Serialize;
use tracing::{info, warn};

use crate::analytics::{AnalyticsReport, PortfolioAnalytics};
use crate::backtest::Backtester;
use crate::data::MarketDataProvider;
use crate::error::{EngineError, Result};
use crate::evolution::{EvolutionConfig, EvolutionEngine, FitnessMode};
use crate::execution::{
    AllocationMode, CapitalAllocator, DecayMetric, LifecycleReport, PerformanceDecayDetector,
    PortfolioLifecycleManager, RebalancePolicy,
};
use crate::genome::Genome;
use crate::research::ranking::{
    sort_and_rank, BacktestSummary, MonteCarloSummary, RankingResult, RankingSource,
    StabilitySummary, StaticRanking, StrategyRankingEngine, WalkForwardSummary,
};
use crate::strategies::{StrategyFactory, StrategyHandle};
use crate::types::Candle;

/// Number of top unique genomes promoted out of evolution.
const TOP_STRATEGIES: usize = 3;
/// Simulation budget for the full ranking attempt.
const RANKING_SIMULATIONS: usize = 10;
/// A composite score below this is considered trivial.
const TRIVIAL_SCORE: f64 = 0.001;

/// Pipeline parameters mirroring the research config.
#[derive(Debug, Clone)]
pub struct PipelineParams {
    pub initial_capital: f64,
    pub population_size: usize,
    pub generations: usize,
    pub mutation_rate: f64,
    pub crossover_rate: f64,
    pub elitism: usize,
    pub tournament_size: usize,
    pub rebalance_interval: usize,
    pub decay_threshold: f64,
    pub allocator_mode: AllocationMode,
    pub seed: Option<u64>,
}

impl Default for PipelineParams {
    fn default() -> Self {
        PipelineParams {
            initial_capital: 10_000.0,
            population_size: 10,
            generations: 5,
            mutation_rate: 0.3,
            crossover_rate: 0.7,
            elitism: 2,
            tournament_size: 3,
            rebalance_interval: 20,
            decay_threshold: -1.0,
            allocator_mode: AllocationMode::Sharpe,
            seed: Some(42),
        }
    }
}

/// Final pipeline report.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub symbol: String,
    pub candle_count: usize,
    pub best_genome: Option<Genome>,
    pub best_fitness: Option<f64>,
    pub ranking_results: Vec<RankingResult>,
    pub portfolio_result: Option<LifecycleReport>,
    pub analytics_report: Option<AnalyticsReport>,
    pub error: Option<String>,
}

impl PipelineReport {
    fn empty(symbol: &str, error: impl Into<String>) -> Self {
        PipelineReport {
            symbol: symbol.to_string(),
            candle_count: 0,
            best_genome: None,
            best_fitness: None,
            ranking_results: Vec::new(),
            portfolio_result: None,
            analytics_report: None,
            error: Some(error.into()),
        }
    }
}

/// Run the full automated research pipeline for one symbol.
pub fn run_full_pipeline(
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
    provider: &dyn MarketDataProvider,
    params: &PipelineParams,
) -> Result<PipelineReport> {
    // 1. Fetch data.
    let candles = provider
        .get_historical(symbol, start, end, "1d")
        .map_err(|e| EngineError::Internal(format!("provider failed for {symbol}: {e}")))?;

    if candles.is_empty() {
        return Ok(PipelineReport::empty(symbol, "No candles returned by provider"));
    }
    info!(symbol, candles = candles.len(), "pipeline start");

    // 2. Evolve strategy genomes in fast fitness mode.
    let evolution = EvolutionEngine::new(
        &candles,
        EvolutionConfig {
            population_size: params.population_size,
            generations: params.generations,
            mutation_rate: params.mutation_rate,
            crossover_rate: params.crossover_rate,
            elitism: params.elitism,
            tournament_size: params.tournament_size,
            fitness_mode: FitnessMode::Fast,
            initial_cash: params.initial_capital / params.population_size.max(1) as f64,
            seed: params.seed,
        },
    )?;
    let evo_report = evolution.run()?;

    // 3. Top unique genomes (the name canonicalizes family + parameters).
    let top_strategies: Vec<StrategyHandle> = evo_report
        .history
        .iter()
        .sorted_by(|a, b| b.fitness.total_cmp(&a.fitness))
        .unique_by(|record| record.genome.name())
        .take(TOP_STRATEGIES)
        .map(|record| Arc::new(record.genome.clone()) as StrategyHandle)
        .collect();
    let top_strategies = if top_strategies.is_empty() {
        vec![Arc::new(evo_report.best_genome.clone()) as StrategyHandle]
    } else {
        top_strategies
    };

    // 4. Adaptive walk-forward geometry.
    let n = candles.len();
    let mut train_size = (n / 5).clamp(10, 50);
    let mut test_size = (n / 10).clamp(5, 25);
    let step_size = test_size;
    while train_size + test_size > n && train_size > 10 {
        train_size = (train_size - 5).max(10);
        test_size = (test_size.saturating_sub(2)).max(5);
    }

    // 5. Ranking: the backtester-only fallback is guaranteed to succeed;
    //    the full engine replaces it when it yields non-trivial scores.
    let mut ranking_results =
        fallback_ranking(&top_strategies, &candles, params.initial_capital);

    match StrategyRankingEngine::new(
        top_strategies.clone(),
        params.initial_capital / top_strategies.len() as f64,
        train_size,
        test_size,
        step_size,
        RANKING_SIMULATIONS,
        params.seed,
    )
    .and_then(|engine| engine.run(&candles))
    {
        Ok(full_results) => {
            if full_results
                .iter()
                .any(|r| r.composite_score.abs() > TRIVIAL_SCORE)
            {
                ranking_results = full_results;
            }
        }
        Err(err) => {
            warn!(error = %err, "full ranking failed, keeping fallback ranking");
        }
    }

    // 6. Lifecycle simulation over the pre-computed ranking.
    let lifecycle = PortfolioLifecycleManager::new(
        top_strategies,
        params.initial_capital,
        Box::new(StaticRanking::new(ranking_results.clone())),
        CapitalAllocator::new(params.allocator_mode),
        RebalancePolicy::new(params.rebalance_interval)?,
        Some(PerformanceDecayDetector::new(
            params.decay_threshold,
            DecayMetric::Sharpe,
        )),
    )?;
    let portfolio_result = lifecycle.run(&candles)?;

    // 7. Analytics over the lifecycle equity curve. The curve is clamped
    //    to a small positive floor because the analytics require strictly
    //    positive equity.
    let analytics_report = if portfolio_result.equity_curve.len() >= 2 {
        let safe_curve: Vec<f64> = portfolio_result
            .equity_curve
            .iter()
            .map(|&v| v.max(0.01))
            .collect();
        match PortfolioAnalytics::new(&safe_curve, None).and_then(|pa| pa.full_report()) {
            Ok(report) => Some(report),
            Err(err) => {
                warn!(error = %err, "analytics failed, returning empty analytics");
                None
            }
        }
    } else {
        None
    };

    Ok(PipelineReport {
        symbol: symbol.to_string(),
        candle_count: candles.len(),
        best_genome: Some(evo_report.best_genome),
        best_fitness: Some(evo_report.best_fitness),
        ranking_results,
        portfolio_result: Some(portfolio_result),
        analytics_report,
        error: None,
    })
}

/// Ranking built from the backtester alone; never fails. Strategies that
/// error during backtest get all-zero metrics.
fn fallback_ranking(
    strategies: &[StrategyHandle],
    candles: &[Candle],
    initial_capital: f64,
) -> Vec<RankingResult> {
    let backtester = Backtester::new(initial_capital / strategies.len() as f64);

    let mut results: Vec<RankingResult> = strategies
        .iter()
        .map(|strategy| {
            let (return_pct, sharpe, calmar, max_drawdown) =
                match backtester.run(candles, strategy.as_ref()) {
                    Ok(report) => (
                        report.return_pct,
                        report.sharpe_ratio,
                        report.calmar_ratio,
                        report.max_drawdown_pct,
                    ),
                    Err(_) => (0.0, 0.0, 0.0, 0.0),
                };

            RankingResult {
                strategy_name: strategy.name(),
                backtest: BacktestSummary {
                    return_pct,
                    sharpe_ratio: sharpe,
                    calmar_ratio: calmar,
                    max_drawdown_pct: max_drawdown,
                },
                stability: StabilitySummary {
                    stability_score: 0.0,
                },
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
                composite_score: sharpe - 0.5 * max_drawdown.abs(),
                rank: 0,
            }
        })
        .collect();

    sort_and_rank(&mut results);
    results
}
