//! Research command: run the full pipeline per symbol and print the
//! ranked tables.

use anyhow::{Context, Result};
use chrono::NaiveDate;

use quant_research::config::ResearchConfig;
use quant_research::data::{
    CachedProvider, CsvDataProvider, HttpDataProvider, JsonFileCache, MarketDataProvider,
};
use quant_research::pipeline::{run_full_pipeline, PipelineParams, PipelineReport};
use quant_research::types::Symbol;

pub fn run(
    config: Option<String>,
    symbols: String,
    start: String,
    end: String,
    source: String,
    output: Option<String>,
) -> Result<()> {
    let config = match config {
        Some(path) => ResearchConfig::from_file(&path)
            .with_context(|| format!("failed to load config {path}"))?,
        None => ResearchConfig::default(),
    };

    let symbols: Vec<Symbol> = symbols
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Symbol::new)
        .collect();
    if symbols.is_empty() {
        anyhow::bail!("no symbols given");
    }

    let start: NaiveDate = start.parse().context("invalid start date")?;
    let end: NaiveDate = end.parse().context("invalid end date")?;

    let params = PipelineParams {
        initial_capital: config.portfolio.initial_capital,
        population_size: config.evolution.population_size,
        generations: config.evolution.generations,
        mutation_rate: config.evolution.mutation_rate,
        crossover_rate: config.evolution.crossover_rate,
        elitism: config.evolution.elitism,
        tournament_size: config.evolution.tournament_size,
        rebalance_interval: config.portfolio.rebalance_interval,
        decay_threshold: config.portfolio.decay_threshold,
        allocator_mode: config.portfolio.allocator_mode.parse()?,
        seed: config.seed,
    };

    let provider: Box<dyn MarketDataProvider> = match source.as_str() {
        "csv" => Box::new(CsvDataProvider::new(&config.data.data_dir)),
        "http" => {
            let cache = JsonFileCache::new(&config.data.cache_dir)?;
            Box::new(CachedProvider::new(HttpDataProvider::new()?, cache))
        }
        other => anyhow::bail!("unknown data source {other:?}; expected csv or http"),
    };

    let mut reports = Vec::with_capacity(symbols.len());
    for symbol in &symbols {
        let report = run_full_pipeline(symbol.as_str(), start, end, provider.as_ref(), &params)?;
        print_report(&report);
        reports.push(report);
    }

    if let Some(path) = output {
        // A single symbol writes one report object; several write an array.
        let json = if reports.len() == 1 {
            serde_json::to_string_pretty(&reports[0])?
        } else {
            serde_json::to_string_pretty(&reports)?
        };
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write report to {path}"))?;
        println!("Report written to {path}");
    }

    Ok(())
}

fn print_report(report: &PipelineReport) {
    println!("Research report for {}", report.symbol);
    println!("  Candles: {}", report.candle_count);

    if let Some(error) = &report.error {
        println!("  Error: {error}");
        return;
    }

    if let (Some(genome), Some(fitness)) = (&report.best_genome, report.best_fitness) {
        println!("  Best genome: {genome} (fitness {fitness:.4})");
    }

    println!("  Rankings:");
    println!(
        "    {:<4} {:<18} {:>8} {:>8} {:>9} {:>10}",
        "rank", "strategy", "sharpe", "calmar", "max dd%", "composite"
    );
    for entry in &report.ranking_results {
        println!(
            "    {:<4} {:<18} {:>8.3} {:>8.3} {:>9.2} {:>10.3}",
            entry.rank,
            entry.strategy_name,
            entry.backtest.sharpe_ratio,
            entry.backtest.calmar_ratio,
            entry.backtest.max_drawdown_pct,
            entry.composite_score,
        );
    }

    if let Some(portfolio) = &report.portfolio_result {
        println!(
            "  Final portfolio equity: {:.2}",
            portfolio.final_portfolio_equity
        );
        println!("  Rebalances: {}", portfolio.rebalance_steps.len());
        if !portfolio.disabled_strategies.is_empty() {
            println!("  Disabled: {}", portfolio.disabled_strategies.join(", "));
        }
    }

    if let Some(analytics) = &report.analytics_report {
        println!("  Analytics:");
        println!("    Total return: {:.2}%", analytics.total_return * 100.0);
        println!("    CAGR:         {:.2}%", analytics.cagr * 100.0);
        println!("    Sharpe:       {:.3}", analytics.sharpe);
        println!("    Sortino:      {:.3}", analytics.sortino);
        println!("    Max drawdown: {:.2}%", analytics.max_drawdown * 100.0);
        if let Some(var) = analytics.var_95_hist {
            println!("    VaR (95%, hist):  {:.4}", var);
        }
        if let Some(var) = analytics.var_95_param {
            println!("    VaR (95%, param): {:.4}", var);
        }
    }
}
