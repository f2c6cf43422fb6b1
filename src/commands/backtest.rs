//! Backtest command: run one strategy (or buy-and-hold) over a CSV file.

use anyhow::{Context, Result};

use quant_research::backtest::Backtester;
use quant_research::data::load_csv;
use quant_research::genome::Genome;

pub fn run(
    data: String,
    capital: f64,
    genome: Option<String>,
    cost: f64,
    slippage: f64,
) -> Result<()> {
    let candles = load_csv(&data).context("failed to load candle data")?;
    tracing::info!("loaded {} candles from {}", candles.len(), data);

    let backtester = Backtester::with_costs(capital, cost, slippage);

    let (label, report) = match genome {
        Some(json) => {
            let genome: Genome =
                serde_json::from_str(&json).context("failed to parse genome JSON")?;
            genome
                .validate()
                .context("genome parameters out of bounds")?;
            let report = backtester.run(&candles, &genome)?;
            (genome.name(), report)
        }
        None => {
            let report = backtester.run_buy_and_hold(&candles)?;
            ("BuyAndHold".to_string(), report)
        }
    };

    println!("Backtest: {label}");
    println!("  Candles:        {}", candles.len());
    println!("  Final equity:   {:.2}", report.final_equity);
    println!("  Return:         {:.2}%", report.return_pct);
    println!("  Max drawdown:   {:.2}%", report.max_drawdown_pct);
    println!("  Volatility:     {:.4}%", report.volatility_pct);
    println!("  Sharpe ratio:   {:.4}", report.sharpe_ratio);
    println!("  Calmar ratio:   {:.4}", report.calmar_ratio);

    Ok(())
}
