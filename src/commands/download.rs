//! Download command: fetch candles over HTTP into the CSV data dir.

use anyhow::{Context, Result};
use chrono::NaiveDate;

use quant_research::data::{save_to_csv, HttpDataProvider, MarketDataProvider};

pub fn run(
    symbols: String,
    start: String,
    end: String,
    interval: String,
    output: String,
) -> Result<()> {
    let start: NaiveDate = start.parse().context("invalid start date")?;
    let end: NaiveDate = end.parse().context("invalid end date")?;

    let provider = HttpDataProvider::new()?;

    for symbol in symbols.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let candles = provider
            .get_historical(symbol, start, end, &interval)
            .with_context(|| format!("download failed for {symbol}"))?;

        if candles.is_empty() {
            tracing::warn!("no data for {symbol}");
            continue;
        }

        let filename = format!("{symbol}_{interval}.csv");
        let path = save_to_csv(&output, &candles, &filename)?;
        println!("{symbol}: {} candles -> {}", candles.len(), path.display());
    }

    Ok(())
}
