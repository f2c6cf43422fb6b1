//! Market data providers
//!
//! The [`MarketDataProvider`] contract plus three implementations: a CSV
//! directory reader, a Yahoo-chart-style HTTP fetcher, and a caching
//! decorator that works with any of them.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{NaiveDate, TimeZone, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use crate::data::cache::JsonFileCache;
use crate::data::load_csv;
use crate::types::Candle;

/// Contract for historical market data.
///
/// `start` and `end` are inclusive ISO `YYYY-MM-DD` dates. The returned
/// candles are chronologically ordered; an empty vector means the
/// provider has no data for the request.
pub trait MarketDataProvider {
    fn get_historical(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: &str,
    ) -> Result<Vec<Candle>>;
}

fn in_range(candle: &Candle, start: NaiveDate, end: NaiveDate) -> bool {
    let date = candle.datetime.date_naive();
    date >= start && date <= end
}

/// Provider backed by `{symbol}_{interval}.csv` files in a directory.
pub struct CsvDataProvider {
    data_dir: PathBuf,
}

impl CsvDataProvider {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        CsvDataProvider {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }
}

impl MarketDataProvider for CsvDataProvider {
    fn get_historical(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: &str,
    ) -> Result<Vec<Candle>> {
        let path = self.data_dir.join(format!("{symbol}_{interval}.csv"));
        if !path.exists() {
            warn!("data file not found: {}", path.display());
            return Ok(Vec::new());
        }

        let mut candles: Vec<Candle> = load_csv(&path)?
            .into_iter()
            .filter(|c| in_range(c, start, end))
            .collect();
        candles.sort_by_key(|c| c.datetime);

        info!("loaded {} candles for {} from CSV", candles.len(), symbol);
        Ok(candles)
    }
}

/// Provider backed by a Yahoo-style public chart endpoint.
///
/// No API key is required for the default endpoint; `with_base_url`
/// exists for self-hosted mirrors and tests.
pub struct HttpDataProvider {
    base_url: String,
    client: reqwest::blocking::Client,
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartPayload,
}

#[derive(Debug, Deserialize)]
struct ChartPayload {
    result: Option<Vec<ChartResult>>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<f64>>,
}

const DEFAULT_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

impl HttpDataProvider {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_CHART_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .user_agent("quant-research/0.1")
            .build()
            .context("failed to build HTTP client")?;
        Ok(HttpDataProvider {
            base_url: base_url.into(),
            client,
        })
    }
}

impl MarketDataProvider for HttpDataProvider {
    fn get_historical(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: &str,
    ) -> Result<Vec<Candle>> {
        let period1 = start
            .and_hms_opt(0, 0, 0)
            .map(|dt| Utc.from_utc_datetime(&dt).timestamp())
            .unwrap_or(0);
        // End date is inclusive: request through the end of that day.
        let period2 = end
            .and_hms_opt(23, 59, 59)
            .map(|dt| Utc.from_utc_datetime(&dt).timestamp())
            .unwrap_or(0);

        let url = format!("{}/{symbol}", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", interval.to_string()),
            ])
            .send()
            .with_context(|| format!("request failed for {symbol}"))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("provider returned HTTP {status} for {symbol}");
        }

        let parsed: ChartResponse = response
            .json()
            .with_context(|| format!("malformed chart payload for {symbol}"))?;

        if let Some(error) = parsed.chart.error {
            if !error.is_null() {
                anyhow::bail!("provider error for {symbol}: {error}");
            }
        }

        let Some(results) = parsed.chart.result else {
            return Ok(Vec::new());
        };
        let Some(result) = results.into_iter().next() else {
            return Ok(Vec::new());
        };
        let Some(timestamps) = result.timestamp else {
            return Ok(Vec::new());
        };
        let Some(quote) = result.indicators.quote.into_iter().next() else {
            return Ok(Vec::new());
        };

        let mut candles = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let bar = (
                quote.open.get(i).copied().flatten(),
                quote.high.get(i).copied().flatten(),
                quote.low.get(i).copied().flatten(),
                quote.close.get(i).copied().flatten(),
                quote.volume.get(i).copied().flatten(),
            );
            // Bars with missing fields (halts, partial sessions) are skipped.
            if let (Some(open), Some(high), Some(low), Some(close), Some(volume)) = bar {
                let Some(datetime) = chrono::DateTime::from_timestamp(ts, 0) else {
                    continue;
                };
                candles.push(Candle {
                    datetime,
                    open,
                    high,
                    low,
                    close,
                    volume,
                });
            }
        }

        candles.retain(|c| in_range(c, start, end));
        candles.sort_by_key(|c| c.datetime);
        candles.dedup_by_key(|c| c.datetime);

        // Sorting and dedup fix the ordering; OHLC sanity still depends
        // on the endpoint, so the assembled series is checked before it
        // enters the research core.
        crate::data::ensure_valid_series(symbol, &candles)?;

        info!("fetched {} candles for {} over HTTP", candles.len(), symbol);
        Ok(candles)
    }
}

/// Caching decorator: consults a [`JsonFileCache`] before fetching, and
/// stores fresh responses under the deterministic request key.
pub struct CachedProvider<P: MarketDataProvider> {
    inner: P,
    cache: JsonFileCache,
}

impl<P: MarketDataProvider> CachedProvider<P> {
    pub fn new(inner: P, cache: JsonFileCache) -> Self {
        CachedProvider { inner, cache }
    }
}

impl<P: MarketDataProvider> MarketDataProvider for CachedProvider<P> {
    fn get_historical(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: &str,
    ) -> Result<Vec<Candle>> {
        let key = JsonFileCache::make_key(
            symbol,
            &start.to_string(),
            &end.to_string(),
            interval,
        );
        if self.cache.has(&key) {
            return self.cache.get(&key);
        }

        let candles = self.inner.get_historical(symbol, start, end, interval)?;
        self.cache.set(&key, &candles)?;
        Ok(candles)
    }
}

/// In-memory provider used by tests and offline pipelines.
pub struct StaticDataProvider {
    candles: BTreeMap<String, Vec<Candle>>,
}

impl StaticDataProvider {
    pub fn new() -> Self {
        StaticDataProvider {
            candles: BTreeMap::new(),
        }
    }

    pub fn with_candles(mut self, symbol: impl Into<String>, candles: Vec<Candle>) -> Self {
        self.candles.insert(symbol.into(), candles);
        self
    }
}

impl Default for StaticDataProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketDataProvider for StaticDataProvider {
    fn get_historical(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        _interval: &str,
    ) -> Result<Vec<Candle>> {
        Ok(self
            .candles
            .get(symbol)
            .map(|candles| {
                candles
                    .iter()
                    .filter(|c| in_range(c, start, end))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::test_support::candles_from_closes;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_static_provider_filters_by_range() {
        let candles = candles_from_closes(&[100.0, 101.0, 102.0, 103.0, 104.0]);
        let provider = StaticDataProvider::new().with_candles("TEST", candles);

        let all = provider
            .get_historical("TEST", date("2023-01-01"), date("2023-01-05"), "1d")
            .unwrap();
        assert_eq!(all.len(), 5);

        let some = provider
            .get_historical("TEST", date("2023-01-02"), date("2023-01-03"), "1d")
            .unwrap();
        assert_eq!(some.len(), 2);

        let none = provider
            .get_historical("OTHER", date("2023-01-01"), date("2023-01-05"), "1d")
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_cached_provider_serves_second_request_from_cache() {
        let dir = std::env::temp_dir().join(format!(
            "quant-research-provider-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        let cache = JsonFileCache::new(&dir).unwrap();

        let candles = candles_from_closes(&[100.0, 110.0]);
        let provider =
            CachedProvider::new(StaticDataProvider::new().with_candles("TEST", candles), cache);

        let first = provider
            .get_historical("TEST", date("2023-01-01"), date("2023-01-02"), "1d")
            .unwrap();
        let second = provider
            .get_historical("TEST", date("2023-01-01"), date("2023-01-02"), "1d")
            .unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 2);
        assert_eq!(first[0].close, second[0].close);
    }

    #[test]
    fn test_csv_provider_missing_file_returns_empty() {
        let provider = CsvDataProvider::new("definitely-missing-dir");
        let candles = provider
            .get_historical("NOPE", date("2023-01-01"), date("2023-01-02"), "1d")
            .unwrap();
        assert!(candles.is_empty());
    }
}
