//! Data loading and management
//!
//! CSV loading of OHLCV files, market data providers (CSV directory,
//! HTTP, in-memory) with a deterministic JSON file cache, and series
//! validation applied at every ingestion path.

pub mod cache;
pub mod provider;

pub use cache::JsonFileCache;
pub use provider::{
    CachedProvider, CsvDataProvider, HttpDataProvider, MarketDataProvider, StaticDataProvider,
};

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::types::Candle;

/// Load OHLCV data from a `datetime,open,high,low,close,volume` CSV file.
///
/// The loaded series is validated before it is returned; a file with
/// broken OHLC ranges or out-of-order rows is rejected as a whole.
pub fn load_csv(path: impl AsRef<Path>) -> Result<Vec<Candle>> {
    let mut reader = csv::Reader::from_path(path.as_ref()).context("Failed to open CSV file")?;

    let mut candles = Vec::new();

    for (row_idx, result) in reader.records().enumerate() {
        let record = result.context(format!("Failed to read row {}", row_idx + 1))?;

        let dt_str = record.get(0).context("Missing datetime column")?;
        let datetime = dt_str
            .parse::<DateTime<Utc>>()
            .or_else(|_| {
                // Try parsing without timezone and assume UTC
                chrono::NaiveDateTime::parse_from_str(dt_str, "%Y-%m-%d %H:%M:%S")
                    .map(|ndt| DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc))
            })
            .or_else(|_| {
                chrono::NaiveDate::parse_from_str(dt_str, "%Y-%m-%d").map(|date| {
                    DateTime::<Utc>::from_naive_utc_and_offset(
                        date.and_hms_opt(0, 0, 0).expect("midnight is valid"),
                        Utc,
                    )
                })
            })
            .context(format!("Failed to parse datetime: {dt_str}"))?;

        let open: f64 = record
            .get(1)
            .context("Missing open column")?
            .parse()
            .context("Failed to parse open")?;
        let high: f64 = record
            .get(2)
            .context("Missing high column")?
            .parse()
            .context("Failed to parse high")?;
        let low: f64 = record
            .get(3)
            .context("Missing low column")?
            .parse()
            .context("Failed to parse low")?;
        let close: f64 = record
            .get(4)
            .context("Missing close column")?
            .parse()
            .context("Failed to parse close")?;
        let volume: f64 = record
            .get(5)
            .context("Missing volume column")?
            .parse()
            .context("Failed to parse volume")?;

        candles.push(Candle {
            datetime,
            open,
            high,
            low,
            close,
            volume,
        });
    }

    ensure_valid_series(&path.as_ref().display().to_string(), &candles)?;

    Ok(candles)
}

/// Save candles to a CSV file under `data_dir`, returning the path.
pub fn save_to_csv(data_dir: impl AsRef<Path>, candles: &[Candle], filename: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(data_dir.as_ref()).context("Failed to create data dir")?;
    let filepath = data_dir.as_ref().join(filename);
    let mut file = File::create(&filepath).context("Failed to create output file")?;

    writeln!(file, "datetime,open,high,low,close,volume")?;

    for candle in candles {
        writeln!(
            file,
            "{},{},{},{},{},{}",
            candle.datetime.format("%Y-%m-%d %H:%M:%S"),
            candle.open,
            candle.high,
            candle.low,
            candle.close,
            candle.volume
        )?;
    }

    info!("Saved {} rows to {}", candles.len(), filepath.display());
    Ok(filepath)
}

/// Data-quality report for a candle series.
#[derive(Debug)]
pub struct SeriesValidation {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl SeriesValidation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate a candle series before it enters the research core.
///
/// Per-candle OHLC sanity delegates to [`Candle::validate`]; the series
/// itself must be strictly chronological. Zero-volume bars are warnings
/// only: halted sessions produce them legitimately. An empty series is
/// valid (the provider contract returns empty when there is no data).
pub fn validate_series(candles: &[Candle]) -> SeriesValidation {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for (i, candle) in candles.iter().enumerate() {
        if let Err(err) = candle.validate() {
            errors.push(format!("candle {i}: {err}"));
        }
        if candle.volume == 0.0 {
            warnings.push(format!("candle {i}: zero volume"));
        }
        if i > 0 && candle.datetime <= candles[i - 1].datetime {
            errors.push(format!(
                "candle {i}: timestamp {} does not advance past {}",
                candle.datetime,
                candles[i - 1].datetime
            ));
        }
    }

    SeriesValidation { errors, warnings }
}

/// Log warnings and reject the series on the first hard data error.
pub(crate) fn ensure_valid_series(source: &str, candles: &[Candle]) -> Result<()> {
    let report = validate_series(candles);
    for warning in &report.warnings {
        warn!("{source}: {warning}");
    }
    if let Some(first) = report.errors.first() {
        anyhow::bail!(
            "{source}: rejected candle series ({} data errors; first: {first})",
            report.errors.len()
        );
    }
    Ok(())
}
