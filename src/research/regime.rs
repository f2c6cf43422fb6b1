//! Regime splitting and cross-regime stability
//!
//! Splits a candle history into sequential, non-overlapping windows, runs
//! the strategy over each, and aggregates per-window Sharpe and drawdown
//! into a single stability score.

use serde::Serialize;

use crate::backtest::{BacktestReport, Backtester};
use crate::error::{EngineError, Result};
use crate::strategies::StrategyFactory;
use crate::types::Candle;

/// Split `candles` into sequential, non-overlapping windows of
/// `window_size` candles.
///
/// A trailing remainder of length 1 is dropped; a remainder of length >= 2
/// is kept. The input is not mutated; each window is a copied slice.
pub fn split_into_time_windows(candles: &[Candle], window_size: usize) -> Result<Vec<Vec<Candle>>> {
    if window_size < 2 {
        return Err(EngineError::invalid(
            "window_size",
            format!("must be >= 2, got {window_size}"),
        ));
    }
    if candles.len() < window_size {
        return Err(EngineError::invalid(
            "candles",
            format!(
                "not enough candles: need at least {window_size}, got {}",
                candles.len()
            ),
        ));
    }

    let mut windows = Vec::new();
    let mut start = 0;
    while start < candles.len() {
        let end = (start + window_size).min(candles.len());
        let slice = &candles[start..end];
        if slice.len() >= 2 {
            windows.push(slice.to_vec());
        }
        start = end;
    }

    Ok(windows)
}

/// Cross-regime stability summary.
#[derive(Debug, Clone, Serialize)]
pub struct StabilityReport {
    pub regime_metrics: Vec<BacktestReport>,
    pub mean_sharpe: f64,
    pub sharpe_variance: f64,
    pub worst_drawdown: f64,
    pub stability_score: f64,
}

/// Run `strategy` across every time window and aggregate consistency
/// metrics. `stability_score = mean_sharpe - sharpe_variance -
/// |worst_drawdown| / 100`.
pub fn analyze_stability(
    strategy: &dyn StrategyFactory,
    candles: &[Candle],
    window_size: usize,
    initial_cash: f64,
) -> Result<StabilityReport> {
    let windows = split_into_time_windows(candles, window_size)?;

    let backtester = Backtester::new(initial_cash);
    let mut regime_metrics = Vec::with_capacity(windows.len());
    for window in &windows {
        regime_metrics.push(backtester.run(window, strategy)?);
    }

    let sharpes: Vec<f64> = regime_metrics.iter().map(|m| m.sharpe_ratio).collect();
    let n = sharpes.len();
    let mean_sharpe = sharpes.iter().sum::<f64>() / n as f64;

    let sharpe_variance = if n > 1 {
        sharpes
            .iter()
            .map(|s| (s - mean_sharpe).powi(2))
            .sum::<f64>()
            / (n - 1) as f64
    } else {
        0.0
    };

    let worst_drawdown = regime_metrics
        .iter()
        .map(|m| m.max_drawdown_pct)
        .fold(f64::INFINITY, f64::min);

    let stability_score = mean_sharpe - sharpe_variance - worst_drawdown.abs() / 100.0;

    Ok(StabilityReport {
        regime_metrics,
        mean_sharpe,
        sharpe_variance,
        worst_drawdown,
        stability_score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::test_support::candles_from_closes;
    use crate::strategies::BuyAndHold;

    #[test]
    fn test_split_exact_multiple() {
        let candles = candles_from_closes(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let windows = split_into_time_windows(&candles, 3).unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].len(), 3);
        assert_eq!(windows[1].len(), 3);
    }

    #[test]
    fn test_split_drops_singleton_remainder() {
        let candles = candles_from_closes(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        let windows = split_into_time_windows(&candles, 3).unwrap();
        // 3 + 3 + 1: the trailing single candle is dropped.
        assert_eq!(windows.len(), 2);
    }

    #[test]
    fn test_split_keeps_remainder_of_two() {
        let candles = candles_from_closes(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let windows = split_into_time_windows(&candles, 3).unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[1].len(), 2);
    }

    #[test]
    fn test_split_validates_inputs() {
        let candles = candles_from_closes(&[1.0, 2.0, 3.0]);
        assert!(split_into_time_windows(&candles, 1).is_err());
        assert!(split_into_time_windows(&candles, 4).is_err());
    }

    #[test]
    fn test_stability_score_formula() {
        let candles = candles_from_closes(&[
            100.0, 105.0, 110.0, 108.0, 112.0, 118.0, 115.0, 121.0, 126.0, 124.0,
        ]);
        let report = analyze_stability(&BuyAndHold, &candles, 5, 1000.0).unwrap();

        assert_eq!(report.regime_metrics.len(), 2);
        let expected = report.mean_sharpe - report.sharpe_variance
            - report.worst_drawdown.abs() / 100.0;
        assert!((report.stability_score - expected).abs() < 1e-12);
    }

    #[test]
    fn test_single_window_has_zero_variance() {
        let candles = candles_from_closes(&[100.0, 101.0, 102.0]);
        let report = analyze_stability(&BuyAndHold, &candles, 3, 1000.0).unwrap();
        assert_eq!(report.sharpe_variance, 0.0);
    }
}
