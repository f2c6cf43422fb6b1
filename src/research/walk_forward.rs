//! Walk-forward analysis
//!
//! Repeatedly backtests a strategy on a training window and on the
//! immediately following out-of-sample test window, sliding both forward
//! by `step_size` candles. Every fold gets a fresh backtest; no state
//! survives between slices. The headline aggregate is the performance
//! decay: `mean_test_sharpe - mean_train_sharpe`.

use serde::Serialize;

use crate::backtest::Backtester;
use crate::error::{EngineError, Result};
use crate::strategies::StrategyFactory;
use crate::types::Candle;

/// Per-fold metrics.
#[derive(Debug, Clone, Serialize)]
pub struct FoldMetrics {
    pub train_sharpe: f64,
    pub test_sharpe: f64,
    pub train_drawdown: f64,
    pub test_drawdown: f64,
    pub train_return: f64,
    pub test_return: f64,
}

/// Walk-forward aggregates.
#[derive(Debug, Clone, Serialize)]
pub struct WalkForwardReport {
    pub windows: Vec<FoldMetrics>,
    pub mean_train_sharpe: f64,
    pub mean_test_sharpe: f64,
    /// Bessel-corrected sample variance of the test Sharpes; 0.0 when
    /// exactly one fold exists.
    pub test_sharpe_variance: f64,
    pub performance_decay: f64,
}

pub(crate) fn validate_geometry(
    candles_len: usize,
    train_size: usize,
    test_size: usize,
    step_size: usize,
) -> Result<()> {
    if train_size < 2 {
        return Err(EngineError::invalid(
            "train_size",
            format!("must be >= 2, got {train_size}"),
        ));
    }
    if test_size < 2 {
        return Err(EngineError::invalid(
            "test_size",
            format!("must be >= 2, got {test_size}"),
        ));
    }
    if step_size < 1 {
        return Err(EngineError::invalid(
            "step_size",
            format!("must be >= 1, got {step_size}"),
        ));
    }
    if candles_len < train_size + test_size {
        return Err(EngineError::invalid(
            "candles",
            format!(
                "dataset too small: need at least {} candles for one window, got {candles_len}",
                train_size + test_size
            ),
        ));
    }
    Ok(())
}

/// Run a walk-forward analysis over `candles`.
pub fn walk_forward_analysis(
    strategy: &dyn StrategyFactory,
    candles: &[Candle],
    train_size: usize,
    test_size: usize,
    step_size: usize,
    initial_cash: f64,
) -> Result<WalkForwardReport> {
    validate_geometry(candles.len(), train_size, test_size, step_size)?;

    let backtester = Backtester::new(initial_cash);
    let mut windows = Vec::new();
    let mut pos = 0;

    loop {
        let train_end = pos + train_size;
        let test_end = train_end + test_size;
        if test_end > candles.len() {
            break;
        }

        let train = backtester.run(&candles[pos..train_end], strategy)?;
        let test = backtester.run(&candles[train_end..test_end], strategy)?;

        windows.push(FoldMetrics {
            train_sharpe: train.sharpe_ratio,
            test_sharpe: test.sharpe_ratio,
            train_drawdown: train.max_drawdown_pct,
            test_drawdown: test.max_drawdown_pct,
            train_return: train.return_pct,
            test_return: test.return_pct,
        });

        pos += step_size;
    }

    let n = windows.len();
    let mean_train_sharpe = windows.iter().map(|w| w.train_sharpe).sum::<f64>() / n as f64;
    let mean_test_sharpe = windows.iter().map(|w| w.test_sharpe).sum::<f64>() / n as f64;

    let test_sharpe_variance = if n > 1 {
        windows
            .iter()
            .map(|w| (w.test_sharpe - mean_test_sharpe).powi(2))
            .sum::<f64>()
            / (n - 1) as f64
    } else {
        0.0
    };

    Ok(WalkForwardReport {
        mean_train_sharpe,
        mean_test_sharpe,
        test_sharpe_variance,
        performance_decay: mean_test_sharpe - mean_train_sharpe,
        windows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::test_support::candles_from_closes;
    use crate::strategies::BuyAndHold;

    fn rising(n: usize) -> Vec<Candle> {
        let closes: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
        candles_from_closes(&closes)
    }

    #[test]
    fn test_fold_count_with_step() {
        // 20 candles, train 8, test 4, step 4: folds at pos 0, 4, 8.
        let report =
            walk_forward_analysis(&BuyAndHold, &rising(20), 8, 4, 4, 1000.0).unwrap();
        assert_eq!(report.windows.len(), 3);
    }

    #[test]
    fn test_incomplete_test_window_stops_iteration() {
        // 13 candles, train 8, test 4, step 4: only pos 0 fits.
        let report =
            walk_forward_analysis(&BuyAndHold, &rising(13), 8, 4, 4, 1000.0).unwrap();
        assert_eq!(report.windows.len(), 1);
        assert_eq!(report.test_sharpe_variance, 0.0);
    }

    #[test]
    fn test_decay_is_test_minus_train() {
        let report =
            walk_forward_analysis(&BuyAndHold, &rising(24), 8, 4, 4, 1000.0).unwrap();
        assert!(
            (report.performance_decay - (report.mean_test_sharpe - report.mean_train_sharpe))
                .abs()
                < 1e-12
        );
    }

    #[test]
    fn test_parameter_domains() {
        let candles = rising(20);
        assert!(walk_forward_analysis(&BuyAndHold, &candles, 1, 4, 4, 1000.0).is_err());
        assert!(walk_forward_analysis(&BuyAndHold, &candles, 8, 1, 4, 1000.0).is_err());
        assert!(walk_forward_analysis(&BuyAndHold, &candles, 8, 4, 0, 1000.0).is_err());
        assert!(walk_forward_analysis(&BuyAndHold, &rising(5), 8, 4, 4, 1000.0).is_err());
    }
}
