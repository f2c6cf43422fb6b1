//! Drawdown analysis for an equity curve
//!
//! `DD_t = (E_t - Peak_t) / Peak_t` where `Peak_t` is the running maximum.

use crate::analytics::risk_metrics::check_equity_curve;
use crate::error::Result;

/// Drawdown analytics for a single equity curve.
///
/// Accepts curves of length >= 1 (unlike the other analytics, a single
/// point still has a well-defined, zero drawdown).
#[derive(Debug, Clone)]
pub struct DrawdownAnalytics {
    curve: Vec<f64>,
    series: Vec<f64>,
}

impl DrawdownAnalytics {
    pub fn new(equity_curve: &[f64]) -> Result<Self> {
        check_equity_curve(equity_curve, 1)?;

        let mut series = Vec::with_capacity(equity_curve.len());
        let mut peak = equity_curve[0];
        for &v in equity_curve {
            if v > peak {
                peak = v;
            }
            series.push((v - peak) / peak);
        }

        Ok(DrawdownAnalytics {
            curve: equity_curve.to_vec(),
            series,
        })
    }

    /// The full drawdown series; every entry is <= 0.
    pub fn drawdown_series(&self) -> &[f64] {
        &self.series
    }

    /// Most negative drawdown; 0.0 for a non-decreasing curve.
    pub fn max_drawdown(&self) -> f64 {
        self.series
            .iter()
            .copied()
            .fold(0.0_f64, f64::min)
    }

    /// Index of the trough of the maximum drawdown (first occurrence).
    fn trough_index(&self) -> usize {
        let mut min_dd = f64::INFINITY;
        let mut idx = 0;
        for (i, &dd) in self.series.iter().enumerate() {
            if dd < min_dd {
                min_dd = dd;
                idx = i;
            }
        }
        idx
    }

    /// Periods from the peak that caused the maximum drawdown to the first
    /// full recovery (equity back at the peak), or to the series end when
    /// no recovery occurs.
    pub fn max_drawdown_duration(&self) -> usize {
        let n = self.curve.len();
        if n == 1 {
            return 0;
        }

        let trough_idx = self.trough_index();

        // The last maximum at or before the trough is the causing peak.
        let mut peak_val = self.curve[trough_idx];
        let mut peak_idx = trough_idx;
        for (i, &v) in self.curve.iter().enumerate().take(trough_idx + 1) {
            if v >= peak_val {
                peak_val = v;
                peak_idx = i;
            }
        }

        for (i, &v) in self.curve.iter().enumerate().skip(peak_idx + 1) {
            if v >= peak_val {
                return i - peak_idx;
            }
        }

        n - 1 - peak_idx
    }

    /// Mean of the strictly negative drawdown entries; 0.0 if there are
    /// none.
    pub fn average_drawdown(&self) -> f64 {
        let negative: Vec<f64> = self.series.iter().copied().filter(|&d| d < 0.0).collect();
        if negative.is_empty() {
            return 0.0;
        }
        negative.iter().sum::<f64>() / negative.len() as f64
    }

    /// Periods from the trough of the maximum drawdown to the first point
    /// where equity reaches the preceding peak again; 0 for a curve that
    /// never draws down, or the remaining periods when no recovery occurs.
    pub fn recovery_time(&self) -> usize {
        let n = self.curve.len();
        if n == 1 || self.max_drawdown() == 0.0 {
            return 0;
        }

        let trough_idx = self.trough_index();
        let peak_val = self.curve[..=trough_idx]
            .iter()
            .copied()
            .fold(f64::MIN, f64::max);

        for (i, &v) in self.curve.iter().enumerate().skip(trough_idx + 1) {
            if v >= peak_val {
                return i - trough_idx;
            }
        }

        n - 1 - trough_idx
    }
}
