//! Backtesting engine
//!
//! Deterministic replay of a single strategy over one candle slice. Two
//! execution modes share the same report contract: a buy-and-hold baseline
//! (no strategy supplied) and a signal-driven walk that feeds candles
//! through a fresh strategy instance.

use serde::Serialize;

use crate::error::{EngineError, Result};
use crate::strategies::{Strategy, StrategyFactory};
use crate::types::{Candle, PositionState, Signal};

/// Backtest engine.
///
/// Holds the starting cash and the per-side cost assumptions. Transaction
/// cost and slippage are percentages (e.g. `0.1` means 0.1%).
#[derive(Debug, Clone)]
pub struct Backtester {
    initial_cash: f64,
    transaction_cost_pct: f64,
    slippage_pct: f64,
}

/// Report produced by every backtest run.
#[derive(Debug, Clone, Serialize)]
pub struct BacktestReport {
    pub final_equity: f64,
    pub return_pct: f64,
    pub equity_curve: Vec<f64>,
    pub max_drawdown_pct: f64,
    pub returns_series: Vec<f64>,
    pub volatility_pct: f64,
    pub sharpe_ratio: f64,
    pub calmar_ratio: f64,
}

impl Backtester {
    pub fn new(initial_cash: f64) -> Self {
        Backtester {
            initial_cash,
            transaction_cost_pct: 0.0,
            slippage_pct: 0.0,
        }
    }

    pub fn with_costs(initial_cash: f64, transaction_cost_pct: f64, slippage_pct: f64) -> Self {
        Backtester {
            initial_cash,
            transaction_cost_pct,
            slippage_pct,
        }
    }

    pub fn initial_cash(&self) -> f64 {
        self.initial_cash
    }

    /// Buy-and-hold baseline: buy all cash at the first close (adjusted for
    /// slippage and entry cost), sell at the final close symmetrically.
    pub fn run_buy_and_hold(&self, candles: &[Candle]) -> Result<BacktestReport> {
        self.check_candles(candles)?;

        let buy_price = candles[0].close * (1.0 + self.slippage_pct / 100.0);
        let sell_price = candles[candles.len() - 1].close * (1.0 - self.slippage_pct / 100.0);
        let cash_after_entry_cost = self.initial_cash * (1.0 - self.transaction_cost_pct / 100.0);
        let shares = cash_after_entry_cost / buy_price;

        let equity_curve: Vec<f64> = candles.iter().map(|c| shares * c.close).collect();

        let gross_exit = shares * sell_price;
        let final_equity = gross_exit * (1.0 - self.transaction_cost_pct / 100.0);

        Ok(self.report_from_curve(equity_curve, final_equity))
    }

    /// Signal-driven run: builds a fresh strategy from `factory`, then
    /// walks the candles converting BUY/SELL signals into all-in entries
    /// and full liquidations at the close, with slippage and transaction
    /// cost applied on both sides.
    pub fn run(&self, candles: &[Candle], factory: &dyn StrategyFactory) -> Result<BacktestReport> {
        self.check_candles(candles)?;

        let mut strategy = factory.build();
        let signals = strategy.generate(candles);

        let mut cash = self.initial_cash;
        let mut shares = 0.0_f64;
        let mut state = PositionState::Flat;
        let mut equity_curve = Vec::with_capacity(candles.len());

        for (candle, signal) in candles.iter().zip(signals.iter()) {
            let close = candle.close;
            match signal {
                Signal::Buy if state == PositionState::Flat && cash > 0.0 => {
                    let exec_price = close * (1.0 + self.slippage_pct / 100.0);
                    let spendable = cash * (1.0 - self.transaction_cost_pct / 100.0);
                    shares = spendable / exec_price;
                    cash = 0.0;
                    state = PositionState::Long;
                }
                Signal::Sell if state == PositionState::Long => {
                    let exec_price = close * (1.0 - self.slippage_pct / 100.0);
                    let proceeds = shares * exec_price;
                    cash = proceeds * (1.0 - self.transaction_cost_pct / 100.0);
                    shares = 0.0;
                    state = PositionState::Flat;
                }
                _ => {}
            }
            equity_curve.push(cash + shares * close);
        }

        let final_equity = *equity_curve
            .last()
            .expect("equity curve is non-empty for >= 2 candles");
        Ok(self.report_from_curve(equity_curve, final_equity))
    }

    fn check_candles(&self, candles: &[Candle]) -> Result<()> {
        if candles.len() < 2 {
            return Err(EngineError::invalid(
                "candles",
                format!("backtest requires at least 2 candles, got {}", candles.len()),
            ));
        }
        Ok(())
    }

    /// Shared analytics over an equity curve: drawdown, per-period returns,
    /// Bessel-corrected volatility, Sharpe and Calmar.
    fn report_from_curve(&self, equity_curve: Vec<f64>, final_equity: f64) -> BacktestReport {
        let return_pct = (final_equity - self.initial_cash) / self.initial_cash * 100.0;

        let max_drawdown_pct = max_drawdown_pct(&equity_curve);

        let mut returns_series = Vec::with_capacity(equity_curve.len());
        returns_series.push(0.0);
        for pair in equity_curve.windows(2) {
            returns_series.push((pair[1] - pair[0]) / pair[0]);
        }

        // Statistics run over the actual per-period returns; the leading
        // 0.0 in `returns_series` is a positional sentinel, not a sample.
        let returns = &returns_series[1..];
        let n = returns.len();
        let mean_return = if n > 0 {
            returns.iter().sum::<f64>() / n as f64
        } else {
            0.0
        };
        let volatility_pct = if n < 2 {
            0.0
        } else {
            let variance = returns
                .iter()
                .map(|r| (r - mean_return).powi(2))
                .sum::<f64>()
                / (n - 1) as f64;
            variance.sqrt() * 100.0
        };

        let std_dev = volatility_pct / 100.0;
        let sharpe_ratio = if std_dev != 0.0 {
            mean_return / std_dev
        } else {
            0.0
        };

        let calmar_ratio = if max_drawdown_pct != 0.0 {
            return_pct / max_drawdown_pct.abs()
        } else {
            0.0
        };

        BacktestReport {
            final_equity,
            return_pct,
            equity_curve,
            max_drawdown_pct,
            returns_series,
            volatility_pct,
            sharpe_ratio,
            calmar_ratio,
        }
    }
}

/// Running peak-to-trough drawdown, expressed as a percentage of the
/// running peak. Non-positive; 0.0 for a non-decreasing curve.
pub fn max_drawdown_pct(equity_curve: &[f64]) -> f64 {
    let Some(&first) = equity_curve.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0;
    for &v in equity_curve {
        if v > peak {
            peak = v;
        }
        let dd = (v - peak) / peak * 100.0;
        if dd < max_dd {
            max_dd = dd;
        }
    }
    max_dd
}
