//! Trading strategy framework
//!
//! Defines the [`Strategy`] trait, the [`StrategyFactory`] abstraction that
//! engines use to build fresh strategy instances per run, and the genome
//! factory dispatching over the three parameterized families.
//!
//! ## Available strategies
//!
//! - `moving_average`: simple-moving-average crossover
//! - `rsi`: mean-reversion on the relative strength index
//! - `breakout`: rolling high/low channel breakout
//! - `BuyAndHold`: buys the first candle and holds (baseline)

pub mod breakout;
pub mod moving_average;
pub mod rsi;

pub use breakout::BreakoutStrategy;
pub use moving_average::MovingAverageCrossover;
pub use rsi::RsiStrategy;

use std::sync::Arc;

use crate::genome::Genome;
use crate::types::{Candle, PositionState, Signal};

/// Trading strategy trait.
///
/// Strategies are stateful: they accumulate price history and track their
/// own `{FLAT, LONG}` position across `generate_signal` calls. All
/// implementations must be deterministic functions of their parameters and
/// the candle sequence; no hidden global state.
pub trait Strategy: Send {
    /// Produce a signal for the next candle in the sequence.
    fn generate_signal(&mut self, candle: &Candle) -> Signal;

    /// Vector form used by the backtester: one signal per candle, in order.
    fn generate(&mut self, candles: &[Candle]) -> Vec<Signal> {
        candles.iter().map(|c| self.generate_signal(c)).collect()
    }
}

/// Builds fresh [`Strategy`] instances.
///
/// The research engines (backtest, stability, walk-forward, ranking) each
/// need a brand-new strategy per candle slice so that no price history
/// leaks between runs. A factory captures the parameters once and stamps
/// out instances on demand.
pub trait StrategyFactory: Send + Sync {
    /// Stable display name used in rankings and allocation maps.
    fn name(&self) -> String;

    /// Build a fresh instance with empty history and FLAT position.
    fn build(&self) -> Box<dyn Strategy>;
}

/// Shared handle to a strategy factory.
pub type StrategyHandle = Arc<dyn StrategyFactory>;

impl StrategyFactory for Genome {
    fn name(&self) -> String {
        Genome::name(self)
    }

    fn build(&self) -> Box<dyn Strategy> {
        match *self {
            Genome::MovingAverage { short, long } => {
                Box::new(MovingAverageCrossover::new(short as usize, long as usize))
            }
            Genome::Rsi {
                period,
                overbought,
                oversold,
            } => Box::new(RsiStrategy::new(
                period as usize,
                overbought as f64,
                oversold as f64,
            )),
            Genome::Breakout { window } => Box::new(BreakoutStrategy::new(window as usize)),
        }
    }
}

/// Baseline factory: buy on the first candle, hold forever.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuyAndHold;

impl StrategyFactory for BuyAndHold {
    fn name(&self) -> String {
        "BuyAndHold".to_string()
    }

    fn build(&self) -> Box<dyn Strategy> {
        Box::new(BuyAndHoldStrategy {
            position: PositionState::Flat,
        })
    }
}

/// Strategy built by [`BuyAndHold`].
#[derive(Debug)]
pub struct BuyAndHoldStrategy {
    position: PositionState,
}

impl Strategy for BuyAndHoldStrategy {
    fn generate_signal(&mut self, _candle: &Candle) -> Signal {
        if self.position == PositionState::Flat {
            self.position = PositionState::Long;
            Signal::Buy
        } else {
            Signal::Hold
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    /// Build a candle series from closing prices, one day apart.
    pub fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
        let start = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                Candle::new_unchecked(
                    start + Duration::days(i as i64),
                    close,
                    close * 1.01,
                    close * 0.99,
                    close,
                    1_000.0,
                )
            })
            .collect()
    }
}
