//! Channel breakout strategy
//!
//! After `window` prices have been seen, BUY while flat when the close
//! exceeds the trailing high (excluding the current candle); SELL while
//! long when it falls below the trailing low.

use crate::types::{Candle, PositionState, Signal};

use super::Strategy;

#[derive(Debug)]
pub struct BreakoutStrategy {
    window: usize,
    prices: Vec<f64>,
    position: PositionState,
}

impl BreakoutStrategy {
    pub fn new(window: usize) -> Self {
        BreakoutStrategy {
            window,
            prices: Vec::new(),
            position: PositionState::Flat,
        }
    }

    /// Trailing (high, low) over the `window` prices preceding the
    /// current one.
    fn channel(&self) -> (f64, f64) {
        let n = self.prices.len();
        let slice = &self.prices[n - 1 - self.window..n - 1];
        let high = slice.iter().copied().fold(f64::MIN, f64::max);
        let low = slice.iter().copied().fold(f64::MAX, f64::min);
        (high, low)
    }
}

impl Strategy for BreakoutStrategy {
    fn generate_signal(&mut self, candle: &Candle) -> Signal {
        let price = candle.close;
        self.prices.push(price);

        if self.prices.len() <= self.window {
            return Signal::Hold;
        }

        let (rolling_high, rolling_low) = self.channel();

        if price > rolling_high && self.position == PositionState::Flat {
            self.position = PositionState::Long;
            Signal::Buy
        } else if price < rolling_low && self.position == PositionState::Long {
            self.position = PositionState::Flat;
            Signal::Sell
        } else {
            Signal::Hold
        }
    }
}
