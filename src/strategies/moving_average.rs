//! Simple-moving-average crossover strategy
//!
//! Waits until `long` prices have been seen, then compares the trailing
//! short and long simple averages: BUY on the first `short > long` while
//! flat, SELL on the first `short < long` while long.

use crate::types::{Candle, PositionState, Signal};

use super::Strategy;

#[derive(Debug)]
pub struct MovingAverageCrossover {
    short: usize,
    long: usize,
    prices: Vec<f64>,
    position: PositionState,
}

impl MovingAverageCrossover {
    pub fn new(short: usize, long: usize) -> Self {
        MovingAverageCrossover {
            short,
            long,
            prices: Vec::new(),
            position: PositionState::Flat,
        }
    }

    fn trailing_mean(&self, window: usize) -> f64 {
        let n = self.prices.len();
        let slice = &self.prices[n - window..];
        slice.iter().sum::<f64>() / window as f64
    }
}

impl Strategy for MovingAverageCrossover {
    fn generate_signal(&mut self, candle: &Candle) -> Signal {
        self.prices.push(candle.close);

        if self.prices.len() < self.long {
            return Signal::Hold;
        }

        let short_ma = self.trailing_mean(self.short);
        let long_ma = self.trailing_mean(self.long);

        if short_ma > long_ma && self.position == PositionState::Flat {
            self.position = PositionState::Long;
            Signal::Buy
        } else if short_ma < long_ma && self.position == PositionState::Long {
            self.position = PositionState::Flat;
            Signal::Sell
        } else {
            Signal::Hold
        }
    }
}
