//! RSI mean-reversion strategy
//!
//! Maintains the last `period + 1` closes. The index uses mean gain and
//! mean loss over the window (`RSI = 100 - 100 / (1 + gain/loss)`, with
//! `RSI = 100` when the average loss is zero). BUY while flat when the
//! index drops below `oversold`; SELL while long when it rises above
//! `overbought`.

use crate::types::{Candle, PositionState, Signal};

use super::Strategy;

#[derive(Debug)]
pub struct RsiStrategy {
    period: usize,
    overbought: f64,
    oversold: f64,
    prices: Vec<f64>,
    position: PositionState,
}

impl RsiStrategy {
    pub fn new(period: usize, overbought: f64, oversold: f64) -> Self {
        RsiStrategy {
            period,
            overbought,
            oversold,
            prices: Vec::new(),
            position: PositionState::Flat,
        }
    }

    /// Relative strength index over the retained window.
    ///
    /// Returns the neutral value 50.0 until `period + 1` prices are seen,
    /// which can never cross either threshold (oversold <= 40 < 50 < 60 <=
    /// overbought).
    fn rsi(&self) -> f64 {
        if self.prices.len() < self.period + 1 {
            return 50.0;
        }

        let mut gain_sum = 0.0;
        let mut loss_sum = 0.0;
        for pair in self.prices.windows(2) {
            let delta = pair[1] - pair[0];
            if delta > 0.0 {
                gain_sum += delta;
            } else {
                loss_sum += -delta;
            }
        }

        let n = (self.prices.len() - 1) as f64;
        let avg_gain = gain_sum / n;
        let avg_loss = loss_sum / n;

        if avg_loss == 0.0 {
            return 100.0;
        }

        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    }
}

impl Strategy for RsiStrategy {
    fn generate_signal(&mut self, candle: &Candle) -> Signal {
        self.prices.push(candle.close);
        if self.prices.len() > self.period + 1 {
            self.prices.remove(0);
        }

        let rsi = self.rsi();

        if rsi < self.oversold && self.position == PositionState::Flat {
            self.position = PositionState::Long;
            Signal::Buy
        } else if rsi > self.overbought && self.position == PositionState::Long {
            self.position = PositionState::Flat;
            Signal::Sell
        } else {
            Signal::Hold
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::candles_from_closes;
    use super::*;

    #[test]
    fn test_neutral_until_window_filled() {
        let mut s = RsiStrategy::new(5, 70.0, 30.0);
        let candles = candles_from_closes(&[100.0, 98.0, 96.0]);
        for c in &candles {
            assert_eq!(s.generate_signal(c), Signal::Hold);
        }
    }

    #[test]
    fn test_buys_when_oversold() {
        let mut s = RsiStrategy::new(3, 70.0, 30.0);
        // Strictly falling closes: every delta is a loss, RSI = 0.
        let candles = candles_from_closes(&[100.0, 95.0, 90.0, 85.0]);
        let signals: Vec<Signal> = candles.iter().map(|c| s.generate_signal(c)).collect();
        assert_eq!(*signals.last().unwrap(), Signal::Buy);
    }

    #[test]
    fn test_sells_when_overbought_while_long() {
        let mut s = RsiStrategy::new(3, 70.0, 30.0);
        // Fall to enter, then rally hard: all gains push RSI to 100.
        let candles =
            candles_from_closes(&[100.0, 95.0, 90.0, 85.0, 95.0, 105.0, 115.0, 125.0]);
        let signals: Vec<Signal> = candles.iter().map(|c| s.generate_signal(c)).collect();
        assert!(signals.contains(&Signal::Buy));
        assert!(signals.contains(&Signal::Sell));
        let buy_at = signals.iter().position(|&x| x == Signal::Buy).unwrap();
        let sell_at = signals.iter().position(|&x| x == Signal::Sell).unwrap();
        assert!(buy_at < sell_at);
    }

    #[test]
    fn test_all_gains_rsi_is_100() {
        let mut s = RsiStrategy::new(3, 70.0, 30.0);
        for c in &candles_from_closes(&[100.0, 101.0, 102.0, 103.0]) {
            s.generate_signal(c);
        }
        assert_eq!(s.rsi(), 100.0);
    }
}
