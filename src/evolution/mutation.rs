//! Genome mutation
//!
//! Each bounded parameter is independently resampled from its closed
//! integer interval with probability `mutation_rate`. The moving-average
//! invariant `short < long` is repaired by resampling both parameters
//! consistently. Deterministic under a fixed seed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{EngineError, Result};
use crate::genome::{
    Genome, BREAKOUT_WINDOW_BOUNDS, MA_LONG_BOUNDS, MA_SHORT_BOUNDS, RSI_OVERBOUGHT_BOUNDS,
    RSI_OVERSOLD_BOUNDS, RSI_PERIOD_BOUNDS,
};

pub struct MutationEngine {
    mutation_rate: f64,
    rng: StdRng,
}

impl MutationEngine {
    /// `mutation_rate` must be in [0, 1].
    pub fn new(mutation_rate: f64, seed: Option<u64>) -> Result<Self> {
        if !(0.0..=1.0).contains(&mutation_rate) {
            return Err(EngineError::invalid(
                "mutation_rate",
                format!("must be in [0, 1], got {mutation_rate}"),
            ));
        }
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(MutationEngine { mutation_rate, rng })
    }

    /// Return a mutated copy of `genome`; the input is never modified.
    pub fn mutate(&mut self, genome: &Genome) -> Result<Genome> {
        genome.validate()?;

        let mut mutated = match *genome {
            Genome::MovingAverage { short, long } => Genome::MovingAverage {
                short: self.maybe_resample(short, MA_SHORT_BOUNDS),
                long: self.maybe_resample(long, MA_LONG_BOUNDS),
            },
            Genome::Rsi {
                period,
                overbought,
                oversold,
            } => Genome::Rsi {
                period: self.maybe_resample(period, RSI_PERIOD_BOUNDS),
                overbought: self.maybe_resample(overbought, RSI_OVERBOUGHT_BOUNDS),
                oversold: self.maybe_resample(oversold, RSI_OVERSOLD_BOUNDS),
            },
            Genome::Breakout { window } => Genome::Breakout {
                window: self.maybe_resample(window, BREAKOUT_WINDOW_BOUNDS),
            },
        };

        // Repair the moving-average ordering by drawing a fresh pair.
        if let Genome::MovingAverage { short, long } = mutated {
            if short >= long {
                let new_short = self.rng.gen_range(MA_SHORT_BOUNDS.0..=MA_SHORT_BOUNDS.1);
                let long_lo = MA_LONG_BOUNDS.0.max(new_short + 1);
                let new_long = self.rng.gen_range(long_lo..=MA_LONG_BOUNDS.1);
                mutated = Genome::MovingAverage {
                    short: new_short,
                    long: new_long,
                };
            }
        }

        Ok(mutated)
    }

    fn maybe_resample(&mut self, value: u32, bounds: (u32, u32)) -> u32 {
        if self.rng.gen::<f64>() < self.mutation_rate {
            self.rng.gen_range(bounds.0..=bounds.1)
        } else {
            value
        }
    }
}
