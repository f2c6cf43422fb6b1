//! Genome crossover
//!
//! Uniform crossover: for each parameter the child inherits from either
//! parent with equal probability. Both parents must share the same family.
//! A violated moving-average ordering falls back to parent A's window
//! pair.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{EngineError, Result};
use crate::genome::Genome;

pub struct CrossoverEngine {
    rng: StdRng,
}

impl CrossoverEngine {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        CrossoverEngine { rng }
    }

    fn pick(&mut self, a: u32, b: u32) -> u32 {
        if self.rng.gen::<f64>() < 0.5 {
            a
        } else {
            b
        }
    }

    /// Produce a child genome from two parents of the same family.
    pub fn crossover(&mut self, parent_a: &Genome, parent_b: &Genome) -> Result<Genome> {
        parent_a.validate()?;
        parent_b.validate()?;

        match (parent_a, parent_b) {
            (
                &Genome::MovingAverage {
                    short: a_short,
                    long: a_long,
                },
                &Genome::MovingAverage {
                    short: b_short,
                    long: b_long,
                },
            ) => {
                let mut short = self.pick(a_short, b_short);
                let mut long = self.pick(a_long, b_long);
                if short >= long {
                    short = a_short;
                    long = a_long;
                }
                Ok(Genome::MovingAverage { short, long })
            }
            (
                &Genome::Rsi {
                    period: a_period,
                    overbought: a_over,
                    oversold: a_under,
                },
                &Genome::Rsi {
                    period: b_period,
                    overbought: b_over,
                    oversold: b_under,
                },
            ) => Ok(Genome::Rsi {
                period: self.pick(a_period, b_period),
                overbought: self.pick(a_over, b_over),
                oversold: self.pick(a_under, b_under),
            }),
            (&Genome::Breakout { window: a_window }, &Genome::Breakout { window: b_window }) => {
                Ok(Genome::Breakout {
                    window: self.pick(a_window, b_window),
                })
            }
            _ => Err(EngineError::invalid(
                "parents",
                format!(
                    "cannot crossover genomes of different families: {:?} vs {:?}",
                    parent_a.family(),
                    parent_b.family()
                ),
            )),
        }
    }
}
