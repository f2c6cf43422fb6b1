//! Strategy genome representation
//!
//! A genome is a tagged record describing a parameterized trading strategy.
//! Three families are supported; every parameter is an integer inside a
//! fixed inclusive interval. Validation is centralized here so that the
//! mutation, crossover, and fitness engines all reject the same inputs.

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Inclusive bounds for the moving-average short window.
pub const MA_SHORT_BOUNDS: (u32, u32) = (2, 50);
/// Inclusive bounds for the moving-average long window.
pub const MA_LONG_BOUNDS: (u32, u32) = (10, 200);
/// Inclusive bounds for the RSI lookback period.
pub const RSI_PERIOD_BOUNDS: (u32, u32) = (5, 30);
/// Inclusive bounds for the RSI overbought level.
pub const RSI_OVERBOUGHT_BOUNDS: (u32, u32) = (60, 90);
/// Inclusive bounds for the RSI oversold level.
pub const RSI_OVERSOLD_BOUNDS: (u32, u32) = (10, 40);
/// Inclusive bounds for the breakout window.
pub const BREAKOUT_WINDOW_BOUNDS: (u32, u32) = (5, 60);

/// Strategy family discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenomeFamily {
    MovingAverage,
    Rsi,
    Breakout,
}

impl GenomeFamily {
    pub const ALL: [GenomeFamily; 3] = [
        GenomeFamily::MovingAverage,
        GenomeFamily::Rsi,
        GenomeFamily::Breakout,
    ];
}

/// A strategy genome: one family plus its integer parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Genome {
    MovingAverage { short: u32, long: u32 },
    Rsi { period: u32, overbought: u32, oversold: u32 },
    Breakout { window: u32 },
}

fn check_bounds(field: &'static str, value: u32, bounds: (u32, u32)) -> Result<()> {
    let (lo, hi) = bounds;
    if value < lo || value > hi {
        return Err(EngineError::invalid(
            field,
            format!("{value} out of bounds [{lo}, {hi}]"),
        ));
    }
    Ok(())
}

impl Genome {
    /// Validate every parameter against its declared interval.
    ///
    /// The moving-average family additionally requires `short < long`.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Genome::MovingAverage { short, long } => {
                check_bounds("short", short, MA_SHORT_BOUNDS)?;
                check_bounds("long", long, MA_LONG_BOUNDS)?;
                if short >= long {
                    return Err(EngineError::invalid(
                        "short",
                        format!("short ({short}) must be < long ({long})"),
                    ));
                }
                Ok(())
            }
            Genome::Rsi {
                period,
                overbought,
                oversold,
            } => {
                check_bounds("period", period, RSI_PERIOD_BOUNDS)?;
                check_bounds("overbought", overbought, RSI_OVERBOUGHT_BOUNDS)?;
                check_bounds("oversold", oversold, RSI_OVERSOLD_BOUNDS)?;
                Ok(())
            }
            Genome::Breakout { window } => check_bounds("window", window, BREAKOUT_WINDOW_BOUNDS),
        }
    }

    pub fn family(&self) -> GenomeFamily {
        match self {
            Genome::MovingAverage { .. } => GenomeFamily::MovingAverage,
            Genome::Rsi { .. } => GenomeFamily::Rsi,
            Genome::Breakout { .. } => GenomeFamily::Breakout,
        }
    }

    /// Canonical display name, e.g. `MA_10_50`, `RSI_14_70_30`, `BREAKOUT_20`.
    ///
    /// The name encodes every parameter, so it doubles as a dedup key.
    pub fn name(&self) -> String {
        match *self {
            Genome::MovingAverage { short, long } => format!("MA_{short}_{long}"),
            Genome::Rsi {
                period,
                overbought,
                oversold,
            } => format!("RSI_{period}_{overbought}_{oversold}"),
            Genome::Breakout { window } => format!("BREAKOUT_{window}"),
        }
    }

    /// Parameters in canonical order, for reporting.
    pub fn params(&self) -> Vec<(&'static str, u32)> {
        match *self {
            Genome::MovingAverage { short, long } => vec![("short", short), ("long", long)],
            Genome::Rsi {
                period,
                overbought,
                oversold,
            } => vec![
                ("period", period),
                ("overbought", overbought),
                ("oversold", oversold),
            ],
            Genome::Breakout { window } => vec![("window", window)],
        }
    }

    /// Draw a uniformly random genome: family first, then each parameter
    /// within its bounds. The moving-average invariant is repaired by
    /// drawing `long` from `[max(short + 1, 10), 200]`.
    pub fn random(rng: &mut StdRng) -> Genome {
        let family = GenomeFamily::ALL[rng.gen_range(0..GenomeFamily::ALL.len())];
        Genome::random_of(family, rng)
    }

    /// Draw a random genome of a specific family.
    pub fn random_of(family: GenomeFamily, rng: &mut StdRng) -> Genome {
        match family {
            GenomeFamily::MovingAverage => {
                let short = rng.gen_range(MA_SHORT_BOUNDS.0..=MA_SHORT_BOUNDS.1);
                let long_lo = MA_LONG_BOUNDS.0.max(short + 1);
                let long = rng.gen_range(long_lo..=MA_LONG_BOUNDS.1);
                Genome::MovingAverage { short, long }
            }
            GenomeFamily::Rsi => Genome::Rsi {
                period: rng.gen_range(RSI_PERIOD_BOUNDS.0..=RSI_PERIOD_BOUNDS.1),
                overbought: rng.gen_range(RSI_OVERBOUGHT_BOUNDS.0..=RSI_OVERBOUGHT_BOUNDS.1),
                oversold: rng.gen_range(RSI_OVERSOLD_BOUNDS.0..=RSI_OVERSOLD_BOUNDS.1),
            },
            GenomeFamily::Breakout => Genome::Breakout {
                window: rng.gen_range(BREAKOUT_WINDOW_BOUNDS.0..=BREAKOUT_WINDOW_BOUNDS.1),
            },
        }
    }
}

impl std::fmt::Display for Genome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_valid_genomes() {
        assert!(Genome::MovingAverage { short: 10, long: 50 }.validate().is_ok());
        assert!(Genome::Rsi {
            period: 14,
            overbought: 70,
            oversold: 30
        }
        .validate()
        .is_ok());
        assert!(Genome::Breakout { window: 20 }.validate().is_ok());
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let g = Genome::Breakout { window: 61 };
        let err = g.validate().unwrap_err();
        assert!(err.to_string().contains("window"));
    }

    #[test]
    fn test_short_must_be_less_than_long() {
        let g = Genome::MovingAverage { short: 50, long: 50 };
        assert!(g.validate().is_err());
    }

    #[test]
    fn test_random_genomes_always_valid() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            Genome::random(&mut rng).validate().expect("random genome in bounds");
        }
    }

    #[test]
    fn test_name_encodes_params() {
        assert_eq!(Genome::MovingAverage { short: 5, long: 21 }.name(), "MA_5_21");
        assert_eq!(
            Genome::Rsi {
                period: 14,
                overbought: 70,
                oversold: 30
            }
            .name(),
            "RSI_14_70_30"
        );
        assert_eq!(Genome::Breakout { window: 20 }.name(), "BREAKOUT_20");
    }

    #[test]
    fn test_serde_tagged_shape() {
        let g = Genome::MovingAverage { short: 10, long: 50 };
        let json = serde_json::to_value(&g).unwrap();
        assert_eq!(json["type"], "moving_average");
        assert_eq!(json["short"], 10);
        let back: Genome = serde_json::from_value(json).unwrap();
        assert_eq!(back, g);
    }
}
