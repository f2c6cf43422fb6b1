//! Strategy research engines
//!
//! Robustness tooling layered on top of the backtester: regime splitting
//! and stability, walk-forward folds, Monte Carlo simulation, walk-forward
//! Monte Carlo robustness, and the composite ranking engine fusing them
//! all.

pub mod monte_carlo;
pub mod ranking;
pub mod regime;
pub mod robustness;
pub mod walk_forward;

pub use monte_carlo::{MonteCarloEngine, MonteCarloReport, SimulationOutcome};
pub use ranking::{RankingResult, RankingSource, StaticRanking, StrategyRankingEngine};
pub use regime::{analyze_stability, split_into_time_windows, StabilityReport};
pub use robustness::{RobustnessEngine, RobustnessReport};
pub use walk_forward::{walk_forward_analysis, FoldMetrics, WalkForwardReport};
