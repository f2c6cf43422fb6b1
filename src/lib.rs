//! Quantitative Strategy Research
//!
//! An automated research core for parameterized trading strategies:
//! genetic evolution over strategy genomes, deterministic backtesting,
//! walk-forward / regime / Monte Carlo robustness analysis, composite
//! strategy ranking, and a rebalancing portfolio lifecycle simulator
//! with full risk analytics.

pub mod analytics;
pub mod backtest;
pub mod config;
pub mod data;
pub mod error;
pub mod evolution;
pub mod execution;
pub mod genome;
pub mod pipeline;
pub mod research;
pub mod strategies;
pub mod types;

pub use config::ResearchConfig;
pub use error::{EngineError, Result};
pub use genome::{Genome, GenomeFamily};
pub use types::*;
