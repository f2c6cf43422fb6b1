//! Configuration management
//!
//! Handles loading and parsing of JSON configuration files for the
//! research pipeline, with per-section defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ResearchConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub evolution: EvolutionSettings,
    #[serde(default)]
    pub portfolio: PortfolioSettings,
    /// Seed shared by every stochastic engine; omit for entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl ResearchConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).context("Failed to read config file")?;
        serde_json::from_str(&contents).context("Failed to parse config JSON")
    }
}

/// Data layer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub data_dir: String,
    pub cache_dir: String,
    pub interval: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            data_dir: "data".to_string(),
            cache_dir: ".market_cache".to_string(),
            interval: "1d".to_string(),
        }
    }
}

/// Genetic optimizer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionSettings {
    pub population_size: usize,
    pub generations: usize,
    pub mutation_rate: f64,
    pub crossover_rate: f64,
    pub elitism: usize,
    pub tournament_size: usize,
}

impl Default for EvolutionSettings {
    fn default() -> Self {
        EvolutionSettings {
            population_size: 10,
            generations: 5,
            mutation_rate: 0.3,
            crossover_rate: 0.7,
            elitism: 2,
            tournament_size: 3,
        }
    }
}

/// Portfolio lifecycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSettings {
    pub initial_capital: f64,
    pub rebalance_interval: usize,
    /// Sharpe threshold below which a strategy is disabled.
    pub decay_threshold: f64,
    pub allocator_mode: String,
}

impl Default for PortfolioSettings {
    fn default() -> Self {
        PortfolioSettings {
            initial_capital: 10_000.0,
            rebalance_interval: 20,
            decay_threshold: -1.0,
            allocator_mode: "sharpe".to_string(),
        }
    }
}
