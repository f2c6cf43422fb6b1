//! Genetic optimizer
//!
//! Evolves strategy genomes against a fitness function: per-parameter
//! mutation, uniform crossover, tournament selection with elitism, and a
//! fast (backtester) or full (composite-ranking) fitness mode.

pub mod crossover;
pub mod engine;
pub mod fitness;
pub mod mutation;

pub use crossover::CrossoverEngine;
pub use engine::{EvaluationRecord, EvolutionConfig, EvolutionEngine, EvolutionReport};
pub use fitness::{FitnessEvaluator, FitnessMode, INACTIVITY_PENALTY};
pub use mutation::MutationEngine;
