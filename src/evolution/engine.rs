//! Genetic strategy evolution
//!
//! Classic generational GA over strategy genomes: random initial
//! population, fitness evaluation, stable descending sort, elitism,
//! tournament selection, uniform crossover, and mutation. All randomness
//! flows from caller-seeded RNGs, so a fixed seed reproduces the run
//! bit for bit.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;

use crate::error::{EngineError, Result};
use crate::evolution::crossover::CrossoverEngine;
use crate::evolution::fitness::{FitnessEvaluator, FitnessMode};
use crate::evolution::mutation::MutationEngine;
use crate::genome::Genome;
use crate::types::Candle;

/// Evolution parameters with the conventional defaults.
#[derive(Debug, Clone)]
pub struct EvolutionConfig {
    pub population_size: usize,
    pub generations: usize,
    pub mutation_rate: f64,
    pub crossover_rate: f64,
    pub elitism: usize,
    pub tournament_size: usize,
    pub fitness_mode: FitnessMode,
    pub initial_cash: f64,
    pub seed: Option<u64>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        EvolutionConfig {
            population_size: 20,
            generations: 10,
            mutation_rate: 0.3,
            crossover_rate: 0.7,
            elitism: 2,
            tournament_size: 3,
            fitness_mode: FitnessMode::Fast,
            initial_cash: 1000.0,
            seed: None,
        }
    }
}

/// One fitness evaluation, kept for the full run history.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationRecord {
    pub generation: usize,
    pub genome: Genome,
    pub fitness: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvolutionReport {
    pub best_genome: Genome,
    pub best_fitness: f64,
    /// Best fitness per generation, in order.
    pub generation_bests: Vec<f64>,
    /// Every evaluation across all generations.
    pub history: Vec<EvaluationRecord>,
}

pub struct EvolutionEngine {
    candles: Vec<Candle>,
    config: EvolutionConfig,
}

impl EvolutionEngine {
    pub fn new(candles: &[Candle], config: EvolutionConfig) -> Result<Self> {
        if config.population_size < 2 {
            return Err(EngineError::invalid(
                "population_size",
                format!("must be >= 2, got {}", config.population_size),
            ));
        }
        if config.generations < 1 {
            return Err(EngineError::invalid(
                "generations",
                format!("must be >= 1, got {}", config.generations),
            ));
        }
        Ok(EvolutionEngine {
            candles: candles.to_vec(),
            config,
        })
    }

    pub fn run(&self) -> Result<EvolutionReport> {
        self.run_with_observer(|_, _| {})
    }

    /// Run the GA, invoking `observer(generation, best_fitness)` after
    /// each generation (used for progress reporting).
    pub fn run_with_observer<F>(&self, mut observer: F) -> Result<EvolutionReport>
    where
        F: FnMut(usize, f64),
    {
        let cfg = &self.config;
        let elitism = cfg.elitism.min(cfg.population_size);
        let tournament_size = cfg.tournament_size.min(cfg.population_size).max(1);

        let mut rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut mutator = MutationEngine::new(cfg.mutation_rate, cfg.seed)?;
        let mut crossover = CrossoverEngine::new(cfg.seed);
        let evaluator =
            FitnessEvaluator::new(&self.candles, cfg.initial_cash, cfg.fitness_mode, cfg.seed);

        // Random initial population.
        let mut population: Vec<Genome> = (0..cfg.population_size)
            .map(|_| Genome::random(&mut rng))
            .collect();

        let mut generation_bests = Vec::with_capacity(cfg.generations);
        let mut history = Vec::with_capacity(cfg.population_size * cfg.generations);

        for generation in 0..cfg.generations {
            let mut scored = Self::evaluate(&evaluator, &population);
            for (fitness, genome) in &scored {
                history.push(EvaluationRecord {
                    generation,
                    genome: genome.clone(),
                    fitness: *fitness,
                });
            }

            // Stable descending sort by fitness.
            scored.sort_by(|a, b| b.0.total_cmp(&a.0));
            let (gen_best, gen_best_genome) = (scored[0].0, scored[0].1.clone());
            generation_bests.push(gen_best);
            observer(generation, gen_best);
            tracing::debug!(
                generation,
                best_fitness = gen_best,
                best_genome = %gen_best_genome,
                "generation complete"
            );

            let mut next_pop: Vec<Genome> = scored
                .iter()
                .take(elitism)
                .map(|(_, g)| g.clone())
                .collect();

            while next_pop.len() < cfg.population_size {
                let parent_a = Self::tournament_select(&scored, tournament_size, &mut rng);
                let child = if rng.gen::<f64>() < cfg.crossover_rate {
                    let parent_b = Self::tournament_select(&scored, tournament_size, &mut rng);
                    if parent_a.family() == parent_b.family() {
                        crossover.crossover(&parent_a, &parent_b)?
                    } else {
                        parent_a
                    }
                } else {
                    parent_a
                };

                next_pop.push(mutator.mutate(&child)?);
            }

            population = next_pop;
        }

        // Final evaluation of the last population.
        let mut final_scored = Self::evaluate(&evaluator, &population);
        final_scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        let (best_fitness, best_genome) = final_scored.swap_remove(0);

        Ok(EvolutionReport {
            best_genome,
            best_fitness,
            generation_bests,
            history,
        })
    }

    /// Fitness evaluation is pure, so the rayon fan-out keeps the run
    /// deterministic; results come back in population order.
    fn evaluate(evaluator: &FitnessEvaluator, population: &[Genome]) -> Vec<(f64, Genome)> {
        population
            .par_iter()
            .map(|genome| (evaluator.evaluate(genome), genome.clone()))
            .collect()
    }

    /// Sample `tournament_size` distinct entries and return the fittest
    /// (first of ties, matching the sample order).
    fn tournament_select(
        scored: &[(f64, Genome)],
        tournament_size: usize,
        rng: &mut StdRng,
    ) -> Genome {
        let mut best: Option<&(f64, Genome)> = None;
        for idx in rand::seq::index::sample(rng, scored.len(), tournament_size) {
            let candidate = &scored[idx];
            if best.map_or(true, |b| candidate.0 > b.0) {
                best = Some(candidate);
            }
        }
        best.expect("tournament_size >= 1").1.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::test_support::candles_from_closes;

    fn market(n: usize) -> Vec<Candle> {
        let closes: Vec<f64> = (0..n)
            .map(|i| 100.0 + (i as f64) * 0.5 + ((i % 7) as f64 - 3.0))
            .collect();
        candles_from_closes(&closes)
    }

    fn config(seed: u64) -> EvolutionConfig {
        EvolutionConfig {
            population_size: 8,
            generations: 3,
            seed: Some(seed),
            ..EvolutionConfig::default()
        }
    }

    #[test]
    fn test_constructor_validation() {
        let candles = market(30);
        let mut bad = config(1);
        bad.population_size = 1;
        assert!(EvolutionEngine::new(&candles, bad).is_err());

        let mut bad = config(1);
        bad.generations = 0;
        assert!(EvolutionEngine::new(&candles, bad).is_err());
    }

    #[test]
    fn test_report_shape() {
        let engine = EvolutionEngine::new(&market(40), config(42)).unwrap();
        let report = engine.run().unwrap();

        assert_eq!(report.generation_bests.len(), 3);
        assert_eq!(report.history.len(), 8 * 3);
        assert!(report.best_fitness.is_finite());
        report.best_genome.validate().unwrap();
    }

    #[test]
    fn test_same_seed_reproduces_run() {
        let candles = market(40);
        let a = EvolutionEngine::new(&candles, config(7)).unwrap().run().unwrap();
        let b = EvolutionEngine::new(&candles, config(7)).unwrap().run().unwrap();

        assert_eq!(a.best_genome, b.best_genome);
        assert_eq!(a.best_fitness.to_bits(), b.best_fitness.to_bits());
        assert_eq!(a.generation_bests.len(), b.generation_bests.len());
        for (x, y) in a.generation_bests.iter().zip(b.generation_bests.iter()) {
            assert_eq!(x.to_bits(), y.to_bits());
        }
    }

    #[test]
    fn test_different_seeds_diverge() {
        let candles = market(40);
        let a = EvolutionEngine::new(&candles, config(1)).unwrap().run().unwrap();
        let b = EvolutionEngine::new(&candles, config(2)).unwrap().run().unwrap();
        // Different seeds explore different populations; histories differ.
        let same = a
            .history
            .iter()
            .zip(b.history.iter())
            .all(|(x, y)| x.genome == y.genome);
        assert!(!same);
    }

    #[test]
    fn test_all_evaluated_genomes_valid() {
        let engine = EvolutionEngine::new(&market(40), config(11)).unwrap();
        let report = engine.run().unwrap();
        for record in &report.history {
            record.genome.validate().unwrap();
        }
    }

    #[test]
    fn test_observer_sees_every_generation() {
        let engine = EvolutionEngine::new(&market(40), config(3)).unwrap();
        let mut seen = Vec::new();
        engine
            .run_with_observer(|generation, best| seen.push((generation, best)))
            .unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].0, 0);
        assert_eq!(seen[2].0, 2);
    }
}
