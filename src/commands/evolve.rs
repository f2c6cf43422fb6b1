//! Evolve command: run the genetic optimizer with a progress bar.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use quant_research::data::load_csv;
use quant_research::evolution::{EvolutionConfig, EvolutionEngine};

pub fn run(
    data: String,
    capital: f64,
    population: usize,
    generations: usize,
    seed: Option<u64>,
) -> Result<()> {
    let candles = load_csv(&data).context("failed to load candle data")?;
    tracing::info!("loaded {} candles from {}", candles.len(), data);

    let config = EvolutionConfig {
        population_size: population,
        generations,
        initial_cash: capital,
        seed,
        ..EvolutionConfig::default()
    };
    let engine = EvolutionEngine::new(&candles, config)?;

    let bar = ProgressBar::new(generations as u64);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{bar:40.cyan/blue}] gen {pos}/{len} best={msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let report = engine.run_with_observer(|_, best| {
        bar.set_message(format!("{best:.4}"));
        bar.inc(1);
    })?;
    bar.finish();

    println!("Best genome:  {}", report.best_genome);
    println!("Best fitness: {:.4}", report.best_fitness);
    println!("Generation bests:");
    for (generation, best) in report.generation_bests.iter().enumerate() {
        println!("  gen {generation:>3}: {best:.4}");
    }
    println!("Evaluations recorded: {}", report.history.len());

    Ok(())
}
