//! Quant research - main entry point
//!
//! This binary provides four subcommands:
//! - research: Run the full research pipeline for one symbol
//! - backtest: Run a single backtest over a CSV file
//! - evolve: Run the genetic optimizer and print the best genome
//! - download: Download historical candles into the CSV data dir

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "quant-research")]
#[command(about = "Automated strategy research: evolution, backtesting, robustness ranking, and portfolio simulation", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full research pipeline for one or more symbols
    Research {
        /// Path to configuration file (optional; defaults apply)
        #[arg(short, long)]
        config: Option<String>,

        /// Ticker symbols (comma-separated). E.g., "AAPL,MSFT"
        #[arg(short, long)]
        symbols: String,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: String,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: String,

        /// Data source: "csv" (default) or "http"
        #[arg(long, default_value = "csv")]
        source: String,

        /// Write the full JSON report here
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Run a backtest over a CSV file
    Backtest {
        /// Path to a datetime,open,high,low,close,volume CSV file
        #[arg(short, long)]
        data: String,

        /// Initial cash
        #[arg(long, default_value = "10000")]
        capital: f64,

        /// Strategy genome as JSON, e.g.
        /// '{"type":"moving_average","short":10,"long":50}'.
        /// Omit for buy-and-hold.
        #[arg(short, long)]
        genome: Option<String>,

        /// Transaction cost percentage per side
        #[arg(long, default_value = "0")]
        cost: f64,

        /// Slippage percentage per side
        #[arg(long, default_value = "0")]
        slippage: f64,
    },

    /// Run the genetic optimizer over a CSV file
    Evolve {
        /// Path to a candle CSV file
        #[arg(short, long)]
        data: String,

        /// Initial cash for fitness evaluation
        #[arg(long, default_value = "1000")]
        capital: f64,

        /// Population size
        #[arg(short, long, default_value = "20")]
        population: usize,

        /// Number of generations
        #[arg(short, long, default_value = "10")]
        generations: usize,

        /// Random seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Download historical candles into the data directory
    Download {
        /// Symbols to download (comma-separated). E.g., "AAPL,MSFT"
        #[arg(short, long)]
        symbols: String,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: String,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: String,

        /// Data interval
        #[arg(short, long, default_value = "1d")]
        interval: String,

        /// Output directory
        #[arg(short, long, default_value = "data")]
        output: String,
    },
}

fn setup_logging(verbose: bool, command_name: &str) -> Result<()> {
    // Create logs directory
    std::fs::create_dir_all("logs")?;

    let log_filename = format!(
        "{}_{}.log",
        command_name,
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let log_path = PathBuf::from("logs").join(&log_filename);

    // Set log level - filter out noisy external crates
    let level = if verbose { "debug" } else { "info" };
    let filter_str = format!("{level},hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn");
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let file_appender = tracing_appender::rolling::never("logs", &log_filename);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(true);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_appender)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    info!("Logging initialized");
    info!("Log file: {}", log_path.display());

    Ok(())
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let command_name = match &cli.command {
        Commands::Research { .. } => "research",
        Commands::Backtest { .. } => "backtest",
        Commands::Evolve { .. } => "evolve",
        Commands::Download { .. } => "download",
    };

    setup_logging(cli.verbose, command_name)?;

    match cli.command {
        Commands::Research {
            config,
            symbols,
            start,
            end,
            source,
            output,
        } => commands::research::run(config, symbols, start, end, source, output),

        Commands::Backtest {
            data,
            capital,
            genome,
            cost,
            slippage,
        } => commands::backtest::run(data, capital, genome, cost, slippage),

        Commands::Evolve {
            data,
            capital,
            population,
            generations,
            seed,
        } => commands::evolve::run(data, capital, population, generations, seed),

        Commands::Download {
            symbols,
            start,
            end,
            interval,
            output,
        } => commands::download::run(symbols, start, end, interval, output),
    }
}
