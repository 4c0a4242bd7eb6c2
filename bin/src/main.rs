//! candela CLI - Streaming multi-resolution OHLC candle aggregator.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;
mod source;

use output::OutputArgs;
use source::GeneratorConfig;

#[derive(Parser)]
#[command(name = "candela")]
#[command(about = "Aggregate price ticks into 1m/2m/10m OHLC candles", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (only warnings and errors)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate a synthetic random-walk price feed until interrupted
    Generate {
        /// Comma-separated tickers to generate prices for
        #[arg(short, long, value_delimiter = ',', default_value = "AAPL,SBER,NVDA,TSLA")]
        tickers: Vec<String>,

        /// Milliseconds between two rounds of ticks
        #[arg(short, long, default_value = "500")]
        interval: u64,

        /// Volatility factor; each tick moves by up to `factor` tenths of a percent
        #[arg(long, default_value = "10")]
        factor: f64,

        /// Seed for a reproducible feed
        #[arg(long)]
        seed: Option<u64>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Aggregate `ticker,timestamp,value` records from a file
    Replay {
        /// Input file; timestamps in RFC 3339
        file: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },
}

fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };

    // RUST_LOG wins over -v/-q
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Show help if no command provided
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    init_tracing(cli.verbose, cli.quiet);

    match command {
        Commands::Generate {
            tickers,
            interval,
            factor,
            seed,
            output,
        } => {
            let config = GeneratorConfig::default()
                .with_tickers(tickers)
                .with_interval(Duration::from_millis(interval))
                .with_factor(factor)
                .with_seed(seed);
            commands::generate::generate(&output, config).await
        }
        Commands::Replay { file, output } => commands::replay::replay(&file, &output).await,
    }
}
