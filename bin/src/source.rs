//! Tick sources feeding the pipeline.

use anyhow::{Context, Result, bail};
use candela_lib::{Tick, Ticker};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Lowest price the random walk may reach.
const PRICE_FLOOR: f64 = 0.01;

/// Configuration of the synthetic price feed.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GeneratorConfig {
    /// Tickers priced every round.
    pub(crate) tickers: Vec<Ticker>,
    /// Time between two rounds.
    pub(crate) interval: Duration,
    /// Volatility; a tick moves by at most `factor` tenths of a percent.
    pub(crate) factor: f64,
    /// Seed for a reproducible feed.
    pub(crate) seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            tickers: ["AAPL", "SBER", "NVDA", "TSLA"]
                .into_iter()
                .map(Ticker::from)
                .collect(),
            interval: Duration::from_millis(500),
            factor: 10.0,
            seed: None,
        }
    }
}

impl GeneratorConfig {
    pub(crate) fn with_tickers(mut self, tickers: impl IntoIterator<Item = String>) -> Self {
        self.tickers = tickers
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .map(Ticker::from)
            .collect();
        self
    }

    pub(crate) const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub(crate) const fn with_factor(mut self, factor: f64) -> Self {
        self.factor = factor;
        self
    }

    pub(crate) const fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }
}

/// Independent random walk per ticker.
#[derive(Debug)]
pub(crate) struct RandomWalk {
    rng: StdRng,
    prices: Vec<(Ticker, f64)>,
    max_step: f64,
}

impl RandomWalk {
    pub(crate) fn new(config: &GeneratorConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let prices = config
            .tickers
            .iter()
            .map(|ticker| (ticker.clone(), rng.random_range(50.0..500.0)))
            .collect();

        Self {
            rng,
            prices,
            max_step: config.factor.abs() / 1000.0,
        }
    }

    /// Moves every price one step and returns one tick per ticker.
    pub(crate) fn step(&mut self, now: DateTime<Utc>) -> Vec<Tick> {
        let max_step = self.max_step;
        self.prices
            .iter_mut()
            .map(|(ticker, price)| {
                let change = if max_step > 0.0 {
                    self.rng.random_range(-max_step..=max_step)
                } else {
                    0.0
                };
                *price = (*price * (1.0 + change)).max(PRICE_FLOOR);
                Tick::new(ticker.clone(), *price, now)
            })
            .collect()
    }
}

/// Feeds random-walk ticks stamped with the wall clock until the pipeline
/// stops accepting them. Returns the number of ticks sent.
pub(crate) async fn generate(config: GeneratorConfig, tx: mpsc::Sender<Tick>) -> Result<u64> {
    if config.tickers.is_empty() {
        bail!("No tickers to generate prices for");
    }

    let mut walk = RandomWalk::new(&config);
    let mut interval = tokio::time::interval(config.interval);
    let mut sent = 0;

    tracing::info!(
        tickers = config.tickers.len(),
        interval_ms = config.interval.as_millis(),
        factor = config.factor,
        "price generator started"
    );

    loop {
        interval.tick().await;
        for tick in walk.step(Utc::now()) {
            if tx.send(tick).await.is_err() {
                return Ok(sent);
            }
            sent += 1;
        }
    }
}

/// Parses one `ticker,timestamp,value` record.
///
/// Blank lines and lines starting with `#` yield `None`.
pub(crate) fn parse_line(line: &str) -> Result<Option<Tick>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let [ticker, timestamp, value] = fields.as_slice() else {
        bail!("Expected 3 fields, found {}", fields.len());
    };

    if ticker.is_empty() {
        bail!("Empty ticker");
    }
    let timestamp = DateTime::parse_from_rfc3339(timestamp)
        .with_context(|| format!("Invalid timestamp: {timestamp}"))?
        .with_timezone(&Utc);
    let value: f64 = value
        .parse()
        .with_context(|| format!("Invalid value: {value}"))?;
    if !value.is_finite() {
        bail!("Non-finite value: {value}");
    }

    Ok(Some(Tick::new(*ticker, value, timestamp)))
}

/// Feeds every record of `path` in file order. Returns the number of ticks
/// sent, which is short of the file when the pipeline stopped early.
pub(crate) async fn replay_file(path: &Path, tx: mpsc::Sender<Tick>) -> Result<u64> {
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let mut lines = BufReader::new(file).lines();
    let mut line_number = 0;
    let mut sent = 0;

    while let Some(line) = lines
        .next_line()
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?
    {
        line_number += 1;
        let parsed = parse_line(&line)
            .with_context(|| format!("{}:{line_number}: invalid record", path.display()))?;
        let Some(tick) = parsed else {
            continue;
        };
        if tx.send(tick).await.is_err() {
            tracing::warn!(line = line_number, "pipeline stopped before end of input");
            break;
        }
        sent += 1;
    }

    Ok(sent)
}
