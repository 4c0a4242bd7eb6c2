//! Benchmark fixtures for candela.

use candela_lib::{Tick, Ticker};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Shape of a synthetic tick stream.
#[derive(Debug, Clone)]
pub struct MarketConfig {
    /// Number of distinct tickers, priced round-robin.
    pub tickers: usize,
    /// Total number of ticks.
    pub ticks: usize,
    /// Time between two consecutive ticks.
    pub spacing: TimeDelta,
    /// RNG seed.
    pub seed: u64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            tickers: 4,
            ticks: 100_000,
            spacing: TimeDelta::milliseconds(125),
            seed: 42,
        }
    }
}

/// Start of every synthetic stream.
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Generates a deterministic random-walk stream in timestamp order.
pub fn synthetic_ticks(config: &MarketConfig) -> Vec<Tick> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let tickers: Vec<Ticker> = (0..config.tickers.max(1))
        .map(|i| Ticker::new(format!("T{i:03}")))
        .collect();
    let mut prices = vec![100.0_f64; tickers.len()];
    let mut timestamp = epoch();

    (0..config.ticks)
        .map(|i| {
            let slot = i % tickers.len();
            prices[slot] *= 1.0 + rng.random_range(-0.001..=0.001);
            timestamp += config.spacing;
            Tick::new(tickers[slot].clone(), prices[slot], timestamp)
        })
        .collect()
}
