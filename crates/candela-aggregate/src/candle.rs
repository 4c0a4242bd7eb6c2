//! OHLC candle data structure.

use candela_types::{Resolution, Tick, Ticker};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLC summary of one ticker's ticks within one bucket.
///
/// `low <= open, close <= high` holds at all times. The bucket start never
/// changes after creation and a candle is closed exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    ticker: Ticker,
    resolution: Resolution,
    bucket_start: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    tick_count: u64,
    closed: bool,
}

impl Candle {
    /// Opens a candle from the first tick of its bucket.
    ///
    /// The tick value must be finite.
    #[must_use]
    pub fn new(tick: &Tick, resolution: Resolution) -> Self {
        debug_assert!(tick.value.is_finite(), "non-finite tick value");
        Self {
            ticker: tick.ticker.clone(),
            resolution,
            bucket_start: resolution.bucket_start(tick.timestamp),
            open: tick.value,
            high: tick.value,
            low: tick.value,
            close: tick.value,
            tick_count: 1,
            closed: false,
        }
    }

    /// Folds a tick into the candle.
    ///
    /// The caller must make sure the tick belongs to this candle's bucket
    /// and that its value is finite.
    pub fn update(&mut self, tick: &Tick) {
        debug_assert!(!self.closed, "update on a closed candle");
        debug_assert!(tick.value.is_finite(), "non-finite tick value");
        self.high = self.high.max(tick.value);
        self.low = self.low.min(tick.value);
        self.close = tick.value;
        self.tick_count = self.tick_count.saturating_add(1);
    }

    /// Marks the candle as closed. Must be called exactly once.
    pub fn close(&mut self) {
        debug_assert!(!self.closed, "candle closed twice");
        self.closed = true;
    }

    /// Returns the ticker.
    #[must_use]
    pub const fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    /// Returns the resolution.
    #[must_use]
    pub const fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Returns the start of the candle's bucket.
    #[must_use]
    pub const fn bucket_start(&self) -> DateTime<Utc> {
        self.bucket_start
    }

    /// Returns the (exclusive) end of the candle's bucket.
    #[must_use]
    pub fn bucket_end(&self) -> DateTime<Utc> {
        self.bucket_start + self.resolution.duration()
    }

    /// Opening price (first tick of the bucket).
    #[must_use]
    pub const fn open(&self) -> f64 {
        self.open
    }

    /// Highest price in the bucket.
    #[must_use]
    pub const fn high(&self) -> f64 {
        self.high
    }

    /// Lowest price in the bucket.
    #[must_use]
    pub const fn low(&self) -> f64 {
        self.low
    }

    /// Latest price in the bucket; the closing price once closed.
    #[must_use]
    pub const fn close_price(&self) -> f64 {
        self.close
    }

    /// Number of ticks folded into the candle.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Returns true once the candle has been closed.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Returns the price range (high - low).
    #[must_use]
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Returns the body size (|close - open|).
    #[must_use]
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// Returns true if this is a bullish (green) candle.
    #[must_use]
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// Returns true if this is a bearish (red) candle.
    #[must_use]
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// Returns the typical price ((high + low + close) / 3).
    #[must_use]
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }
}
