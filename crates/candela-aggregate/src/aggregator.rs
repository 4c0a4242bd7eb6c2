//! Streaming tick-to-candle aggregation for one resolution.

use candela_types::{Resolution, Tick, Ticker};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;

use crate::Candle;

/// A tick that belongs to a bucket before the ticker's open candle.
///
/// The aggregator rejects such ticks without touching its state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Stale tick for {ticker} at {resolution}: bucket {bucket} is before open bucket {open_bucket}")]
pub struct StaleTick {
    /// Ticker of the rejected tick.
    pub ticker: Ticker,
    /// Resolution of the rejecting aggregator.
    pub resolution: Resolution,
    /// Bucket the tick falls into.
    pub bucket: DateTime<Utc>,
    /// Bucket of the ticker's open candle.
    pub open_bucket: DateTime<Utc>,
}

/// Outcome of processing one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// Tick to forward to the next coarser aggregator: the ticker's current
    /// close at the timestamp of the processed tick.
    pub derived: Tick,
    /// Candle closed by this tick, if it started a new bucket.
    pub closed: Option<Candle>,
}

/// Streaming candle aggregator for a single resolution.
///
/// Holds the active-candle table: at most one open candle per ticker.
/// Tickers never interfere with one another.
#[derive(Debug)]
pub struct CandleAggregator {
    resolution: Resolution,
    open: HashMap<Ticker, Candle>,
}

impl CandleAggregator {
    /// Creates a new aggregator for the given resolution.
    #[must_use]
    pub fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            open: HashMap::new(),
        }
    }

    /// Returns the resolution being aggregated to.
    #[must_use]
    pub const fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Processes a tick.
    ///
    /// # Errors
    ///
    /// Returns [`StaleTick`] if the tick's bucket is before the bucket of the
    /// ticker's open candle.
    pub fn process(&mut self, tick: Tick) -> Result<Step, StaleTick> {
        let bucket = self.resolution.bucket_start(tick.timestamp);

        let closed = match self.open.get_mut(&tick.ticker) {
            Some(candle) if bucket == candle.bucket_start() => {
                candle.update(&tick);
                None
            }
            Some(candle) if bucket < candle.bucket_start() => {
                return Err(StaleTick {
                    ticker: tick.ticker,
                    resolution: self.resolution,
                    bucket,
                    open_bucket: candle.bucket_start(),
                });
            }
            Some(candle) => {
                let mut finished = std::mem::replace(candle, Candle::new(&tick, self.resolution));
                finished.close();
                Some(finished)
            }
            None => {
                self.open
                    .insert(tick.ticker.clone(), Candle::new(&tick, self.resolution));
                None
            }
        };

        // The open candle's close is the value just folded in.
        Ok(Step {
            derived: tick,
            closed,
        })
    }

    /// Closes and returns every open candle, ordered by ticker.
    ///
    /// The aggregator is empty afterwards.
    pub fn drain(&mut self) -> Vec<Candle> {
        let mut candles: Vec<Candle> = self
            .open
            .drain()
            .map(|(_, mut candle)| {
                candle.close();
                candle
            })
            .collect();
        candles.sort_by(|a, b| a.ticker().cmp(b.ticker()));
        candles
    }

    /// Returns the open candle for a ticker.
    #[must_use]
    pub fn open_candle(&self, ticker: &str) -> Option<&Candle> {
        self.open.get(ticker)
    }

    /// Returns the number of open candles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.open.len()
    }

    /// Returns true if no candle is open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{TimeDelta, TimeZone};

    fn make_tick(ticker: &str, minute: u32, second: u32, value: f64) -> Tick {
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 1, 0, minute, second).unwrap();
        Tick::new(ticker, value, timestamp)
    }

    #[test]
    fn test_minute_aggregation() {
        let mut agg = CandleAggregator::new(Resolution::Minute1);

        // 00:00:10 and 00:00:40 share a bucket
        let step = agg.process(make_tick("AAPL", 0, 10, 100.0)).unwrap();
        assert!(step.closed.is_none());
        let step = agg.process(make_tick("AAPL", 0, 40, 105.0)).unwrap();
        assert!(step.closed.is_none());

        // 00:01:05 starts a new bucket and closes the first
        let step = agg.process(make_tick("AAPL", 1, 5, 102.0)).unwrap();
        let candle = step.closed.unwrap();

        assert!(candle.is_closed());
        assert_eq!(
            candle.bucket_start(),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
        assert_relative_eq!(candle.open(), 100.0);
        assert_relative_eq!(candle.high(), 105.0);
        assert_relative_eq!(candle.low(), 100.0);
        assert_relative_eq!(candle.close_price(), 105.0);

        let open = agg.open_candle("AAPL").unwrap();
        assert_eq!(
            open.bucket_start(),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 1, 0).unwrap()
        );
        assert_relative_eq!(open.open(), 102.0);
        assert!(!open.is_closed());
    }

    #[test]
    fn test_derived_tick_carries_close() {
        let mut agg = CandleAggregator::new(Resolution::Minute1);

        let tick = make_tick("AAPL", 0, 10, 100.0);
        let step = agg.process(tick.clone()).unwrap();
        assert_eq!(step.derived, tick);

        let tick = make_tick("AAPL", 0, 20, 99.5);
        let step = agg.process(tick.clone()).unwrap();
        assert_relative_eq!(step.derived.value, 99.5);
        assert_eq!(step.derived.timestamp, tick.timestamp);
        assert_relative_eq!(
            agg.open_candle("AAPL").unwrap().close_price(),
            step.derived.value
        );
    }

    #[test]
    fn test_tickers_are_independent() {
        let mut agg = CandleAggregator::new(Resolution::Minute1);

        agg.process(make_tick("AAPL", 0, 10, 100.0)).unwrap();
        agg.process(make_tick("SBER", 0, 50, 250.0)).unwrap();
        // SBER moves to the next minute; AAPL's candle stays open
        let step = agg.process(make_tick("SBER", 1, 0, 251.0)).unwrap();
        assert_eq!(step.closed.unwrap().ticker().as_str(), "SBER");
        assert_eq!(agg.len(), 2);

        let step = agg.process(make_tick("AAPL", 0, 59, 101.0)).unwrap();
        assert!(step.closed.is_none());
        assert_relative_eq!(agg.open_candle("AAPL").unwrap().close_price(), 101.0);
    }

    #[test]
    fn test_skipped_buckets_close_once() {
        let mut agg = CandleAggregator::new(Resolution::Minute1);

        agg.process(make_tick("AAPL", 0, 10, 100.0)).unwrap();
        let step = agg.process(make_tick("AAPL", 7, 0, 90.0)).unwrap();

        let closed = step.closed.unwrap();
        assert_eq!(
            closed.bucket_start(),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(agg.len(), 1);
    }

    #[test]
    fn test_stale_tick_is_rejected() {
        let mut agg = CandleAggregator::new(Resolution::Minute1);

        agg.process(make_tick("AAPL", 2, 0, 100.0)).unwrap();
        let err = agg.process(make_tick("AAPL", 1, 59, 80.0)).unwrap_err();

        assert_eq!(err.ticker.as_str(), "AAPL");
        assert_eq!(err.bucket, Utc.with_ymd_and_hms(2024, 1, 1, 0, 1, 0).unwrap());
        assert_eq!(
            err.open_bucket,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 2, 0).unwrap()
        );

        let open = agg.open_candle("AAPL").unwrap();
        assert_relative_eq!(open.low(), 100.0);
        assert_eq!(open.tick_count(), 1);
    }

    #[test]
    fn test_late_tick_within_bucket_is_folded() {
        let mut agg = CandleAggregator::new(Resolution::Minute2);

        agg.process(make_tick("AAPL", 1, 30, 100.0)).unwrap();
        let step = agg.process(make_tick("AAPL", 0, 5, 95.0)).unwrap();

        assert!(step.closed.is_none());
        assert_relative_eq!(agg.open_candle("AAPL").unwrap().low(), 95.0);
    }

    #[test]
    fn test_drain() {
        let mut agg = CandleAggregator::new(Resolution::Minute10);

        agg.process(make_tick("SBER", 0, 0, 250.0)).unwrap();
        agg.process(make_tick("AAPL", 3, 0, 100.0)).unwrap();

        let drained = agg.drain();
        assert!(agg.is_empty());
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].ticker().as_str(), "AAPL");
        assert_eq!(drained[1].ticker().as_str(), "SBER");
        assert!(drained.iter().all(Candle::is_closed));
        assert!(agg.drain().is_empty());
    }

    #[test]
    fn test_candle_count_matches_buckets() {
        let mut agg = CandleAggregator::new(Resolution::Minute2);
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let mut closed = Vec::new();
        // One tick every 25 seconds for 20 minutes: 10 two-minute buckets
        for i in 0..48 {
            let tick = Tick::new("NVDA", f64::from(i), start + TimeDelta::seconds(25 * i64::from(i)));
            closed.extend(agg.process(tick).unwrap().closed);
        }
        closed.extend(agg.drain());

        assert_eq!(closed.len(), 10);
        for candle in &closed {
            // Values increase monotonically, so open = low and close = high
            assert_relative_eq!(candle.open(), candle.low());
            assert_relative_eq!(candle.close_price(), candle.high());
        }
        assert_relative_eq!(closed[0].open(), 0.0);
        assert_relative_eq!(closed[0].close_price(), 4.0);
    }
}
