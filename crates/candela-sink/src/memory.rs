//! In-memory candle sink.

use candela_aggregate::Candle;
use std::sync::{Arc, Mutex, PoisonError};

use crate::{CandleSink, SinkError};

/// Sink that records candles in memory.
///
/// Clones share the same buffer, so a test can keep one handle while the
/// pipeline owns the other.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    candles: Arc<Mutex<Vec<Candle>>>,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the candles written so far, in write order.
    #[must_use]
    pub fn candles(&self) -> Vec<Candle> {
        self.candles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of candles written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.candles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CandleSink for MemorySink {
    fn write(&mut self, candle: &Candle) -> Result<(), SinkError> {
        self.candles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(candle.clone());
        Ok(())
    }
}
