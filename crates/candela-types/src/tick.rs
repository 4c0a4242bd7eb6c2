//! Tick data representation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::sync::Arc;

/// Ticker identifier (e.g., "AAPL").
///
/// Cloning is cheap: every stage of the pipeline carries the ticker of each
/// tick it forwards, so the name is shared rather than copied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticker(Arc<str>);

impl Ticker {
    /// Creates a new ticker.
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// Returns the ticker as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Ticker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Ticker {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Ticker {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl Borrow<str> for Ticker {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for Ticker {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Ticker {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

/// A single price observation for a ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    /// Ticker the price belongs to.
    pub ticker: Ticker,
    /// Observed price. Must be finite.
    pub value: f64,
    /// Timestamp of the observation (UTC).
    pub timestamp: DateTime<Utc>,
}

impl Tick {
    /// Creates a new tick.
    #[must_use]
    pub fn new(ticker: impl Into<Ticker>, value: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            ticker: ticker.into(),
            value,
            timestamp,
        }
    }
}
