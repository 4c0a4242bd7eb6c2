//! Candle resolutions and the time-bucket function.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::ConfigError;

/// Width of the time buckets a candle summarizes.
///
/// Variants are declared finest first, so the derived ordering is the
/// ordering by duration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub enum Resolution {
    /// 1-minute candles.
    #[default]
    #[serde(rename = "1m")]
    Minute1,
    /// 2-minute candles.
    #[serde(rename = "2m")]
    Minute2,
    /// 5-minute candles.
    #[serde(rename = "5m")]
    Minute5,
    /// 10-minute candles.
    #[serde(rename = "10m")]
    Minute10,
    /// 15-minute candles.
    #[serde(rename = "15m")]
    Minute15,
    /// 30-minute candles.
    #[serde(rename = "30m")]
    Minute30,
    /// 1-hour candles.
    #[serde(rename = "1h")]
    Hour1,
}

impl Resolution {
    /// Returns the bucket width in seconds.
    #[must_use]
    pub const fn seconds(&self) -> u32 {
        match self {
            Self::Minute1 => 60,
            Self::Minute2 => 120,
            Self::Minute5 => 300,
            Self::Minute10 => 600,
            Self::Minute15 => 900,
            Self::Minute30 => 1800,
            Self::Hour1 => 3600,
        }
    }

    /// Returns the bucket width in milliseconds.
    #[must_use]
    pub const fn milliseconds(&self) -> i64 {
        self.seconds() as i64 * 1000
    }

    /// Returns the bucket width as a [`TimeDelta`].
    #[must_use]
    pub const fn duration(&self) -> TimeDelta {
        TimeDelta::milliseconds(self.milliseconds())
    }

    /// Returns the resolution as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Minute1 => "1m",
            Self::Minute2 => "2m",
            Self::Minute5 => "5m",
            Self::Minute10 => "10m",
            Self::Minute15 => "15m",
            Self::Minute30 => "30m",
            Self::Hour1 => "1h",
        }
    }

    /// Returns all supported resolutions, finest first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Minute1,
            Self::Minute2,
            Self::Minute5,
            Self::Minute10,
            Self::Minute15,
            Self::Minute30,
            Self::Hour1,
        ]
    }

    /// Returns the start of the bucket containing `timestamp`.
    ///
    /// Buckets are aligned to whole multiples of the width counted from the
    /// Unix epoch, so a 2-minute bucket always starts on an even minute.
    #[must_use]
    pub fn bucket_start(&self, timestamp: DateTime<Utc>) -> DateTime<Utc> {
        let into_bucket = timestamp.timestamp_millis().rem_euclid(self.milliseconds());
        let sub_millis = i64::from(timestamp.timestamp_subsec_nanos() % 1_000_000);
        timestamp - TimeDelta::milliseconds(into_bucket) - TimeDelta::nanoseconds(sub_millis)
    }

    /// Returns true if every bucket of `self` lies inside a single bucket of
    /// `coarser`.
    #[must_use]
    pub const fn nests_in(&self, coarser: Self) -> bool {
        coarser.seconds() % self.seconds() == 0
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1m" | "m1" | "minute" | "minute1" => Ok(Self::Minute1),
            "2m" | "m2" | "minute2" => Ok(Self::Minute2),
            "5m" | "m5" | "minute5" => Ok(Self::Minute5),
            "10m" | "m10" | "minute10" => Ok(Self::Minute10),
            "15m" | "m15" | "minute15" => Ok(Self::Minute15),
            "30m" | "m30" | "minute30" => Ok(Self::Minute30),
            "1h" | "h1" | "60m" | "hour" | "hour1" => Ok(Self::Hour1),
            _ => Err(ConfigError::UnsupportedResolution(s.to_string())),
        }
    }
}

/// The configured resolutions of a pipeline, ordered finest to coarsest.
///
/// A set is never empty and each resolution nests in the next coarser one,
/// which is what lets a coarser stage aggregate the derived ticks of a finer
/// stage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolutionSet(Vec<Resolution>);

impl ResolutionSet {
    /// Creates a resolution set. Input order and duplicates do not matter.
    ///
    /// # Errors
    ///
    /// Returns an error if the set is empty or a resolution does not nest in
    /// the next coarser one.
    pub fn new(resolutions: impl IntoIterator<Item = Resolution>) -> Result<Self, ConfigError> {
        let mut resolutions: Vec<_> = resolutions.into_iter().collect();
        resolutions.sort_unstable();
        resolutions.dedup();

        if resolutions.is_empty() {
            return Err(ConfigError::EmptyResolutionSet);
        }
        for pair in resolutions.windows(2) {
            let (finer, coarser) = (pair[0], pair[1]);
            if !finer.nests_in(coarser) {
                return Err(ConfigError::NotNested { finer, coarser });
            }
        }

        Ok(Self(resolutions))
    }

    /// Returns the resolutions, finest first.
    #[must_use]
    pub fn as_slice(&self) -> &[Resolution] {
        &self.0
    }

    /// Returns an iterator over the resolutions, finest first.
    pub fn iter(&self) -> impl Iterator<Item = Resolution> + '_ {
        self.0.iter().copied()
    }

    /// Returns the number of resolutions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the set holds no resolution, which a constructed set never does.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if the set contains `resolution`.
    #[must_use]
    pub fn contains(&self, resolution: Resolution) -> bool {
        self.0.contains(&resolution)
    }

    /// Returns the finest resolution.
    #[must_use]
    pub fn finest(&self) -> Resolution {
        self.0[0]
    }

    /// Returns the coarsest resolution.
    #[must_use]
    pub fn coarsest(&self) -> Resolution {
        self.0[self.0.len() - 1]
    }

    /// Returns the start of the bucket containing `timestamp` at `resolution`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedResolution`] if `resolution` is not
    /// part of this set.
    pub fn bucket_start(
        &self,
        resolution: Resolution,
        timestamp: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, ConfigError> {
        if !self.contains(resolution) {
            return Err(ConfigError::UnsupportedResolution(resolution.to_string()));
        }
        Ok(resolution.bucket_start(timestamp))
    }
}

impl Default for ResolutionSet {
    fn default() -> Self {
        Self(vec![
            Resolution::Minute1,
            Resolution::Minute2,
            Resolution::Minute10,
        ])
    }
}

impl std::fmt::Display for ResolutionSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, resolution) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{resolution}")?;
        }
        Ok(())
    }
}

impl FromStr for ResolutionSet {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let resolutions = s
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(str::parse)
            .collect::<Result<Vec<Resolution>, _>>()?;
        Self::new(resolutions)
    }
}

impl<'a> IntoIterator for &'a ResolutionSet {
    type Item = Resolution;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, Resolution>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    fn at(hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, hour, minute, second).unwrap()
    }

    #[test]
    fn test_resolution_ordering() {
        assert!(Resolution::Minute1 < Resolution::Minute2);
        assert!(Resolution::Minute10 < Resolution::Hour1);
        assert_eq!(Resolution::Minute10.seconds(), 600);
    }

    #[test]
    fn test_resolution_parse() {
        assert_eq!("1m".parse::<Resolution>().unwrap(), Resolution::Minute1);
        assert_eq!("M10".parse::<Resolution>().unwrap(), Resolution::Minute10);
        assert_eq!("1h".parse::<Resolution>().unwrap(), Resolution::Hour1);
        assert!(matches!(
            "3m".parse::<Resolution>(),
            Err(ConfigError::UnsupportedResolution(s)) if s == "3m"
        ));
    }

    #[test]
    fn test_bucket_start() {
        let ts = at(14, 37, 45);
        assert_eq!(Resolution::Minute1.bucket_start(ts), at(14, 37, 0));
        assert_eq!(Resolution::Minute2.bucket_start(ts), at(14, 36, 0));
        assert_eq!(Resolution::Minute10.bucket_start(ts), at(14, 30, 0));
        assert_eq!(Resolution::Hour1.bucket_start(ts), at(14, 0, 0));
    }

    #[test]
    fn test_bucket_start_drops_subseconds() {
        let ts = at(9, 1, 5) + TimeDelta::nanoseconds(123_456_789);
        let start = Resolution::Minute1.bucket_start(ts);
        assert_eq!(start, at(9, 1, 0));
        assert_eq!(start.nanosecond(), 0);
    }

    #[test]
    fn test_bucket_start_before_epoch() {
        let ts = Utc.with_ymd_and_hms(1969, 12, 31, 23, 59, 30).unwrap();
        let start = Resolution::Minute2.bucket_start(ts);
        assert_eq!(start, Utc.with_ymd_and_hms(1969, 12, 31, 23, 58, 0).unwrap());
    }

    #[test]
    fn test_bucket_start_is_idempotent() {
        let mut ts = at(0, 0, 0);
        for _ in 0..500 {
            for &resolution in Resolution::all() {
                let once = resolution.bucket_start(ts);
                assert_eq!(resolution.bucket_start(once), once);
                assert!(once <= ts);
                assert!(ts - once < resolution.duration());
            }
            ts += TimeDelta::milliseconds(7_919);
        }
    }

    #[test]
    fn test_set_sorts_and_dedups() {
        let set = ResolutionSet::new([
            Resolution::Minute10,
            Resolution::Minute1,
            Resolution::Minute2,
            Resolution::Minute1,
        ])
        .unwrap();
        assert_eq!(set, ResolutionSet::default());
        assert_eq!(set.finest(), Resolution::Minute1);
        assert_eq!(set.coarsest(), Resolution::Minute10);
        assert_eq!(set.to_string(), "1m,2m,10m");
    }

    #[test]
    fn test_set_rejects_invalid() {
        assert_eq!(ResolutionSet::new([]), Err(ConfigError::EmptyResolutionSet));
        assert_eq!(
            ResolutionSet::new([Resolution::Minute2, Resolution::Minute5]),
            Err(ConfigError::NotNested {
                finer: Resolution::Minute2,
                coarser: Resolution::Minute5,
            })
        );
    }

    #[test]
    fn test_set_parse() {
        let set: ResolutionSet = "1m, 5m,15m".parse().unwrap();
        assert_eq!(
            set.as_slice(),
            &[Resolution::Minute1, Resolution::Minute5, Resolution::Minute15]
        );
        assert!("1m,7m".parse::<ResolutionSet>().is_err());
    }

    #[test]
    fn test_set_bucket_start_unsupported() {
        let set = ResolutionSet::default();
        let ts = at(10, 11, 12);
        assert_eq!(set.bucket_start(Resolution::Minute2, ts), Ok(at(10, 10, 0)));
        assert_eq!(
            set.bucket_start(Resolution::Hour1, ts),
            Err(ConfigError::UnsupportedResolution("1h".to_string()))
        );
    }
}
