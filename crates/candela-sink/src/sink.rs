//! Sink abstraction and output format selection.

use candela_aggregate::Candle;
use candela_types::Resolution;
use std::fs::OpenOptions;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::{CsvSink, NdjsonSink};

/// Errors that can occur while writing candles.
#[derive(Error, Debug)]
pub enum SinkError {
    /// The sink destination could not be opened.
    #[error("Failed to open {path}: {source}")]
    Open {
        /// Destination path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unknown output format.
    #[error("Unknown format: {0}")]
    UnknownFormat(String),
}

/// Durable destination for closed candles of one resolution.
///
/// A sink is owned by a single pipeline stage, so writes never race.
pub trait CandleSink: Send {
    /// Appends one candle and flushes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the candle could not be written. The candle must
    /// then be treated as not persisted.
    fn write(&mut self, candle: &Candle) -> Result<(), SinkError>;
}

impl<S: CandleSink + ?Sized> CandleSink for Box<S> {
    fn write(&mut self, candle: &Candle) -> Result<(), SinkError> {
        (**self).write(candle)
    }
}

/// Output format identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SinkFormat {
    /// CSV format.
    #[default]
    Csv,
    /// Newline-delimited JSON format.
    Ndjson,
}

impl SinkFormat {
    /// Returns the file extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Ndjson => "ndjson",
        }
    }

    /// Returns all available formats.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Csv, Self::Ndjson]
    }

    /// Returns the file name used for a resolution, e.g. `candles_1m.csv`.
    #[must_use]
    pub fn file_name(&self, resolution: Resolution) -> String {
        format!("candles_{resolution}.{}", self.extension())
    }

    /// Opens the sink for `resolution` inside `dir` in append mode.
    ///
    /// A CSV header is written only when requested and the file is new.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn open(
        &self,
        dir: &Path,
        resolution: Resolution,
        header: bool,
    ) -> Result<Box<dyn CandleSink>, SinkError> {
        let path = dir.join(self.file_name(resolution));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| SinkError::Open {
                path: path.clone(),
                source,
            })?;
        let is_new = file
            .metadata()
            .map_err(|source| SinkError::Open { path, source })?
            .len()
            == 0;
        let writer = BufWriter::new(file);

        let sink: Box<dyn CandleSink> = match self {
            Self::Csv => Box::new(CsvSink::new(writer).with_header(header && is_new)),
            Self::Ndjson => Box::new(NdjsonSink::new(writer)),
        };
        Ok(sink)
    }
}

impl std::fmt::Display for SinkFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl std::str::FromStr for SinkFormat {
    type Err = SinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "ndjson" | "jsonl" => Ok(Self::Ndjson),
            _ => Err(SinkError::UnknownFormat(s.to_string())),
        }
    }
}
