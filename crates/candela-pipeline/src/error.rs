//! Error types for the candle pipeline.

use candela_sink::SinkError;
use candela_types::{ConfigError, Resolution, Ticker};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur while building or running a pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Invalid configuration; the pipeline never started.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A configured resolution has no sink.
    #[error("No sink configured for resolution {0}")]
    MissingSink(Resolution),

    /// A closed candle could not be written.
    #[error("{resolution} sink failed writing {ticker} candle at {bucket_start}: {source}")]
    Sink {
        /// Resolution of the failing stage.
        resolution: Resolution,
        /// Ticker of the candle that was not persisted.
        ticker: Ticker,
        /// Bucket of the candle that was not persisted.
        bucket_start: DateTime<Utc>,
        /// Underlying sink error.
        source: SinkError,
    },

    /// A stage task panicked or was cancelled.
    #[error("{resolution} stage task failed: {source}")]
    Join {
        /// Resolution of the failed stage.
        resolution: Resolution,
        /// Underlying join error.
        source: tokio::task::JoinError,
    },
}
