//! Streaming multi-resolution OHLC candle aggregation.
//!
//! This is a facade crate that re-exports functionality from the candela
//! workspace crates for convenient access.
//!
//! # Quick Start
//!
//! ```ignore
//! use candela_lib::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dir = std::path::Path::new(".");
//!     let resolutions = ResolutionSet::default();
//!
//!     let mut pipeline = Pipeline::new(resolutions.clone());
//!     for resolution in &resolutions {
//!         let sink = SinkFormat::Csv.open(dir, resolution, true)?;
//!         pipeline = pipeline.with_sink(resolution, sink)?;
//!     }
//!
//!     let (tx, rx) = pipeline.source_channel();
//!     let running = pipeline.start(rx)?;
//!
//!     tx.send(Tick::new("AAPL", 100.0, chrono::Utc::now())).await?;
//!     drop(tx);
//!
//!     let summary = running.join().await?;
//!     println!("Wrote {} candles", summary.total_candles());
//!     Ok(())
//! }
//! ```

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/candela/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use candela_types::*;

// Re-export aggregation
#[cfg(feature = "aggregate")]
pub use candela_aggregate::{Candle, CandleAggregator, StaleTick, Step};

// Re-export sinks
#[cfg(feature = "sink")]
pub use candela_sink::{CandleSink, CsvSink, MemorySink, NdjsonSink, SinkError, SinkFormat};

// Re-export the pipeline
#[cfg(feature = "pipeline")]
pub use candela_pipeline::{
    Pipeline, PipelineConfig, PipelineError, PipelineSummary, RunningPipeline, StageSummary,
};

/// Prelude module for convenient imports.
///
/// ```
/// use candela_lib::prelude::*;
/// ```
pub mod prelude {
    pub use candela_types::{ConfigError, Resolution, ResolutionSet, Tick, Ticker};

    #[cfg(feature = "aggregate")]
    pub use candela_aggregate::{Candle, CandleAggregator};

    #[cfg(feature = "sink")]
    pub use candela_sink::{CandleSink, CsvSink, MemorySink, NdjsonSink, SinkFormat};

    #[cfg(feature = "pipeline")]
    pub use candela_pipeline::{
        Pipeline, PipelineConfig, PipelineError, PipelineSummary, RunningPipeline,
    };
}
