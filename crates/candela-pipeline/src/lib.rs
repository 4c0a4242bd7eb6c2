//! Concurrent multi-resolution candle pipeline for candela.
//!
//! This crate wires aggregation stages into a chain, one tokio task per
//! resolution:
//!
//! - [`Pipeline`] - Builder binding resolutions to sinks
//! - [`RunningPipeline`] - Handle used to shut the chain down and collect results
//! - [`PipelineConfig`] - Resolutions and handoff capacity
//! - [`StageSummary`] / [`PipelineSummary`] - Counters reported on completion
//! - [`PipelineError`] - Configuration and sink failures

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/candela/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod pipeline;
mod stage;

pub use error::{PipelineError, Result};
pub use pipeline::{Pipeline, PipelineConfig, PipelineSummary, RunningPipeline};
pub use stage::StageSummary;
