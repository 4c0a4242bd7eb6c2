//! Closed-candle sinks for candela.
//!
//! This crate provides the destinations a pipeline stage writes its closed
//! candles to:
//!
//! - [`CandleSink`] - Sink trait, one instance per resolution
//! - [`CsvSink`] - CSV (or TSV) records
//! - [`NdjsonSink`] - Newline-delimited JSON records
//! - [`MemorySink`] - In-memory recorder
//! - [`SinkFormat`] - File format selection and opening

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/candela/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod csv;
mod json;
mod memory;
mod sink;

pub use crate::csv::CsvSink;
pub use json::NdjsonSink;
pub use memory::MemorySink;
pub use sink::{CandleSink, SinkError, SinkFormat};
