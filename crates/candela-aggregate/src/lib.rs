//! Per-resolution OHLC candle aggregation for candela.
//!
//! This crate provides the synchronous aggregation core:
//!
//! - [`Candle`] - OHLC candle data structure
//! - [`CandleAggregator`] - Active-candle table and per-tick state machine
//! - [`Step`] - Derived tick and closed candle produced by one tick
//! - [`StaleTick`] - Rejection of a tick older than the open bucket

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/candela/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod aggregator;
mod candle;

pub use aggregator::{CandleAggregator, StaleTick, Step};
pub use candle::Candle;
