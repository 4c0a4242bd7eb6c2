//! Core types for the candela OHLC candle aggregator.
//!
//! This crate provides the fundamental data structures used throughout candela:
//!
//! - [`Tick`] - A single price observation for a [`Ticker`]
//! - [`Resolution`] - Candle bucket width
//! - [`ResolutionSet`] - The configured resolutions, finest to coarsest
//! - [`ConfigError`] - Fatal configuration errors

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/candela/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod resolution;
mod tick;

pub use error::{ConfigError, Result};
pub use resolution::{Resolution, ResolutionSet};
pub use tick::{Tick, Ticker};
