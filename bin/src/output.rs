//! Output options shared by every command.

use anyhow::{Context, Result};
use candela_lib::prelude::*;
use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum Format {
    Csv,
    Ndjson,
}

impl From<Format> for SinkFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Csv => Self::Csv,
            Format::Ndjson => Self::Ndjson,
        }
    }
}

/// Where and how closed candles are written.
#[derive(Debug, Clone, Args)]
pub(crate) struct OutputArgs {
    /// Comma-separated candle resolutions, finest first (e.g. 1m,2m,10m)
    #[arg(short, long, default_value = "1m,2m,10m")]
    pub(crate) resolutions: ResolutionSet,

    /// Directory the per-resolution files are appended to
    #[arg(short, long, default_value = ".")]
    pub(crate) output_dir: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "csv")]
    pub(crate) format: Format,

    /// Write a header row to new CSV files
    #[arg(long)]
    pub(crate) header: bool,
}

impl OutputArgs {
    /// Opens one sink per resolution and attaches it to a new pipeline.
    pub(crate) fn pipeline(&self) -> Result<Pipeline> {
        let format = SinkFormat::from(self.format);
        let mut pipeline = Pipeline::new(self.resolutions.clone());

        for resolution in &self.resolutions {
            let sink = format
                .open(&self.output_dir, resolution, self.header)
                .with_context(|| format!("Failed to open {resolution} sink"))?;
            pipeline = pipeline.with_sink(resolution, sink)?;
            tracing::debug!(
                %resolution,
                file = %self.output_dir.join(format.file_name(resolution)).display(),
                "sink opened"
            );
        }

        Ok(pipeline)
    }
}
