//! Replay command implementation.
//!
//! Feeds recorded `ticker,timestamp,value` lines through the pipeline in file
//! order. The run ends once the file is exhausted and every stage has
//! flushed, or earlier on Ctrl-C.

use anyhow::{Context, Result};
use std::path::Path;

use crate::output::OutputArgs;
use crate::source;

/// Aggregates the ticks recorded in `file`.
pub(crate) async fn replay(file: &Path, output: &OutputArgs) -> Result<()> {
    // Fail before any sink file is touched.
    tokio::fs::metadata(file)
        .await
        .with_context(|| format!("Cannot read {}", file.display()))?;

    let pipeline = output.pipeline()?;
    let (tx, rx) = pipeline.source_channel();
    let running = pipeline.start(rx)?;

    let path = file.to_path_buf();
    let feeder = tokio::spawn(async move { source::replay_file(&path, tx).await });
    super::supervise(running, feeder).await
}
