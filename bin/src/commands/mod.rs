//! CLI command implementations.

pub(crate) mod generate;
pub(crate) mod replay;

use anyhow::{Context, Result};
use candela_lib::prelude::*;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// What ended the feed.
enum Outcome {
    Interrupted,
    StageFailed,
    Fed(Result<Result<u64>, tokio::task::JoinError>),
}

/// Runs `feeder` against a started pipeline until the feed ends, a stage
/// fails, or Ctrl-C is received, then waits for every stage to flush.
pub(crate) async fn supervise(
    pipeline: RunningPipeline,
    mut feeder: JoinHandle<Result<u64>>,
) -> Result<()> {
    let outcome = tokio::select! {
        interrupt = tokio::signal::ctrl_c() => {
            interrupt.context("Failed to listen for Ctrl-C")?;
            Outcome::Interrupted
        }
        () = pipeline.failed() => Outcome::StageFailed,
        fed = &mut feeder => Outcome::Fed(fed),
    };

    let summary = match outcome {
        Outcome::Fed(fed) => {
            let sent = fed.context("Tick source panicked")?;
            match sent {
                Ok(sent) => {
                    info!(ticks = sent, "tick source exhausted");
                    pipeline.join().await
                }
                Err(e) => {
                    // Flush what was aggregated so far before reporting.
                    pipeline.shutdown().await?;
                    return Err(e.context("Tick source failed"));
                }
            }
        }
        Outcome::Interrupted => {
            info!("interrupted, draining open candles");
            feeder.abort();
            pipeline.shutdown().await
        }
        Outcome::StageFailed => {
            warn!("stage failed, stopping pipeline");
            feeder.abort();
            pipeline.shutdown().await
        }
    }
    .context("Pipeline failed")?;

    report(&summary);
    Ok(())
}

fn report(summary: &PipelineSummary) {
    for stage in &summary.stages {
        info!(
            resolution = %stage.resolution,
            ticks = stage.ticks,
            candles = stage.candles,
            drained = stage.drained,
            stale = stage.stale,
            "stage summary"
        );
    }
    if summary.total_stale() > 0 {
        warn!(stale = summary.total_stale(), "stale ticks were rejected");
    }
    info!(candles = summary.total_candles(), "shutdown complete");
}
