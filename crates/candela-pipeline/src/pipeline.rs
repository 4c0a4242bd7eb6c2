//! Pipeline composition and lifecycle.

use candela_sink::CandleSink;
use candela_types::{ConfigError, Resolution, ResolutionSet, Tick};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Notify, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::stage::Stage;
use crate::{PipelineError, Result, StageSummary};

/// Pipeline configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Resolutions to aggregate, finest to coarsest.
    pub resolutions: ResolutionSet,
    /// Capacity of the handoff channel between two stages.
    ///
    /// Tokio channels cannot be zero-sized; the default of 1 is the closest
    /// to a rendezvous and keeps backpressure tight.
    pub channel_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            resolutions: ResolutionSet::default(),
            channel_capacity: 1,
        }
    }
}

/// Builder for a chain of aggregation stages, one per resolution.
pub struct Pipeline {
    config: PipelineConfig,
    sinks: HashMap<Resolution, Box<dyn CandleSink>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut with_sinks: Vec<_> = self.sinks.keys().copied().collect();
        with_sinks.sort_unstable();
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("sinks", &with_sinks)
            .finish()
    }
}

impl Pipeline {
    /// Creates a pipeline for the given resolutions with default settings.
    #[must_use]
    pub fn new(resolutions: ResolutionSet) -> Self {
        Self::with_config(PipelineConfig {
            resolutions,
            ..Default::default()
        })
    }

    /// Creates a pipeline with custom configuration.
    #[must_use]
    pub fn with_config(config: PipelineConfig) -> Self {
        Self {
            config,
            sinks: HashMap::new(),
        }
    }

    /// Returns the pipeline configuration.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Creates a tick source channel with the configured handoff capacity.
    #[must_use]
    pub fn source_channel(&self) -> (mpsc::Sender<Tick>, mpsc::Receiver<Tick>) {
        mpsc::channel(self.config.channel_capacity.max(1))
    }

    /// Sets the sink closed candles of `resolution` are written to.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedResolution`] if `resolution` is not
    /// part of the configured set.
    pub fn with_sink(
        mut self,
        resolution: Resolution,
        sink: impl CandleSink + 'static,
    ) -> Result<Self> {
        if !self.config.resolutions.contains(resolution) {
            return Err(ConfigError::UnsupportedResolution(resolution.to_string()).into());
        }
        self.sinks.insert(resolution, Box::new(sink));
        Ok(self)
    }

    /// Spawns one stage per resolution and connects them finest to coarsest.
    ///
    /// `source` feeds the finest stage. Must be called from within a tokio
    /// runtime.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::MissingSink`] if a resolution has no sink.
    /// Nothing is spawned in that case.
    pub fn start(mut self, source: mpsc::Receiver<Tick>) -> Result<RunningPipeline> {
        if let Some(missing) = self
            .config
            .resolutions
            .iter()
            .find(|resolution| !self.sinks.contains_key(resolution))
        {
            return Err(PipelineError::MissingSink(missing));
        }

        let capacity = self.config.channel_capacity.max(1);
        let (stop_tx, stop_rx) = watch::channel(false);
        let mut stop_rx = Some(stop_rx);
        let failure = Arc::new(Notify::new());
        let mut input = source;
        let mut stages = Vec::with_capacity(self.config.resolutions.len());

        for resolution in &self.config.resolutions {
            let sink = self
                .sinks
                .remove(&resolution)
                .ok_or(PipelineError::MissingSink(resolution))?;
            let (tx, rx) = mpsc::channel(capacity);
            let mut stage =
                Stage::new(resolution, sink, input, tx).notify_failure(Arc::clone(&failure));
            // The finest stage stops on the signal; the rest follow its end-of-stream.
            if let Some(stop_rx) = stop_rx.take() {
                stage = stage.stop_on(stop_rx);
            }
            stages.push((resolution, tokio::spawn(stage.run())));
            input = rx;
        }

        info!(resolutions = %self.config.resolutions, "pipeline started");

        Ok(RunningPipeline {
            stop_tx,
            failure,
            stages,
            output: Some(input),
        })
    }
}

/// Counters of every stage of a finished pipeline, finest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSummary {
    /// Per-stage counters.
    pub stages: Vec<StageSummary>,
}

impl PipelineSummary {
    /// Returns the counters of one stage.
    #[must_use]
    pub fn stage(&self, resolution: Resolution) -> Option<&StageSummary> {
        self.stages.iter().find(|s| s.resolution == resolution)
    }

    /// Returns the number of candles written across all stages.
    #[must_use]
    pub fn total_candles(&self) -> u64 {
        self.stages.iter().map(|s| s.candles).sum()
    }

    /// Returns the number of stale ticks rejected across all stages.
    #[must_use]
    pub fn total_stale(&self) -> u64 {
        self.stages.iter().map(|s| s.stale).sum()
    }
}

/// Handle to a started pipeline.
///
/// Dropping the handle without calling [`shutdown`](Self::shutdown) or
/// [`join`](Self::join) also signals the stages, which then flush in the
/// background.
#[derive(Debug)]
pub struct RunningPipeline {
    stop_tx: watch::Sender<bool>,
    failure: Arc<Notify>,
    stages: Vec<(Resolution, JoinHandle<Result<StageSummary>>)>,
    output: Option<mpsc::Receiver<Tick>>,
}

impl RunningPipeline {
    /// Takes the derived-tick output of the coarsest stage.
    ///
    /// Whoever takes the output must keep receiving from it until it ends,
    /// including during [`shutdown`](Self::shutdown), otherwise the chain
    /// stalls. When it is never taken, [`shutdown`](Self::shutdown) and
    /// [`join`](Self::join) discard it.
    pub fn take_output(&mut self) -> Option<mpsc::Receiver<Tick>> {
        self.output.take()
    }

    /// Returns true once every stage has terminated.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.stages.iter().all(|(_, handle)| handle.is_finished())
    }

    /// Resolves once some stage has failed.
    ///
    /// A failed stage has already stopped; the owner is expected to call
    /// [`shutdown`](Self::shutdown) to stop the rest and collect the error.
    pub async fn failed(&self) {
        self.failure.notified().await;
    }

    /// Stops taking ticks from the source and waits until every stage has
    /// written its remaining open candles.
    ///
    /// Ticks the source already handed over are still aggregated at every
    /// resolution before the flush.
    ///
    /// There is no timeout: the flush always runs to completion.
    ///
    /// # Errors
    ///
    /// Returns the first stage error, in resolution order.
    pub async fn shutdown(self) -> Result<PipelineSummary> {
        info!("pipeline shutdown requested");
        self.stop_tx.send_replace(true);
        self.wait().await
    }

    /// Waits for the pipeline to finish on its own, which happens once the
    /// tick source is exhausted.
    ///
    /// # Errors
    ///
    /// Returns the first stage error, in resolution order.
    pub async fn join(self) -> Result<PipelineSummary> {
        self.wait().await
    }

    async fn wait(self) -> Result<PipelineSummary> {
        let Self {
            stop_tx,
            stages,
            output,
            ..
        } = self;

        let discard = output.map(|mut rx| {
            tokio::spawn(async move { while rx.recv().await.is_some() {} })
        });

        let (resolutions, handles): (Vec<_>, Vec<_>) = stages.into_iter().unzip();
        let results = futures::future::join_all(handles).await;

        // Kept alive until here so that waiting never doubles as a stop signal.
        drop(stop_tx);
        if let Some(discard) = discard {
            // Ends once the coarsest stage has dropped its sender.
            let _ = discard.await;
        }

        let mut summaries = Vec::with_capacity(results.len());
        let mut first_error = None;
        for (resolution, result) in resolutions.into_iter().zip(results) {
            let outcome = result
                .map_err(|source| PipelineError::Join { resolution, source })
                .and_then(|stage| stage);
            match outcome {
                Ok(summary) => summaries.push(summary),
                Err(e) => {
                    if matches!(e, PipelineError::Join { .. }) {
                        error!(%resolution, error = %e, "stage did not complete");
                    }
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                let summary = PipelineSummary { stages: summaries };
                info!(candles = summary.total_candles(), "pipeline finished");
                Ok(summary)
            }
        }
    }
}
