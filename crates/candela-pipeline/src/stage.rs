//! Aggregation stage task for one resolution.

use candela_aggregate::{Candle, CandleAggregator};
use candela_sink::CandleSink;
use candela_types::{Resolution, Tick};
use std::sync::Arc;
use tokio::sync::{Notify, mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::{PipelineError, Result};

/// Counters reported by a stage once it has terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSummary {
    /// Resolution of the stage.
    pub resolution: Resolution,
    /// Ticks received.
    pub ticks: u64,
    /// Closed candles written, including the shutdown flush.
    pub candles: u64,
    /// Candles written by the shutdown flush.
    pub drained: u64,
    /// Ticks rejected for falling before the open bucket.
    pub stale: u64,
}

impl StageSummary {
    const fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            ticks: 0,
            candles: 0,
            drained: 0,
            stale: 0,
        }
    }
}

/// Why the receive loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    /// Shutdown was signaled (or the pipeline handle was dropped).
    Signal,
    /// The upstream sender closed.
    Exhausted,
}

/// What the receive loop got next.
enum Next {
    Tick(Tick),
    Signal,
    Exhausted,
}

/// A single aggregation stage.
///
/// Owns its aggregator and its sink exclusively; the only way in is the
/// input channel and the only way out is the output channel.
///
/// Only the stage fed by the tick source watches the shutdown signal. Every
/// other stage runs until its upstream closes, so end-of-stream travels down
/// the chain behind the last derived tick.
pub(crate) struct Stage {
    aggregator: CandleAggregator,
    sink: Box<dyn CandleSink>,
    input: mpsc::Receiver<Tick>,
    output: Option<mpsc::Sender<Tick>>,
    shutdown: Option<watch::Receiver<bool>>,
    failure: Option<Arc<Notify>>,
    summary: StageSummary,
}

impl Stage {
    pub(crate) fn new(
        resolution: Resolution,
        sink: Box<dyn CandleSink>,
        input: mpsc::Receiver<Tick>,
        output: mpsc::Sender<Tick>,
    ) -> Self {
        Self {
            aggregator: CandleAggregator::new(resolution),
            sink,
            input,
            output: Some(output),
            shutdown: None,
            failure: None,
            summary: StageSummary::new(resolution),
        }
    }

    /// Makes the stage stop taking new input once `shutdown` turns true or
    /// its sender is dropped.
    pub(crate) fn stop_on(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Sets the notifier woken when this stage fails.
    pub(crate) fn notify_failure(mut self, failure: Arc<Notify>) -> Self {
        self.failure = Some(failure);
        self
    }

    /// Runs the stage to completion.
    ///
    /// Returns once the input is exhausted or shutdown is signaled, after
    /// every open candle has been written to the sink.
    pub(crate) async fn run(mut self) -> Result<StageSummary> {
        let resolution = self.aggregator.resolution();
        debug!(%resolution, "stage started");

        let outcome = match self.receive().await {
            Ok(stop) => self.drain().map(|()| stop),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(stop) => {
                info!(
                    %resolution,
                    ?stop,
                    ticks = self.summary.ticks,
                    candles = self.summary.candles,
                    drained = self.summary.drained,
                    stale = self.summary.stale,
                    "stage finished"
                );
                Ok(self.summary)
            }
            Err(e) => {
                error!(
                    %resolution,
                    error = %e,
                    open = self.aggregator.len(),
                    "stage failed"
                );
                if let Some(failure) = &self.failure {
                    failure.notify_one();
                }
                Err(e)
            }
        }
    }

    async fn receive(&mut self) -> Result<Stop> {
        loop {
            match self.next().await {
                Next::Tick(tick) => self.process(tick).await?,
                Next::Exhausted => return Ok(Stop::Exhausted),
                Next::Signal => break,
            }
        }

        // Refuse new ticks, but finish those the source already handed over.
        self.input.close();
        while let Some(tick) = self.input.recv().await {
            self.process(tick).await?;
        }
        Ok(Stop::Signal)
    }

    async fn next(&mut self) -> Next {
        let Some(shutdown) = self.shutdown.as_mut() else {
            return self.input.recv().await.map_or(Next::Exhausted, Next::Tick);
        };

        loop {
            // Checked before blocking so a pending signal wins over new input.
            if *shutdown.borrow() {
                return Next::Signal;
            }

            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        return Next::Signal;
                    }
                }
                tick = self.input.recv() => {
                    return tick.map_or(Next::Exhausted, Next::Tick);
                }
            }
        }
    }

    async fn process(&mut self, tick: Tick) -> Result<()> {
        self.summary.ticks += 1;

        match self.aggregator.process(tick) {
            Ok(step) => {
                if let Some(candle) = step.closed {
                    self.write(&candle)?;
                }
                self.forward(step.derived).await;
            }
            Err(stale) => {
                self.summary.stale += 1;
                warn!(
                    resolution = %stale.resolution,
                    ticker = %stale.ticker,
                    bucket = %stale.bucket,
                    open_bucket = %stale.open_bucket,
                    "rejecting stale tick"
                );
            }
        }

        Ok(())
    }

    /// Hands a derived tick to the next stage, waiting for it to be taken.
    async fn forward(&mut self, derived: Tick) {
        let Some(output) = self.output.as_ref() else {
            return;
        };

        if output.send(derived).await.is_err() {
            warn!(
                resolution = %self.aggregator.resolution(),
                "downstream stage is gone, no longer forwarding"
            );
            self.output = None;
        }
    }

    fn drain(&mut self) -> Result<()> {
        // Downstream sees end-of-stream as soon as the flush starts.
        self.output = None;

        let candles = self.aggregator.drain();
        let total = candles.len();
        for (written, candle) in candles.iter().enumerate() {
            if let Err(e) = self.write(candle) {
                error!(
                    resolution = %candle.resolution(),
                    unwritten = total - written,
                    "shutdown flush aborted"
                );
                return Err(e);
            }
            self.summary.drained += 1;
        }

        Ok(())
    }

    fn write(&mut self, candle: &Candle) -> Result<()> {
        self.sink
            .write(candle)
            .map_err(|source| PipelineError::Sink {
                resolution: candle.resolution(),
                ticker: candle.ticker().clone(),
                bucket_start: candle.bucket_start(),
                source,
            })?;
        self.summary.candles += 1;

        debug!(
            resolution = %candle.resolution(),
            ticker = %candle.ticker(),
            bucket_start = %candle.bucket_start(),
            open = candle.open(),
            high = candle.high(),
            low = candle.low(),
            close = candle.close_price(),
            "candle closed"
        );
        Ok(())
    }
}
