//! Generate command implementation.

use anyhow::Result;

use crate::output::OutputArgs;
use crate::source::{self, GeneratorConfig};

/// Aggregates a synthetic price feed until Ctrl-C.
pub(crate) async fn generate(output: &OutputArgs, config: GeneratorConfig) -> Result<()> {
    let pipeline = output.pipeline()?;
    let (tx, rx) = pipeline.source_channel();
    let running = pipeline.start(rx)?;

    let feeder = tokio::spawn(source::generate(config, tx));
    super::supervise(running, feeder).await
}
