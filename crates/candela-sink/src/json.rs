//! Newline-delimited JSON candle sink.

use candela_aggregate::Candle;
use std::io::Write;

use crate::{CandleSink, SinkError};

/// NDJSON sink writing one JSON object per candle.
#[derive(Debug)]
pub struct NdjsonSink<W> {
    writer: W,
}

impl<W: Write + Send> NdjsonSink<W> {
    /// Creates a new NDJSON sink.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> CandleSink for NdjsonSink<W> {
    fn write(&mut self, candle: &Candle) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.writer, candle)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}
