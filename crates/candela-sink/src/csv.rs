//! CSV candle sink.

use candela_aggregate::Candle;
use std::io::Write;

use crate::{CandleSink, SinkError};

/// CSV sink writing one `ticker,bucket_start,open,high,low,close` line per
/// candle.
#[derive(Debug)]
pub struct CsvSink<W> {
    writer: W,
    /// Field delimiter (default: comma).
    delimiter: char,
    /// Digits after the decimal point for prices.
    precision: usize,
    /// Whether to write a header row before the first record.
    include_header: bool,
    header_written: bool,
}

impl<W: Write + Send> CsvSink<W> {
    /// Default number of digits after the decimal point.
    pub const DEFAULT_PRECISION: usize = 6;

    /// Creates a new CSV sink with default settings and no header.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self {
            writer,
            delimiter: ',',
            precision: Self::DEFAULT_PRECISION,
            include_header: false,
            header_written: false,
        }
    }

    /// Creates a tab-separated values (TSV) sink.
    #[must_use]
    pub const fn tsv(writer: W) -> Self {
        Self::new(writer).with_delimiter('\t')
    }

    /// Sets the field delimiter.
    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Sets whether to write a header row.
    #[must_use]
    pub const fn with_header(mut self, include: bool) -> Self {
        self.include_header = include;
        self
    }

    /// Sets the number of digits after the decimal point for prices.
    #[must_use]
    pub const fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    /// Consumes the sink, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> CandleSink for CsvSink<W> {
    fn write(&mut self, candle: &Candle) -> Result<(), SinkError> {
        let d = self.delimiter;

        if self.include_header && !self.header_written {
            writeln!(self.writer, "ticker{d}bucket_start{d}open{d}high{d}low{d}close")?;
            self.header_written = true;
        }

        writeln!(
            self.writer,
            "{}{d}{}{d}{:.p$}{d}{:.p$}{d}{:.p$}{d}{:.p$}",
            candle.ticker(),
            candle.bucket_start().format("%Y-%m-%dT%H:%M:%SZ"),
            candle.open(),
            candle.high(),
            candle.low(),
            candle.close_price(),
            p = self.precision,
        )?;
        self.writer.flush()?;

        Ok(())
    }
}
