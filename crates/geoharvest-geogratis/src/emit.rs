//! JSON Lines output of accepted records

use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStyle {
    /// One record per line
    Compact,
    /// Multi-line, 2-space indented
    Pretty,
}

/// Writes one serialized record per write and flushes after each.
pub struct JsonLinesEmitter<W: Write> {
    out: W,
    style: OutputStyle,
    written: usize,
}

impl<W: Write> JsonLinesEmitter<W> {
    pub fn new(out: W, style: OutputStyle) -> Self {
        Self {
            out,
            style,
            written: 0,
        }
    }

    pub fn emit<T: Serialize>(&mut self, record: &T) -> Result<()> {
        match self.style {
            OutputStyle::Compact => serde_json::to_writer(&mut self.out, record),
            OutputStyle::Pretty => serde_json::to_writer_pretty(&mut self.out, record),
        }
        .context("Failed to serialize record")?;
        self.out.write_all(b"\n")?;
        self.out.flush().context("Failed to flush record output")?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
