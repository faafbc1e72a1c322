//! JSON-lines audit sink.
//!
//! Writes every [`FdirEvent`] as one JSON object per line so an external
//! tool can replay the arm/cancel/fire history of each device. Write
//! failures are logged once and never stop the loop.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use log::{info, warn};

use crate::app::events::FdirEvent;
use crate::app::ports::EventSink;

pub struct JsonLinesAuditSink<W: Write> {
    out: W,
    written: u64,
    failed: bool,
}

impl JsonLinesAuditSink<BufWriter<File>> {
    /// Create (or truncate) the audit file at `path`.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path.as_ref())?;
        info!("audit: writing events to {}", path.as_ref().display());
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> JsonLinesAuditSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            written: 0,
            failed: false,
        }
    }

    /// Events successfully written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line(&mut self, event: &FdirEvent) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, event)?;
        self.out.write_all(b"\n")
    }
}

impl<W: Write> EventSink for JsonLinesAuditSink<W> {
    fn emit(&mut self, event: &FdirEvent) {
        match self.write_line(event) {
            Ok(()) => self.written += 1,
            Err(e) => {
                if !self.failed {
                    warn!("audit: write failed, further events dropped silently: {}", e);
                    self.failed = true;
                }
            }
        }
    }
}
