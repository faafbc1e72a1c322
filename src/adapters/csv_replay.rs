//! CSV replay source.
//!
//! Replays recorded photodiode telemetry, one row per tick. The header row
//! names the columns (`PD1`..`PD6`, device names, or anything else such as
//! a timestamp, which is carried along and ignored). Fields are trimmed and
//! rows may be shorter than the header; absent cells read as missing.

use std::collections::HashSet;
use std::fs::File;
use std::io;
use std::path::Path;

use log::info;

use crate::app::ports::ReadingSource;
use crate::error::SourceError;
use crate::sensors::ReadingFrame;

/// [`ReadingSource`] over CSV text from any reader.
pub struct CsvReplaySource<R> {
    reader: csv::Reader<R>,
    headers: Vec<String>,
    record: csv::StringRecord,
}

fn builder() -> csv::ReaderBuilder {
    let mut b = csv::ReaderBuilder::new();
    b.has_headers(true).flexible(true).trim(csv::Trim::All);
    b
}

impl CsvReplaySource<File> {
    /// Open a CSV file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let reader = builder()
            .from_path(path)
            .map_err(|e| SourceError::Io(format!("{}: {}", path.display(), e)))?;
        let source = Self::with_reader(reader)?;
        info!(
            "csv: replaying {} (columns: {})",
            path.display(),
            source.headers.join(",")
        );
        Ok(source)
    }
}

impl<R: io::Read> CsvReplaySource<R> {
    /// Read CSV from `rdr`. The header row is read immediately.
    pub fn from_reader(rdr: R) -> Result<Self, SourceError> {
        Self::with_reader(builder().from_reader(rdr))
    }

    fn with_reader(mut reader: csv::Reader<R>) -> Result<Self, SourceError> {
        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| SourceError::Io(e.to_string()))?
            .iter()
            .map(str::to_string)
            .collect();
        if headers.iter().all(String::is_empty) {
            return Err(SourceError::Io("input has no header row".into()));
        }
        // Columns are matched case-insensitively, so `PD6` and `pd6` collide.
        let mut seen = HashSet::new();
        for h in headers.iter().filter(|h| !h.is_empty()) {
            if !seen.insert(h.to_ascii_uppercase()) {
                return Err(SourceError::Io(format!("duplicate column '{}'", h)));
            }
        }
        Ok(Self {
            reader,
            headers,
            record: csv::StringRecord::new(),
        })
    }
}

impl<R: io::Read> ReadingSource for CsvReplaySource<R> {
    fn columns(&self) -> Option<&[String]> {
        Some(&self.headers)
    }

    fn next_frame(&mut self) -> Option<Result<ReadingFrame, SourceError>> {
        match self.reader.read_record(&mut self.record) {
            Ok(false) => None,
            Ok(true) => Some(Ok(ReadingFrame::from_pairs(
                self.headers.iter().zip(self.record.iter()),
            ))),
            Err(e) if e.is_io_error() => Some(Err(SourceError::Io(e.to_string()))),
            Err(e) => Some(Err(SourceError::Record(e.to_string()))),
        }
    }
}
