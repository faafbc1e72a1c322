//! Mock I/O adapters for integration tests.
//!
//! `ScriptedSource` replays an in-memory table (with optional injected
//! errors) and `RecordingSink` keeps every event so tests can assert on
//! the full transition history.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use fdir::app::events::FdirEvent;
use fdir::app::ports::{EventSink, ReadingSource};
use fdir::device::DeviceId;
use fdir::error::SourceError;
use fdir::sensors::ReadingFrame;

// ── ScriptedSource ────────────────────────────────────────────

pub struct ScriptedSource {
    columns: Option<Vec<String>>,
    rows: VecDeque<Result<ReadingFrame, SourceError>>,
}

#[allow(dead_code)]
impl ScriptedSource {
    /// One column, one value per tick.
    pub fn single(column: &str, values: &[f64]) -> Self {
        let mut src = Self::with_columns(&[column]);
        for &v in values {
            src.push_row(&[&v.to_string()]);
        }
        src
    }

    pub fn with_columns(columns: &[&str]) -> Self {
        Self {
            columns: Some(columns.iter().map(|c| (*c).to_string()).collect()),
            rows: VecDeque::new(),
        }
    }

    /// No header known up front.
    pub fn headerless() -> Self {
        Self {
            columns: None,
            rows: VecDeque::new(),
        }
    }

    /// Append a row of raw cells, matched to the columns by position.
    pub fn push_row(&mut self, cells: &[&str]) -> &mut Self {
        let columns = self.columns.clone().unwrap_or_default();
        let frame = ReadingFrame::from_pairs(columns.iter().zip(cells.iter().copied()));
        self.rows.push_back(Ok(frame));
        self
    }

    pub fn push_frame(&mut self, frame: ReadingFrame) -> &mut Self {
        self.rows.push_back(Ok(frame));
        self
    }

    pub fn push_error(&mut self, err: SourceError) -> &mut Self {
        self.rows.push_back(Err(err));
        self
    }

    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl ReadingSource for ScriptedSource {
    fn columns(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    fn next_frame(&mut self) -> Option<Result<ReadingFrame, SourceError>> {
        self.rows.pop_front()
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<FdirEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn armed(&self, device: DeviceId) -> usize {
        self.count(|e| matches!(e, FdirEvent::TimerArmed { device: d, .. } if *d == device))
    }

    pub fn cancelled(&self, device: DeviceId) -> usize {
        self.count(|e| matches!(e, FdirEvent::TimerCancelled { device: d, .. } if *d == device))
    }

    pub fn turned_off(&self, device: DeviceId) -> Vec<Duration> {
        self.events
            .iter()
            .filter_map(|e| match e {
                FdirEvent::DeviceTurnedOff {
                    device: d,
                    fired_after_ms,
                    ..
                } if *d == device => Some(Duration::from_millis(*fired_after_ms)),
                _ => None,
            })
            .collect()
    }

    pub fn rejected(&self, device: DeviceId) -> usize {
        self.count(|e| matches!(e, FdirEvent::ReadingRejected { device: d, .. } if *d == device))
    }

    pub fn count(&self, pred: impl Fn(&FdirEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &FdirEvent) {
        self.events.push(event.clone());
    }
}

// ── Helpers ───────────────────────────────────────────────────

/// Poll `cond` until it holds or `limit` passes.
#[allow(dead_code)]
pub fn wait_until(limit: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < limit {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    cond()
}
