//! Port traits: the hexagonal boundary between the loop and the outside world.
//!
//! ```text
//!   ReadingSource ──▶ MonitorService ──▶ EventSink
//!                           ▲
//!                      ConfigPort
//! ```
//!
//! Driven adapters (CSV replay, log output, audit files, config storage)
//! implement these traits. The [`MonitorService`](super::service::MonitorService)
//! consumes them via generics, so the core never opens a file itself.

use crate::config::FdirConfig;
use crate::error::{ConfigError, SourceError};
use crate::sensors::ReadingFrame;

use super::events::FdirEvent;

// ───────────────────────────────────────────────────────────────
// Reading source port (driven adapter: telemetry → loop)
// ───────────────────────────────────────────────────────────────

/// Produces one [`ReadingFrame`] per tick, in order.
pub trait ReadingSource {
    /// Column names every frame will carry, when known up front (e.g. a
    /// CSV header). The loop uses them to fail fast on a missing channel.
    fn columns(&self) -> Option<&[String]> {
        None
    }

    /// Next frame, `None` once the input is exhausted.
    ///
    /// A [`SourceError::Record`] affects that row only; the loop skips it.
    fn next_frame(&mut self) -> Option<Result<ReadingFrame, SourceError>>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: loop → logging / audit)
// ───────────────────────────────────────────────────────────────

/// The loop emits every transition as an [`FdirEvent`] through this port.
/// Adapters decide where it goes (log lines, JSON audit trail, tests).
pub trait EventSink {
    fn emit(&mut self, event: &FdirEvent);
}

impl<T: EventSink + ?Sized> EventSink for &mut T {
    fn emit(&mut self, event: &FdirEvent) {
        (**self).emit(event);
    }
}

/// An absent sink drops events.
impl<T: EventSink> EventSink for Option<T> {
    fn emit(&mut self, event: &FdirEvent) {
        if let Some(sink) = self {
            sink.emit(event);
        }
    }
}

/// Fan-out: both sinks see every event, left first.
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn emit(&mut self, event: &FdirEvent) {
        self.0.emit(event);
        self.1.emit(event);
    }
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: loop ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the loop configuration.
///
/// Implementations MUST validate before persisting. Invalid values are
/// rejected with [`ConfigError::ValidationFailed`], not silently clamped.
pub trait ConfigPort {
    /// Load configuration. Returns [`FdirConfig::default()`] if none is
    /// stored yet.
    fn load(&self) -> Result<FdirConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &FdirConfig) -> Result<(), ConfigError>;
}
