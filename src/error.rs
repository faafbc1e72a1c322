//! Unified error types for the FDIR loop.
//!
//! A single [`Error`] enum that every subsystem converts into, so the
//! monitoring loop and the host binary handle failures uniformly.
//! Per-tick reading errors are `Copy` and cheap to pass through the loop
//! and the event sink; configuration errors carry the offending name.

use core::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug)]
pub enum Error {
    /// A single photodiode reading could not be used.
    Reading(ReadingError),
    /// Configuration is invalid. Fatal at startup.
    Config(ConfigError),
    /// A debounce timer could not be started.
    Timer(TimerError),
    /// The reading source failed as a whole (unreadable file, bad header).
    Source(SourceError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reading(e) => write!(f, "reading: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Timer(e) => write!(f, "timer: {e}"),
            Self::Source(e) => write!(f, "source: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Reading errors
// ---------------------------------------------------------------------------

/// Why a channel reading was rejected for one device on one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingError {
    /// The column is absent from the row, or the cell is blank.
    Missing,
    /// The cell does not parse as a finite real number.
    NonNumeric,
    /// The value is outside the plausible elevation-angle range.
    OutOfRange,
}

impl fmt::Display for ReadingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "reading missing"),
            Self::NonNumeric => write!(f, "reading not numeric"),
            Self::OutOfRange => write!(f, "reading out of range"),
        }
    }
}

impl std::error::Error for ReadingError {}

impl From<ReadingError> for Error {
    fn from(e: ReadingError) -> Self {
        Self::Reading(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Construction-time configuration errors. All of these abort startup.
#[derive(Debug)]
pub enum ConfigError {
    /// A device identifier is not one of the known devices.
    UnknownDevice(String),
    /// A channel identifier is not one of PD1..PD6, or the input has no
    /// column for a device's bound channel.
    UnknownChannel(String),
    /// The same device is configured twice.
    DuplicateDevice(String),
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Stored config could not be parsed.
    Corrupted(String),
    /// Generic I/O error from the config backend.
    Io(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownDevice(name) => write!(f, "unknown device '{name}'"),
            Self::UnknownChannel(name) => write!(f, "unknown channel '{name}'"),
            Self::DuplicateDevice(name) => write!(f, "device '{name}' configured twice"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
            Self::Corrupted(msg) => write!(f, "config corrupted: {msg}"),
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Timer errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    /// The host refused to start the background timer thread.
    SpawnFailed,
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpawnFailed => write!(f, "could not start timer thread"),
        }
    }
}

impl std::error::Error for TimerError {}

impl From<TimerError> for Error {
    fn from(e: TimerError) -> Self {
        Self::Timer(e)
    }
}

// ---------------------------------------------------------------------------
// Source errors
// ---------------------------------------------------------------------------

/// Errors raised by a [`ReadingSource`](crate::app::ports::ReadingSource).
#[derive(Debug)]
pub enum SourceError {
    /// The source could not be opened or read.
    Io(String),
    /// One record was malformed. The loop skips it and carries on.
    Record(String),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
            Self::Record(msg) => write!(f, "bad record: {msg}"),
        }
    }
}

impl std::error::Error for SourceError {}

impl From<SourceError> for Error {
    fn from(e: SourceError) -> Self {
        Self::Source(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
