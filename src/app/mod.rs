//! Application core: the monitoring loop, free of concrete I/O.
//!
//! The loop drives the threshold evaluator and the debounce timers for
//! every device. Readings come in and transition events go out through the
//! **port traits** defined in [`ports`], so the whole loop runs under test
//! with scripted sources and recording sinks.

pub mod events;
pub mod ports;
pub mod service;
