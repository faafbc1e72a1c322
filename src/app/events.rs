//! Outbound loop events and the end-of-run report.
//!
//! The [`MonitorService`](super::service::MonitorService) emits these
//! through the [`EventSink`](super::ports::EventSink) port. Every arm,
//! cancel and fire is one event identifying the device, so an external
//! auditor can rebuild each device's history from the stream alone.

use core::fmt;

use serde::Serialize;

use crate::device::{DeviceId, DeviceState};
use crate::error::ReadingError;

/// Structured events emitted by the monitoring loop.
///
/// Serialised internally tagged, e.g.
/// `{"event":"timer_armed","tick":2,"device":"HD_CAMERA","grace_ms":5000}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FdirEvent {
    /// The loop is about to process its first tick.
    Started { devices: usize },

    /// A DANGER reading started a turn-off countdown.
    TimerArmed {
        tick: u64,
        device: DeviceId,
        grace_ms: u64,
    },

    /// A SAFE reading cancelled a live countdown.
    TimerCancelled { tick: u64, device: DeviceId },

    /// A countdown elapsed and the device was turned off. `was_on` is false
    /// when the turn-off repeated on a device already OFF.
    DeviceTurnedOff {
        device: DeviceId,
        generation: u64,
        was_on: bool,
        fired_after_ms: u64,
    },

    /// The device's reading was unusable; no arm, no cancel this tick.
    ReadingRejected {
        tick: u64,
        device: DeviceId,
        column: String,
        reason: ReadingError,
    },

    /// A countdown could not be started; the device stays disarmed.
    ArmFailed { tick: u64, device: DeviceId },

    /// The source produced a malformed row.
    RowSkipped { tick: u64, reason: String },

    /// Input exhausted and every timer settled.
    Finished { ticks: u64 },
}

// ───────────────────────────────────────────────────────────────
// Final report
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeviceReport {
    pub device: DeviceId,
    pub state: DeviceState,
}

/// Final `(device, state)` pairs plus run counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FinalReport {
    pub ticks: u64,
    pub rows_skipped: u64,
    pub readings_rejected: u64,
    pub devices: heapless::Vec<DeviceReport, { DeviceId::COUNT }>,
}

impl FinalReport {
    /// Final state of `device`, if it was monitored.
    pub fn state(&self, device: DeviceId) -> Option<DeviceState> {
        self.devices
            .iter()
            .find(|r| r.device == device)
            .map(|r| r.state)
    }
}

impl fmt::Display for FinalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Device - State")?;
        for r in &self.devices {
            writeln!(f, "{} - {}", r.device, r.state)?;
        }
        Ok(())
    }
}
