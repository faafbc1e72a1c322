//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing every loop event as one terse line
//! through the `log` facade. The binary always installs it; an audit file
//! sink can run alongside.

use log::{error, info, warn};

use crate::app::events::FdirEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`FdirEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &FdirEvent) {
        match event {
            FdirEvent::Started { devices } => {
                info!("START | devices={}", devices);
            }
            FdirEvent::TimerArmed {
                tick,
                device,
                grace_ms,
            } => {
                info!("ARM   | tick={} device={} grace={}ms", tick, device, grace_ms);
            }
            FdirEvent::TimerCancelled { tick, device } => {
                info!("CANCEL| tick={} device={}", tick, device);
            }
            FdirEvent::DeviceTurnedOff {
                device,
                generation,
                was_on: true,
                fired_after_ms,
            } => {
                warn!(
                    "OFF   | device={} after={}ms arm#{}",
                    device, fired_after_ms, generation
                );
            }
            FdirEvent::DeviceTurnedOff {
                device,
                generation,
                was_on: false,
                fired_after_ms,
            } => {
                warn!(
                    "OFF   | device={} after={}ms arm#{} (repeat)",
                    device, fired_after_ms, generation
                );
            }
            FdirEvent::ReadingRejected {
                tick,
                device,
                column,
                reason,
            } => {
                warn!(
                    "REJECT| tick={} device={} column={} reason={}",
                    tick, device, column, reason
                );
            }
            FdirEvent::ArmFailed { tick, device } => {
                error!("ARMERR| tick={} device={}", tick, device);
            }
            FdirEvent::RowSkipped { tick, reason } => {
                warn!("SKIP  | tick={} reason={}", tick, reason);
            }
            FdirEvent::Finished { ticks } => {
                info!("DONE  | ticks={}", ticks);
            }
        }
    }
}
