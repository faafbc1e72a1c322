//! Monitoring loop: the hexagonal core.
//!
//! [`MonitorService`] owns the device table and the debounce timers. Each
//! tick it evaluates every device on that tick's reading and arms or
//! cancels the device's countdown. Fired countdowns come back through the
//! notice queue and are forwarded to the sink before anything newer is
//! emitted, so the event stream follows the order transitions happened in.
//!
//! ```text
//!  ReadingSource ──▶ ┌─────────────────────────────┐ ──▶ EventSink
//!                    │        MonitorService       │
//!                    │ evaluate · arm/cancel · drain│
//!                    └──────────────┬──────────────┘
//!                                   │ timer threads
//!                                   ▼
//!                              NoticeQueue
//! ```

use std::thread;
use std::time::Duration;

use log::{error, info, warn};

use crate::config::{FdirConfig, check_grace, check_threshold};
use crate::device::{Device, DeviceId, DeviceState};
use crate::error::{ConfigError, Error, Result, SourceError};
use crate::events::{NoticeQueue, TimerNotice};
use crate::safety::{Exposure, evaluate};
use crate::sensors::ReadingFrame;
use crate::timer::{ArmOutcome, CancelOutcome, DebounceTimers};

use super::events::{DeviceReport, FdirEvent, FinalReport};
use super::ports::{EventSink, ReadingSource};

type DeviceTable = heapless::Vec<Device, { DeviceId::COUNT }>;

// ───────────────────────────────────────────────────────────────
// MonitorService
// ───────────────────────────────────────────────────────────────

/// The monitoring loop over a fixed set of devices.
pub struct MonitorService {
    devices: DeviceTable,
    timers: DebounceTimers,
    polling_period: Duration,
    tick_count: u64,
    rows_skipped: u64,
    readings_rejected: u64,
}

impl MonitorService {
    /// Build the device table from configuration.
    ///
    /// Fails on unknown names, duplicates or out-of-range values.
    pub fn new(config: &FdirConfig) -> core::result::Result<Self, ConfigError> {
        let key = config.reading_key;
        let devices = config
            .resolve()?
            .into_iter()
            .map(|dev| dev.build(key));
        Self::with_devices(devices, config.polling_period())
    }

    /// Build from already constructed devices.
    ///
    /// Applies the same threshold and grace checks as [`FdirConfig::resolve`].
    pub fn with_devices(
        devices: impl IntoIterator<Item = Device>,
        polling_period: Duration,
    ) -> core::result::Result<Self, ConfigError> {
        let mut table = DeviceTable::new();
        for device in devices {
            check_threshold(device.threshold_angle())?;
            check_grace(device.grace_duration())?;
            if table.iter().any(|d| d.id() == device.id()) {
                return Err(ConfigError::DuplicateDevice(device.id().name().to_string()));
            }
            // Unreachable with distinct ids, but keep the error typed.
            if table.push(device).is_err() {
                return Err(ConfigError::ValidationFailed("too many devices"));
            }
        }
        if table.is_empty() {
            return Err(ConfigError::ValidationFailed("at least one device is required"));
        }

        Ok(Self {
            devices: table,
            timers: DebounceTimers::default(),
            polling_period,
            tick_count: 0,
            rows_skipped: 0,
            readings_rejected: 0,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Announce the device table.
    pub fn start(&mut self, sink: &mut impl EventSink) {
        for d in &self.devices {
            info!(
                "monitor: {} on {} (column {}), threshold {:.4} rad, grace {:?}",
                d.id(),
                d.channel(),
                d.input_key(),
                d.threshold_angle(),
                d.grace_duration()
            );
        }
        sink.emit(&FdirEvent::Started {
            devices: self.devices.len(),
        });
    }

    /// Fail with [`ConfigError::UnknownChannel`] if any device's input
    /// column is absent from `columns`.
    pub fn check_columns(&self, columns: &[String]) -> core::result::Result<(), ConfigError> {
        for d in &self.devices {
            let key = d.input_key();
            if !columns.iter().any(|c| c.trim().eq_ignore_ascii_case(key)) {
                error!("monitor: input has no column {} for {}", key, d.id());
                return Err(ConfigError::UnknownChannel(key.to_string()));
            }
        }
        Ok(())
    }

    /// Replay `source` to exhaustion, then drain every timer.
    ///
    /// Sleeps the polling period between ticks. A malformed row is a tick
    /// with no new information; an I/O failure of the source drains the
    /// timers and returns the error.
    pub fn run(
        &mut self,
        source: &mut impl ReadingSource,
        sink: &mut impl EventSink,
    ) -> Result<FinalReport> {
        if let Some(columns) = source.columns() {
            self.check_columns(columns)?;
        }
        self.start(sink);

        let mut first = true;
        while let Some(next) = source.next_frame() {
            if !first && !self.polling_period.is_zero() {
                thread::sleep(self.polling_period);
            }
            first = false;

            match next {
                Ok(frame) => self.tick(&frame, sink),
                Err(SourceError::Record(reason)) => self.skip_row(reason, sink),
                Err(e) => {
                    error!("monitor: source failed after {} ticks: {}", self.tick_count, e);
                    self.shutdown(sink);
                    return Err(Error::Source(e));
                }
            }
        }

        Ok(self.shutdown(sink))
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Evaluate every device on `frame`: DANGER arms, SAFE cancels, an
    /// unusable reading does neither.
    pub fn tick(&mut self, frame: &ReadingFrame, sink: &mut impl EventSink) {
        // Timers that fired during the polling sleep.
        self.forward_notices(sink);
        self.tick_count += 1;
        let tick = self.tick_count;

        for device in &mut self.devices {
            let id = device.id();
            let reading = match frame.elevation(device.input_key()) {
                Ok(r) => r,
                Err(reason) => {
                    warn!(
                        "monitor: tick {} {} column {}: {}",
                        tick,
                        id,
                        device.input_key(),
                        reason
                    );
                    self.readings_rejected += 1;
                    sink.emit(&FdirEvent::ReadingRejected {
                        tick,
                        device: id,
                        column: device.input_key().to_string(),
                        reason,
                    });
                    continue;
                }
            };

            match evaluate(reading, device.threshold_angle()) {
                Exposure::Danger => {
                    let grace = device.grace_duration();
                    match self.timers.arm(device, grace) {
                        Ok(ArmOutcome::Armed) => {
                            // Arming reaps the previous instance, whose
                            // notice must come first.
                            forward(self.timers.notices(), sink);
                            sink.emit(&FdirEvent::TimerArmed {
                                tick,
                                device: id,
                                grace_ms: millis(grace),
                            });
                        }
                        Ok(ArmOutcome::AlreadyArmed | ArmOutcome::DeviceOff) => {}
                        Err(e) => {
                            error!("monitor: tick {} {}: {}", tick, id, e);
                            sink.emit(&FdirEvent::ArmFailed { tick, device: id });
                        }
                    }
                }
                Exposure::Safe => {
                    if self.timers.cancel(device) == CancelOutcome::Cancelled {
                        sink.emit(&FdirEvent::TimerCancelled { tick, device: id });
                    }
                }
            }
        }

        self.forward_notices(sink);
    }

    /// Count a malformed row as a tick with no readings.
    pub fn skip_row(&mut self, reason: String, sink: &mut impl EventSink) {
        self.forward_notices(sink);
        self.tick_count += 1;
        self.rows_skipped += 1;
        warn!("monitor: tick {} skipped: {}", self.tick_count, reason);
        sink.emit(&FdirEvent::RowSkipped {
            tick: self.tick_count,
            reason,
        });
        self.forward_notices(sink);
    }

    /// Wait for every pending timer to fire or be cancelled, then report.
    pub fn shutdown(&mut self, sink: &mut impl EventSink) -> FinalReport {
        for device in &mut self.devices {
            self.timers.drain(device);
        }
        self.forward_notices(sink);
        sink.emit(&FdirEvent::Finished {
            ticks: self.tick_count,
        });

        let report = self.report();
        info!(
            "monitor: finished after {} ticks ({} rows skipped, {} readings rejected)",
            report.ticks, report.rows_skipped, report.readings_rejected
        );
        report
    }

    fn forward_notices(&self, sink: &mut impl EventSink) {
        forward(self.timers.notices(), sink);
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current `(device, state)` pairs and run counters.
    pub fn report(&self) -> FinalReport {
        let mut devices = heapless::Vec::new();
        for d in &self.devices {
            // Same capacity as the device table.
            let _ = devices.push(DeviceReport {
                device: d.id(),
                state: d.state(),
            });
        }
        FinalReport {
            ticks: self.tick_count,
            rows_skipped: self.rows_skipped,
            readings_rejected: self.readings_rejected,
            devices,
        }
    }

    pub fn device(&self, id: DeviceId) -> Option<&Device> {
        self.devices.iter().find(|d| d.id() == id)
    }

    pub fn device_state(&self, id: DeviceId) -> Option<DeviceState> {
        self.device(id).map(Device::state)
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn polling_period(&self) -> Duration {
        self.polling_period
    }

    /// Ticks processed so far, skipped rows included.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn rows_skipped(&self) -> u64 {
        self.rows_skipped
    }

    pub fn readings_rejected(&self) -> u64 {
        self.readings_rejected
    }
}

fn forward(notices: &NoticeQueue, sink: &mut impl EventSink) {
    notices.drain(|n: TimerNotice| {
        sink.emit(&FdirEvent::DeviceTurnedOff {
            device: n.device,
            generation: n.generation,
            was_on: n.was_on,
            fired_after_ms: millis(n.fired_after),
        });
    });
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
