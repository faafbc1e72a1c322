//! Protected optical devices.
//!
//! Each [`Device`] is bound to one photodiode channel and carries the
//! elevation threshold above which the sun is inside (or too close to) its
//! field of view. Channel, threshold and grace duration are fixed at
//! construction; the power state lives in the device's [`TimerSlot`] because
//! the debounce timer thread is the only writer.
//!
//! The star tracker is special: its real power state cannot be read back,
//! so the protection logic treats it as always on when deciding to arm.

use core::fmt;
use core::str::FromStr;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::sensors::Channel;
use crate::timer::TimerSlot;

/// Camera elevation threshold (PD6).
///
/// FOV 18.63° in the lens specs and 21° in the ICD; threshold is
/// 90° − (21° FOV + 9° margin) = 60°.
pub const PD_ELEVATION_THRESHOLD_HD_CAM: f64 = 1.0472;

/// Optical receiver elevation threshold (PD6).
///
/// FOV 12.2° at 542 nm and 82.65° for the optics (CAD model); threshold is
/// 90° − (82.65° / 2 + 10° margin) ≈ 38°.
pub const PD_ELEVATION_THRESHOLD_OPT_RX: f64 = 0.6632;

/// Star tracker elevation threshold (PD3). FOV 33.1° (CAD model); 63°.
pub const PD_ELEVATION_THRESHOLD_IADCS_ST: f64 = 1.0996;

// ---------------------------------------------------------------------------
// Identity and state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DeviceId {
    #[serde(rename = "HD_CAMERA")]
    Camera = 0,
    #[serde(rename = "OPTICAL_RX")]
    OpticalReceiver = 1,
    #[serde(rename = "STAR_TRACKER")]
    StarTracker = 2,
}

impl DeviceId {
    /// Total number of known devices. Sizes the device table.
    pub const COUNT: usize = 3;

    pub const ALL: [DeviceId; DeviceId::COUNT] = [
        DeviceId::Camera,
        DeviceId::OpticalReceiver,
        DeviceId::StarTracker,
    ];

    /// Telemetry name, also the input column when rows are keyed by device.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Camera => "HD_CAMERA",
            Self::OpticalReceiver => "OPTICAL_RX",
            Self::StarTracker => "STAR_TRACKER",
        }
    }

    /// Whether the device's power state can be read back.
    ///
    /// Only devices with an observable state gate arming on being ON.
    pub const fn power_state_observable(self) -> bool {
        !matches!(self, Self::StarTracker)
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Camera => &["HD_CAMERA", "CAMERA"],
            Self::OpticalReceiver => &["OPTICAL_RX", "OPTICAL_RECEIVER", "OPT_RX"],
            Self::StarTracker => &["STAR_TRACKER", "IADCS_ST", "STARTRACKER"],
        }
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DeviceId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        DeviceId::ALL
            .into_iter()
            .find(|id| id.aliases().iter().any(|a| a.eq_ignore_ascii_case(wanted)))
            .ok_or_else(|| ConfigError::UnknownDevice(wanted.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeviceState {
    On,
    Off,
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => write!(f, "ON"),
            Self::Off => write!(f, "OFF"),
        }
    }
}

// ---------------------------------------------------------------------------
// Device
// ---------------------------------------------------------------------------

/// A protected device and its debounce timer slot.
pub struct Device {
    id: DeviceId,
    channel: Channel,
    threshold_angle: f64,
    grace_duration: Duration,
    /// Column looked up in each [`ReadingFrame`](crate::sensors::ReadingFrame).
    input_key: String,
    pub(crate) slot: Arc<TimerSlot>,
    /// Background timer thread of the latest arm instance, until reaped.
    pub(crate) pending: Option<JoinHandle<()>>,
}

impl Device {
    /// Construct a powered-on device reading from `channel`.
    ///
    /// Values are taken as given; [`MonitorService::with_devices`] range-checks
    /// them with [`check_threshold`] and [`check_grace`].
    ///
    /// [`MonitorService::with_devices`]: crate::app::service::MonitorService::with_devices
    /// [`check_threshold`]: crate::config::check_threshold
    /// [`check_grace`]: crate::config::check_grace
    pub fn new(id: DeviceId, channel: Channel, threshold_angle: f64, grace_duration: Duration) -> Self {
        Self {
            id,
            channel,
            threshold_angle,
            grace_duration,
            input_key: channel.name().to_string(),
            slot: Arc::new(TimerSlot::new(DeviceState::On)),
            pending: None,
        }
    }

    /// Read this device's elevation from a different input column.
    pub fn with_input_key(mut self, key: impl Into<String>) -> Self {
        self.input_key = key.into();
        self
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn threshold_angle(&self) -> f64 {
        self.threshold_angle
    }

    pub fn grace_duration(&self) -> Duration {
        self.grace_duration
    }

    pub fn input_key(&self) -> &str {
        &self.input_key
    }

    /// Current power state.
    pub fn state(&self) -> DeviceState {
        self.slot.power()
    }

    /// True while a turn-off timer is armed and has neither fired nor been
    /// cancelled.
    pub fn has_live_timer(&self) -> bool {
        self.slot.is_armed()
    }

    /// Number of timers ever armed on this device.
    pub fn arm_count(&self) -> u64 {
        self.slot.generation()
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("id", &self.id)
            .field("channel", &self.channel)
            .field("threshold_angle", &self.threshold_angle)
            .field("grace_duration", &self.grace_duration)
            .field("input_key", &self.input_key)
            .field("state", &self.state())
            .field("live_timer", &self.has_live_timer())
            .finish()
    }
}

/// The OPS-SAT optical payload set, all powered on.
pub fn opssat_devices(grace_duration: Duration) -> [Device; DeviceId::COUNT] {
    [
        Device::new(
            DeviceId::StarTracker,
            Channel::Pd3,
            PD_ELEVATION_THRESHOLD_IADCS_ST,
            grace_duration,
        ),
        Device::new(
            DeviceId::Camera,
            Channel::Pd6,
            PD_ELEVATION_THRESHOLD_HD_CAM,
            grace_duration,
        ),
        Device::new(
            DeviceId::OpticalReceiver,
            Channel::Pd6,
            PD_ELEVATION_THRESHOLD_OPT_RX,
            grace_duration,
        ),
    ]
}
