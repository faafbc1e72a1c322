//! System configuration parameters
//!
//! All tunable parameters for the FDIR loop. Defaults reproduce the OPS-SAT
//! onboard setup; values can be overridden from a JSON file (see
//! [`JsonConfigFile`](crate::adapters::config_file::JsonConfigFile)) and
//! then from the command line.
//!
//! Device and channel names are kept as strings in the serialised form and
//! resolved by [`FdirConfig::resolve`], so a typo surfaces as
//! [`ConfigError::UnknownDevice`] / [`ConfigError::UnknownChannel`] instead
//! of a generic parse error.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::device::{
    Device, DeviceId, PD_ELEVATION_THRESHOLD_HD_CAM, PD_ELEVATION_THRESHOLD_IADCS_ST,
    PD_ELEVATION_THRESHOLD_OPT_RX,
};
use crate::error::ConfigError;
use crate::sensors::Channel;

/// Which column of an input row feeds a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingKey {
    /// The bound photodiode channel (`PD1`..`PD6`).
    #[default]
    Channel,
    /// The device name (`HD_CAMERA`, `OPTICAL_RX`, `STAR_TRACKER`).
    Device,
}

/// How a device's danger threshold is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Threshold {
    /// Elevation angle in radians, used as is.
    AngleRad(f64),
    /// Derived from the optical field of view:
    /// 90° − (fov + margin), converted to radians.
    FieldOfView { fov_deg: f64, margin_deg: f64 },
}

impl Threshold {
    /// Elevation threshold in radians.
    pub fn angle_rad(self) -> f64 {
        match self {
            Self::AngleRad(rad) => rad,
            Self::FieldOfView { fov_deg, margin_deg } => (90.0 - (fov_deg + margin_deg)).to_radians(),
        }
    }
}

/// Per-device settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Device name, e.g. `HD_CAMERA`.
    pub id: String,
    /// Photodiode channel, e.g. `PD6`.
    pub channel: String,
    pub threshold: Threshold,
    /// Overrides [`FdirConfig::grace_duration_ms`] for this device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grace_duration_ms: Option<u64>,
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FdirConfig {
    // --- Timing ---
    /// Debounce grace duration before a device is turned off (milliseconds)
    pub grace_duration_ms: u64,
    /// Spacing between ticks (milliseconds). Zero replays as fast as possible.
    pub polling_period_ms: u64,

    // --- Input ---
    pub reading_key: ReadingKey,

    // --- Devices ---
    pub devices: Vec<DeviceConfig>,
}

impl Default for FdirConfig {
    fn default() -> Self {
        Self {
            grace_duration_ms: 5_000,
            polling_period_ms: 1_000,
            reading_key: ReadingKey::Channel,
            devices: vec![
                DeviceConfig {
                    id: DeviceId::StarTracker.name().into(),
                    channel: Channel::Pd3.name().into(),
                    threshold: Threshold::AngleRad(PD_ELEVATION_THRESHOLD_IADCS_ST),
                    grace_duration_ms: None,
                },
                DeviceConfig {
                    id: DeviceId::Camera.name().into(),
                    channel: Channel::Pd6.name().into(),
                    threshold: Threshold::AngleRad(PD_ELEVATION_THRESHOLD_HD_CAM),
                    grace_duration_ms: None,
                },
                DeviceConfig {
                    id: DeviceId::OpticalReceiver.name().into(),
                    channel: Channel::Pd6.name().into(),
                    threshold: Threshold::AngleRad(PD_ELEVATION_THRESHOLD_OPT_RX),
                    grace_duration_ms: None,
                },
            ],
        }
    }
}

/// Upper bound on any grace duration (one hour).
const MAX_GRACE_MS: u64 = 3_600_000;
/// Upper bound on the polling period (one minute).
const MAX_POLLING_MS: u64 = 60_000;

/// The threshold must be a finite angle in (0, π/2] radians.
pub fn check_threshold(angle_rad: f64) -> Result<(), ConfigError> {
    if angle_rad.is_finite() && angle_rad > 0.0 && angle_rad <= core::f64::consts::FRAC_PI_2 {
        Ok(())
    } else {
        Err(ConfigError::ValidationFailed(
            "threshold must resolve to an angle in (0, π/2] radians",
        ))
    }
}

/// The grace duration must be at least 1 ms and at most one hour.
pub fn check_grace(grace: Duration) -> Result<(), ConfigError> {
    if grace >= Duration::from_millis(1) && grace <= Duration::from_millis(MAX_GRACE_MS) {
        Ok(())
    } else {
        Err(ConfigError::ValidationFailed(
            "device grace_duration_ms must be 1–3600000",
        ))
    }
}

/// A device entry with names resolved and the threshold calibrated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedDevice {
    pub id: DeviceId,
    pub channel: Channel,
    pub threshold_angle: f64,
    pub grace_duration: Duration,
}

impl ResolvedDevice {
    /// Build the powered-on device, reading from the column `key` selects.
    pub fn build(&self, key: ReadingKey) -> Device {
        let device = Device::new(self.id, self.channel, self.threshold_angle, self.grace_duration);
        match key {
            ReadingKey::Channel => device,
            ReadingKey::Device => device.with_input_key(self.id.name()),
        }
    }
}

impl FdirConfig {
    pub fn grace_duration(&self) -> Duration {
        Duration::from_millis(self.grace_duration_ms)
    }

    pub fn polling_period(&self) -> Duration {
        Duration::from_millis(self.polling_period_ms)
    }

    /// Range-check every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.resolve().map(|_| ())
    }

    /// Validate and resolve device entries, preserving their order.
    pub fn resolve(&self) -> Result<Vec<ResolvedDevice>, ConfigError> {
        if !(1..=MAX_GRACE_MS).contains(&self.grace_duration_ms) {
            return Err(ConfigError::ValidationFailed(
                "grace_duration_ms must be 1–3600000",
            ));
        }
        if self.polling_period_ms > MAX_POLLING_MS {
            return Err(ConfigError::ValidationFailed(
                "polling_period_ms must be 0–60000",
            ));
        }
        if self.devices.is_empty() {
            return Err(ConfigError::ValidationFailed("at least one device is required"));
        }

        let mut resolved: Vec<ResolvedDevice> = Vec::with_capacity(self.devices.len());
        for entry in &self.devices {
            let id: DeviceId = entry.id.parse()?;
            let channel: Channel = entry.channel.parse()?;
            if resolved.iter().any(|s| s.id == id) {
                return Err(ConfigError::DuplicateDevice(id.name().to_string()));
            }

            let threshold_angle = entry.threshold.angle_rad();
            check_threshold(threshold_angle)?;

            let grace_duration =
                Duration::from_millis(entry.grace_duration_ms.unwrap_or(self.grace_duration_ms));
            check_grace(grace_duration)?;

            resolved.push(ResolvedDevice {
                id,
                channel,
                threshold_angle,
                grace_duration,
            });
        }
        Ok(resolved)
    }
}
