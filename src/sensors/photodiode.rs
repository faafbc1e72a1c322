//! Coarse sun sensor photodiodes.
//!
//! Six photodiodes (PD1..PD6) are mounted on the spacecraft body. Each
//! reports a sun elevation angle in radians relative to its own face;
//! higher means the sun is closer to the optical axis of whatever sits
//! behind that face.
//!
//! Readings are sanity-checked against the physically plausible range
//! `|angle| <= π/2` with a 1% allowance for sensor noise. Anything outside
//! that is treated as a bad sample rather than as sun exposure.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ReadingError};

/// Upper bound on the magnitude of a plausible elevation angle (radians).
pub const MAX_ELEVATION_RAD: f64 = core::f64::consts::FRAC_PI_2 * 1.01;

/// A photodiode input channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Channel {
    #[serde(rename = "PD1")]
    Pd1 = 0,
    #[serde(rename = "PD2")]
    Pd2 = 1,
    #[serde(rename = "PD3")]
    Pd3 = 2,
    #[serde(rename = "PD4")]
    Pd4 = 3,
    #[serde(rename = "PD5")]
    Pd5 = 4,
    #[serde(rename = "PD6")]
    Pd6 = 5,
}

impl Channel {
    /// Total number of photodiode channels.
    pub const COUNT: usize = 6;

    pub const ALL: [Channel; Channel::COUNT] = [
        Channel::Pd1,
        Channel::Pd2,
        Channel::Pd3,
        Channel::Pd4,
        Channel::Pd5,
        Channel::Pd6,
    ];

    /// Column name used by telemetry exports (`PD1`..`PD6`).
    pub const fn name(self) -> &'static str {
        match self {
            Self::Pd1 => "PD1",
            Self::Pd2 => "PD2",
            Self::Pd3 => "PD3",
            Self::Pd4 => "PD4",
            Self::Pd5 => "PD5",
            Self::Pd6 => "PD6",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Channel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Channel::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ConfigError::UnknownChannel(wanted.to_string()))
    }
}

/// Parse and sanity-check a raw elevation cell.
///
/// Blank cells count as missing, as telemetry exports leave a space where
/// a sample was dropped.
pub fn parse_elevation(raw: &str) -> Result<f64, ReadingError> {
    let cell = raw.trim();
    if cell.is_empty() {
        return Err(ReadingError::Missing);
    }
    let value: f64 = cell.parse().map_err(|_| ReadingError::NonNumeric)?;
    if value.is_nan() {
        return Err(ReadingError::NonNumeric);
    }
    validate_elevation(value)
}

/// Reject angles outside the plausible elevation range (infinities included).
pub fn validate_elevation(value: f64) -> Result<f64, ReadingError> {
    if value.is_nan() {
        return Err(ReadingError::NonNumeric);
    }
    if value.abs() > MAX_ELEVATION_RAD {
        return Err(ReadingError::OutOfRange);
    }
    Ok(value)
}
