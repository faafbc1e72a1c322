//! Sun-exposure evaluator.
//!
//! Pure decision function: compares a photodiode elevation angle against a
//! device's danger threshold. It never touches device state; the monitoring
//! loop turns the verdict into an arm or cancel of the debounce timer.
//!
//! The boundary is inclusive on the safe side: a reading exactly equal to
//! the threshold is [`Exposure::Safe`].

use core::fmt;

use serde::Serialize;

/// Verdict for one reading against one threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Exposure {
    Safe,
    Danger,
}

impl Exposure {
    pub fn is_danger(self) -> bool {
        self == Self::Danger
    }
}

impl fmt::Display for Exposure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Safe => write!(f, "SAFE"),
            Self::Danger => write!(f, "DANGER"),
        }
    }
}

/// `Danger` iff `reading > threshold`.
#[inline]
pub fn evaluate(reading: f64, threshold: f64) -> Exposure {
    if reading > threshold {
        Exposure::Danger
    } else {
        Exposure::Safe
    }
}
