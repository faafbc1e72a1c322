//! Sensor subsystem: photodiode channels and the per-tick [`ReadingFrame`].
//!
//! A reading source produces one frame per tick. The monitoring loop looks
//! up each device's input column in the frame and parses it on demand, so a
//! bad cell only affects the devices bound to it.

pub mod photodiode;

use std::collections::HashMap;

use crate::error::ReadingError;
pub use photodiode::{Channel, MAX_ELEVATION_RAD, parse_elevation, validate_elevation};

/// One tick worth of raw readings, keyed by column name.
///
/// Column names are normalised to upper case, so `hd_camera` and
/// `HD_CAMERA` refer to the same column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadingFrame {
    cells: HashMap<String, String>,
}

impl ReadingFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a frame from `(column, cell)` pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut frame = Self::new();
        for (key, value) in pairs {
            frame.insert(key.as_ref(), value);
        }
        frame
    }

    /// Set the raw cell for `column`, replacing any previous value.
    pub fn insert(&mut self, column: &str, raw: impl Into<String>) {
        self.cells.insert(normalise(column), raw.into());
    }

    /// Set a numeric reading for `column`.
    pub fn set(&mut self, column: &str, value: f64) {
        self.insert(column, value.to_string());
    }

    /// Raw cell text, if the column is present.
    pub fn raw(&self, column: &str) -> Option<&str> {
        self.cells.get(&normalise(column)).map(String::as_str)
    }

    /// Parsed and range-checked elevation angle for `column`.
    pub fn elevation(&self, column: &str) -> Result<f64, ReadingError> {
        match self.raw(column) {
            Some(cell) => parse_elevation(cell),
            None => Err(ReadingError::Missing),
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

fn normalise(column: &str) -> String {
    column.trim().to_ascii_uppercase()
}
