//! FDIR sun-exposure protection library.
//!
//! Guards the optical payload (camera, optical receiver, star tracker)
//! against sun exposure. Photodiode elevation readings are checked against
//! per-device thresholds, and a device is turned off once the danger has
//! persisted for a full grace period.
//!
//! The domain core ([`app::service::MonitorService`]) talks to the outside
//! world only through the port traits in [`app::ports`]; concrete file and
//! log adapters live in [`adapters`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod device;
pub mod error;
pub mod events;
pub mod safety;
pub mod sensors;
pub mod timer;

pub use error::{Error, Result};
