//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters. Everything runs on the host with real timer
//! threads and short grace durations.

mod mock_io;
mod monitor_loop_tests;
