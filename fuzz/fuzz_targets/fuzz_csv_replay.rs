//! Fuzz target: `CsvReplaySource` + `ReadingFrame::elevation`
//!
//! Drives arbitrary bytes through the CSV replay source and parses every
//! photodiode channel of every frame. Must never panic, and every accepted
//! reading must lie inside the plausible elevation range.
//!
//! cargo fuzz run fuzz_csv_replay

#![no_main]

use libfuzzer_sys::fuzz_target;

use fdir::adapters::csv_replay::CsvReplaySource;
use fdir::app::ports::ReadingSource;
use fdir::error::SourceError;
use fdir::sensors::{Channel, MAX_ELEVATION_RAD};

fuzz_target!(|data: &[u8]| {
    let Ok(mut source) = CsvReplaySource::from_reader(data) else {
        return;
    };

    while let Some(next) = source.next_frame() {
        let frame = match next {
            Ok(frame) => frame,
            Err(SourceError::Record(_)) => continue,
            Err(SourceError::Io(_)) => break,
        };
        for ch in Channel::ALL {
            if let Ok(angle) = frame.elevation(ch.name()) {
                assert!(angle.is_finite());
                assert!(angle.abs() <= MAX_ELEVATION_RAD);
            }
        }
    }
});
