//! Integration tests for the monitoring loop: source → evaluate →
//! arm/cancel → timer threads → events and final report.

use std::time::Duration;

use fdir::Error;
use fdir::adapters::audit_log::JsonLinesAuditSink;
use fdir::adapters::csv_replay::CsvReplaySource;
use fdir::app::events::FdirEvent;
use fdir::app::service::MonitorService;
use fdir::config::{FdirConfig, ReadingKey};
use fdir::device::{
    Device, DeviceId, DeviceState, PD_ELEVATION_THRESHOLD_HD_CAM, PD_ELEVATION_THRESHOLD_IADCS_ST,
};
use fdir::error::{ConfigError, SourceError};
use fdir::sensors::{Channel, ReadingFrame};

use crate::mock_io::{RecordingSink, ScriptedSource, wait_until};

const TICK: Duration = Duration::from_millis(20);
const GRACE: Duration = Duration::from_millis(100);

fn camera_only(grace: Duration, polling: Duration) -> MonitorService {
    let camera = Device::new(
        DeviceId::Camera,
        Channel::Pd6,
        PD_ELEVATION_THRESHOLD_HD_CAM,
        grace,
    );
    MonitorService::with_devices([camera], polling).unwrap()
}

fn star_tracker_only(grace: Duration, polling: Duration) -> MonitorService {
    let st = Device::new(
        DeviceId::StarTracker,
        Channel::Pd3,
        PD_ELEVATION_THRESHOLD_IADCS_ST,
        grace,
    );
    MonitorService::with_devices([st], polling).unwrap()
}

// ── End-to-end debounce ───────────────────────────────────────

#[test]
fn sustained_danger_turns_camera_off() {
    let mut svc = camera_only(GRACE, TICK);
    let mut src = ScriptedSource::single("PD6", &[0.5, 1.2, 1.3]);
    let mut sink = RecordingSink::new();

    let report = svc.run(&mut src, &mut sink).unwrap();

    assert_eq!(report.state(DeviceId::Camera), Some(DeviceState::Off));
    assert_eq!(report.ticks, 3);
    assert_eq!(sink.armed(DeviceId::Camera), 1, "re-arm must be a no-op");
    assert_eq!(sink.cancelled(DeviceId::Camera), 0);

    let offs = sink.turned_off(DeviceId::Camera);
    assert_eq!(offs.len(), 1, "exactly one OFF transition");
    assert!(offs[0] >= GRACE, "fired before grace: {:?}", offs[0]);
}

#[test]
fn safe_reading_before_grace_keeps_camera_on() {
    let mut svc = camera_only(GRACE, TICK);
    let mut src = ScriptedSource::single("PD6", &[0.5, 1.2, 0.9]);
    let mut sink = RecordingSink::new();

    let report = svc.run(&mut src, &mut sink).unwrap();

    assert_eq!(report.state(DeviceId::Camera), Some(DeviceState::On));
    assert_eq!(sink.armed(DeviceId::Camera), 1);
    assert_eq!(sink.cancelled(DeviceId::Camera), 1);
    assert!(sink.turned_off(DeviceId::Camera).is_empty());
}

#[test]
fn reading_equal_to_threshold_is_safe() {
    let mut svc = camera_only(Duration::from_millis(5), Duration::ZERO);
    let mut src = ScriptedSource::single("PD6", &[PD_ELEVATION_THRESHOLD_HD_CAM; 4]);
    let mut sink = RecordingSink::new();

    let report = svc.run(&mut src, &mut sink).unwrap();
    assert_eq!(report.state(DeviceId::Camera), Some(DeviceState::On));
    assert_eq!(sink.armed(DeviceId::Camera), 0);
}

#[test]
fn events_bracketed_by_started_and_finished() {
    let mut svc = camera_only(GRACE, Duration::ZERO);
    let mut src = ScriptedSource::single("PD6", &[0.1, 0.2]);
    let mut sink = RecordingSink::new();
    svc.run(&mut src, &mut sink).unwrap();

    assert_eq!(sink.events.first(), Some(&FdirEvent::Started { devices: 1 }));
    assert_eq!(sink.events.last(), Some(&FdirEvent::Finished { ticks: 2 }));
}

// ── Shared channel, independent devices ───────────────────────

#[test]
fn opssat_devices_on_shared_channel_debounce_independently() {
    // PD6 = 0.8 endangers OPTICAL_RX (0.6632) but not HD_CAMERA (1.0472).
    let config = FdirConfig {
        grace_duration_ms: 50,
        polling_period_ms: 0,
        ..Default::default()
    };
    let mut svc = MonitorService::new(&config).unwrap();
    let mut src = CsvReplaySource::from_reader(
        "time,PD3,PD6\n0,0.0,0.8\n1,1.2,0.8\n2,0.0,0.8\n".as_bytes(),
    )
    .unwrap();
    let mut sink = RecordingSink::new();

    let report = svc.run(&mut src, &mut sink).unwrap();

    assert_eq!(report.state(DeviceId::OpticalReceiver), Some(DeviceState::Off));
    assert_eq!(report.state(DeviceId::Camera), Some(DeviceState::On));
    assert_eq!(report.state(DeviceId::StarTracker), Some(DeviceState::On));
    assert_eq!(sink.armed(DeviceId::StarTracker), 1);
    assert_eq!(sink.cancelled(DeviceId::StarTracker), 1);
    assert_eq!(sink.armed(DeviceId::Camera), 0);
}

#[test]
fn device_keyed_rows() {
    let config = FdirConfig {
        grace_duration_ms: 30,
        polling_period_ms: 0,
        reading_key: ReadingKey::Device,
        ..Default::default()
    };
    let mut svc = MonitorService::new(&config).unwrap();
    let csv = "HD_CAMERA,OPTICAL_RX,STAR_TRACKER\n\
               0.5,0.1,0.1\n\
               1.2,0.1,0.1\n\
               1.3,0.1,0.1\n";
    let mut src = CsvReplaySource::from_reader(csv.as_bytes()).unwrap();
    let mut sink = RecordingSink::new();

    let report = svc.run(&mut src, &mut sink).unwrap();

    assert_eq!(report.state(DeviceId::Camera), Some(DeviceState::Off));
    assert_eq!(report.state(DeviceId::OpticalReceiver), Some(DeviceState::On));
    assert_eq!(report.state(DeviceId::StarTracker), Some(DeviceState::On));
}

// ── Star tracker arming exception ─────────────────────────────

#[test]
fn star_tracker_rearms_after_turning_off() {
    let mut svc = star_tracker_only(Duration::from_millis(5), Duration::ZERO);
    let mut sink = RecordingSink::new();
    let mut danger = ReadingFrame::new();
    danger.set("PD3", 1.5);

    svc.start(&mut sink);
    svc.tick(&danger, &mut sink);
    assert!(wait_until(Duration::from_secs(2), || {
        svc.device_state(DeviceId::StarTracker) == Some(DeviceState::Off)
    }));
    svc.tick(&danger, &mut sink);
    let report = svc.shutdown(&mut sink);

    assert_eq!(sink.armed(DeviceId::StarTracker), 2);
    assert_eq!(sink.turned_off(DeviceId::StarTracker).len(), 2);
    assert_eq!(report.state(DeviceId::StarTracker), Some(DeviceState::Off));

    let transitions: Vec<bool> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            FdirEvent::DeviceTurnedOff { was_on, .. } => Some(*was_on),
            _ => None,
        })
        .collect();
    assert_eq!(transitions, vec![true, false]);
}

#[test]
fn turn_off_during_polling_sleep_precedes_next_arm() {
    let mut svc = star_tracker_only(Duration::from_millis(5), Duration::from_millis(40));
    let mut src = ScriptedSource::single("PD3", &[1.5, 1.5]);
    let mut sink = RecordingSink::new();

    svc.run(&mut src, &mut sink).unwrap();

    let first_off = sink
        .events
        .iter()
        .position(|e| matches!(e, FdirEvent::DeviceTurnedOff { generation: 1, .. }))
        .expect("first countdown fired");
    let second_arm = sink
        .events
        .iter()
        .position(|e| matches!(e, FdirEvent::TimerArmed { tick: 2, .. }))
        .expect("re-armed on tick 2");
    assert!(first_off < second_arm, "{:?}", sink.events);

    // Each arm is followed by its own turn-off before the next arm.
    let order: Vec<&str> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            FdirEvent::TimerArmed { .. } => Some("arm"),
            FdirEvent::DeviceTurnedOff { .. } => Some("off"),
            _ => None,
        })
        .collect();
    assert_eq!(order, vec!["arm", "off", "arm", "off"]);
}

#[test]
fn camera_not_rearmed_once_off() {
    let mut svc = camera_only(Duration::from_millis(5), Duration::ZERO);
    let mut sink = RecordingSink::new();
    let mut danger = ReadingFrame::new();
    danger.set("PD6", 1.4);

    svc.tick(&danger, &mut sink);
    assert!(wait_until(Duration::from_secs(2), || {
        svc.device_state(DeviceId::Camera) == Some(DeviceState::Off)
    }));
    svc.tick(&danger, &mut sink);
    svc.tick(&danger, &mut sink);
    svc.shutdown(&mut sink);

    assert_eq!(sink.armed(DeviceId::Camera), 1);
    assert_eq!(sink.turned_off(DeviceId::Camera).len(), 1);
}

// ── Invalid input ─────────────────────────────────────────────

#[test]
fn invalid_readings_neither_arm_nor_cancel() {
    let mut svc = star_tracker_only(Duration::from_millis(30), Duration::ZERO);
    let mut src = ScriptedSource::with_columns(&["PD3"]);
    src.push_row(&["1.5"])
        .push_row(&["abc"])
        .push_row(&[""])
        .push_row(&["9.0"])
        .push_row(&["NaN"]);
    let mut sink = RecordingSink::new();

    let report = svc.run(&mut src, &mut sink).unwrap();

    // The danger on tick 1 was never cancelled.
    assert_eq!(report.state(DeviceId::StarTracker), Some(DeviceState::Off));
    assert_eq!(sink.rejected(DeviceId::StarTracker), 4);
    assert_eq!(report.readings_rejected, 4);
    assert_eq!(sink.cancelled(DeviceId::StarTracker), 0);
}

#[test]
fn all_invalid_input_leaves_devices_on() {
    let mut svc = MonitorService::new(&FdirConfig {
        polling_period_ms: 0,
        ..Default::default()
    })
    .unwrap();
    let mut src = ScriptedSource::with_columns(&["PD3", "PD6"]);
    src.push_row(&["x", "y"]).push_row(&["2.0", "-2.0"]);
    let mut sink = RecordingSink::new();

    let report = svc.run(&mut src, &mut sink).unwrap();
    assert!(report.devices.iter().all(|r| r.state == DeviceState::On));
    assert_eq!(report.readings_rejected, 6);
}

#[test]
fn missing_column_fails_before_first_tick() {
    let mut svc = MonitorService::new(&FdirConfig::default()).unwrap();
    let mut src = ScriptedSource::with_columns(&["time", "PD3"]);
    src.push_row(&["0", "1.5"]);
    let mut sink = RecordingSink::new();

    let err = svc.run(&mut src, &mut sink).unwrap_err();
    assert!(matches!(
        err,
        Error::Config(ConfigError::UnknownChannel(ref c)) if c == "PD6"
    ));
    assert!(sink.events.is_empty());
    assert_eq!(svc.tick_count(), 0);
    assert_eq!(src.remaining(), 1);
}

#[test]
fn headerless_source_skips_column_check() {
    let mut svc = camera_only(GRACE, Duration::ZERO);
    let mut src = ScriptedSource::headerless();
    let mut frame = ReadingFrame::new();
    frame.set("pd6", 0.2);
    src.push_frame(frame).push_frame(ReadingFrame::new());
    let mut sink = RecordingSink::new();

    let report = svc.run(&mut src, &mut sink).unwrap();
    assert_eq!(report.ticks, 2);
    assert_eq!(sink.rejected(DeviceId::Camera), 1);
}

#[test]
fn malformed_rows_do_not_stop_the_run() {
    let mut svc = camera_only(Duration::from_millis(20), Duration::ZERO);
    let mut src = ScriptedSource::with_columns(&["PD6"]);
    src.push_row(&["1.2"])
        .push_error(SourceError::Record("found 3 fields, expected 1".into()))
        .push_row(&["1.3"]);
    let mut sink = RecordingSink::new();

    let report = svc.run(&mut src, &mut sink).unwrap();

    assert_eq!(report.ticks, 3);
    assert_eq!(report.rows_skipped, 1);
    // A skipped row carries no information; the countdown keeps running.
    assert_eq!(report.state(DeviceId::Camera), Some(DeviceState::Off));
    assert_eq!(sink.cancelled(DeviceId::Camera), 0);
}

#[test]
fn source_io_failure_drains_and_reports_error() {
    let mut svc = camera_only(Duration::from_millis(20), Duration::ZERO);
    let mut src = ScriptedSource::with_columns(&["PD6"]);
    src.push_row(&["1.2"])
        .push_error(SourceError::Io("device unplugged".into()))
        .push_row(&["0.0"]);
    let mut sink = RecordingSink::new();

    let err = svc.run(&mut src, &mut sink).unwrap_err();

    assert!(matches!(err, Error::Source(SourceError::Io(_))));
    assert_eq!(src.remaining(), 1, "reading stops at the failure");
    assert!(!svc.device(DeviceId::Camera).unwrap().has_live_timer());
    assert_eq!(svc.device_state(DeviceId::Camera), Some(DeviceState::Off));
    assert_eq!(sink.turned_off(DeviceId::Camera).len(), 1);
}

// ── Fan-out to the audit trail ────────────────────────────────

#[test]
fn audit_trail_mirrors_every_event() {
    let mut svc = camera_only(Duration::from_millis(10), Duration::ZERO);
    let mut src = ScriptedSource::single("PD6", &[1.2, 0.1, 1.2, 1.2]);
    let mut sink = (RecordingSink::new(), JsonLinesAuditSink::new(Vec::new()));

    svc.run(&mut src, &mut sink).unwrap();

    let (recorded, audit) = sink;
    let text = String::from_utf8(audit.into_inner()).unwrap();
    let lines: Vec<serde_json::Value> = text
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), recorded.events.len());

    let kinds: Vec<&str> = lines.iter().map(|v| v["event"].as_str().unwrap()).collect();
    assert_eq!(kinds[0], "started");
    assert_eq!(kinds[1], "timer_armed");
    assert_eq!(kinds[2], "timer_cancelled");
    assert_eq!(kinds[3], "timer_armed");
    assert!(kinds.contains(&"device_turned_off"));
    assert_eq!(*kinds.last().unwrap(), "finished");
}
