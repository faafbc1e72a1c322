//! FDIR host runner: replays photodiode telemetry through the protection loop.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                   Adapters (outer ring)                  │
//! │                                                          │
//! │  CsvReplaySource   LogEventSink   JsonLinesAuditSink     │
//! │  (ReadingSource)   (EventSink)    (EventSink)            │
//! │  JsonConfigFile                                          │
//! │  (ConfigPort)                                            │
//! │                                                          │
//! │  ──────────────── Port Trait Boundary ───────────────    │
//! │                                                          │
//! │  ┌────────────────────────────────────────────────────┐  │
//! │  │            MonitorService (pure logic)             │  │
//! │  │  evaluate · debounce timers · drain                │  │
//! │  └────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Settings are layered: built-in OPS-SAT defaults, then `--config`, then
//! individual flags.
#![deny(unused_must_use)]

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use fdir::adapters::audit_log::JsonLinesAuditSink;
use fdir::adapters::config_file::JsonConfigFile;
use fdir::adapters::csv_replay::CsvReplaySource;
use fdir::adapters::log_sink::LogEventSink;
use fdir::app::ports::ConfigPort;
use fdir::app::service::MonitorService;
use fdir::config::{FdirConfig, ReadingKey};

fn parse_reading_key(s: &str) -> Result<ReadingKey, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "channel" => Ok(ReadingKey::Channel),
        "device" => Ok(ReadingKey::Device),
        other => Err(format!("unknown reading key '{other}' (expected channel or device)")),
    }
}

/// Sun-exposure protection loop for the OPS-SAT optical payload
#[derive(Parser, Debug)]
#[command(name = "fdir", version, about, long_about = None)]
struct Args {
    /// Photodiode telemetry CSV, one row per tick
    #[arg(short, long, required_unless_present = "write_config")]
    input: Option<PathBuf>,

    /// Spacing between ticks in milliseconds (0 replays as fast as possible)
    #[arg(long)]
    polling_period_ms: Option<u64>,

    /// Grace duration before a device in danger is turned off, in milliseconds
    #[arg(long)]
    grace_ms: Option<u64>,

    /// JSON configuration file (missing file means defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Which column feeds each device: channel (PD1..PD6) or device name
    #[arg(long, value_parser = parse_reading_key)]
    reading_key: Option<ReadingKey>,

    /// Also write every event as JSON lines to this file
    #[arg(long)]
    audit: Option<PathBuf>,

    /// Write the effective configuration to this file and exit
    #[arg(long)]
    write_config: Option<PathBuf>,

    /// Print the final report as JSON instead of a table
    #[arg(long)]
    report_json: bool,
}

fn effective_config(args: &Args) -> Result<FdirConfig> {
    let mut config = match &args.config {
        Some(path) => JsonConfigFile::new(path)
            .load()
            .with_context(|| format!("loading {}", path.display()))?,
        None => FdirConfig::default(),
    };
    if let Some(ms) = args.polling_period_ms {
        config.polling_period_ms = ms;
    }
    if let Some(ms) = args.grace_ms {
        config.grace_duration_ms = ms;
    }
    if let Some(key) = args.reading_key {
        config.reading_key = key;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    info!("FDIR sun-exposure protection v{}", env!("CARGO_PKG_VERSION"));

    let config = effective_config(&args)?;

    if let Some(path) = &args.write_config {
        JsonConfigFile::new(path)
            .save(&config)
            .with_context(|| format!("writing {}", path.display()))?;
        return Ok(());
    }

    let input = args.input.as_ref().context("--input is required")?;
    let mut service = MonitorService::new(&config).context("building device table")?;
    let mut source = CsvReplaySource::from_path(input)
        .with_context(|| format!("opening {}", input.display()))?;

    let audit: Option<JsonLinesAuditSink<BufWriter<File>>> = match &args.audit {
        Some(path) => Some(
            JsonLinesAuditSink::create(path)
                .with_context(|| format!("creating {}", path.display()))?,
        ),
        None => None,
    };

    info!(
        "polling every {:?}, default grace {:?}",
        config.polling_period(),
        config.grace_duration()
    );

    let mut sink = (LogEventSink::new(), audit);
    let report = service.run(&mut source, &mut sink)?;

    if let Some(audit) = sink.1.as_mut() {
        audit.flush().context("flushing audit log")?;
    }

    if args.report_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{report}");
    }
    Ok(())
}
