//! Location Timeline Extractor - reconstructs dwell timelines from a
//! device's location history
//!
//! Pipeline phases:
//! - acquire: pull the SQLite database over ADB (or use a local file)
//! - parse: extract raw fixes from the database
//! - detect: cluster fixes into stops
//! - render: timeline.csv, map.html, action_log.txt, hashes.csv
//!
//! Module structure:
//! - `domain/` - Core types (LocationFix, Stop) and geodesic helpers
//! - `services/` - The stop detection algorithm
//! - `io/` - External interfaces (ADB, SQLite, report rendering)
//! - `infra/` - Infrastructure (Config, AuditLog)

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Duration, Utc};
use clap::Parser;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

use location_timeline::domain::types::DeviceId;
use location_timeline::infra::{AuditLog, Config};
use location_timeline::io::adb::{AdbBridge, DeviceRepository};
use location_timeline::io::{db, report};
use location_timeline::services::StopDetector;

/// Location Timeline Extractor - dwell analysis for Android location history
#[derive(Parser, Debug)]
#[command(name = "location-timeline", version, about)]
struct Args {
    /// Directory to save output files (timeline.csv, map.html, hashes.csv,
    /// action_log.txt)
    #[arg(short, long)]
    output_dir: PathBuf,

    /// Local path to a location DB file, skipping the device pull
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Device serial to pull from when multiple devices are connected
    #[arg(long)]
    device_id: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,
}

fn main() -> Result<()> {
    // Initialize structured logging with configurable level via RUST_LOG env var
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        git = env!("GIT_HASH"),
        "location_timeline_starting"
    );

    let args = Args::parse();
    let config = Config::load_from_path(&args.config);

    info!(
        config_file = %config.config_file(),
        stop_radius_m = %config.stop_radius_m(),
        min_stop_duration_min = %config.min_stop_duration_min(),
        max_time_gap_min = %config.max_time_gap_min(),
        db_table = %config.db_table(),
        lookback_days = %config.lookback_days(),
        "config_loaded"
    );

    let mut audit = AuditLog::new();
    audit.record("Location Timeline Extractor started");
    audit.record(format!(
        "Command line arguments: {}",
        std::env::args().collect::<Vec<_>>().join(" ")
    ));

    fs::create_dir_all(&args.output_dir).with_context(|| {
        format!("could not create output directory '{}'", args.output_dir.display())
    })?;
    audit.record(format!("Output directory '{}' ensured", args.output_dir.display()));

    // Phase 1: get the database
    let db_path = acquire_database(&args, &config, &mut audit)?;
    audit.record(format!("Location database ready at: {}", db_path.display()));

    // Phase 2: parse the database
    audit.record("Starting database parsing...");
    audit.record(format!(
        "DB config: table='{}', timestamp='{}', lat='{}', lon='{}'",
        config.db_table(),
        config.timestamp_column(),
        config.latitude_column(),
        config.longitude_column()
    ));

    let since = Utc::now() - Duration::days(config.lookback_days());
    let fixes = db::read_location_fixes(&db_path, &config, since)?;
    if fixes.is_empty() {
        bail!("no location data extracted from '{}'", db_path.display());
    }
    audit.record(format!("Successfully parsed {} location points", fixes.len()));

    // Phase 3: detect stops
    audit.record("Starting location analysis...");
    let detector = StopDetector::new(config.detector_config());
    let stops = detector.detect(&fixes);
    if stops.is_empty() {
        audit.record("No stops identified in the location data");
    } else {
        audit.record(format!("Identified {} stops from location data", stops.len()));
    }

    // Phase 4: render artifacts (produced even when no stops were found)
    audit.record("Starting output generation...");
    let paths = report::generate_all(&stops, &mut audit, &args.output_dir)?;

    info!(
        timeline = %paths.timeline.display(),
        map = %paths.map.display(),
        hashes = %paths.hashes.display(),
        "artifacts_written"
    );
    audit.record("Location Timeline Extractor completed successfully");

    Ok(())
}

/// Resolve the database to analyze: an explicit local file, or a pull from
/// a connected device
fn acquire_database(args: &Args, config: &Config, audit: &mut AuditLog) -> Result<PathBuf> {
    if let Some(db_path) = &args.db_path {
        if !db_path.exists() {
            bail!("specified DB path '{}' does not exist", db_path.display());
        }
        audit.record(format!("Using provided local DB path: '{}'", db_path.display()));
        return Ok(db_path.clone());
    }

    let bridge = AdbBridge::new(config);
    let devices = bridge.list_devices()?;
    if devices.is_empty() {
        bail!("no devices found to pull from; connect an ADB-enabled device or provide --db-path");
    }

    let device = select_device(&devices, args.device_id.as_deref(), audit)?;
    audit.record(format!("Pulling location database from device '{}'", device));
    bridge
        .pull_database(&device, &args.output_dir)
        .with_context(|| format!("failed to pull DB from '{}'", device))
}

/// Pick the device to pull from: explicit serial, the only one connected,
/// or an interactive choice when several are attached
fn select_device(
    devices: &[DeviceId],
    requested: Option<&str>,
    audit: &mut AuditLog,
) -> Result<DeviceId> {
    if let Some(serial) = requested {
        return devices.iter().find(|d| d.0 == serial).cloned().ok_or_else(|| {
            anyhow!("specified device ID '{}' not found among connected devices", serial)
        });
    }

    if devices.len() == 1 {
        return Ok(devices[0].clone());
    }

    audit.record("Multiple devices found. Please select one:");
    for (i, device) in devices.iter().enumerate() {
        println!("  {}. {}", i + 1, device);
    }
    print!("Enter device number or ID: ");
    std::io::stdout().flush().ok();

    let mut choice = String::new();
    std::io::stdin().read_line(&mut choice).context("failed to read device choice")?;
    let choice = choice.trim();

    if let Ok(index) = choice.parse::<usize>() {
        if (1..=devices.len()).contains(&index) {
            return Ok(devices[index - 1].clone());
        }
    }

    devices
        .iter()
        .find(|d| d.0 == choice)
        .cloned()
        .ok_or_else(|| anyhow!("invalid device choice '{}'", choice))
}
