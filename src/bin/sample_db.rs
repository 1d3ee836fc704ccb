//! Sample database generator - creates a realistic locations.db for testing
//!
//! Writes a week of synthetic San Francisco Bay Area fixes with the schema
//! an Android location database uses, so the extractor can be exercised end
//! to end without a connected device:
//!
//!   sample-db --output-dir sample_data
//!   location-timeline --output-dir out --db-path sample_data/locations.db

use anyhow::{Context, Result};
use chrono::{Duration, TimeZone, Utc};
use clap::Parser;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

/// Sample database generator for the location timeline extractor
#[derive(Parser, Debug)]
#[command(name = "sample-db", version, about)]
struct Args {
    /// Directory for the generated database
    #[arg(short, long, default_value = "sample_data")]
    output_dir: PathBuf,
}

/// (days_ago, hour, minute, lat, lon, accuracy, altitude, speed, bearing, provider)
type SampleFix = (i64, u32, u32, f64, f64, i64, f64, f64, f64, &'static str);

/// A week of Bay Area movement: home mornings, a commute, office dwell,
/// a lunch walk, a weekend outing, shopping, an evening jog, recent days
const SAMPLE_FIXES: &[SampleFix] = &[
    // Home location (morning, repeated pattern)
    (7, 8, 0, 37.7749, -122.4194, 10, 52.3, 0.0, 0.0, "gps"),
    (7, 8, 30, 37.7749, -122.4194, 12, 52.3, 0.0, 0.0, "network"),
    // Commute to work (driving)
    (7, 9, 0, 37.7751, -122.4180, 15, 48.1, 8.5, 45.0, "gps"),
    (7, 9, 15, 37.7805, -122.4121, 20, 35.2, 12.3, 65.0, "gps"),
    (7, 9, 30, 37.7858, -122.4064, 18, 28.5, 15.7, 85.0, "gps"),
    (7, 9, 45, 37.7901, -122.4012, 25, 22.1, 10.2, 90.0, "network"),
    // At the office through the day
    (7, 10, 0, 37.4220, -122.0841, 30, 15.0, 0.0, 0.0, "network"),
    (7, 12, 0, 37.4220, -122.0841, 35, 15.0, 0.0, 0.0, "network"),
    (7, 14, 0, 37.4220, -122.0841, 40, 15.0, 0.0, 0.0, "passive"),
    (7, 16, 0, 37.4220, -122.0841, 45, 15.0, 0.0, 0.0, "network"),
    // Lunch break (walking to a nearby restaurant)
    (7, 12, 30, 37.4225, -122.0835, 10, 15.5, 1.2, 120.0, "gps"),
    (7, 12, 35, 37.4230, -122.0828, 12, 16.0, 1.5, 135.0, "gps"),
    (7, 13, 0, 37.4235, -122.0820, 15, 16.5, 0.0, 0.0, "gps"),
    // Weekend trip to the Golden Gate Bridge
    (5, 10, 0, 37.8199, -122.4783, 8, 75.0, 0.0, 0.0, "gps"),
    (5, 10, 30, 37.8199, -122.4783, 10, 75.0, 0.0, 0.0, "gps"),
    (5, 11, 0, 37.8199, -122.4783, 12, 75.0, 0.0, 0.0, "network"),
    // Shopping at Union Square
    (4, 15, 0, 37.7879, -122.4075, 20, 45.0, 0.8, 180.0, "network"),
    (4, 15, 30, 37.7881, -122.4078, 25, 45.0, 0.5, 210.0, "network"),
    (4, 16, 0, 37.7885, -122.4082, 30, 45.0, 0.0, 0.0, "passive"),
    // Evening jog in the park
    (3, 18, 0, 37.7694, -122.4862, 10, 120.0, 2.5, 270.0, "gps"),
    (3, 18, 15, 37.7701, -122.4905, 12, 125.0, 3.2, 285.0, "gps"),
    (3, 18, 30, 37.7712, -122.4948, 15, 130.0, 2.8, 300.0, "gps"),
    (3, 18, 45, 37.7725, -122.4990, 18, 128.0, 2.1, 315.0, "gps"),
    // Recent locations (yesterday and today)
    (1, 9, 0, 37.7749, -122.4194, 10, 52.3, 0.0, 0.0, "gps"),
    (1, 12, 30, 37.7735, -122.4142, 15, 38.0, 0.0, 0.0, "network"),
    (1, 18, 0, 37.7749, -122.4194, 12, 52.3, 0.0, 0.0, "gps"),
    (0, 8, 0, 37.7749, -122.4194, 10, 52.3, 0.0, 0.0, "gps"),
    (0, 10, 30, 37.7805, -122.4090, 20, 30.0, 5.5, 45.0, "gps"),
    (0, 14, 0, 37.7820, -122.4015, 25, 25.0, 0.0, 0.0, "network"),
];

fn main() -> Result<()> {
    let args = Args::parse();

    fs::create_dir_all(&args.output_dir).with_context(|| {
        format!("could not create output directory '{}'", args.output_dir.display())
    })?;

    let db_path = args.output_dir.join("locations.db");
    if db_path.exists() {
        fs::remove_file(&db_path).context("failed to remove existing database")?;
        println!("Existing {} removed.", db_path.display());
    }

    let conn = Connection::open(&db_path)
        .with_context(|| format!("failed to create {}", db_path.display()))?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS locations (
            _id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp INTEGER NOT NULL,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            accuracy INTEGER,
            altitude REAL,
            speed REAL,
            bearing REAL,
            provider TEXT
        )",
        [],
    )?;

    println!("Inserting location data...");
    for &(days_ago, hour, minute, lat, lon, accuracy, altitude, speed, bearing, provider) in
        SAMPLE_FIXES
    {
        let timestamp = timestamp_at(days_ago, hour, minute);
        conn.execute(
            "INSERT INTO locations
                 (timestamp, latitude, longitude, accuracy, altitude, speed, bearing, provider)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![timestamp, lat, lon, accuracy, altitude, speed, bearing, provider],
        )?;
    }

    conn.execute("CREATE INDEX idx_timestamp ON locations (timestamp)", [])?;

    let total: i64 = conn.query_row("SELECT COUNT(*) FROM locations", [], |r| r.get(0))?;
    let (min_ts, max_ts): (i64, i64) = conn.query_row(
        "SELECT MIN(timestamp), MAX(timestamp) FROM locations",
        [],
        |r| Ok((r.get(0)?, r.get(1)?)),
    )?;

    println!("locations.db created at: {}", db_path.display());
    println!("  records:    {}", total);
    println!("  date range: {} to {}", format_day(min_ts), format_day(max_ts));
    Ok(())
}

/// Epoch milliseconds for a wall-clock time `days_ago` days in the past
fn timestamp_at(days_ago: i64, hour: u32, minute: u32) -> i64 {
    let date = Utc::now() - Duration::days(days_ago);
    date.date_naive()
        .and_hms_opt(hour, minute, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or_else(|| date.timestamp_millis())
}

fn format_day(ts_ms: i64) -> String {
    Utc.timestamp_millis_opt(ts_ms)
        .single()
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
