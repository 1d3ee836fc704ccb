//! Report rendering - timeline CSV, interactive map, audit log, hashes
//!
//! Every artifact is hashed after writing; hashes.csv is written last and
//! indexes the other three files. Artifacts are produced even when zero
//! stops were detected.

use anyhow::{Context, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::domain::types::Stop;
use crate::infra::AuditLog;

/// Default map center when no stops were detected (San Francisco)
const FALLBACK_CENTER: (f64, f64) = (37.7749, -122.4194);
const MAP_ZOOM: u32 = 12;
const HEAT_RADIUS: u32 = 15;
const HEAT_BLUR: u32 = 10;
const HASH_BLOCK_SIZE: usize = 4096;

/// Paths of the artifacts produced by one run
#[derive(Debug)]
pub struct ReportPaths {
    pub timeline: PathBuf,
    pub map: PathBuf,
    pub action_log: PathBuf,
    pub hashes: PathBuf,
}

/// Write one row per stop to timeline.csv
pub fn write_timeline_csv(stops: &[Stop], output_dir: &Path) -> Result<PathBuf> {
    let path = output_dir.join("timeline.csv");
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    writer
        .write_record([
            "arrival_time",
            "departure_time",
            "duration_minutes",
            "latitude",
            "longitude",
            "point_count",
        ])
        .context("failed to write timeline header")?;

    for stop in stops {
        writer
            .write_record([
                stop.arrival_time.format("%Y-%m-%d %H:%M:%S").to_string(),
                stop.departure_time.format("%Y-%m-%d %H:%M:%S").to_string(),
                stop.duration_minutes.to_string(),
                stop.latitude.to_string(),
                stop.longitude.to_string(),
                stop.point_count.to_string(),
            ])
            .context("failed to write timeline row")?;
    }

    writer.flush().context("failed to flush timeline.csv")?;
    info!(path = %path.display(), stops = stops.len(), "timeline_csv_written");
    Ok(path)
}

/// Marker payload embedded in the generated map page
#[derive(Serialize)]
struct MapMarker {
    lat: f64,
    lon: f64,
    color: &'static str,
    tooltip: String,
    popup: String,
    weight: i64,
}

/// Write a self-contained Leaflet map with one banded marker per stop and
/// a duration-weighted heat layer
pub fn write_map_html(stops: &[Stop], output_dir: &Path) -> Result<PathBuf> {
    let path = output_dir.join("map.html");

    let (center_lat, center_lon) = if stops.is_empty() {
        FALLBACK_CENTER
    } else {
        let n = stops.len() as f64;
        (
            stops.iter().map(|s| s.latitude).sum::<f64>() / n,
            stops.iter().map(|s| s.longitude).sum::<f64>() / n,
        )
    };

    let markers: Vec<MapMarker> = stops
        .iter()
        .enumerate()
        .map(|(i, stop)| MapMarker {
            lat: stop.latitude,
            lon: stop.longitude,
            color: stop.duration_band().marker_color(),
            tooltip: format!("Stop #{} ({} min)", i + 1, stop.duration_minutes),
            popup: format!(
                "<b>Stop #{}</b><br>Arrival: {}<br>Departure: {}<br>\
                 Duration: {} minutes<br>Location points: {}",
                i + 1,
                stop.arrival_time.format("%Y-%m-%d %H:%M"),
                stop.departure_time.format("%Y-%m-%d %H:%M"),
                stop.duration_minutes,
                stop.point_count
            ),
            weight: stop.duration_minutes,
        })
        .collect();

    let markers_json =
        serde_json::to_string(&markers).context("failed to serialize map markers")?;

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Location Timeline</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<script src="https://unpkg.com/leaflet.heat@0.2.0/dist/leaflet-heat.js"></script>
<style>html, body, #map {{ height: 100%; margin: 0; }}</style>
</head>
<body>
<div id="map"></div>
<script>
var map = L.map('map').setView([{center_lat}, {center_lon}], {zoom});
L.tileLayer('https://{{s}}.tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png', {{
  attribution: '&copy; OpenStreetMap contributors'
}}).addTo(map);

var stops = {markers_json};
stops.forEach(function (stop) {{
  L.circleMarker([stop.lat, stop.lon], {{
    radius: 8,
    color: stop.color,
    fillColor: stop.color,
    fillOpacity: 0.8
  }}).bindTooltip(stop.tooltip).bindPopup(stop.popup).addTo(map);
}});

L.heatLayer(stops.map(function (stop) {{
  return [stop.lat, stop.lon, stop.weight];
}}), {{radius: {heat_radius}, blur: {heat_blur}}}).addTo(map);
</script>
</body>
</html>
"#,
        center_lat = center_lat,
        center_lon = center_lon,
        zoom = MAP_ZOOM,
        markers_json = markers_json,
        heat_radius = HEAT_RADIUS,
        heat_blur = HEAT_BLUR,
    );

    fs::write(&path, html).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), markers = stops.len(), "map_html_written");
    Ok(path)
}

/// Render the audit trail into action_log.txt
pub fn write_audit_log(audit: &AuditLog, output_dir: &Path) -> Result<PathBuf> {
    let path = output_dir.join("action_log.txt");
    fs::write(&path, audit.render())
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), entries = audit.entries().len(), "action_log_written");
    Ok(path)
}

/// Streaming SHA-256 of a file, hex encoded
pub fn hash_file(path: &Path) -> Result<String> {
    let file = File::open(path)
        .with_context(|| format!("failed to open {} for hashing", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; HASH_BLOCK_SIZE];

    loop {
        let n = reader
            .read(&mut buf)
            .with_context(|| format!("failed to read {} for hashing", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Write filename + SHA-256 rows for each existing artifact.
///
/// A file that fails to hash is recorded as ERROR and the run continues.
pub fn write_hashes_csv(
    files: &[PathBuf],
    output_dir: &Path,
    audit: &mut AuditLog,
) -> Result<PathBuf> {
    let path = output_dir.join("hashes.csv");
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    writer
        .write_record(["filename", "sha256_hash"])
        .context("failed to write hashes header")?;

    for file in files {
        if !file.exists() {
            continue;
        }
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file.display().to_string());

        let digest = match hash_file(file) {
            Ok(digest) => digest,
            Err(e) => {
                warn!(file = %file.display(), error = %e, "hashing_failed");
                "ERROR".to_string()
            }
        };

        audit.record(format!("  - {}: {}...", name, &digest[..digest.len().min(16)]));
        writer
            .write_record([name.as_str(), digest.as_str()])
            .context("failed to write hash row")?;
    }

    writer.flush().context("failed to flush hashes.csv")?;
    info!(path = %path.display(), "hashes_csv_written");
    Ok(path)
}

/// Generate all artifacts for a run: timeline, map, action log, then the
/// hash index over the first three
pub fn generate_all(stops: &[Stop], audit: &mut AuditLog, output_dir: &Path) -> Result<ReportPaths> {
    audit.record("Starting output file generation");

    audit.record("Generating timeline.csv...");
    let timeline = write_timeline_csv(stops, output_dir)?;
    audit.record(format!("Generated timeline.csv with {} stops", stops.len()));

    audit.record("Generating map.html...");
    let map = write_map_html(stops, output_dir)?;
    audit.record(format!("Generated map.html with {} markers and heat layer", stops.len()));

    audit.record("Generating action_log.txt...");
    let action_log = write_audit_log(audit, output_dir)?;

    audit.record("Generating hashes.csv...");
    let files = [timeline.clone(), map.clone(), action_log.clone()];
    let hashes = write_hashes_csv(&files, output_dir, audit)?;

    audit.record("All output files generated successfully");
    Ok(ReportPaths { timeline, map, action_log, hashes })
}
