//! Configuration loading from TOML files
//!
//! Config file is selected via the --config command line argument; a
//! missing or unparseable file falls back to built-in defaults with a
//! warning. Every section and field is optional.

use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::services::stop_detector::DetectorConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct DetectorSection {
    /// Max distance in meters from the running cluster centroid
    #[serde(default = "default_stop_radius_m")]
    pub stop_radius_m: f64,
    /// Minimum dwell duration in minutes for a cluster to become a stop
    #[serde(default = "default_min_stop_duration_min")]
    pub min_stop_duration_min: f64,
    /// Max minutes between consecutive fixes of one cluster
    #[serde(default = "default_max_time_gap_min")]
    pub max_time_gap_min: f64,
}

fn default_stop_radius_m() -> f64 {
    50.0
}

fn default_min_stop_duration_min() -> f64 {
    1.0
}

fn default_max_time_gap_min() -> f64 {
    30.0
}

impl Default for DetectorSection {
    fn default() -> Self {
        Self {
            stop_radius_m: default_stop_radius_m(),
            min_stop_duration_min: default_min_stop_duration_min(),
            max_time_gap_min: default_max_time_gap_min(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSection {
    #[serde(default = "default_db_table")]
    pub table: String,
    #[serde(default = "default_timestamp_column")]
    pub timestamp_column: String,
    #[serde(default = "default_latitude_column")]
    pub latitude_column: String,
    #[serde(default = "default_longitude_column")]
    pub longitude_column: String,
    /// How far back from now to extract fixes
    #[serde(default = "default_lookback_days")]
    pub lookback_days: i64,
}

fn default_db_table() -> String {
    "locations".to_string()
}

fn default_timestamp_column() -> String {
    "timestamp".to_string()
}

fn default_latitude_column() -> String {
    "latitude".to_string()
}

fn default_longitude_column() -> String {
    "longitude".to_string()
}

fn default_lookback_days() -> i64 {
    7
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            table: default_db_table(),
            timestamp_column: default_timestamp_column(),
            latitude_column: default_latitude_column(),
            longitude_column: default_longitude_column(),
            lookback_days: default_lookback_days(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdbSection {
    /// Name or path of the adb binary
    #[serde(default = "default_adb_binary")]
    pub binary: String,
    /// Candidate on-device database paths, tried in order
    #[serde(default = "default_remote_db_paths")]
    pub remote_db_paths: Vec<String>,
}

fn default_adb_binary() -> String {
    "adb".to_string()
}

fn default_remote_db_paths() -> Vec<String> {
    vec![
        "/data/data/com.google.android.gms/databases/locations.db".to_string(),
        "/data/data/com.google.android.gms/databases/cache.db".to_string(),
    ]
}

impl Default for AdbSection {
    fn default() -> Self {
        Self { binary: default_adb_binary(), remote_db_paths: default_remote_db_paths() }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub detector: DetectorSection,
    #[serde(default)]
    pub database: DatabaseSection,
    #[serde(default)]
    pub adb: AdbSection,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    stop_radius_m: f64,
    min_stop_duration_min: f64,
    max_time_gap_min: f64,
    db_table: String,
    timestamp_column: String,
    latitude_column: String,
    longitude_column: String,
    lookback_days: i64,
    adb_binary: String,
    remote_db_paths: Vec<String>,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default(), "default")
    }
}

impl Config {
    fn from_toml(toml_config: TomlConfig, config_file: &str) -> Self {
        Self {
            stop_radius_m: toml_config.detector.stop_radius_m,
            min_stop_duration_min: toml_config.detector.min_stop_duration_min,
            max_time_gap_min: toml_config.detector.max_time_gap_min,
            db_table: toml_config.database.table,
            timestamp_column: toml_config.database.timestamp_column,
            latitude_column: toml_config.database.latitude_column,
            longitude_column: toml_config.database.longitude_column,
            lookback_days: toml_config.database.lookback_days,
            adb_binary: toml_config.adb.binary,
            remote_db_paths: toml_config.adb.remote_db_paths,
            config_file: config_file.to_string(),
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(Self::from_toml(toml_config, &path.display().to_string()))
    }

    /// Load configuration - tries the TOML file first, falls back to defaults
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match Self::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: {}. Using defaults.", e);
                Self::default()
            }
        }
    }

    /// Detector thresholds as the value the analysis core consumes
    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig {
            stop_radius_m: self.stop_radius_m,
            min_stop_duration_min: self.min_stop_duration_min,
            max_time_gap_min: self.max_time_gap_min,
        }
    }

    // Getters for all config fields
    pub fn stop_radius_m(&self) -> f64 {
        self.stop_radius_m
    }

    pub fn min_stop_duration_min(&self) -> f64 {
        self.min_stop_duration_min
    }

    pub fn max_time_gap_min(&self) -> f64 {
        self.max_time_gap_min
    }

    pub fn db_table(&self) -> &str {
        &self.db_table
    }

    pub fn timestamp_column(&self) -> &str {
        &self.timestamp_column
    }

    pub fn latitude_column(&self) -> &str {
        &self.latitude_column
    }

    pub fn longitude_column(&self) -> &str {
        &self.longitude_column
    }

    pub fn lookback_days(&self) -> i64 {
        self.lookback_days
    }

    pub fn adb_binary(&self) -> &str {
        &self.adb_binary
    }

    pub fn remote_db_paths(&self) -> &[String] {
        &self.remote_db_paths
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Builder method for tests to set the stop radius
    #[cfg(test)]
    pub fn with_stop_radius_m(mut self, meters: f64) -> Self {
        self.stop_radius_m = meters;
        self
    }

    /// Builder method for tests to set the lookback window
    #[cfg(test)]
    pub fn with_lookback_days(mut self, days: i64) -> Self {
        self.lookback_days = days;
        self
    }
}
