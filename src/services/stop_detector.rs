//! Stop detection - groups a location history into dwell episodes
//!
//! A stop is a run of fixes that stays within a configured radius of the
//! cluster's running centroid without a time gap longer than the configured
//! maximum. Clusters shorter than the minimum duration are dropped with no
//! trace. A dwell sampled more sparsely than the gap threshold fragments
//! into multiple stops; that loss is accepted.
//!
//! The detector is pure: no I/O, no logging, deterministic for a given
//! input. Callers may run it from any number of threads on disjoint inputs.

use chrono::{DateTime, Utc};

use crate::domain::geo::{centroid, haversine_distance_m};
use crate::domain::types::{LocationFix, Stop};

/// Thresholds governing cluster membership and emission
#[derive(Debug, Clone, Copy)]
pub struct DetectorConfig {
    /// Max distance in meters from the running cluster centroid for a fix
    /// to join the current cluster
    pub stop_radius_m: f64,
    /// Minimum dwell duration in minutes for a cluster to be emitted
    pub min_stop_duration_min: f64,
    /// Max minutes since the cluster's last fix for the next fix to still
    /// count as contiguous
    pub max_time_gap_min: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self { stop_radius_m: 50.0, min_stop_duration_min: 1.0, max_time_gap_min: 30.0 }
    }
}

/// Single-pass streaming clustering of location fixes into stops
pub struct StopDetector {
    config: DetectorConfig,
}

impl StopDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Group fixes into stops with one forward pass.
    ///
    /// Input order does not matter: fixes are sorted by timestamp first
    /// (stable, so equal timestamps keep their relative order). Stops come
    /// back in close order, which equals non-decreasing arrival order.
    pub fn detect(&self, fixes: &[LocationFix]) -> Vec<Stop> {
        if fixes.is_empty() {
            return Vec::new();
        }

        let mut sorted: Vec<LocationFix> = fixes.to_vec();
        sorted.sort_by_key(|f| f.timestamp);

        let mut stops = Vec::new();
        let mut cluster: Vec<LocationFix> = vec![sorted[0]];

        for fix in &sorted[1..] {
            // Gap is measured from the last fix added, not the cluster start
            let last_ts = cluster.last().map(|f| f.timestamp).unwrap_or(fix.timestamp);
            let time_diff_min = minutes_between(last_ts, fix.timestamp);

            // Centroid of the cluster as it stands before this fix joins
            let (center_lat, center_lon) = centroid(&cluster);
            let distance =
                haversine_distance_m(center_lat, center_lon, fix.latitude, fix.longitude);

            if distance <= self.config.stop_radius_m
                && time_diff_min <= self.config.max_time_gap_min
            {
                cluster.push(*fix);
            } else {
                self.close_cluster(&cluster, &mut stops);
                cluster.clear();
                cluster.push(*fix);
            }
        }

        self.close_cluster(&cluster, &mut stops);
        stops
    }

    /// Emit the cluster as a stop if it meets the minimum duration,
    /// otherwise discard it entirely (no merge into neighbors).
    fn close_cluster(&self, cluster: &[LocationFix], stops: &mut Vec<Stop>) {
        let (Some(first), Some(last)) = (cluster.first(), cluster.last()) else {
            return;
        };

        let duration_min = minutes_between(first.timestamp, last.timestamp);
        if duration_min < self.config.min_stop_duration_min {
            return;
        }

        let (center_lat, center_lon) = centroid(cluster);
        stops.push(Stop {
            arrival_time: first.timestamp,
            departure_time: last.timestamp,
            duration_minutes: duration_min as i64,
            latitude: round6(center_lat),
            longitude: round6(center_lon),
            point_count: cluster.len(),
        });
    }
}

/// Elapsed fractional minutes between two timestamps
#[inline]
fn minutes_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 60_000.0
}

/// Round a coordinate to 6 decimal places
#[inline]
fn round6(v: f64) -> f64 {
    (v * 1_000_000.0).round() / 1_000_000.0
}
