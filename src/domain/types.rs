//! Shared types for the location timeline extractor

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Newtype wrapper for device serials to provide type safety
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct DeviceId(pub String);

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One raw GPS observation pulled from the location database.
///
/// Coordinates are WGS-84 decimal degrees. Values are taken as-is from the
/// source; range validation is not performed here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationFix {
    pub timestamp: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
}

impl LocationFix {
    #[inline]
    pub fn new(timestamp: DateTime<Utc>, latitude: f64, longitude: f64) -> Self {
        Self { timestamp, latitude, longitude }
    }
}

/// A detected dwell episode derived from one or more temporally and
/// spatially contiguous fixes.
///
/// `arrival_time` and `departure_time` are the timestamps of the first and
/// last fix assigned to the stop, `duration_minutes` is truncated whole
/// minutes between them, and the coordinate is the cluster centroid rounded
/// to 6 decimal places. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stop {
    pub arrival_time: DateTime<Utc>,
    pub departure_time: DateTime<Utc>,
    pub duration_minutes: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub point_count: usize,
}

impl Stop {
    /// Duration band used for map marker coloring
    pub fn duration_band(&self) -> DurationBand {
        if self.duration_minutes < 30 {
            DurationBand::Short
        } else if self.duration_minutes < 120 {
            DurationBand::Medium
        } else {
            DurationBand::Long
        }
    }
}

/// Three-tier banding of a stop's duration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationBand {
    Short,
    Medium,
    Long,
}

impl DurationBand {
    pub fn as_str(&self) -> &str {
        match self {
            DurationBand::Short => "short",
            DurationBand::Medium => "medium",
            DurationBand::Long => "long",
        }
    }

    /// Marker color on the generated map
    pub fn marker_color(&self) -> &'static str {
        match self {
            DurationBand::Short => "green",
            DurationBand::Medium => "orange",
            DurationBand::Long => "red",
        }
    }
}
