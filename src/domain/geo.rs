//! Geodesic helpers - haversine distance and cluster centroid

use crate::domain::types::LocationFix;

/// Mean Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters between two decimal-degree coordinates.
///
/// Uses the atan2 form of the haversine formula, which stays numerically
/// stable for coincident and near-antipodal points.
pub fn haversine_distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Arithmetic mean of latitudes and longitudes taken independently.
///
/// Not a spherical centroid; at stop scale (tens of meters) the
/// approximation error is negligible. Empty input yields `(0.0, 0.0)`.
pub fn centroid(fixes: &[LocationFix]) -> (f64, f64) {
    if fixes.is_empty() {
        return (0.0, 0.0);
    }

    let n = fixes.len() as f64;
    let lat_sum: f64 = fixes.iter().map(|f| f.latitude).sum();
    let lon_sum: f64 = fixes.iter().map(|f| f.longitude).sum();
    (lat_sum / n, lon_sum / n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn fix_at(lat: f64, lon: f64) -> LocationFix {
        LocationFix::new(Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap(), lat, lon)
    }

    #[test]
    fn test_haversine_same_point_is_zero() {
        assert_eq!(haversine_distance_m(51.5074, -0.1278, 51.5074, -0.1278), 0.0);
    }

    #[test]
    fn test_haversine_known_value() {
        // London to Paris is approximately 344 km
        let dist = haversine_distance_m(51.5074, -0.1278, 48.8566, 2.3522);
        assert!(approx_eq(dist, 343_560.0, 5000.0));
    }

    #[test]
    fn test_haversine_symmetric() {
        let forward = haversine_distance_m(37.7749, -122.4194, 37.4220, -122.0841);
        let backward = haversine_distance_m(37.4220, -122.0841, 37.7749, -122.4194);
        assert!(approx_eq(forward, backward, 1e-9));
    }

    #[test]
    fn test_haversine_short_distance() {
        // One ten-thousandth of a degree of latitude is roughly 11 meters
        let dist = haversine_distance_m(37.7749, -122.4194, 37.7750, -122.4194);
        assert!(approx_eq(dist, 11.1, 0.2));
    }

    #[test]
    fn test_centroid_is_mean() {
        let fixes = vec![fix_at(51.50, -0.10), fix_at(51.52, -0.12)];
        let (lat, lon) = centroid(&fixes);
        assert!(approx_eq(lat, 51.51, 1e-9));
        assert!(approx_eq(lon, -0.11, 1e-9));
    }

    #[test]
    fn test_centroid_single_fix() {
        let fixes = vec![fix_at(37.7749, -122.4194)];
        assert_eq!(centroid(&fixes), (37.7749, -122.4194));
    }

    #[test]
    fn test_centroid_empty_is_origin() {
        assert_eq!(centroid(&[]), (0.0, 0.0));
    }
}
