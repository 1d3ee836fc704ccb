//! Domain models - location fixes and detected stops
//!
//! This module contains the canonical data types used throughout the system:
//! - `LocationFix` - one raw GPS observation from the location database
//! - `Stop` - a detected dwell episode
//! - `DeviceId` - serial of an attached device
//! - `geo` - haversine distance and cluster centroid helpers

pub mod geo;
pub mod types;

// Re-export commonly used types at module level
pub use types::{DeviceId, DurationBand, LocationFix, Stop};
