//! Services - the analysis core
//!
//! This module contains the algorithmic heart of the tool:
//! - `stop_detector` - Single-pass clustering of fixes into dwell stops

pub mod stop_detector;

// Re-export commonly used types
pub use stop_detector::{DetectorConfig, StopDetector};
