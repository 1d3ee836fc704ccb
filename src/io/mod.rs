//! IO modules - external system interfaces
//!
//! This module contains all external IO operations:
//! - `adb` - Debug-bridge device discovery and database pull
//! - `db` - SQLite extraction of raw location fixes
//! - `report` - Artifact rendering (timeline CSV, map, audit log, hashes)

pub mod adb;
pub mod db;
pub mod report;

// Re-export commonly used types
pub use adb::{AdbBridge, DeviceRepository};
pub use report::ReportPaths;
