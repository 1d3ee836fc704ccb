//! ADB bridge - device discovery and database pull over the debug bridge
//!
//! Wraps the `adb` command-line tool. The Google Play Services database
//! paths usually require a rooted device; a candidate path that fails with
//! a permission or not-found error falls through to the next one.

use anyhow::{anyhow, bail, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

use crate::domain::types::DeviceId;
use crate::infra::Config;

/// Capability interface for pulling location databases off a device.
///
/// The pipeline is written against this trait so a fake repository can
/// stand in for a real device during tests.
pub trait DeviceRepository {
    /// Serials of all connected devices in the `device` state
    fn list_devices(&self) -> Result<Vec<DeviceId>>;

    /// Pull the first reachable candidate database into `dest_dir` and
    /// return its local path
    fn pull_database(&self, device: &DeviceId, dest_dir: &Path) -> Result<PathBuf>;
}

/// Device repository backed by the `adb` binary
pub struct AdbBridge {
    binary: String,
    remote_db_paths: Vec<String>,
}

struct AdbOutput {
    stdout: String,
    stderr: String,
    success: bool,
}

impl AdbBridge {
    pub fn new(config: &Config) -> Self {
        Self {
            binary: config.adb_binary().to_string(),
            remote_db_paths: config.remote_db_paths().to_vec(),
        }
    }

    /// Run one adb invocation, capturing stdout and stderr
    fn run(&self, args: &[&str]) -> Result<AdbOutput> {
        let output = Command::new(&self.binary).args(args).output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                anyhow!("adb not found; ensure it is installed and on your PATH")
            } else {
                anyhow!("failed to run adb {}: {}", args.join(" "), e)
            }
        })?;

        Ok(AdbOutput {
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            success: output.status.success(),
        })
    }
}

impl DeviceRepository for AdbBridge {
    fn list_devices(&self) -> Result<Vec<DeviceId>> {
        debug!("adb_listing_devices");
        let out = self.run(&["devices"])?;
        if !out.success {
            bail!("adb devices failed: {}", out.stderr);
        }

        let devices = parse_devices_output(&out.stdout);
        info!(count = devices.len(), "adb_devices_listed");
        Ok(devices)
    }

    fn pull_database(&self, device: &DeviceId, dest_dir: &Path) -> Result<PathBuf> {
        for remote_path in &self.remote_db_paths {
            let file_name = remote_path.rsplit('/').next().unwrap_or("locations.db");
            let local_path = dest_dir.join(file_name);
            let local_str = local_path.to_string_lossy().to_string();

            info!(device = %device, remote = %remote_path, "adb_pull_attempt");
            let out = self.run(&["-s", device.0.as_str(), "pull", remote_path, &local_str])?;

            if is_retryable_pull_error(&out.stderr) {
                warn!(
                    remote = %remote_path,
                    stderr = %out.stderr,
                    "adb_pull_candidate_unreachable"
                );
                remove_partial(&local_path);
                continue;
            }

            if !out.success || !out.stderr.is_empty() {
                warn!(remote = %remote_path, stderr = %out.stderr, "adb_pull_failed");
                remove_partial(&local_path);
                continue;
            }

            if out.stdout.contains("pulled") {
                info!(device = %device, local = %local_path.display(), "adb_pull_ok");
                return Ok(local_path);
            }

            remove_partial(&local_path);
        }

        bail!(
            "failed to pull a location database from device '{}' using any known path; \
             unrooted devices typically deny access, consider --db-path with a local copy",
            device
        )
    }
}

/// Parse `adb devices` output into serials.
///
/// The first line is the "List of devices attached" header; each following
/// row is `<serial>\t<state>` and only the `device` state counts as usable.
fn parse_devices_output(stdout: &str) -> Vec<DeviceId> {
    stdout
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut cols = line.split('\t');
            let serial = cols.next()?.trim();
            match cols.next()?.trim() {
                "device" if !serial.is_empty() => Some(DeviceId(serial.to_string())),
                _ => None,
            }
        })
        .collect()
}

/// stderr patterns that mean "this candidate path is unreachable, try the
/// next one" rather than a hard adb failure
fn is_retryable_pull_error(stderr: &str) -> bool {
    stderr.contains("Permission denied")
        || stderr.contains("failed to stat")
        || stderr.contains("No such file or directory")
}

/// Remove a partially pulled local file, if any
fn remove_partial(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            warn!(path = %path.display(), error = %e, "partial_pull_cleanup_failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_devices_output_typical() {
        let stdout = "List of devices attached\nemulator-5554\tdevice\nRF8M123ABC\tdevice";
        let devices = parse_devices_output(stdout);
        assert_eq!(
            devices,
            vec![
                DeviceId("emulator-5554".to_string()),
                DeviceId("RF8M123ABC".to_string())
            ]
        );
    }

    #[test]
    fn test_parse_devices_output_skips_non_device_states() {
        let stdout =
            "List of devices attached\nemulator-5554\toffline\nRF8M123ABC\tunauthorized\nserial1\tdevice";
        let devices = parse_devices_output(stdout);
        assert_eq!(devices, vec![DeviceId("serial1".to_string())]);
    }

    #[test]
    fn test_parse_devices_output_empty() {
        assert!(parse_devices_output("List of devices attached").is_empty());
        assert!(parse_devices_output("").is_empty());
    }

    #[test]
    fn test_retryable_pull_errors() {
        assert!(is_retryable_pull_error(
            "adb: error: failed to stat remote object '/data/data/x': Permission denied"
        ));
        assert!(is_retryable_pull_error("remote object does not exist: No such file or directory"));
        assert!(is_retryable_pull_error("failed to stat remote object"));
        assert!(!is_retryable_pull_error("error: device offline"));
        assert!(!is_retryable_pull_error(""));
    }
}
