//! Audit trail - ordered record of every action taken during a run
//!
//! Collaborators record entries into an injected `AuditLog` instead of a
//! global accumulator; the rendered log becomes one of the run's artifacts
//! (action_log.txt). Entries are mirrored to the structured log as they
//! arrive.

use chrono::Utc;
use tracing::info;

const BANNER_WIDTH: usize = 70;

/// Accumulates timestamped audit entries in arrival order
#[derive(Debug)]
pub struct AuditLog {
    entries: Vec<String>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Append a timestamped entry and mirror it to the structured log
    pub fn record(&mut self, message: impl AsRef<str>) {
        let message = message.as_ref();
        let stamp = Utc::now().format("%Y-%m-%d %H:%M:%S%.3f");
        self.entries.push(format!("[{}] {}", stamp, message));
        info!("{}", message);
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the full log body written to action_log.txt
    pub fn render(&self) -> String {
        let banner = "=".repeat(BANNER_WIDTH);
        let now = Utc::now().format("%Y-%m-%d %H:%M:%S");

        let mut out = String::new();
        out.push_str("Location Timeline Extractor - Detailed Action Log\n");
        out.push_str(&banner);
        out.push('\n');
        out.push_str(&format!("Generated at: {}\n", now));
        out.push_str(&banner);
        out.push_str("\n\n");

        for entry in &self.entries {
            out.push_str(entry);
            out.push('\n');
        }

        out.push_str(&format!("\n[{}] Action log completed.\n", now));
        out
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_appends_timestamped_entry() {
        let mut audit = AuditLog::new();
        assert!(audit.is_empty());

        audit.record("Extractor started");
        audit.record("Output directory ensured");

        assert_eq!(audit.entries().len(), 2);
        assert!(audit.entries()[0].starts_with('['));
        assert!(audit.entries()[0].ends_with("Extractor started"));
        assert!(audit.entries()[1].ends_with("Output directory ensured"));
    }

    #[test]
    fn test_entry_timestamp_format() {
        let mut audit = AuditLog::new();
        audit.record("check format");

        // "[YYYY-MM-DD HH:MM:SS.mmm] message"
        let entry = &audit.entries()[0];
        let close = entry.find(']').unwrap();
        let stamp = &entry[1..close];
        assert_eq!(stamp.len(), "2024-03-04 08:00:00.000".len());
        assert_eq!(&stamp[4..5], "-");
        assert_eq!(&stamp[10..11], " ");
        assert_eq!(&stamp[19..20], ".");
    }

    #[test]
    fn test_render_contains_header_and_entries() {
        let mut audit = AuditLog::new();
        audit.record("first action");
        audit.record("second action");

        let body = audit.render();

        assert!(body.starts_with("Location Timeline Extractor - Detailed Action Log"));
        assert!(body.contains("Generated at: "));
        assert!(body.contains("first action"));
        assert!(body.contains("second action"));
        assert!(body.trim_end().ends_with("Action log completed."));
    }

    #[test]
    fn test_render_empty_log() {
        let audit = AuditLog::new();
        let body = audit.render();
        assert!(body.contains("Generated at: "));
        assert!(body.contains("Action log completed."));
    }
}
