//! Provisioning report module
//!
//! Records the outcome of each setup step of a provision pass and writes
//! the result as a JSON file. Reports are append-only snapshots: one file
//! per pass, named after the device serial and the start time.

use crate::core::error::{Result, SetupError};
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Outcome of a single setup step
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StepOutcome {
    /// The step ran to completion
    Completed,
    /// The step was skipped (unmet precondition, not an error)
    Skipped,
    /// The step failed
    Failed,
}

impl std::fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepOutcome::Completed => write!(f, "completed"),
            StepOutcome::Skipped => write!(f, "skipped"),
            StepOutcome::Failed => write!(f, "failed"),
        }
    }
}

/// Record of a single setup step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    /// Step name (e.g. "set_country_code")
    pub name: String,

    /// How the step ended
    pub outcome: StepOutcome,

    /// Extra detail: skip reason or error message
    #[serde(default)]
    pub detail: Option<String>,

    /// Wall-clock duration of the step in milliseconds
    pub duration_ms: u64,
}

/// Report of one provision pass over a single device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionReport {
    /// Version of the report file format
    pub version: u32,

    /// Serial of the provisioned device
    pub serial: String,

    /// Pass start time
    pub started_at: DateTime<Utc>,

    /// Pass end time (set by finish)
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,

    /// Steps in execution order
    #[serde(default)]
    pub steps: Vec<StepRecord>,

    /// Collected device properties (e.g. the GMS core version)
    #[serde(default)]
    pub properties: HashMap<String, String>,

    /// Whether every step that ran completed or was skipped
    pub completed: bool,
}

impl ProvisionReport {
    /// Create a new report for a device
    pub fn new(serial: &str) -> Self {
        Self {
            version: 1,
            serial: serial.to_string(),
            started_at: Utc::now(),
            finished_at: None,
            steps: Vec::new(),
            properties: HashMap::new(),
            completed: false,
        }
    }

    /// Record the outcome of one step
    pub fn record_step(
        &mut self,
        name: &str,
        outcome: StepOutcome,
        detail: Option<String>,
        duration: Duration,
    ) {
        self.steps.push(StepRecord {
            name: name.to_string(),
            outcome,
            detail,
            duration_ms: duration.as_millis() as u64,
        });
    }

    /// Merge collected device properties into the report
    pub fn add_properties(&mut self, properties: HashMap<String, String>) {
        self.properties.extend(properties);
    }

    /// Mark the pass as finished
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
        self.completed = !self.steps.iter().any(|s| s.outcome == StepOutcome::Failed);
    }

    /// Number of steps that completed
    pub fn completed_steps(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.outcome == StepOutcome::Completed)
            .count()
    }

    /// Number of steps that were skipped
    pub fn skipped_steps(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.outcome == StepOutcome::Skipped)
            .count()
    }

    /// Number of steps that failed
    pub fn failed_steps(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.outcome == StepOutcome::Failed)
            .count()
    }

    /// Write the report as pretty-printed JSON into `dir`.
    ///
    /// Creates the directory if needed. Returns the path of the written file.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir).map_err(|e| {
            SetupError::IoError(format!("Failed to create report directory: {}", e))
        })?;

        let filename = format!(
            "provision_{}_{}.json",
            filename_safe(&self.serial),
            self.started_at.format("%Y%m%d_%H%M%S")
        );
        let path = dir.join(filename);

        let file = File::create(&path)
            .map_err(|e| SetupError::IoError(format!("Failed to create report file: {}", e)))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| SetupError::IoError(format!("Failed to write report file: {}", e)))?;

        debug!("Saved provisioning report to: {}", path.display());

        Ok(path)
    }

    /// Load a report from a JSON file
    ///
    /// Reserved for future use - allows inspecting past passes.
    #[allow(dead_code)]
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| SetupError::IoError(format!("Failed to open report file: {}", e)))?;
        let reader = BufReader::new(file);
        let report: ProvisionReport = serde_json::from_reader(reader)
            .map_err(|e| SetupError::IoError(format!("Failed to parse report file: {}", e)))?;

        Ok(report)
    }
}

/// Make a serial safe to embed in a filename.
///
/// TCP-connected devices carry serials like `192.168.1.44:5555`, and `:` is
/// not a legal filename character on Windows. The report itself keeps the
/// raw serial; only the filename is rewritten.
fn filename_safe(serial: &str) -> String {
    serial
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_report_new() {
        let report = ProvisionReport::new("17301JEC201234");
        assert_eq!(report.version, 1);
        assert_eq!(report.serial, "17301JEC201234");
        assert!(report.finished_at.is_none());
        assert!(report.steps.is_empty());
        assert!(report.properties.is_empty());
        assert!(!report.completed);
    }

    #[test]
    fn test_record_steps_and_counts() {
        let mut report = ProvisionReport::new("test-serial");
        report.record_step(
            "set_country_code",
            StepOutcome::Skipped,
            Some("device is not rooted".to_string()),
            Duration::from_millis(5),
        );
        report.record_step(
            "enable_verbose_logs",
            StepOutcome::Completed,
            None,
            Duration::from_millis(120),
        );
        report.record_step(
            "connect_wifi",
            StepOutcome::Failed,
            Some("association rejected".to_string()),
            Duration::from_millis(3000),
        );

        assert_eq!(report.completed_steps(), 1);
        assert_eq!(report.skipped_steps(), 1);
        assert_eq!(report.failed_steps(), 1);
        assert_eq!(report.steps[2].duration_ms, 3000);
    }

    #[test]
    fn test_finish_marks_completed() {
        let mut report = ProvisionReport::new("test-serial");
        report.record_step(
            "enable_verbose_logs",
            StepOutcome::Completed,
            None,
            Duration::from_millis(50),
        );
        report.record_step(
            "set_country_code",
            StepOutcome::Skipped,
            Some("device is not rooted".to_string()),
            Duration::from_millis(1),
        );
        report.finish();

        // Skipped steps do not count against completion
        assert!(report.completed);
        assert!(report.finished_at.is_some());
    }

    #[test]
    fn test_finish_with_failure() {
        let mut report = ProvisionReport::new("test-serial");
        report.record_step(
            "install_apk",
            StepOutcome::Failed,
            Some("INSTALL_FAILED_VERIFICATION_FAILURE".to_string()),
            Duration::from_millis(800),
        );
        report.finish();

        assert!(!report.completed);
    }

    #[test]
    fn test_add_properties() {
        let mut report = ProvisionReport::new("test-serial");
        let mut props = HashMap::new();
        props.insert(
            "GMS core version on test-serial".to_string(),
            "    versionCode=242212000".to_string(),
        );
        report.add_properties(props);

        assert_eq!(report.properties.len(), 1);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();

        let mut report = ProvisionReport::new("28161FDH3000EP");
        report.record_step(
            "enable_verbose_logs",
            StepOutcome::Completed,
            None,
            Duration::from_millis(40),
        );
        report.finish();

        let path = report.save(temp_dir.path()).unwrap();
        assert!(path.exists());
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("provision_28161FDH3000EP_"));
        assert!(name.ends_with(".json"));

        let loaded = ProvisionReport::load(&path).unwrap();
        assert_eq!(loaded.serial, "28161FDH3000EP");
        assert_eq!(loaded.steps.len(), 1);
        assert!(loaded.completed);
    }

    #[test]
    fn test_save_with_tcp_serial() {
        let temp_dir = TempDir::new().unwrap();

        let report = ProvisionReport::new("192.168.1.44:5555");
        let path = report.save(temp_dir.path()).unwrap();

        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(!name.contains(':'));
        assert!(name.starts_with("provision_192.168.1.44-5555_"));

        // Only the filename is rewritten, the report keeps the raw serial
        let loaded = ProvisionReport::load(&path).unwrap();
        assert_eq!(loaded.serial, "192.168.1.44:5555");
    }

    #[test]
    fn test_save_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("reports").join("nightly");

        let report = ProvisionReport::new("emulator-5554");
        let path = report.save(&nested).unwrap();

        assert!(nested.is_dir());
        assert!(path.exists());
    }

    #[test]
    fn test_load_corrupted_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("report.json");
        let mut file = File::create(&path).unwrap();
        file.write_all(b"{ not json }").unwrap();

        assert!(ProvisionReport::load(&path).is_err());
    }

    #[test]
    fn test_step_outcome_serializes_lowercase() {
        let json = serde_json::to_string(&StepOutcome::Skipped).unwrap();
        assert_eq!(json, "\"skipped\"");
    }
}
