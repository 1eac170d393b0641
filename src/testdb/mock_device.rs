//! Mock device implementation for testing without a real phone
//!
//! This module provides a mock implementation of the device traits that
//! simulates a connected Android phone with configurable root state, API
//! level and failure behavior. Every interaction is recorded in a journal
//! so tests can assert the exact command sequence a setup routine issued,
//! and settle waits are recorded instead of slept so scenario runs finish
//! instantly.

use crate::core::error::{Result, SetupError};
use crate::device::traits::{
    BuildInfo, DeviceControl, DeviceInfo, DeviceState, WifiSnippet, BUILD_VERSION_SDK_KEY,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// One recorded device interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandRecord {
    /// A shell command with its full command line
    Shell(String),
    /// A package install with the host-side apk path
    Install(PathBuf),
    /// A Wi-Fi radio state query
    WifiStatusQuery,
    /// A Wi-Fi radio enable call
    WifiEnable,
    /// A Wi-Fi connect attempt
    WifiConnect {
        ssid: String,
        password: Option<String>,
    },
    /// A settle wait (recorded, never slept)
    Settle(Duration),
}

/// Configuration for mock device behavior
#[derive(Debug, Clone)]
pub struct MockDeviceConfig {
    /// Simulate adbd running as root
    pub rooted: bool,
    /// Android SDK level reported in build info (0 = never reported)
    pub sdk_level: u32,
    /// Initial Wi-Fi radio state
    pub wifi_enabled: bool,
    /// Flag names already committed in the phenotype database
    pub preset_flags: Vec<String>,
    /// Drop flag override broadcasts instead of committing them
    pub ignore_flag_broadcasts: bool,
    /// Refuse Wi-Fi connect attempts
    pub fail_wifi_connect: bool,
    /// Reject package installs
    pub fail_install: bool,
    /// Simulate random shell failures (percentage 0-100)
    pub shell_failure_rate: u8,
    /// Output returned for the GMS core version dump
    pub gms_version_output: String,
}

impl Default for MockDeviceConfig {
    fn default() -> Self {
        Self {
            rooted: true,
            sdk_level: 34,
            wifi_enabled: true,
            preset_flags: Vec::new(),
            ignore_flag_broadcasts: false,
            fail_wifi_connect: false,
            fail_install: false,
            shell_failure_rate: 0,
            gms_version_output: "    versionCode=242212000 minSdk=31 targetSdk=34".to_string(),
        }
    }
}

impl MockDeviceConfig {
    /// A phone without adb root (production build)
    pub fn unrooted() -> Self {
        Self {
            rooted: false,
            ..Default::default()
        }
    }

    /// A phone below API 30 (no appops MANAGE_EXTERNAL_STORAGE)
    pub fn legacy_api() -> Self {
        Self {
            sdk_level: 29,
            ..Default::default()
        }
    }

    /// A phone with the bluetooth multiplex flag already committed
    pub fn flag_preset() -> Self {
        Self {
            preset_flags: vec!["mediums_supports_bluetooth_multiplex_socket".to_string()],
            ..Default::default()
        }
    }

    /// A phone whose shell fails at the given percentage rate
    pub fn flaky(rate: u8) -> Self {
        Self {
            shell_failure_rate: rate,
            ..Default::default()
        }
    }

    /// Set the reported SDK level
    pub fn with_sdk(mut self, sdk_level: u32) -> Self {
        self.sdk_level = sdk_level;
        self
    }

    /// Start with the Wi-Fi radio off
    pub fn with_wifi_disabled(mut self) -> Self {
        self.wifi_enabled = false;
        self
    }

    /// Refuse Wi-Fi connect attempts
    pub fn with_connect_failure(mut self) -> Self {
        self.fail_wifi_connect = true;
        self
    }

    /// Reject package installs
    pub fn with_install_failure(mut self) -> Self {
        self.fail_install = true;
        self
    }

    /// Drop flag override broadcasts without committing them
    pub fn with_ignored_flag_broadcasts(mut self) -> Self {
        self.ignore_flag_broadcasts = true;
        self
    }

    /// Set the output of the GMS core version dump
    pub fn with_gms_output(mut self, output: &str) -> Self {
        self.gms_version_output = output.to_string();
        self
    }
}

/// Mutable simulation state behind the journal lock
#[derive(Debug)]
struct MockState {
    journal: Vec<CommandRecord>,
    wifi_enabled: bool,
    committed_flags: HashSet<String>,
    connected_ssid: Option<String>,
}

/// A simulated Android phone implementing the device traits
///
/// All trait methods record into the journal before simulating. The
/// simulation is intentionally shallow: just enough command understanding
/// for the setup routines to observe realistic responses.
pub struct MockDevice {
    serial: String,
    config: MockDeviceConfig,
    build_info: BuildInfo,
    state: Mutex<MockState>,
}

impl MockDevice {
    /// Create a mock phone with the given serial and behavior
    pub fn new(serial: &str, config: MockDeviceConfig) -> Self {
        let mut build_info = BuildInfo::new();
        if config.sdk_level > 0 {
            build_info.insert(BUILD_VERSION_SDK_KEY, &config.sdk_level.to_string());
        }
        build_info.insert("build_id", "UQ1A.240205.004");
        build_info.insert("build_type", if config.rooted { "userdebug" } else { "user" });
        build_info.insert("build_product", "raven");
        build_info.insert("hardware", "raven");

        let committed_flags = config.preset_flags.iter().cloned().collect();
        let wifi_enabled = config.wifi_enabled;

        Self {
            serial: serial.to_string(),
            config,
            build_info,
            state: Mutex::new(MockState {
                journal: Vec::new(),
                wifi_enabled,
                committed_flags,
                connected_ssid: None,
            }),
        }
    }

    /// The journal stays readable even after a panicking test poisons the lock
    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Everything recorded so far, in call order
    pub fn journal(&self) -> Vec<CommandRecord> {
        self.state().journal.clone()
    }

    /// Just the shell command lines, in call order
    pub fn shell_commands(&self) -> Vec<String> {
        self.state()
            .journal
            .iter()
            .filter_map(|record| match record {
                CommandRecord::Shell(command) => Some(command.clone()),
                _ => None,
            })
            .collect()
    }

    /// Just the settle waits, in call order
    pub fn settle_requests(&self) -> Vec<Duration> {
        self.state()
            .journal
            .iter()
            .filter_map(|record| match record {
                CommandRecord::Settle(wait) => Some(*wait),
                _ => None,
            })
            .collect()
    }

    /// Number of shell commands recorded
    pub fn shell_count(&self) -> usize {
        self.shell_commands().len()
    }

    /// Forget everything recorded so far
    pub fn clear_journal(&self) {
        self.state().journal.clear();
    }

    /// The network the phone is currently connected to, if any
    pub fn connected_ssid(&self) -> Option<String> {
        self.state().connected_ssid.clone()
    }

    /// Current simulated radio state
    pub fn radio_enabled(&self) -> bool {
        self.state().wifi_enabled
    }

    /// Check whether a flag override has been committed
    pub fn flag_committed(&self, flag: &str) -> bool {
        self.state().committed_flags.contains(flag)
    }

    /// Device info as it would appear in a device listing
    pub fn device_info(&self) -> DeviceInfo {
        DeviceInfo::new(
            &self.serial,
            DeviceState::Device,
            "raven",
            "Mock_Pixel",
            "raven",
        )
    }

    /// Produce the simulated output for a shell command
    fn respond(&self, state: &mut MockState, command: &str) -> Vec<u8> {
        if command == "id" {
            let id_line = if self.config.rooted {
                "uid=0(root) gid=0(root) groups=0(root) context=u:r:su:s0"
            } else {
                "uid=2000(shell) gid=2000(shell) groups=2000(shell)"
            };
            return id_line.as_bytes().to_vec();
        }

        if command.starts_with("sqlite3") && command.contains("FlagOverrides") {
            let mut rows = String::new();
            for flag in &state.committed_flags {
                rows.push_str(flag);
                rows.push_str("|1\n");
            }
            return rows.into_bytes();
        }

        if command.contains("dumpsys package com.google.android.gms") {
            return self.config.gms_version_output.clone().into_bytes();
        }

        if command.starts_with("am broadcast") && command.contains("FLAG_OVERRIDE") {
            if !self.config.ignore_flag_broadcasts {
                for flag in extract_broadcast_flags(command) {
                    state.committed_flags.insert(flag);
                }
            }
            return b"Broadcast completed: result=0".to_vec();
        }

        Vec::new()
    }
}

impl DeviceControl for MockDevice {
    fn serial(&self) -> &str {
        &self.serial
    }

    fn is_adb_root(&self) -> bool {
        self.config.rooted
    }

    fn build_info(&self) -> &BuildInfo {
        &self.build_info
    }

    fn shell(&self, command: &str) -> Result<Vec<u8>> {
        let mut state = self.state();
        state.journal.push(CommandRecord::Shell(command.to_string()));

        // Check random failure
        if self.config.shell_failure_rate > 0 {
            let roll = rand::random::<u8>() % 100;
            if roll < self.config.shell_failure_rate {
                return Err(SetupError::ShellError {
                    serial: self.serial.clone(),
                    message: "Random simulated failure".to_string(),
                });
            }
        }

        Ok(self.respond(&mut state, command))
    }

    fn install_package(&self, apk_path: &Path) -> Result<()> {
        self.state()
            .journal
            .push(CommandRecord::Install(apk_path.to_path_buf()));

        if self.config.fail_install {
            return Err(SetupError::InstallError {
                apk: apk_path.display().to_string(),
                message: "Failure [INSTALL_FAILED_VERIFICATION_FAILURE]".to_string(),
            });
        }
        Ok(())
    }

    fn settle(&self, wait: Duration) {
        self.state().journal.push(CommandRecord::Settle(wait));
    }
}

impl WifiSnippet for MockDevice {
    fn wifi_is_enabled(&self) -> Result<bool> {
        let mut state = self.state();
        state.journal.push(CommandRecord::WifiStatusQuery);
        Ok(state.wifi_enabled)
    }

    fn wifi_enable(&self) -> Result<()> {
        let mut state = self.state();
        state.journal.push(CommandRecord::WifiEnable);
        state.wifi_enabled = true;
        Ok(())
    }

    fn wifi_connect(&self, ssid: &str, password: Option<&str>) -> Result<()> {
        let mut state = self.state();
        state.journal.push(CommandRecord::WifiConnect {
            ssid: ssid.to_string(),
            password: password.map(str::to_string),
        });

        if self.config.fail_wifi_connect {
            return Err(SetupError::WifiConnectError {
                serial: self.serial.clone(),
                message: format!("Association to \"{}\" rejected", ssid),
            });
        }
        state.connected_ssid = Some(ssid.to_string());
        Ok(())
    }
}

/// Pull the flag names out of a phenotype override broadcast
fn extract_broadcast_flags(command: &str) -> Vec<String> {
    let Some(rest) = command.split("--esa flags \"").nth(1) else {
        return Vec::new();
    };
    let Some(flags) = rest.split('"').next() else {
        return Vec::new();
    };
    flags.split(',').map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_reports_root_state() {
        let rooted = MockDevice::new("mock-a", MockDeviceConfig::default());
        assert!(rooted.is_adb_root());
        assert!(rooted.shell_utf8("id").unwrap().contains("uid=0(root)"));

        let unrooted = MockDevice::new("mock-b", MockDeviceConfig::unrooted());
        assert!(!unrooted.is_adb_root());
        assert!(unrooted.shell_utf8("id").unwrap().contains("uid=2000(shell)"));
    }

    #[test]
    fn test_mock_reports_sdk_level() {
        let modern = MockDevice::new("mock-a", MockDeviceConfig::default());
        assert_eq!(modern.build_info().version_sdk(), 34);

        let legacy = MockDevice::new("mock-b", MockDeviceConfig::legacy_api());
        assert_eq!(legacy.build_info().version_sdk(), 29);

        let unreported = MockDevice::new("mock-c", MockDeviceConfig::default().with_sdk(0));
        assert_eq!(unreported.build_info().version_sdk(), 0);
    }

    #[test]
    fn test_journal_records_in_call_order() {
        let device = MockDevice::new("mock-j", MockDeviceConfig::default());

        device.shell("setprop log.tag.Nearby VERBOSE").unwrap();
        device.settle(Duration::from_secs(2));
        device.shell("id").unwrap();

        assert_eq!(
            device.journal(),
            vec![
                CommandRecord::Shell("setprop log.tag.Nearby VERBOSE".to_string()),
                CommandRecord::Settle(Duration::from_secs(2)),
                CommandRecord::Shell("id".to_string()),
            ]
        );
        assert_eq!(device.shell_count(), 2);

        device.clear_journal();
        assert!(device.journal().is_empty());
    }

    #[test]
    fn test_flag_query_reflects_committed_overrides() {
        let device = MockDevice::new("mock-f", MockDeviceConfig::flag_preset());

        let out = device
            .shell_utf8("sqlite3 /data/data/com.google.android.gms/databases/phenotype.db \"select name from FlagOverrides where committed=1;\"")
            .unwrap();

        assert!(out.contains("mediums_supports_bluetooth_multiplex_socket|1"));
    }

    #[test]
    fn test_flag_broadcast_commits_override() {
        let device = MockDevice::new("mock-f", MockDeviceConfig::default());
        assert!(!device.flag_committed("mediums_supports_bluetooth_multiplex_socket"));

        device
            .shell(
                "am broadcast -a \"com.google.android.gms.phenotype.FLAG_OVERRIDE\" \
                 --esa flags \"mediums_supports_bluetooth_multiplex_socket\" \
                 --esa values \"true\" com.google.android.gms",
            )
            .unwrap();

        assert!(device.flag_committed("mediums_supports_bluetooth_multiplex_socket"));
    }

    #[test]
    fn test_flag_broadcast_can_be_ignored() {
        let config = MockDeviceConfig::default().with_ignored_flag_broadcasts();
        let device = MockDevice::new("mock-f", config);

        device
            .shell("am broadcast -a \"com.google.android.gms.phenotype.FLAG_OVERRIDE\" --esa flags \"some_flag\"")
            .unwrap();

        assert!(!device.flag_committed("some_flag"));
    }

    #[test]
    fn test_wifi_simulation_tracks_radio_and_connection() {
        let config = MockDeviceConfig::default().with_wifi_disabled();
        let device = MockDevice::new("mock-w", config);

        assert!(!device.wifi_is_enabled().unwrap());
        device.wifi_enable().unwrap();
        assert!(device.radio_enabled());

        device.wifi_connect("GoogleGuest", None).unwrap();
        assert_eq!(device.connected_ssid(), Some("GoogleGuest".to_string()));
    }

    #[test]
    fn test_wifi_connect_failure_leaves_no_connection() {
        let config = MockDeviceConfig::default().with_connect_failure();
        let device = MockDevice::new("mock-w", config);

        let result = device.wifi_connect("GoogleGuest", Some("pw"));

        assert!(matches!(result, Err(SetupError::WifiConnectError { .. })));
        assert_eq!(device.connected_ssid(), None);
    }

    #[test]
    fn test_always_flaky_shell_fails_every_command() {
        let device = MockDevice::new("mock-x", MockDeviceConfig::flaky(100));

        let result = device.shell("id");

        assert!(matches!(result, Err(SetupError::ShellError { .. })));
        // The failed command is still journaled
        assert_eq!(device.shell_count(), 1);
    }

    #[test]
    fn test_install_failure_simulation() {
        let device = MockDevice::new("mock-i", MockDeviceConfig::default().with_install_failure());

        let result = device.install_package(Path::new("/tmp/app.apk"));

        assert!(matches!(result, Err(SetupError::InstallError { .. })));
        assert_eq!(
            device.journal(),
            vec![CommandRecord::Install(PathBuf::from("/tmp/app.apk"))]
        );
    }

    #[test]
    fn test_broadcast_flag_extraction() {
        let flags = extract_broadcast_flags(
            "am broadcast --esa flags \"flag_one,flag_two\" --esa types \"boolean,boolean\"",
        );
        assert_eq!(flags, vec!["flag_one", "flag_two"]);

        assert!(extract_broadcast_flags("am broadcast -a SOMETHING").is_empty());
    }

    #[test]
    fn test_device_info_is_usable() {
        let device = MockDevice::new("mock-d", MockDeviceConfig::default());
        let info = device.device_info();

        assert_eq!(info.serial, "mock-d");
        assert!(info.is_usable());
        assert!(info.describe().contains("Mock Pixel"));
    }
}
