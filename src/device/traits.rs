//! Device abstraction traits for testability
//!
//! This module defines traits that abstract device operations, allowing both
//! real devices (Android phones reached through adb) and mock devices to be
//! used interchangeably. This enables comprehensive testing of the setup
//! pipeline without connecting a real phone.
//!
//! # Architecture
//!
//! The trait hierarchy is:
//! - `DeviceControl` - Shell access, package install, root state and build info
//! - `WifiSnippet` - The Wi-Fi RPC surface (enable / status / connect)
//! - `DeviceInfo` - Common device information structure (shared, not a trait)
//! - `DeviceState` - Enum identifying the adb connection state of a device
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use device_setup_tool::device::traits::DeviceControl;
//!
//! fn show_root_state<D: DeviceControl>(device: &D) -> Result<(), String> {
//!     let id_line = device.shell_utf8("id").map_err(|e| e.to_string())?;
//!     println!("{} root={} -> {}", device.serial(), device.is_adb_root(), id_line);
//!     Ok(())
//! }
//! ```

use crate::core::error::Result;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{self, Display};
use std::path::Path;
use std::time::Duration;

/// Build-info key holding the Android SDK level
pub const BUILD_VERSION_SDK_KEY: &str = "build_version_sdk";

/// Represents the adb connection state of a device
///
/// This enum mirrors the state column of `adb devices -l`. Only devices in
/// the `Device` state accept shell commands and installs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DeviceState {
    /// Fully connected and authorized
    Device,
    /// Attached but the adb daemon cannot talk to it
    Offline,
    /// USB debugging not authorized on the phone yet
    Unauthorized,
    /// Any other state adb may report (recovery, sideload, ...)
    #[default]
    Unknown,
}

impl DeviceState {
    /// Parse the state column of `adb devices -l` output
    pub fn parse(state: &str) -> Self {
        match state {
            "device" => DeviceState::Device,
            "offline" => DeviceState::Offline,
            "unauthorized" => DeviceState::Unauthorized,
            _ => DeviceState::Unknown,
        }
    }

    /// Check if the device can accept shell commands
    pub fn is_usable(&self) -> bool {
        matches!(self, DeviceState::Device)
    }

    /// Check if the device is waiting for USB debugging authorization
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, DeviceState::Unauthorized)
    }

    /// Get a human-readable name for this state
    pub fn display_name(&self) -> &'static str {
        match self {
            DeviceState::Device => "device",
            DeviceState::Offline => "offline",
            DeviceState::Unauthorized => "unauthorized",
            DeviceState::Unknown => "unknown",
        }
    }
}

impl Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Common device information shared between real and mock devices
///
/// Populated from one line of `adb devices -l`, e.g.
/// `17301JEC201234  device usb:1-2 product:raven model:Pixel_6_Pro device:raven`
#[derive(Debug, Clone, Default)]
pub struct DeviceInfo {
    /// adb serial number (also accepts ip:port for TCP devices)
    pub serial: String,
    /// Connection state reported by adb
    pub state: DeviceState,
    /// Build product name (e.g. "raven")
    pub product: String,
    /// Marketing model name (e.g. "Pixel_6_Pro")
    pub model: String,
    /// Hardware device name (e.g. "raven")
    pub device: String,
}

impl DeviceInfo {
    /// Create a new DeviceInfo
    pub fn new(serial: &str, state: DeviceState, product: &str, model: &str, device: &str) -> Self {
        Self {
            serial: serial.to_string(),
            state,
            product: product.to_string(),
            model: model.to_string(),
            device: device.to_string(),
        }
    }

    /// Check if this device can accept setup commands
    pub fn is_usable(&self) -> bool {
        self.state.is_usable()
    }

    /// One-line description for device listings
    pub fn describe(&self) -> String {
        if self.model.is_empty() {
            format!("{} ({})", self.serial, self.state)
        } else {
            format!(
                "{} ({}) - {}",
                self.serial,
                self.state,
                self.model.replace('_', " ")
            )
        }
    }
}

/// String-keyed build metadata collected from a device
///
/// The key set follows the `ro.build.*` properties; the one key the setup
/// pipeline depends on is [`BUILD_VERSION_SDK_KEY`].
#[derive(Debug, Clone, Default)]
pub struct BuildInfo {
    properties: HashMap<String, String>,
}

impl BuildInfo {
    /// Create an empty build info map
    pub fn new() -> Self {
        Self {
            properties: HashMap::new(),
        }
    }

    /// Insert a property value
    pub fn insert(&mut self, key: &str, value: &str) {
        self.properties
            .insert(key.to_string(), value.trim().to_string());
    }

    /// Look up a property value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// The Android SDK level of the device
    ///
    /// A missing or unparseable value is treated as 0, which downstream
    /// callers handle as "older than any gated feature".
    pub fn version_sdk(&self) -> u32 {
        self.get(BUILD_VERSION_SDK_KEY)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    /// Number of collected properties
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Check if no properties were collected
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Iterate over all properties (sorted order is up to the caller)
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for BuildInfo {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            properties: iter.into_iter().collect(),
        }
    }
}

/// Trait for controlling a single Android device
///
/// This trait abstracts the operations the setup pipeline needs: running
/// shell commands, installing packages, reading root state and build info,
/// and waiting for device-side changes to settle. Both the real adb-backed
/// device and mock devices implement this trait.
pub trait DeviceControl: Send + Sync {
    /// The adb serial of this device
    fn serial(&self) -> &str;

    /// Whether adbd runs as root on this device
    fn is_adb_root(&self) -> bool;

    /// Build metadata collected when the device was opened
    fn build_info(&self) -> &BuildInfo;

    /// Run a shell command on the device and return its raw output
    ///
    /// # Arguments
    /// * `command` - The full command line, passed to the device shell as-is
    fn shell(&self, command: &str) -> Result<Vec<u8>>;

    /// Install an apk with replace, grant-permissions and allow-test flags
    ///
    /// # Arguments
    /// * `apk_path` - Host-side path of the package to install
    fn install_package(&self, apk_path: &Path) -> Result<()>;

    /// Block until a device-side change has settled
    ///
    /// The default implementation sleeps on the calling thread. Mock devices
    /// override this to record the request instead of blocking.
    fn settle(&self, wait: Duration) {
        std::thread::sleep(wait);
    }

    /// Run a shell command and decode its output as trimmed UTF-8
    fn shell_utf8(&self, command: &str) -> Result<String> {
        let out = self.shell(command)?;
        Ok(String::from_utf8_lossy(&out).trim().to_string())
    }

    /// Log an info message prefixed with this device's serial
    fn log_info(&self, msg: &str) {
        info!("[{}] {}", self.serial(), msg);
    }

    /// Log a debug message prefixed with this device's serial
    fn log_debug(&self, msg: &str) {
        debug!("[{}] {}", self.serial(), msg);
    }
}

/// Trait for the Wi-Fi RPC surface of a device
///
/// These calls map to the Wi-Fi methods of the on-device snippet. The real
/// implementation drives them through `cmd wifi`; mock devices flip
/// simulated radio state instead.
pub trait WifiSnippet: Send + Sync {
    /// Whether the Wi-Fi radio is currently enabled
    fn wifi_is_enabled(&self) -> Result<bool>;

    /// Enable the Wi-Fi radio
    fn wifi_enable(&self) -> Result<()>;

    /// Connect to a network, returning once the connection is established
    ///
    /// # Arguments
    /// * `ssid` - Network name
    /// * `password` - WPA2 passphrase, or `None` for an open network
    fn wifi_connect(&self, ssid: &str, password: Option<&str>) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_device_state_parse() {
        assert_eq!(DeviceState::parse("device"), DeviceState::Device);
        assert_eq!(DeviceState::parse("offline"), DeviceState::Offline);
        assert_eq!(DeviceState::parse("unauthorized"), DeviceState::Unauthorized);
        assert_eq!(DeviceState::parse("recovery"), DeviceState::Unknown);
        assert_eq!(DeviceState::parse(""), DeviceState::Unknown);
    }

    #[test]
    fn test_device_state_usable() {
        assert!(DeviceState::Device.is_usable());
        assert!(!DeviceState::Offline.is_usable());
        assert!(!DeviceState::Unauthorized.is_usable());
        assert!(DeviceState::Unauthorized.is_unauthorized());
    }

    #[test]
    fn test_device_state_display() {
        assert_eq!(DeviceState::Device.display_name(), "device");
        assert_eq!(format!("{}", DeviceState::Unauthorized), "unauthorized");
    }

    #[test]
    fn test_device_info_creation() {
        let info = DeviceInfo::new(
            "17301JEC201234",
            DeviceState::Device,
            "raven",
            "Pixel_6_Pro",
            "raven",
        );

        assert_eq!(info.serial, "17301JEC201234");
        assert_eq!(info.state, DeviceState::Device);
        assert_eq!(info.model, "Pixel_6_Pro");
        assert!(info.is_usable());
    }

    #[test]
    fn test_device_info_describe() {
        let info = DeviceInfo::new(
            "abc123",
            DeviceState::Device,
            "raven",
            "Pixel_6_Pro",
            "raven",
        );
        assert_eq!(info.describe(), "abc123 (device) - Pixel 6 Pro");

        let bare = DeviceInfo::new("abc123", DeviceState::Unauthorized, "", "", "");
        assert_eq!(bare.describe(), "abc123 (unauthorized)");
    }

    #[test]
    fn test_build_info_sdk_level() {
        let mut info = BuildInfo::new();
        info.insert(BUILD_VERSION_SDK_KEY, "34");
        assert_eq!(info.version_sdk(), 34);

        // Raw getprop output may carry a trailing newline
        let mut padded = BuildInfo::new();
        padded.insert(BUILD_VERSION_SDK_KEY, " 30\n");
        assert_eq!(padded.version_sdk(), 30);
    }

    #[test]
    fn test_build_info_missing_or_garbage_sdk() {
        let empty = BuildInfo::new();
        assert_eq!(empty.version_sdk(), 0);
        assert!(empty.is_empty());

        let mut garbage = BuildInfo::new();
        garbage.insert(BUILD_VERSION_SDK_KEY, "unknown");
        assert_eq!(garbage.version_sdk(), 0);
    }

    #[test]
    fn test_build_info_from_iter() {
        let info: BuildInfo = vec![
            ("build_id".to_string(), "UQ1A.240205.004".to_string()),
            (BUILD_VERSION_SDK_KEY.to_string(), "34".to_string()),
        ]
        .into_iter()
        .collect();

        assert_eq!(info.len(), 2);
        assert_eq!(info.get("build_id"), Some("UQ1A.240205.004"));
        assert_eq!(info.version_sdk(), 34);
    }

    /// Minimal DeviceControl impl exercising the default trait methods
    struct FakeDevice {
        build_info: BuildInfo,
        responses: Mutex<Vec<Vec<u8>>>,
    }

    impl DeviceControl for FakeDevice {
        fn serial(&self) -> &str {
            "fake-001"
        }

        fn is_adb_root(&self) -> bool {
            false
        }

        fn build_info(&self) -> &BuildInfo {
            &self.build_info
        }

        fn shell(&self, _command: &str) -> Result<Vec<u8>> {
            let mut responses = self.responses.lock().unwrap();
            Ok(responses.pop().unwrap_or_default())
        }

        fn install_package(&self, _apk_path: &Path) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_shell_utf8_trims_output() {
        let device = FakeDevice {
            build_info: BuildInfo::new(),
            responses: Mutex::new(vec![b"  versionCode=242212000\n".to_vec()]),
        };

        let out = device.shell_utf8("dumpsys package x").unwrap();
        assert_eq!(out, "versionCode=242212000");
    }

    #[test]
    fn test_shell_utf8_lossy_decoding() {
        let device = FakeDevice {
            build_info: BuildInfo::new(),
            responses: Mutex::new(vec![vec![0x66, 0xFF, 0x6F]]),
        };

        // Invalid UTF-8 must not error, adb output is not always clean
        let out = device.shell_utf8("getprop").unwrap();
        assert!(out.starts_with('f'));
        assert!(out.ends_with('o'));
    }
}
