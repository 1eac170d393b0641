//! adb-backed device implementation
//!
//! This module wraps the platform `adb` binary with the [`DeviceControl`] and
//! [`WifiSnippet`] traits. Every operation shells out to adb; nothing here
//! keeps a persistent connection, so a dropped USB cable surfaces as an error
//! on the next call rather than a hang.

use crate::core::error::{Result, SetupError};
use crate::device::traits::{
    BuildInfo, DeviceControl, DeviceInfo, DeviceState, WifiSnippet, BUILD_VERSION_SDK_KEY,
};
use log::debug;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::Duration;

/// Default adb binary, resolved through PATH
pub const DEFAULT_ADB_PATH: &str = "adb";

/// getprop keys collected into [`BuildInfo`] when a device is opened
const BUILD_PROPS: &[(&str, &str)] = &[
    (BUILD_VERSION_SDK_KEY, "ro.build.version.sdk"),
    ("build_id", "ro.build.id"),
    ("build_type", "ro.build.type"),
    ("build_product", "ro.build.product"),
    ("hardware", "ro.hardware"),
];

/// `cmd wifi connect-network` returns before association finishes, so the
/// connect call polls `cmd wifi status` until the network shows up.
const WIFI_CONNECT_POLL_ATTEMPTS: u32 = 30;
const WIFI_CONNECT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// A single Android device reached through adb
///
/// Root state and build properties are probed once in [`AdbDevice::open`] and
/// cached for the lifetime of the handle; they cannot change without a
/// reconnect anyway.
pub struct AdbDevice {
    serial: String,
    adb_path: PathBuf,
    rooted: bool,
    build_info: BuildInfo,
}

impl AdbDevice {
    /// Open a device by serial, probing root state and build properties
    pub fn open<P: Into<PathBuf>>(adb_path: P, serial: &str) -> Result<Self> {
        let mut device = Self {
            serial: serial.to_string(),
            adb_path: adb_path.into(),
            rooted: false,
            build_info: BuildInfo::new(),
        };

        let id_line = device.shell_utf8("id")?;
        device.rooted = id_line.contains("uid=0(root)");

        let mut build_info = BuildInfo::new();
        for (key, prop) in BUILD_PROPS {
            let value = device.shell_utf8(&format!("getprop {}", prop))?;
            build_info.insert(key, &value);
        }
        device.build_info = build_info;

        debug!(
            "[{}] opened: root={} sdk={}",
            device.serial,
            device.rooted,
            device.build_info.version_sdk()
        );
        Ok(device)
    }

    /// Open a device using the default adb binary
    pub fn open_default(serial: &str) -> Result<Self> {
        Self::open(DEFAULT_ADB_PATH, serial)
    }

    fn run_adb(&self, args: &[&str]) -> Result<Output> {
        let mut command = Command::new(&self.adb_path);
        command.arg("-s").arg(&self.serial).args(args);
        run_command(&self.adb_path, command)
    }
}

impl DeviceControl for AdbDevice {
    fn serial(&self) -> &str {
        &self.serial
    }

    fn is_adb_root(&self) -> bool {
        self.rooted
    }

    fn build_info(&self) -> &BuildInfo {
        &self.build_info
    }

    fn shell(&self, command: &str) -> Result<Vec<u8>> {
        debug!("[{}] $ {}", self.serial, command);
        let output = self.run_adb(&["shell", command])?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                format!("'{}' exited with {}", command, output.status)
            } else {
                stderr
            };
            return Err(SetupError::ShellError {
                serial: self.serial.clone(),
                message,
            });
        }

        Ok(output.stdout)
    }

    fn install_package(&self, apk_path: &Path) -> Result<()> {
        let path = apk_path.to_string_lossy();
        debug!("[{}] install -r -g -t {}", self.serial, path);
        let output = self.run_adb(&["install", "-r", "-g", "-t", &path])?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        // Older adb versions report install rejections on stdout with exit 0
        if !output.status.success() || stdout.contains("Failure") || stderr.contains("Failure") {
            let message = [stderr.trim(), stdout.trim()]
                .iter()
                .find(|s| !s.is_empty())
                .map(|s| s.to_string())
                .unwrap_or_else(|| format!("adb install exited with {}", output.status));
            return Err(SetupError::InstallError {
                apk: apk_path.display().to_string(),
                message,
            });
        }

        Ok(())
    }
}

impl WifiSnippet for AdbDevice {
    fn wifi_is_enabled(&self) -> Result<bool> {
        let status = self.shell_utf8("cmd wifi status")?;
        Ok(status.contains("Wifi is enabled"))
    }

    fn wifi_enable(&self) -> Result<()> {
        self.shell("cmd wifi set-wifi-enabled enabled")?;
        Ok(())
    }

    fn wifi_connect(&self, ssid: &str, password: Option<&str>) -> Result<()> {
        self.shell(&wifi_connect_command(ssid, password))?;

        for _ in 0..WIFI_CONNECT_POLL_ATTEMPTS {
            let status = self.shell_utf8("cmd wifi status")?;
            if status_reports_connected(&status, ssid) {
                return Ok(());
            }
            self.settle(WIFI_CONNECT_POLL_INTERVAL);
        }

        Err(SetupError::WifiConnectError {
            serial: self.serial.clone(),
            message: format!(
                "no association with '{}' after {}s",
                ssid,
                WIFI_CONNECT_POLL_ATTEMPTS as u64 * WIFI_CONNECT_POLL_INTERVAL.as_secs()
            ),
        })
    }
}

/// List devices known to the adb daemon
pub fn list_devices<P: AsRef<Path>>(adb_path: P) -> Result<Vec<DeviceInfo>> {
    let adb_path = adb_path.as_ref();
    let mut command = Command::new(adb_path);
    command.arg("devices").arg("-l");
    let output = run_command(adb_path, command)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(SetupError::AdbError(format!(
            "'adb devices' failed: {}",
            stderr
        )));
    }

    Ok(parse_devices_output(&String::from_utf8_lossy(
        &output.stdout,
    )))
}

/// Open the device a command should act on
///
/// With an explicit serial the device only has to exist; without one there
/// must be exactly one usable device attached.
pub fn open_target<P: AsRef<Path>>(adb_path: P, serial: Option<&str>) -> Result<AdbDevice> {
    let adb_path = adb_path.as_ref();
    let devices = list_devices(adb_path)?;

    if let Some(serial) = serial {
        if !devices.iter().any(|d| d.serial == serial) {
            return Err(SetupError::DeviceNotFound(serial.to_string()));
        }
        return AdbDevice::open(adb_path, serial);
    }

    let usable: Vec<&DeviceInfo> = devices.iter().filter(|d| d.is_usable()).collect();
    match usable.as_slice() {
        [] => Err(SetupError::NoDevicesFound),
        [only] => AdbDevice::open(adb_path, &only.serial),
        _ => Err(SetupError::MultipleDevices),
    }
}

fn run_command(adb_path: &Path, mut command: Command) -> Result<Output> {
    command.output().map_err(|e| {
        SetupError::AdbError(format!("failed to run '{}': {}", adb_path.display(), e))
    })
}

/// Quote a value for the device shell.
///
/// Single quotes pass everything through literally; an embedded quote has to
/// close the quoting, escape itself and reopen.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

/// Build the `cmd wifi connect-network` invocation. SSIDs and passphrases
/// regularly contain spaces and apostrophes, so both are quoted.
fn wifi_connect_command(ssid: &str, password: Option<&str>) -> String {
    match password {
        Some(pass) => format!(
            "cmd wifi connect-network {} wpa2 {}",
            shell_quote(ssid),
            shell_quote(pass)
        ),
        None => format!("cmd wifi connect-network {} open", shell_quote(ssid)),
    }
}

/// Check whether `cmd wifi status` output names `ssid` as the current
/// network. The connected line reports the SSID in double quotes; hex SSIDs
/// come back bare.
fn status_reports_connected(status: &str, ssid: &str) -> bool {
    let quoted = format!("\"{}\"", ssid);
    status.lines().any(|line| {
        line.trim()
            .strip_prefix("Wifi is connected to ")
            .is_some_and(|shown| shown == quoted || shown == ssid)
    })
}

/// Parse `adb devices -l` output into device records
fn parse_devices_output(out: &str) -> Vec<DeviceInfo> {
    let mut devices = Vec::new();

    for line in out.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("List of devices") || line.starts_with('*') {
            continue;
        }

        let mut fields = line.split_whitespace();
        let serial = match fields.next() {
            Some(serial) => serial,
            None => continue,
        };
        let state = DeviceState::parse(fields.next().unwrap_or(""));

        let mut info = DeviceInfo {
            serial: serial.to_string(),
            state,
            ..Default::default()
        };

        for field in fields {
            if let Some(product) = field.strip_prefix("product:") {
                info.product = product.to_string();
            } else if let Some(model) = field.strip_prefix("model:") {
                info.model = model.to_string();
            } else if let Some(device) = field.strip_prefix("device:") {
                info.device = device.to_string();
            }
        }

        devices.push(info);
    }

    devices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_devices_output_typical() {
        let out = "List of devices attached\n\
                   17301JEC201234         device usb:1-2 product:raven model:Pixel_6_Pro device:raven transport_id:1\n\
                   emulator-5554          device product:sdk_gphone64_x86_64 model:sdk_gphone64_x86_64 device:emu64x transport_id:2\n\n";

        let devices = parse_devices_output(out);
        assert_eq!(devices.len(), 2);

        assert_eq!(devices[0].serial, "17301JEC201234");
        assert_eq!(devices[0].state, DeviceState::Device);
        assert_eq!(devices[0].product, "raven");
        assert_eq!(devices[0].model, "Pixel_6_Pro");
        assert_eq!(devices[0].device, "raven");

        assert_eq!(devices[1].serial, "emulator-5554");
        assert!(devices[1].is_usable());
    }

    #[test]
    fn test_parse_devices_output_unauthorized() {
        let out = "List of devices attached\n\
                   29051FDH300GHK         unauthorized usb:1-4 transport_id:3\n";

        let devices = parse_devices_output(out);
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].state, DeviceState::Unauthorized);
        assert!(!devices[0].is_usable());
        assert!(devices[0].model.is_empty());
    }

    #[test]
    fn test_parse_devices_output_daemon_banner() {
        let out = "* daemon not running; starting now at tcp:5037\n\
                   * daemon started successfully\n\
                   List of devices attached\n\
                   192.168.1.44:5555      device product:raven model:Pixel_6_Pro device:raven\n";

        let devices = parse_devices_output(out);
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].serial, "192.168.1.44:5555");
    }

    #[test]
    fn test_parse_devices_output_empty() {
        let devices = parse_devices_output("List of devices attached\n\n");
        assert!(devices.is_empty());

        let devices = parse_devices_output("");
        assert!(devices.is_empty());
    }

    #[test]
    fn test_parse_devices_output_offline() {
        let out = "List of devices attached\n\
                   17301JEC201234         offline usb:1-2 transport_id:1\n";

        let devices = parse_devices_output(out);
        assert_eq!(devices[0].state, DeviceState::Offline);
        assert!(!devices[0].is_usable());
    }

    #[test]
    fn test_wifi_connect_command_plain() {
        assert_eq!(
            wifi_connect_command("GoogleGuest", None),
            "cmd wifi connect-network 'GoogleGuest' open"
        );
        assert_eq!(
            wifi_connect_command("Lab Net", Some("hunter22")),
            "cmd wifi connect-network 'Lab Net' wpa2 'hunter22'"
        );
    }

    #[test]
    fn test_wifi_connect_command_escapes_embedded_quotes() {
        assert_eq!(
            wifi_connect_command("Bob's WiFi", Some("it's a secret")),
            r"cmd wifi connect-network 'Bob'\''s WiFi' wpa2 'it'\''s a secret'"
        );
    }

    #[test]
    fn test_status_reports_connected() {
        let status = "Wifi is enabled\nWifi is connected to \"GoogleGuest\"\n";
        assert!(status_reports_connected(status, "GoogleGuest"));
        // A network sharing a suffix must not match
        assert!(!status_reports_connected(status, "Guest"));
        assert!(!status_reports_connected(
            "Wifi is enabled\nWifi is not connected\n",
            "GoogleGuest"
        ));
    }

    #[test]
    fn test_status_reports_connected_ssid_with_quotes() {
        let status = "Wifi is connected to \"Bob's \"Guest\" Net\"\r\n";
        assert!(status_reports_connected(status, "Bob's \"Guest\" Net"));
    }
}
