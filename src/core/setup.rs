//! Device preparation routines for Nearby testing
//!
//! This module contains the setup steps a test device goes through before a
//! Nearby test run: Wi-Fi country code, verbose logging, storage permission,
//! the bluetooth multiplex flag, airplane mode and apk install. Each routine
//! is a thin sequence of shell commands and fixed settle waits against a
//! [`DeviceControl`] handle; no state is kept between calls.
//!
//! Routines that require a rooted device do not fail on unrooted phones,
//! they report [`SetupOutcome::Skipped`] so callers can surface the skip
//! instead of a spurious error.

use crate::core::error::Result;
use crate::device::traits::{DeviceControl, WifiSnippet};
use std::collections::HashMap;
use std::fmt::{self, Display};
use std::path::Path;
use std::time::{Duration, Instant};

/// Wait after toggling the Wi-Fi radio or forcing a country code
pub const WIFI_COUNTRYCODE_CONFIG_TIME: Duration = Duration::from_secs(3);

/// Wait after broadcasting an airplane-mode change
pub const TOGGLE_AIRPLANE_MODE_WAIT_TIME: Duration = Duration::from_secs(2);

/// Wait after broadcasting a phenotype flag override
pub const PH_FLAG_WRITE_WAIT_TIME: Duration = Duration::from_secs(3);

/// Log tags switched to verbose by [`enable_logs`]
pub const LOG_TAGS: [&str; 6] = [
    "Nearby",
    "NearbyMessages",
    "NearbyDiscovery",
    "NearbyConnections",
    "NearbyMediums",
    "NearbySetup",
];

/// GMS package owning the Nearby phenotype flags
const NEARBY_PHENOTYPE_PACKAGE: &str = "com.google.android.gms.nearby";

/// Flag enabling multiplexed bluetooth sockets in Nearby mediums
const BT_MULTIPLEX_FLAG: &str = "mediums_supports_bluetooth_multiplex_socket";

/// Outcome of a setup routine that may be skipped
///
/// Skipping is not a failure: root-gated routines skip on unrooted devices
/// and the run continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupOutcome {
    /// The routine ran to completion
    Done,
    /// The routine did not run; the reason says why
    Skipped(String),
}

impl SetupOutcome {
    /// Check if the routine completed
    pub fn is_done(&self) -> bool {
        matches!(self, SetupOutcome::Done)
    }

    /// Check if the routine was skipped
    pub fn is_skipped(&self) -> bool {
        matches!(self, SetupOutcome::Skipped(_))
    }

    /// The skip reason, if the routine was skipped
    pub fn skip_reason(&self) -> Option<&str> {
        match self {
            SetupOutcome::Done => None,
            SetupOutcome::Skipped(reason) => Some(reason),
        }
    }
}

impl Display for SetupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupOutcome::Done => write!(f, "done"),
            SetupOutcome::Skipped(reason) => write!(f, "skipped: {}", reason),
        }
    }
}

/// Set the Wi-Fi country code
///
/// Setting the phone to EU or JP shrinks the available 5GHz channels; some
/// phones then lose Wi-Fi Direct or Hotspot on 5GHz entirely. Tests force a
/// country code to cover the no-Wi-Fi-LAN paths that would otherwise never
/// run. The code only takes effect while Wi-Fi is down, and an airplane-mode
/// bounce is needed before the modem picks it up.
///
/// Skipped on unrooted devices; `cmd wifi force-country-code` needs root.
pub fn set_wifi_country_code<D: DeviceControl>(
    device: &D,
    country_code: &str,
) -> Result<SetupOutcome> {
    if !device.is_adb_root() {
        let reason = format!(
            "not setting wifi country code on unrooted device \"{}\"",
            device.serial()
        );
        device.log_info(&reason);
        return Ok(SetupOutcome::Skipped(reason));
    }

    device.log_info(&format!("Set Wi-Fi country code to {}.", country_code));
    device.shell("cmd wifi set-wifi-enabled disabled")?;
    device.settle(WIFI_COUNTRYCODE_CONFIG_TIME);
    device.shell(&format!(
        "cmd wifi force-country-code enabled {}",
        country_code
    ))?;
    enable_airplane_mode(device)?;
    device.settle(WIFI_COUNTRYCODE_CONFIG_TIME);
    disable_airplane_mode(device)?;
    device.shell("cmd wifi set-wifi-enabled enabled")?;

    Ok(SetupOutcome::Done)
}

/// Switch all Nearby log tags to verbose
pub fn enable_logs<D: DeviceControl>(device: &D) -> Result<()> {
    device.log_info("Enable Nearby loggings.");
    for tag in LOG_TAGS {
        device.shell(&format!("setprop log.tag.{} VERBOSE", tag))?;
    }
    Ok(())
}

/// Grant MANAGE_EXTERNAL_STORAGE to the given package
///
/// The permission is not covered by the `-g` install flag and must be
/// granted through appops. Both the appops command and the permission only
/// exist on API 30+, so older devices silently no-op.
pub fn grant_manage_external_storage_permission<D: DeviceControl>(
    device: &D,
    package_name: &str,
) -> Result<()> {
    let build_version_sdk = device.build_info().version_sdk();
    if build_version_sdk < 30 {
        return Ok(());
    }
    device.log_info(&format!(
        "Grant MANAGE_EXTERNAL_STORAGE permission on device \"{}\".",
        device.serial()
    ));
    device.shell(&format!(
        "appops set --uid {} MANAGE_EXTERNAL_STORAGE allow",
        package_name
    ))?;
    Ok(())
}

/// Dump the installed GMS core version, keyed by device serial
///
/// The returned mapping is meant to be attached to test-run properties
/// verbatim; the version text is not parsed.
pub fn dump_gms_version<D: DeviceControl>(device: &D) -> Result<HashMap<String, String>> {
    let out =
        device.shell_utf8("dumpsys package com.google.android.gms | grep \"versionCode=\"")?;
    let mut properties = HashMap::new();
    properties.insert(format!("GMS core version on {}", device.serial()), out);
    Ok(properties)
}

/// Bounce airplane mode on and off
///
/// Skipped on unrooted devices; writing secure settings needs root.
pub fn toggle_airplane_mode<D: DeviceControl>(device: &D) -> Result<SetupOutcome> {
    if !device.is_adb_root() {
        let reason = format!(
            "not toggling airplane mode on unrooted device \"{}\"",
            device.serial()
        );
        device.log_info(&reason);
        return Ok(SetupOutcome::Skipped(reason));
    }

    device.log_info("turn on airplane mode");
    enable_airplane_mode(device)?;
    device.log_info("turn off airplane mode");
    disable_airplane_mode(device)?;

    Ok(SetupOutcome::Done)
}

/// Enable airplane mode on the given device
pub fn enable_airplane_mode<D: DeviceControl>(device: &D) -> Result<()> {
    device.shell("settings put global airplane_mode_on 1")?;
    device.shell("am broadcast -a android.intent.action.AIRPLANE_MODE --ez state true")?;
    device.settle(TOGGLE_AIRPLANE_MODE_WAIT_TIME);
    Ok(())
}

/// Disable airplane mode on the given device
pub fn disable_airplane_mode<D: DeviceControl>(device: &D) -> Result<()> {
    device.shell("settings put global airplane_mode_on 0")?;
    device.shell("am broadcast -a android.intent.action.AIRPLANE_MODE --ez state false")?;
    device.settle(TOGGLE_AIRPLANE_MODE_WAIT_TIME);
    Ok(())
}

/// Connect to the given WLAN and measure how long it takes
///
/// A single timed attempt; an empty password is treated as an open network.
pub fn connect_to_wifi_wlan_till_success<D: DeviceControl + WifiSnippet>(
    device: &D,
    wifi_ssid: &str,
    wifi_password: &str,
) -> Result<Duration> {
    device.log_info("Start connecting to wifi WLAN");
    let wifi_connect_start = Instant::now();
    let wifi_password = if wifi_password.is_empty() {
        None
    } else {
        Some(wifi_password)
    };
    connect_to_wifi(device, wifi_ssid, wifi_password)?;
    Ok(wifi_connect_start.elapsed())
}

/// Connect to a Wi-Fi network, enabling the radio first if needed
pub fn connect_to_wifi<D: DeviceControl + WifiSnippet>(
    device: &D,
    ssid: &str,
    password: Option<&str>,
) -> Result<()> {
    if !device.wifi_is_enabled()? {
        device.wifi_enable()?;
    }
    // returns once the wifi is connected
    device.wifi_connect(ssid, password)?;
    Ok(())
}

/// Enable the bluetooth multiplex flag through a phenotype override
///
/// Checks the committed flag overrides first and does nothing when the flag
/// is already set. A failed write is logged and tolerated; the flag is an
/// optimization, not a requirement.
pub fn enable_bluetooth_multiplex<D: DeviceControl>(device: &D) -> Result<()> {
    if is_bt_multiplex_flag_enabled(device)? {
        device.log_info("bt multiplex flag is already enabled.");
        return Ok(());
    }

    device.log_info("Enable bluetooth multiplex flag.");
    device.shell(&format!(
        "am broadcast -a \"com.google.android.gms.phenotype.FLAG_OVERRIDE\" \
         --es package \"{pname}\" --es user \"*\" \
         --esa flags \"{flag}\" \
         --esa types \"boolean\" --esa values \"true\" \
         com.google.android.gms",
        pname = NEARBY_PHENOTYPE_PACKAGE,
        flag = BT_MULTIPLEX_FLAG,
    ))?;
    device.settle(PH_FLAG_WRITE_WAIT_TIME);

    if is_bt_multiplex_flag_enabled(device)? {
        device.log_info("bt multiplex flag is enabled successfully.");
    } else {
        device.log_info("failed to enable the bt multiplex flag.");
    }
    Ok(())
}

/// Check the committed phenotype overrides for the bluetooth multiplex flag
fn is_bt_multiplex_flag_enabled<D: DeviceControl>(device: &D) -> Result<bool> {
    let query = format!(
        "sqlite3 /data/data/com.google.android.gms/databases/phenotype.db \
         \"select name, quote(coalesce(intVal, boolVal, floatVal, stringVal, extensionVal)) \
         from FlagOverrides where committed=1 AND packageName='{}';\"",
        NEARBY_PHENOTYPE_PACKAGE
    );
    let flag_result = device.shell_utf8(&query)?;
    Ok(flag_result.contains('1') && flag_result.contains(BT_MULTIPLEX_FLAG))
}

/// Install an apk on the given device
pub fn install_apk<D: DeviceControl>(device: &D, apk_path: &Path) -> Result<()> {
    device.log_info(&format!("Install {}", apk_path.display()));
    device.install_package(apk_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::SetupError;
    use crate::testdb::mock_device::{CommandRecord, MockDevice, MockDeviceConfig};
    use std::path::PathBuf;

    #[test]
    fn test_set_wifi_country_code_rooted_sequence() {
        let device = MockDevice::new("mock-root", MockDeviceConfig::default());

        let outcome = set_wifi_country_code(&device, "US").unwrap();

        assert!(outcome.is_done());
        assert_eq!(
            device.shell_commands(),
            vec![
                "cmd wifi set-wifi-enabled disabled",
                "cmd wifi force-country-code enabled US",
                "settings put global airplane_mode_on 1",
                "am broadcast -a android.intent.action.AIRPLANE_MODE --ez state true",
                "settings put global airplane_mode_on 0",
                "am broadcast -a android.intent.action.AIRPLANE_MODE --ez state false",
                "cmd wifi set-wifi-enabled enabled",
            ]
        );
        // disable radio -> airplane on -> country-code settle -> airplane off
        assert_eq!(
            device.settle_requests(),
            vec![
                WIFI_COUNTRYCODE_CONFIG_TIME,
                TOGGLE_AIRPLANE_MODE_WAIT_TIME,
                WIFI_COUNTRYCODE_CONFIG_TIME,
                TOGGLE_AIRPLANE_MODE_WAIT_TIME,
            ]
        );
    }

    #[test]
    fn test_set_wifi_country_code_unrooted_skips_without_commands() {
        let device = MockDevice::new("mock-user", MockDeviceConfig::unrooted());

        let outcome = set_wifi_country_code(&device, "JP").unwrap();

        assert!(outcome.is_skipped());
        assert!(outcome.skip_reason().unwrap().contains("mock-user"));
        assert_eq!(device.shell_count(), 0);
        assert!(device.settle_requests().is_empty());
    }

    #[test]
    fn test_enable_logs_sets_all_tags_verbose() {
        let device = MockDevice::new("mock-logs", MockDeviceConfig::default());

        enable_logs(&device).unwrap();

        let commands = device.shell_commands();
        assert_eq!(commands.len(), LOG_TAGS.len());
        for (command, tag) in commands.iter().zip(LOG_TAGS) {
            assert_eq!(command, &format!("setprop log.tag.{} VERBOSE", tag));
        }
    }

    #[test]
    fn test_grant_storage_permission_on_api_30_and_later() {
        let device = MockDevice::new("mock-34", MockDeviceConfig::default().with_sdk(34));

        grant_manage_external_storage_permission(&device, "com.example.snippet").unwrap();

        assert_eq!(
            device.shell_commands(),
            vec!["appops set --uid com.example.snippet MANAGE_EXTERNAL_STORAGE allow"]
        );
    }

    #[test]
    fn test_grant_storage_permission_noop_below_api_30() {
        let device = MockDevice::new("mock-29", MockDeviceConfig::default().with_sdk(29));

        grant_manage_external_storage_permission(&device, "com.example.snippet").unwrap();

        assert_eq!(device.shell_count(), 0);
    }

    #[test]
    fn test_grant_storage_permission_noop_when_sdk_unknown() {
        // A device that never reported its SDK level is treated as legacy
        let device = MockDevice::new("mock-unknown", MockDeviceConfig::default().with_sdk(0));

        grant_manage_external_storage_permission(&device, "com.example.snippet").unwrap();

        assert_eq!(device.shell_count(), 0);
    }

    #[test]
    fn test_dump_gms_version_keyed_by_serial() {
        let device = MockDevice::new("mock-gms", MockDeviceConfig::default());

        let properties = dump_gms_version(&device).unwrap();

        assert_eq!(properties.len(), 1);
        let out = properties.get("GMS core version on mock-gms").unwrap();
        assert!(out.contains("versionCode="));
    }

    #[test]
    fn test_toggle_airplane_mode_rooted_sequence() {
        let device = MockDevice::new("mock-root", MockDeviceConfig::default());

        let outcome = toggle_airplane_mode(&device).unwrap();

        assert!(outcome.is_done());
        assert_eq!(
            device.shell_commands(),
            vec![
                "settings put global airplane_mode_on 1",
                "am broadcast -a android.intent.action.AIRPLANE_MODE --ez state true",
                "settings put global airplane_mode_on 0",
                "am broadcast -a android.intent.action.AIRPLANE_MODE --ez state false",
            ]
        );
        assert_eq!(
            device.settle_requests(),
            vec![TOGGLE_AIRPLANE_MODE_WAIT_TIME, TOGGLE_AIRPLANE_MODE_WAIT_TIME]
        );
    }

    #[test]
    fn test_toggle_airplane_mode_unrooted_skips() {
        let device = MockDevice::new("mock-user", MockDeviceConfig::unrooted());

        let outcome = toggle_airplane_mode(&device).unwrap();

        assert!(outcome.is_skipped());
        assert_eq!(device.shell_count(), 0);
    }

    #[test]
    fn test_bluetooth_multiplex_preset_flag_skips_broadcast() {
        let device = MockDevice::new("mock-preset", MockDeviceConfig::flag_preset());

        enable_bluetooth_multiplex(&device).unwrap();

        let commands = device.shell_commands();
        assert_eq!(commands.len(), 1);
        assert!(commands[0].starts_with("sqlite3"));
        assert!(device.settle_requests().is_empty());
    }

    #[test]
    fn test_bluetooth_multiplex_broadcasts_once_and_rechecks() {
        let device = MockDevice::new("mock-flags", MockDeviceConfig::default());

        enable_bluetooth_multiplex(&device).unwrap();

        let commands = device.shell_commands();
        assert_eq!(commands.len(), 3);
        assert!(commands[0].starts_with("sqlite3"));
        assert!(commands[1].contains("com.google.android.gms.phenotype.FLAG_OVERRIDE"));
        assert!(commands[1].contains(BT_MULTIPLEX_FLAG));
        assert!(commands[2].starts_with("sqlite3"));
        assert_eq!(device.settle_requests(), vec![PH_FLAG_WRITE_WAIT_TIME]);
        assert!(device.flag_committed(BT_MULTIPLEX_FLAG));
    }

    #[test]
    fn test_bluetooth_multiplex_tolerates_ignored_write() {
        let config = MockDeviceConfig::default().with_ignored_flag_broadcasts();
        let device = MockDevice::new("mock-stubborn", config);

        // The device never commits the override; the routine still succeeds
        enable_bluetooth_multiplex(&device).unwrap();

        assert_eq!(device.shell_commands().len(), 3);
        assert!(!device.flag_committed(BT_MULTIPLEX_FLAG));
    }

    #[test]
    fn test_connect_to_wifi_enables_radio_first_when_disabled() {
        let config = MockDeviceConfig::default().with_wifi_disabled();
        let device = MockDevice::new("mock-radio", config);

        connect_to_wifi(&device, "TestNet", Some("hunter22")).unwrap();

        assert_eq!(
            device.journal(),
            vec![
                CommandRecord::WifiStatusQuery,
                CommandRecord::WifiEnable,
                CommandRecord::WifiConnect {
                    ssid: "TestNet".to_string(),
                    password: Some("hunter22".to_string()),
                },
            ]
        );
    }

    #[test]
    fn test_connect_to_wifi_skips_enable_when_radio_up() {
        let device = MockDevice::new("mock-radio", MockDeviceConfig::default());

        connect_to_wifi(&device, "TestNet", None).unwrap();

        assert_eq!(
            device.journal(),
            vec![
                CommandRecord::WifiStatusQuery,
                CommandRecord::WifiConnect {
                    ssid: "TestNet".to_string(),
                    password: None,
                },
            ]
        );
    }

    #[test]
    fn test_connect_till_success_maps_empty_password_to_open_network() {
        let device = MockDevice::new("mock-open", MockDeviceConfig::default());

        let elapsed = connect_to_wifi_wlan_till_success(&device, "MySSID", "").unwrap();

        assert!(elapsed < Duration::from_secs(1));
        assert!(device.journal().contains(&CommandRecord::WifiConnect {
            ssid: "MySSID".to_string(),
            password: None,
        }));
        assert_eq!(device.connected_ssid(), Some("MySSID".to_string()));
    }

    #[test]
    fn test_connect_till_success_propagates_connect_failure() {
        let config = MockDeviceConfig::default().with_connect_failure();
        let device = MockDevice::new("mock-refused", config);

        let err = connect_to_wifi_wlan_till_success(&device, "MySSID", "pw").unwrap_err();

        assert!(matches!(err, SetupError::WifiConnectError { .. }));
    }

    #[test]
    fn test_install_apk_records_install() {
        let device = MockDevice::new("mock-install", MockDeviceConfig::default());

        install_apk(&device, Path::new("/tmp/snippet.apk")).unwrap();

        assert_eq!(
            device.journal(),
            vec![CommandRecord::Install(PathBuf::from("/tmp/snippet.apk"))]
        );
    }

    #[test]
    fn test_install_apk_propagates_rejection() {
        let config = MockDeviceConfig::default().with_install_failure();
        let device = MockDevice::new("mock-reject", config);

        let err = install_apk(&device, Path::new("/tmp/bad.apk")).unwrap_err();

        assert!(matches!(err, SetupError::InstallError { .. }));
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(SetupOutcome::Done.to_string(), "done");
        assert_eq!(
            SetupOutcome::Skipped("no root".to_string()).to_string(),
            "skipped: no root"
        );
        assert_eq!(
            SetupOutcome::Skipped("no root".to_string()).skip_reason(),
            Some("no root")
        );
    }
}
