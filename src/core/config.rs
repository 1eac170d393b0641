//! Configuration module for the device setup tool
//!
//! Supports loading configuration from a TOML file.
//! Configuration is stored in a standard location:
//! - Windows: %APPDATA%\device_setup_tool\config.toml
//! - Linux: ~/.config/device_setup_tool/config.toml
//! - macOS: ~/Library/Application Support/device_setup_tool/config.toml

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Application name used for config directory
const APP_NAME: &str = "device_setup_tool";

/// Default config file name
const CONFIG_FILE_NAME: &str = "config.toml";

/// Get the standard configuration directory for the application.
///
/// Returns:
/// - Windows: %APPDATA%\device_setup_tool
/// - Linux: ~/.config/device_setup_tool
/// - macOS: ~/Library/Application Support/device_setup_tool
pub fn get_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_NAME))
}

/// Get the standard configuration file path.
///
/// Returns the full path to the config file in the standard location.
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// Ensure the configuration directory exists.
///
/// Creates the directory and all parent directories if they don't exist.
pub fn ensure_config_dir() -> Result<PathBuf, ConfigError> {
    let config_dir = get_config_dir().ok_or(ConfigError::ConfigDirNotFound)?;

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)
            .map_err(|e| ConfigError::WriteError(config_dir.clone(), e.to_string()))?;
    }

    Ok(config_dir)
}

/// Initialize the configuration file if it doesn't exist.
///
/// Creates the config directory and copies the default config template.
/// Returns the path to the config file.
pub fn init_config() -> Result<PathBuf, ConfigError> {
    let config_dir = ensure_config_dir()?;
    let config_path = config_dir.join(CONFIG_FILE_NAME);

    if !config_path.exists() {
        let default_config = Config::generate_default_config();
        fs::write(&config_path, default_config)
            .map_err(|e| ConfigError::WriteError(config_path.clone(), e.to_string()))?;
    }

    Ok(config_path)
}

/// Open the configuration file in the default application.
///
/// This will typically open the file in Notepad on Windows,
/// or the default text editor on other platforms.
pub fn open_config_in_editor() -> Result<PathBuf, ConfigError> {
    // Ensure config exists first
    let config_path = init_config()?;

    // Open with default application
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", "", config_path.to_str().unwrap_or("")])
            .spawn()
            .map_err(|e| ConfigError::OpenError(config_path.clone(), e.to_string()))?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(&config_path)
            .spawn()
            .map_err(|e| ConfigError::OpenError(config_path.clone(), e.to_string()))?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(&config_path)
            .spawn()
            .map_err(|e| ConfigError::OpenError(config_path.clone(), e.to_string()))?;
    }

    Ok(config_path)
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Device selection settings
    pub device: DeviceConfig,

    /// Wi-Fi network settings
    pub wifi: WifiConfig,

    /// Which setup steps the provision pass runs
    pub provisioning: ProvisioningConfig,

    /// Logging settings
    pub logging: LoggingConfig,

    /// Provisioning report settings
    pub report: ReportConfig,
}

/// Device selection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Specific device serial to use (optional, auto-detect when absent)
    pub serial: Option<String>,

    /// Path to the adb binary
    pub adb_path: PathBuf,
}

/// Wi-Fi network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WifiConfig {
    /// SSID of the network to join (optional, skips the Wi-Fi step when absent)
    pub ssid: Option<String>,

    /// Network passphrase, empty for open networks
    pub password: String,

    /// Two-letter country code applied before connecting
    pub country_code: String,
}

/// Provisioning step configuration
///
/// Each flag toggles one step of the provision pass. Steps run in the
/// order they are listed here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisioningConfig {
    /// Apply the Wi-Fi country code (needs a rooted adb session)
    pub set_country_code: bool,

    /// Raise the Nearby log tags to VERBOSE
    pub enable_verbose_logs: bool,

    /// Grant MANAGE_EXTERNAL_STORAGE to the snippet package
    pub grant_storage_permission: bool,

    /// Enable the Bluetooth multiplex Phenotype flag
    pub enable_bluetooth_multiplex: bool,

    /// Record the GMS core version in the device properties
    pub dump_gms_version: bool,

    /// Join the configured Wi-Fi network
    pub connect_wifi: bool,

    /// Package that receives the storage grant
    pub storage_package: String,

    /// APK to install at the end of the pass (optional)
    pub apk: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log to file
    pub log_to_file: bool,

    /// Log file path
    pub log_file: PathBuf,
}

/// Provisioning report configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Write a JSON report after each provision pass
    pub enabled: bool,

    /// Directory that receives report files
    pub directory: PathBuf,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            serial: None,
            adb_path: PathBuf::from("adb"),
        }
    }
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            ssid: None,
            password: String::new(),
            country_code: "US".to_string(),
        }
    }
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            set_country_code: true,
            enable_verbose_logs: true,
            grant_storage_permission: true,
            enable_bluetooth_multiplex: true,
            dump_gms_version: true,
            connect_wifi: true,
            storage_package: "com.google.android.nearby.mobly.snippet".to_string(),
            apk: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_to_file: false,
            log_file: PathBuf::from("./device_setup.log"),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            directory: PathBuf::from("./reports"),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e.to_string()))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;

        Ok(config)
    }

    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./config.toml (current directory - for development/override)
    /// 2. ./device_setup.toml (current directory - alternative name)
    /// 3. Standard config location (%APPDATA%\device_setup_tool\config.toml on Windows)
    ///
    /// If no config file is found, returns default configuration.
    pub fn load_default() -> Result<Self, ConfigError> {
        // First check local directory (allows for project-specific overrides)
        let local_paths = [
            PathBuf::from("./config.toml"),
            PathBuf::from("./device_setup.toml"),
        ];

        for path in &local_paths {
            if path.exists() {
                return Self::load(path);
            }
        }

        // Then check standard config location
        if let Some(config_path) = get_config_path() {
            if config_path.exists() {
                return Self::load(&config_path);
            }
        }

        // No config file found, use defaults
        Ok(Self::default())
    }

    /// Get the path where the config file is (or would be) located.
    ///
    /// Returns the first existing config file path, or the standard location if none exists.
    pub fn get_active_config_path() -> PathBuf {
        let local_paths = [
            PathBuf::from("./config.toml"),
            PathBuf::from("./device_setup.toml"),
        ];

        for path in &local_paths {
            if path.exists() {
                return path.clone();
            }
        }

        // Return standard location
        get_config_path().unwrap_or_else(|| PathBuf::from("./config.toml"))
    }

    /// Save configuration to a TOML file
    ///
    /// Reserved for future use - allows saving modified configuration.
    #[allow(dead_code)]
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        fs::write(path.as_ref(), content)
            .map_err(|e| ConfigError::WriteError(path.as_ref().to_path_buf(), e.to_string()))?;

        Ok(())
    }

    /// Generate a default config file with comments
    /// This uses the example config file to ensure it stays up to date
    pub fn generate_default_config() -> String {
        include_str!("../../config.example.toml").to_string()
    }
}

/// Configuration error types
///
/// Some variants are reserved for future use (save functionality).
#[derive(Debug)]
#[allow(dead_code)]
pub enum ConfigError {
    /// Configuration file was not found at the specified path
    FileNotFound(PathBuf),
    /// Failed to read the configuration file
    ReadError(PathBuf, String),
    /// Failed to parse the configuration file (invalid TOML)
    ParseError(PathBuf, String),
    /// Failed to serialize configuration to TOML
    SerializeError(String),
    /// Failed to write configuration file
    WriteError(PathBuf, String),
    /// Could not determine config directory
    ConfigDirNotFound,
    /// Failed to open config file in editor
    OpenError(PathBuf, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ReadError(path, err) => {
                write!(
                    f,
                    "Failed to read config file '{}': {}",
                    path.display(),
                    err
                )
            }
            ConfigError::ParseError(path, err) => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    err
                )
            }
            ConfigError::SerializeError(err) => {
                write!(f, "Failed to serialize configuration: {}", err)
            }
            ConfigError::WriteError(path, err) => {
                write!(
                    f,
                    "Failed to write config file '{}': {}",
                    path.display(),
                    err
                )
            }
            ConfigError::ConfigDirNotFound => {
                write!(f, "Could not determine configuration directory")
            }
            ConfigError::OpenError(path, err) => {
                write!(
                    f,
                    "Failed to open config file '{}': {}",
                    path.display(),
                    err
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.device.serial, None);
        assert_eq!(config.device.adb_path, PathBuf::from("adb"));
        assert_eq!(config.wifi.country_code, "US");
        assert!(config.wifi.password.is_empty());
        assert!(config.wifi.ssid.is_none());
        assert!(config.provisioning.set_country_code);
        assert!(config.provisioning.enable_bluetooth_multiplex);
        assert_eq!(
            config.provisioning.storage_package,
            "com.google.android.nearby.mobly.snippet"
        );
        assert!(config.provisioning.apk.is_none());
        assert_eq!(config.logging.level, "info");
        assert!(!config.report.enabled);
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml_str = r#"
            [wifi]
            ssid = "GoogleGuest"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.wifi.ssid, Some("GoogleGuest".to_string()));
        // Sections and fields that are not mentioned keep their defaults
        assert_eq!(config.wifi.country_code, "US");
        assert!(config.provisioning.enable_verbose_logs);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
            [device]
            serial = "17301JEC201234"
            adb_path = "/usr/local/bin/adb"

            [wifi]
            ssid = "TestNet"
            password = "hunter2"
            country_code = "JP"

            [provisioning]
            set_country_code = false
            storage_package = "com.example.snippet"
            apk = "/tmp/snippet.apk"

            [logging]
            level = "debug"
            log_to_file = true

            [report]
            enabled = true
            directory = "/tmp/reports"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.device.serial, Some("17301JEC201234".to_string()));
        assert_eq!(config.device.adb_path, PathBuf::from("/usr/local/bin/adb"));
        assert_eq!(config.wifi.ssid, Some("TestNet".to_string()));
        assert_eq!(config.wifi.password, "hunter2");
        assert_eq!(config.wifi.country_code, "JP");
        assert!(!config.provisioning.set_country_code);
        assert_eq!(config.provisioning.storage_package, "com.example.snippet");
        assert_eq!(
            config.provisioning.apk,
            Some(PathBuf::from("/tmp/snippet.apk"))
        );
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.log_to_file);
        assert!(config.report.enabled);
        assert_eq!(config.report.directory, PathBuf::from("/tmp/reports"));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/config.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.device.serial = Some("28161FDH3000EP".to_string());
        config.wifi.ssid = Some("GoogleGuest".to_string());
        config.provisioning.apk = Some(PathBuf::from("/tmp/mobly-snippet.apk"));
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.device.serial, Some("28161FDH3000EP".to_string()));
        assert_eq!(loaded.wifi.ssid, Some("GoogleGuest".to_string()));
        assert_eq!(
            loaded.provisioning.apk,
            Some(PathBuf::from("/tmp/mobly-snippet.apk"))
        );
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[wifi\nssid = ").unwrap();

        let result = Config::load(&path);
        assert!(matches!(result, Err(ConfigError::ParseError(_, _))));
    }

    #[test]
    fn test_example_config_parses() {
        // The shipped example file must stay in sync with the Config struct
        let content = Config::generate_default_config();
        let config: Config = toml::from_str(&content).unwrap();
        assert_eq!(config.wifi.country_code, "US");
        assert_eq!(
            config.provisioning.storage_package,
            "com.google.android.nearby.mobly.snippet"
        );
    }

    #[test]
    fn test_config_dir_ends_with_app_name() {
        if let Some(dir) = get_config_dir() {
            assert!(dir.ends_with(APP_NAME));
        }
    }
}
