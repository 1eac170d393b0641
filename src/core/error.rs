//! Error types for the device setup tool
//!
//! This module defines the error types used throughout the application.
//! Some variants are reserved for future use or provide a complete API surface.

use thiserror::Error;

/// Main error type for the device setup tool
#[derive(Error, Debug)]
#[allow(dead_code)]
pub enum SetupError {
    /// Failed to spawn or talk to the adb binary
    #[error("adb error: {0}")]
    AdbError(String),

    /// A shell command exited with a non-zero status
    #[error("Shell command failed on '{serial}': {message}")]
    ShellError { serial: String, message: String },

    /// No usable devices were found
    #[error("No devices found. Make sure your phone is connected and USB debugging is authorized.")]
    NoDevicesFound,

    /// The requested serial is not attached
    #[error("Device '{0}' not found. Check 'adb devices' output.")]
    DeviceNotFound(String),

    /// More than one device attached and none selected
    #[error("Multiple devices attached. Select one with --serial or in the config file.")]
    MultipleDevices,

    /// Wi-Fi connect request did not reach the connected state
    #[error("Wi-Fi connect failed on '{serial}': {message}")]
    WifiConnectError { serial: String, message: String },

    /// Package install was rejected by the device
    #[error("Install failed for '{apk}': {message}")]
    InstallError { apk: String, message: String },

    /// General I/O error
    #[error("IO error: {0}")]
    IoError(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, SetupError>;

impl From<std::io::Error> for SetupError {
    fn from(err: std::io::Error) -> Self {
        SetupError::IoError(err.to_string())
    }
}
