//! Device interaction module
//!
//! This module provides functionality for interacting with Android devices
//! attached over USB or TCP via the `adb` binary.
//!
//! # Submodules
//!
//! - `adb` - adb subprocess wrapper (shell, install, enumeration)
//! - `traits` - Abstraction traits for testability
//!
//! # Architecture
//!
//! The module uses a trait-based abstraction to enable testing without real devices:
//!
//! - `DeviceControl` - Shell access, package install, root state, build info
//! - `WifiSnippet` - Wi-Fi RPC surface (enable / status / connect)
//! - `DeviceInfo` - Common device information structure
//! - `DeviceState` - adb connection state of a device
//!
//! Both the real adb implementation and mock devices implement these traits,
//! allowing the setup pipeline to work with either.

pub mod adb;
pub mod traits;

// Re-export commonly used types from traits for convenience
pub use traits::{BuildInfo, DeviceControl, DeviceInfo, DeviceState, WifiSnippet};

// Re-export adb-specific types
pub use adb::{list_devices, open_target, AdbDevice, DEFAULT_ADB_PATH};
