//! Device Setup Tool Library
//!
//! A library for preparing Android devices for Nearby Connections testing
//! over adb: Wi-Fi regulatory setup, verbose logging, permission grants,
//! feature flag overrides and APK installs.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - [`core`] - Core functionality including configuration, error handling,
//!   the setup routines, and provisioning reports
//! - [`device`] - Device interaction over the adb command line
//! - [`cli`] - Command-line interface (only used by the binary)
//! - [`testdb`] - Test database with simulated devices and scenarios for testing
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use device_setup_tool::core::config::Config;
//! use device_setup_tool::core::setup;
//! use device_setup_tool::device;
//!
//! fn main() -> anyhow::Result<()> {
//!     // Load configuration
//!     let config = Config::load_default()?;
//!
//!     // Open the one usable device adb knows about
//!     let phone = device::open_target(&config.device.adb_path, config.device.serial.as_deref())?;
//!
//!     // Force the Wi-Fi regulatory domain and raise the Nearby log tags
//!     setup::set_wifi_country_code(&phone, &config.wifi.country_code)?;
//!     setup::enable_logs(&phone)?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Testing Without a Device
//!
//! The `testdb` module provides comprehensive testing capabilities:
//!
//! ```rust,no_run
//! use device_setup_tool::testdb::{ScenarioLibrary, TestRunner};
//!
//! // Run all quick test scenarios
//! let mut runner = TestRunner::new();
//! let summary = runner.run_quick();
//! println!("Passed: {}/{}", summary.passed, summary.total);
//!
//! // List available scenarios
//! println!("{} scenarios available", ScenarioLibrary::all_scenarios().len());
//! ```
//!
//! # Features
//!
//! - **One-Pass Provisioning** - Country code, verbose logs, permissions, flags,
//!   Wi-Fi and APK install in a single run
//! - **Root Aware** - Steps that need adb root report a skip on production builds
//!   instead of failing the pass
//! - **Wi-Fi Setup** - Joins the test network and measures how long the
//!   connection took
//! - **Feature Flags** - Phenotype flag overrides with verification of the
//!   committed value
//! - **JSON Reports** - Per-step outcomes and device properties for later
//!   inspection
//! - **Comprehensive Testing** - Simulated devices cover every step without
//!   real hardware
//! - **Graceful Shutdown** - Ctrl+C finishes the current step before stopping
//!
//! # Requirements
//!
//! The tool drives devices through the `adb` binary from the Android platform
//! tools. It must be on the `PATH` or pointed at through the `[device]`
//! config section. Any host OS with working adb is supported.

// Core modules - always available
pub mod cli;
pub mod core;
pub mod device;
pub mod testdb;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
