//! Command-line argument definitions
//!
//! This module defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// A command-line helper that prepares Android devices for Nearby testing over adb
#[derive(Parser, Debug)]
#[command(name = "device-setup")]
#[command(version = "1.0.0")]
#[command(about = "Prepare Android devices for Nearby testing: Wi-Fi, verbose logs, permissions and feature flags", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Device serial to target (overrides config)
    #[arg(short, long)]
    pub serial: Option<String>,

    /// Path to the adb binary (overrides config)
    #[arg(long)]
    pub adb_path: Option<PathBuf>,

    /// Log level: error, warn, info, debug, trace (overrides config)
    #[arg(short, long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full provisioning pass on the connected device
    ///
    /// Applies the Wi-Fi country code, raises the Nearby log tags to
    /// VERBOSE, grants the storage permission, enables the Bluetooth
    /// multiplex flag, records the GMS core version and joins the
    /// configured Wi-Fi network. Individual steps can be disabled in
    /// the config file.
    Provision {
        /// APK to install at the end of the pass (overrides config)
        #[arg(long)]
        apk: Option<PathBuf>,

        /// Skip the Wi-Fi connect step even if an SSID is configured
        #[arg(long)]
        skip_wifi: bool,

        /// Write a JSON report of the pass
        #[arg(long)]
        report: bool,

        /// Do not ask for confirmation before starting
        #[arg(short, long)]
        yes: bool,
    },

    /// List connected devices
    List {
        /// Show all devices, including offline and unauthorized ones
        #[arg(long)]
        all: bool,
    },

    /// Connect the device to a Wi-Fi network
    Wifi {
        /// SSID of the network to join
        ssid: String,

        /// Network passphrase (omit for open networks)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Set the Wi-Fi country code (requires a rooted adb session)
    CountryCode {
        /// Two-letter country code, e.g. US or JP
        code: String,
    },

    /// Switch airplane mode on or off
    Airplane {
        /// Desired state
        #[arg(value_parser = ["on", "off", "toggle"])]
        state: String,
    },

    /// Raise the Nearby log tags to VERBOSE
    EnableLogs,

    /// Grant MANAGE_EXTERNAL_STORAGE to a package (API 30+)
    GrantStorage {
        /// Package to grant the permission to (defaults to the configured snippet package)
        #[arg(short, long)]
        package: Option<String>,
    },

    /// Enable the Bluetooth multiplex feature flag in GMS
    EnableMultiplex,

    /// Show the GMS core version of the connected device
    DumpGms,

    /// Install an APK on the connected device
    Install {
        /// Path to the APK file
        apk: PathBuf,
    },

    /// Open the configuration file in your default editor
    ///
    /// The config file is stored at:
    /// - Windows: %APPDATA%\device_setup_tool\config.toml
    /// - Linux: ~/.config/device_setup_tool/config.toml
    /// - macOS: ~/Library/Application Support/device_setup_tool/config.toml
    ///
    /// If no config file exists, a default one will be created.
    Config {
        /// Show the config file path without opening it
        #[arg(long)]
        path: bool,

        /// Reset config to defaults (creates a fresh config file)
        #[arg(long)]
        reset: bool,
    },

    /// Generate a configuration file at a specific location
    GenerateConfig {
        /// Output path for the config file (defaults to standard location)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show current configuration
    ShowConfig,

    /// Run tests using mock devices (no real Android device required)
    ///
    /// This command allows you to test the provisioning flow without
    /// connecting a real device. It uses simulated devices with various
    /// test scenarios.
    Test {
        #[command(subcommand)]
        test_command: TestCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum TestCommands {
    /// Run all available test scenarios
    RunAll {
        /// Generate JSON report
        #[arg(long)]
        json_report: bool,

        /// Output directory for reports
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Stop on first failure
        #[arg(long)]
        fail_fast: bool,
    },

    /// Run quick test scenarios only (fast)
    RunQuick {
        /// Verbose output showing detailed results
        #[arg(short, long)]
        verbose: bool,
    },

    /// Run tests filtered by tag
    RunTag {
        /// Tag to filter scenarios by (see `test list-tags` for the full list)
        tag: String,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Run specific test scenarios by name
    Run {
        /// Scenario names to run (comma-separated or multiple values)
        #[arg(value_delimiter = ',')]
        scenarios: Vec<String>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// List all available test scenarios
    ListScenarios {
        /// Filter by tag
        #[arg(short, long)]
        tag: Option<String>,

        /// Show detailed information about each scenario
        #[arg(short, long)]
        detailed: bool,
    },

    /// List all available tags for filtering
    ListTags,

    /// Run interactive test mode
    ///
    /// Opens an interactive menu to browse and run test scenarios
    Interactive,

    /// Show information about a specific scenario
    Info {
        /// Name of the scenario to show info about
        name: String,
    },
}
