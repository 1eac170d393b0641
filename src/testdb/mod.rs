//! Test Database Module
//!
//! This module provides a comprehensive testing framework for the device setup
//! tool that allows testing the full provisioning pass without plugging a
//! phone into the host.
//!
//! Note: Many functions in this module are intentionally kept for API completeness
//! even if not currently used by the CLI.

#![allow(dead_code)]

//!
//! # Features
//!
//! - **Mock Devices**: Simulated Android phones with configurable root state,
//!   API level and failure behavior
//! - **Command Journal**: Every shell command, install, Wi-Fi call and settle
//!   wait is recorded for exact sequence assertions
//! - **Test Scenarios**: Pre-built scenarios covering device states, flag
//!   overrides, Wi-Fi behavior and error conditions
//! - **Test Runner**: Execute scenarios and generate reports
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use device_setup_tool::testdb::{TestRunner, TestRunnerConfig};
//!
//! // Run all quick test scenarios
//! let mut runner = TestRunner::new();
//! let summary = runner.run_quick();
//! println!("Passed: {}/{}", summary.passed, summary.total);
//!
//! // Run specific scenarios by name
//! let mut runner = TestRunner::with_config(TestRunnerConfig {
//!     verbose: true,
//!     ..Default::default()
//! });
//! let summary = runner.run_by_names(&["rooted_pixel", "wifi_connect_refused"]);
//! ```
//!
//! # Available Scenarios
//!
//! ## Device State
//! - `rooted_pixel` - Rooted lab phone, the happy path
//! - `unrooted_phone` - Production build skips root-gated steps
//! - `legacy_api_phone` - API 29 phone without the appops grant
//!
//! ## Flag Overrides
//! - `flag_already_set` - Committed flag detected, no broadcast
//! - `flag_write_ignored` - Dropped broadcast is tolerated
//!
//! ## Wi-Fi
//! - `wifi_disabled_radio` - Radio enabled before connecting
//! - `wifi_connect_refused` - Association rejected by the AP
//! - `no_wifi_configured` - Pass without touching Wi-Fi
//!
//! ## Install
//! - `install_snippet_apk` - Apk installed at the end of the pass
//! - `install_rejected` - Package manager rejects the apk
//!
//! ## Connection
//! - `dead_shell_connection` - Every shell command fails

pub mod mock_device;
pub mod runner;
pub mod scenarios;

// Re-export commonly used types for convenience
pub use mock_device::{CommandRecord, MockDevice, MockDeviceConfig};
pub use runner::{
    ExecutionStats, InteractiveTestMode, ScenarioResult, TestRunner, TestRunnerConfig, TestSummary,
};
pub use scenarios::{ExpectedResults, ProvisionInputs, ScenarioLibrary, TestScenario};

/// Prelude module for easy imports
pub mod prelude {
    pub use super::mock_device::{CommandRecord, MockDevice, MockDeviceConfig};
    pub use super::runner::{TestRunner, TestRunnerConfig, TestSummary};
    pub use super::scenarios::{ProvisionInputs, ScenarioLibrary, TestScenario};
}

/// Quick function to run all tests with default settings
pub fn run_all_tests() -> TestSummary {
    let mut runner = TestRunner::with_config(TestRunnerConfig {
        verbose: true,
        ..Default::default()
    });
    runner.run_all()
}

/// Quick function to run quick tests only
pub fn run_quick_tests() -> TestSummary {
    let mut runner = TestRunner::with_config(TestRunnerConfig {
        verbose: true,
        ..Default::default()
    });
    runner.run_quick()
}

/// Quick function to run tests by tag
pub fn run_tests_by_tag(tag: &str) -> TestSummary {
    let mut runner = TestRunner::with_config(TestRunnerConfig {
        verbose: true,
        ..Default::default()
    });
    runner.run_by_tag(tag)
}

/// Get a list of all available scenario names
pub fn list_scenario_names() -> Vec<String> {
    ScenarioLibrary::all_scenarios()
        .into_iter()
        .map(|s| s.name)
        .collect()
}

/// Get a list of all available tags
pub fn list_tags() -> Vec<String> {
    let mut tags: Vec<String> = ScenarioLibrary::all_scenarios()
        .into_iter()
        .flat_map(|s| s.tags)
        .collect();
    tags.sort();
    tags.dedup();
    tags
}

/// Print available scenarios to console
pub fn print_available_scenarios() {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                  AVAILABLE TEST SCENARIOS                    ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let scenarios = ScenarioLibrary::all_scenarios();

    // Group by first tag
    let mut by_category: std::collections::HashMap<String, Vec<&TestScenario>> =
        std::collections::HashMap::new();

    for scenario in &scenarios {
        let category = scenario
            .tags
            .first()
            .map(|s| s.clone())
            .unwrap_or_else(|| "other".to_string());
        by_category.entry(category).or_default().push(scenario);
    }

    let mut categories: Vec<_> = by_category.keys().cloned().collect();
    categories.sort();

    for category in categories {
        println!("📁 {}", category.to_uppercase());
        if let Some(scenarios) = by_category.get(&category) {
            for scenario in scenarios {
                println!("   • {} - {}", scenario.name, scenario.description);
            }
        }
        println!();
    }

    println!("Total: {} scenarios available\n", scenarios.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_exports() {
        // Verify all exports are accessible
        let _ = MockDevice::new("export-check", MockDeviceConfig::default());
        let _ = TestRunner::new();
        let _ = ScenarioLibrary::quick_scenarios();
        let _ = ProvisionInputs::default();
    }

    #[test]
    fn test_list_functions() {
        let names = list_scenario_names();
        assert!(!names.is_empty());

        let tags = list_tags();
        assert!(!tags.is_empty());
    }

    #[test]
    fn test_quick_tests_run() {
        let summary = run_quick_tests();
        assert!(summary.total > 0);
    }
}
