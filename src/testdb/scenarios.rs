//! Predefined test scenarios for comprehensive testing
//!
//! This module provides ready-to-use test scenarios that cover various
//! device states, edge cases, and error conditions for the device setup
//! tool. Each scenario pairs a simulated phone with the provisioning
//! inputs to run and the interaction counts the run should produce.

use super::mock_device::MockDeviceConfig;
use std::path::PathBuf;

/// A complete test scenario with device behavior and provisioning inputs
#[derive(Debug, Clone)]
pub struct TestScenario {
    /// Scenario name for identification
    pub name: String,
    /// Description of what this scenario tests
    pub description: String,
    /// Serial assigned to the simulated phone
    pub serial: String,
    /// Behavior of the simulated phone
    pub device_config: MockDeviceConfig,
    /// Provisioning inputs fed to the run
    pub inputs: ProvisionInputs,
    /// Expected interaction counts after the run
    pub expected: ExpectedResults,
    /// Tags for filtering scenarios
    pub tags: Vec<String>,
}

/// Inputs for one provisioning pass
#[derive(Debug, Clone)]
pub struct ProvisionInputs {
    /// Country code to force, or `None` to leave the step out
    pub country_code: Option<String>,
    /// Network to join, or `None` to leave Wi-Fi alone
    pub wifi_ssid: Option<String>,
    /// WPA2 passphrase; an empty string means an open network
    pub wifi_password: String,
    /// Package receiving the storage permission grant
    pub storage_package: String,
    /// Apk to install at the end of the pass, if any
    pub apk: Option<PathBuf>,
}

impl Default for ProvisionInputs {
    fn default() -> Self {
        Self {
            country_code: Some("US".to_string()),
            wifi_ssid: Some("GoogleGuest".to_string()),
            wifi_password: String::new(),
            storage_package: "com.google.android.nearby.mobly.snippet".to_string(),
            apk: None,
        }
    }
}

/// Expected interaction counts from running a provisioning pass
#[derive(Debug, Clone, Default)]
pub struct ExpectedResults {
    /// Expected number of log tags switched to verbose
    pub verbose_tags: usize,
    /// Expected number of appops permission grants
    pub appops_grants: usize,
    /// Expected number of flag override broadcasts
    pub flag_broadcasts: usize,
    /// Expected number of Wi-Fi radio enables
    pub radio_enables: usize,
    /// Expected number of Wi-Fi connect attempts
    pub wifi_connect_attempts: usize,
    /// Expected number of package installs
    pub installs: usize,
    /// Expected number of steps reported as skipped
    pub skipped_steps: usize,
    /// Should the provisioning pass succeed
    pub should_succeed: bool,
    /// Expected error type (if should_succeed is false)
    pub expected_error: Option<String>,
}

impl TestScenario {
    /// Create a new test scenario
    pub fn new(
        name: &str,
        description: &str,
        serial: &str,
        device_config: MockDeviceConfig,
        inputs: ProvisionInputs,
        expected: ExpectedResults,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            serial: serial.to_string(),
            device_config,
            inputs,
            expected,
            tags: Vec::new(),
        }
    }

    /// Add tags to the scenario
    pub fn with_tags(mut self, tags: Vec<&str>) -> Self {
        self.tags = tags.into_iter().map(String::from).collect();
        self
    }
}

/// Collection of all predefined test scenarios
pub struct ScenarioLibrary;

impl ScenarioLibrary {
    // =========================================================================
    // DEVICE STATE SCENARIOS
    // =========================================================================

    /// Scenario: Rooted lab phone, the happy path
    pub fn rooted_pixel() -> TestScenario {
        TestScenario::new(
            "rooted_pixel",
            "Rooted userdebug Pixel runs the full pass with nothing skipped",
            "17301JEC201234",
            MockDeviceConfig::default(),
            ProvisionInputs::default(),
            ExpectedResults {
                verbose_tags: 6,
                appops_grants: 1,
                flag_broadcasts: 1,
                wifi_connect_attempts: 1,
                should_succeed: true,
                ..Default::default()
            },
        )
        .with_tags(vec!["device", "rooted", "basic"])
    }

    /// Scenario: Production build without adb root
    pub fn unrooted_phone() -> TestScenario {
        TestScenario::new(
            "unrooted_phone",
            "Unrooted phone skips the country code step and completes the rest",
            "28161FDH3000EP",
            MockDeviceConfig::unrooted(),
            ProvisionInputs::default(),
            ExpectedResults {
                verbose_tags: 6,
                appops_grants: 1,
                flag_broadcasts: 1,
                wifi_connect_attempts: 1,
                skipped_steps: 1,
                should_succeed: true,
                ..Default::default()
            },
        )
        .with_tags(vec!["device", "unrooted", "skip"])
    }

    /// Scenario: Phone below API 30
    pub fn legacy_api_phone() -> TestScenario {
        TestScenario::new(
            "legacy_api_phone",
            "API 29 phone gets no appops grant, everything else runs",
            "9B021FFAZ004T1",
            MockDeviceConfig::legacy_api(),
            ProvisionInputs::default(),
            ExpectedResults {
                verbose_tags: 6,
                appops_grants: 0,
                flag_broadcasts: 1,
                wifi_connect_attempts: 1,
                should_succeed: true,
                ..Default::default()
            },
        )
        .with_tags(vec!["device", "legacy"])
    }

    // =========================================================================
    // FLAG OVERRIDE SCENARIOS
    // =========================================================================

    /// Scenario: Flag already committed in the phenotype database
    pub fn flag_already_set() -> TestScenario {
        TestScenario::new(
            "flag_already_set",
            "Committed bt multiplex flag is detected, no broadcast is sent",
            "17301JEC201234",
            MockDeviceConfig::flag_preset(),
            ProvisionInputs::default(),
            ExpectedResults {
                verbose_tags: 6,
                appops_grants: 1,
                flag_broadcasts: 0,
                wifi_connect_attempts: 1,
                should_succeed: true,
                ..Default::default()
            },
        )
        .with_tags(vec!["flags", "preset"])
    }

    /// Scenario: GMS never commits the flag override
    pub fn flag_write_ignored() -> TestScenario {
        TestScenario::new(
            "flag_write_ignored",
            "Dropped flag broadcast is logged and tolerated, the pass continues",
            "17301JEC201234",
            MockDeviceConfig::default().with_ignored_flag_broadcasts(),
            ProvisionInputs::default(),
            ExpectedResults {
                verbose_tags: 6,
                appops_grants: 1,
                flag_broadcasts: 1,
                wifi_connect_attempts: 1,
                should_succeed: true,
                ..Default::default()
            },
        )
        .with_tags(vec!["flags", "resilience"])
    }

    // =========================================================================
    // WI-FI SCENARIOS
    // =========================================================================

    /// Scenario: Radio starts disabled
    pub fn wifi_disabled_radio() -> TestScenario {
        TestScenario::new(
            "wifi_disabled_radio",
            "Disabled Wi-Fi radio is enabled before the connect attempt",
            "emulator-5554",
            MockDeviceConfig::default().with_wifi_disabled(),
            ProvisionInputs::default(),
            ExpectedResults {
                verbose_tags: 6,
                appops_grants: 1,
                flag_broadcasts: 1,
                radio_enables: 1,
                wifi_connect_attempts: 1,
                should_succeed: true,
                ..Default::default()
            },
        )
        .with_tags(vec!["wifi", "radio"])
    }

    /// Scenario: Access point rejects the association
    pub fn wifi_connect_refused() -> TestScenario {
        TestScenario::new(
            "wifi_connect_refused",
            "Rejected Wi-Fi association fails the pass with a connect error",
            "emulator-5554",
            MockDeviceConfig::default().with_connect_failure(),
            ProvisionInputs {
                wifi_password: "wrong-passphrase".to_string(),
                ..Default::default()
            },
            ExpectedResults {
                verbose_tags: 6,
                appops_grants: 1,
                flag_broadcasts: 1,
                wifi_connect_attempts: 1,
                should_succeed: false,
                expected_error: Some("WifiConnectError".to_string()),
                ..Default::default()
            },
        )
        .with_tags(vec!["wifi", "error"])
    }

    /// Scenario: No network configured
    pub fn no_wifi_configured() -> TestScenario {
        TestScenario::new(
            "no_wifi_configured",
            "Without a configured SSID the pass never touches Wi-Fi",
            "17301JEC201234",
            MockDeviceConfig::default(),
            ProvisionInputs {
                wifi_ssid: None,
                ..Default::default()
            },
            ExpectedResults {
                verbose_tags: 6,
                appops_grants: 1,
                flag_broadcasts: 1,
                wifi_connect_attempts: 0,
                should_succeed: true,
                ..Default::default()
            },
        )
        .with_tags(vec!["wifi", "config"])
    }

    // =========================================================================
    // INSTALL SCENARIOS
    // =========================================================================

    /// Scenario: Snippet apk installed at the end of the pass
    pub fn install_snippet_apk() -> TestScenario {
        TestScenario::new(
            "install_snippet_apk",
            "Configured apk is installed after the setup steps",
            "17301JEC201234",
            MockDeviceConfig::default(),
            ProvisionInputs {
                apk: Some(PathBuf::from("/tmp/mobly-snippet.apk")),
                ..Default::default()
            },
            ExpectedResults {
                verbose_tags: 6,
                appops_grants: 1,
                flag_broadcasts: 1,
                wifi_connect_attempts: 1,
                installs: 1,
                should_succeed: true,
                ..Default::default()
            },
        )
        .with_tags(vec!["install", "basic"])
    }

    /// Scenario: Package manager rejects the apk
    pub fn install_rejected() -> TestScenario {
        TestScenario::new(
            "install_rejected",
            "Rejected install fails the pass with an install error",
            "17301JEC201234",
            MockDeviceConfig::default().with_install_failure(),
            ProvisionInputs {
                apk: Some(PathBuf::from("/tmp/mobly-snippet.apk")),
                ..Default::default()
            },
            ExpectedResults {
                verbose_tags: 6,
                appops_grants: 1,
                flag_broadcasts: 1,
                wifi_connect_attempts: 1,
                installs: 1,
                should_succeed: false,
                expected_error: Some("InstallError".to_string()),
                ..Default::default()
            },
        )
        .with_tags(vec!["install", "error"])
    }

    // =========================================================================
    // CONNECTION SCENARIOS
    // =========================================================================

    /// Scenario: Every shell command fails
    pub fn dead_shell_connection() -> TestScenario {
        TestScenario::new(
            "dead_shell_connection",
            "Shell failures on every command abort the pass at the first step",
            "28161FDH3000EP",
            MockDeviceConfig::flaky(100),
            ProvisionInputs::default(),
            ExpectedResults {
                should_succeed: false,
                expected_error: Some("ShellError".to_string()),
                ..Default::default()
            },
        )
        .with_tags(vec!["error", "resilience"])
    }

    // =========================================================================
    // HELPER FUNCTIONS
    // =========================================================================

    /// Get all available scenarios
    pub fn all_scenarios() -> Vec<TestScenario> {
        vec![
            Self::rooted_pixel(),
            Self::unrooted_phone(),
            Self::legacy_api_phone(),
            Self::flag_already_set(),
            Self::flag_write_ignored(),
            Self::wifi_disabled_radio(),
            Self::wifi_connect_refused(),
            Self::no_wifi_configured(),
            Self::install_snippet_apk(),
            Self::install_rejected(),
            Self::dead_shell_connection(),
        ]
    }

    /// Get scenarios by tag
    pub fn scenarios_by_tag(tag: &str) -> Vec<TestScenario> {
        Self::all_scenarios()
            .into_iter()
            .filter(|s| s.tags.iter().any(|t| t == tag))
            .collect()
    }

    /// Get quick test scenarios (fast to run)
    pub fn quick_scenarios() -> Vec<TestScenario> {
        vec![
            Self::rooted_pixel(),
            Self::unrooted_phone(),
            Self::legacy_api_phone(),
            Self::flag_already_set(),
            Self::wifi_connect_refused(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_scenarios_load() {
        let scenarios = ScenarioLibrary::all_scenarios();
        assert!(!scenarios.is_empty());
        println!("Loaded {} test scenarios", scenarios.len());
    }

    #[test]
    fn test_scenario_names_unique() {
        let scenarios = ScenarioLibrary::all_scenarios();
        let mut names: Vec<&str> = scenarios.iter().map(|s| s.name.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), scenarios.len());
    }

    #[test]
    fn test_scenario_by_tag() {
        let error_scenarios = ScenarioLibrary::scenarios_by_tag("error");
        assert!(!error_scenarios.is_empty());
        for s in &error_scenarios {
            assert!(s.tags.contains(&"error".to_string()));
        }
    }

    #[test]
    fn test_quick_scenarios() {
        let quick = ScenarioLibrary::quick_scenarios();
        assert_eq!(quick.len(), 5);
    }

    #[test]
    fn test_failing_scenarios_name_their_error() {
        for scenario in ScenarioLibrary::all_scenarios() {
            if !scenario.expected.should_succeed {
                assert!(
                    scenario.expected.expected_error.is_some(),
                    "scenario '{}' expects failure but names no error",
                    scenario.name
                );
            }
        }
    }
}
