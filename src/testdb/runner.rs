//! Test runner for executing scenarios and generating reports
//!
//! This module provides functionality to run test scenarios, track results,
//! and generate detailed reports for testing the device setup tool. Each
//! scenario provisions a simulated phone and the runner compares the
//! recorded interactions against the scenario's expected counts.

use super::mock_device::{CommandRecord, MockDevice};
use super::scenarios::{ExpectedResults, ScenarioLibrary, TestScenario};
use crate::core::setup;
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};

/// Result of running a single test scenario
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario name
    pub name: String,
    /// Whether the test passed
    pub passed: bool,
    /// Execution time
    pub duration: Duration,
    /// Interaction counts from the run
    pub stats: ExecutionStats,
    /// Detailed message
    pub message: String,
    /// Expected results for comparison
    pub expected: ExpectedResults,
    /// Failure reason (if any)
    pub failure_reason: Option<String>,
}

impl ScenarioResult {
    /// Create a new passing result
    pub fn passed(name: &str, duration: Duration) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            duration,
            stats: ExecutionStats::default(),
            message: "Test passed".to_string(),
            expected: ExpectedResults::default(),
            failure_reason: None,
        }
    }

    /// Create a new failing result
    pub fn failed(name: &str, duration: Duration, reason: &str) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            duration,
            stats: ExecutionStats::default(),
            message: format!("Test failed: {}", reason),
            expected: ExpectedResults::default(),
            failure_reason: Some(reason.to_string()),
        }
    }

    /// Set interaction statistics
    pub fn with_stats(mut self, stats: ExecutionStats) -> Self {
        self.stats = stats;
        self
    }

    /// Set expected results for comparison
    pub fn with_expected(mut self, expected: ExpectedResults) -> Self {
        self.expected = expected;
        self
    }
}

/// Summary of test run results
#[derive(Debug, Clone, Default)]
pub struct TestSummary {
    /// Total scenarios run
    pub total: usize,
    /// Scenarios that passed
    pub passed: usize,
    /// Scenarios that failed
    pub failed: usize,
    /// Scenarios that were skipped
    pub skipped: usize,
    /// Total execution time
    pub total_duration: Duration,
    /// Results grouped by tag
    pub results_by_tag: HashMap<String, Vec<ScenarioResult>>,
}

impl TestSummary {
    /// Calculate pass rate as percentage
    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            (self.passed as f64 / self.total as f64) * 100.0
        }
    }

    /// Get all failed scenario names
    pub fn failed_scenarios(&self) -> Vec<&str> {
        self.results_by_tag
            .values()
            .flatten()
            .filter(|r| !r.passed)
            .map(|r| r.name.as_str())
            .collect()
    }
}

/// Configuration for test runner
#[derive(Debug, Clone)]
pub struct TestRunnerConfig {
    /// Whether to run in verbose mode
    pub verbose: bool,
    /// Whether to stop on first failure
    pub fail_fast: bool,
    /// Filter scenarios by tags
    pub tag_filter: Option<Vec<String>>,
    /// Filter scenarios by name pattern
    pub name_filter: Option<String>,
    /// Output directory for reports
    pub report_dir: Option<String>,
    /// Whether to generate JSON report
    pub json_report: bool,
}

impl Default for TestRunnerConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            fail_fast: false,
            tag_filter: None,
            name_filter: None,
            report_dir: None,
            json_report: false,
        }
    }
}

/// Test runner for executing scenarios
pub struct TestRunner {
    /// Configuration
    config: TestRunnerConfig,
    /// Results from test runs
    results: Vec<ScenarioResult>,
    /// Start time of test run
    start_time: Option<Instant>,
}

impl TestRunner {
    /// Create a new test runner with default configuration
    pub fn new() -> Self {
        Self {
            config: TestRunnerConfig::default(),
            results: Vec::new(),
            start_time: None,
        }
    }

    /// Create a new test runner with configuration
    pub fn with_config(config: TestRunnerConfig) -> Self {
        Self {
            config,
            results: Vec::new(),
            start_time: None,
        }
    }

    /// Run all available scenarios
    pub fn run_all(&mut self) -> TestSummary {
        let scenarios = ScenarioLibrary::all_scenarios();
        self.run_scenarios(scenarios)
    }

    /// Run quick test scenarios only
    pub fn run_quick(&mut self) -> TestSummary {
        let scenarios = ScenarioLibrary::quick_scenarios();
        self.run_scenarios(scenarios)
    }

    /// Run scenarios filtered by tag
    pub fn run_by_tag(&mut self, tag: &str) -> TestSummary {
        let scenarios = ScenarioLibrary::scenarios_by_tag(tag);
        self.run_scenarios(scenarios)
    }

    /// Run specific scenarios by name
    pub fn run_by_names(&mut self, names: &[&str]) -> TestSummary {
        let all_scenarios = ScenarioLibrary::all_scenarios();
        let scenarios: Vec<_> = all_scenarios
            .into_iter()
            .filter(|s| names.contains(&s.name.as_str()))
            .collect();
        self.run_scenarios(scenarios)
    }

    /// Run a list of scenarios
    pub fn run_scenarios(&mut self, scenarios: Vec<TestScenario>) -> TestSummary {
        self.start_time = Some(Instant::now());
        self.results.clear();

        let filtered_scenarios = self.filter_scenarios(scenarios);

        if self.config.verbose {
            println!("\n╔══════════════════════════════════════════════════════════════╗");
            println!("║               DEVICE SETUP TOOL - TEST RUNNER                ║");
            println!("╠══════════════════════════════════════════════════════════════╣");
            println!(
                "║  Running {} scenario(s)                                       ",
                filtered_scenarios.len()
            );
            println!("╚══════════════════════════════════════════════════════════════╝\n");
        }

        for scenario in filtered_scenarios {
            let result = self.run_single_scenario(scenario);

            if self.config.verbose {
                self.print_result(&result);
            }

            let should_stop = self.config.fail_fast && !result.passed;
            self.results.push(result);

            if should_stop {
                if self.config.verbose {
                    println!("\n⚠️  Stopping early due to fail-fast mode\n");
                }
                break;
            }
        }

        let summary = self.generate_summary();

        if self.config.verbose {
            self.print_summary(&summary);
        }

        // Generate reports if configured
        if let Some(ref dir) = self.config.report_dir {
            if self.config.json_report {
                let _ = self.generate_json_report(dir, &summary);
            }
        }

        summary
    }

    /// Filter scenarios based on configuration
    fn filter_scenarios(&self, scenarios: Vec<TestScenario>) -> Vec<TestScenario> {
        let mut filtered = scenarios;

        // Filter by tags
        if let Some(ref tags) = self.config.tag_filter {
            filtered = filtered
                .into_iter()
                .filter(|s| s.tags.iter().any(|t| tags.contains(t)))
                .collect();
        }

        // Filter by name pattern
        if let Some(ref pattern) = self.config.name_filter {
            let pattern_lower = pattern.to_lowercase();
            filtered = filtered
                .into_iter()
                .filter(|s| s.name.to_lowercase().contains(&pattern_lower))
                .collect();
        }

        filtered
    }

    /// Run a single scenario
    fn run_single_scenario(&self, scenario: TestScenario) -> ScenarioResult {
        let start = Instant::now();

        if self.config.verbose {
            println!("▶ Running: {} - {}", scenario.name, scenario.description);
        }

        // Execute the scenario
        let result = self.execute_scenario(&scenario);

        let duration = start.elapsed();

        match result {
            Ok(stats) => {
                if !scenario.expected.should_succeed {
                    return ScenarioResult::failed(
                        &scenario.name,
                        duration,
                        "Expected the pass to fail but it succeeded",
                    )
                    .with_stats(stats)
                    .with_expected(scenario.expected);
                }

                // Compare with expected results
                match Self::compare_results(&stats, &scenario.expected) {
                    None => ScenarioResult::passed(&scenario.name, duration)
                        .with_stats(stats)
                        .with_expected(scenario.expected),
                    Some(mismatch) => ScenarioResult::failed(&scenario.name, duration, &mismatch)
                        .with_stats(stats)
                        .with_expected(scenario.expected),
                }
            }
            Err(error) => {
                // Check if error was expected
                if !scenario.expected.should_succeed {
                    if let Some(ref expected_error) = scenario.expected.expected_error {
                        if error.contains(expected_error) {
                            return ScenarioResult::passed(&scenario.name, duration)
                                .with_expected(scenario.expected);
                        }
                    }
                }

                ScenarioResult::failed(&scenario.name, duration, &error)
                    .with_expected(scenario.expected)
            }
        }
    }

    /// Provision a simulated phone and collect interaction statistics
    fn execute_scenario(&self, scenario: &TestScenario) -> Result<ExecutionStats, String> {
        let device = MockDevice::new(&scenario.serial, scenario.device_config.clone());
        let inputs = &scenario.inputs;
        let mut skipped_steps = 0;

        if let Some(ref country_code) = inputs.country_code {
            let outcome = setup::set_wifi_country_code(&device, country_code)
                .map_err(|e| format!("{:?}", e))?;
            if outcome.is_skipped() {
                skipped_steps += 1;
            }
        }

        setup::enable_logs(&device).map_err(|e| format!("{:?}", e))?;
        setup::grant_manage_external_storage_permission(&device, &inputs.storage_package)
            .map_err(|e| format!("{:?}", e))?;
        setup::enable_bluetooth_multiplex(&device).map_err(|e| format!("{:?}", e))?;
        setup::dump_gms_version(&device).map_err(|e| format!("{:?}", e))?;

        if let Some(ref ssid) = inputs.wifi_ssid {
            setup::connect_to_wifi_wlan_till_success(&device, ssid, &inputs.wifi_password)
                .map_err(|e| format!("{:?}", e))?;
        }

        if let Some(ref apk) = inputs.apk {
            setup::install_apk(&device, apk).map_err(|e| format!("{:?}", e))?;
        }

        Ok(Self::collect_stats(&device, skipped_steps))
    }

    /// Count interactions from the journal of a finished run
    fn collect_stats(device: &MockDevice, skipped_steps: usize) -> ExecutionStats {
        let mut stats = ExecutionStats {
            skipped_steps,
            ..Default::default()
        };

        for record in device.journal() {
            match record {
                CommandRecord::Shell(command) => {
                    stats.shell_commands += 1;
                    if command.starts_with("setprop log.tag.") {
                        stats.verbose_tags += 1;
                    }
                    if command.starts_with("appops set") {
                        stats.appops_grants += 1;
                    }
                    if command.starts_with("am broadcast") && command.contains("FLAG_OVERRIDE") {
                        stats.flag_broadcasts += 1;
                    }
                }
                CommandRecord::Settle(_) => stats.settle_requests += 1,
                CommandRecord::WifiStatusQuery => {}
                CommandRecord::WifiEnable => stats.radio_enables += 1,
                CommandRecord::WifiConnect { .. } => stats.wifi_connect_attempts += 1,
                CommandRecord::Install(_) => stats.installs += 1,
            }
        }

        stats
    }

    /// Compare actual counts with expected results
    ///
    /// Returns the first mismatch, or `None` when everything lines up.
    fn compare_results(actual: &ExecutionStats, expected: &ExpectedResults) -> Option<String> {
        let checks = [
            ("verbose tags", actual.verbose_tags, expected.verbose_tags),
            ("appops grants", actual.appops_grants, expected.appops_grants),
            (
                "flag broadcasts",
                actual.flag_broadcasts,
                expected.flag_broadcasts,
            ),
            ("radio enables", actual.radio_enables, expected.radio_enables),
            (
                "wifi connects",
                actual.wifi_connect_attempts,
                expected.wifi_connect_attempts,
            ),
            ("installs", actual.installs, expected.installs),
            ("skipped steps", actual.skipped_steps, expected.skipped_steps),
        ];

        for (what, actual, expected) in checks {
            if actual != expected {
                return Some(format!("{}: expected {}, got {}", what, expected, actual));
            }
        }
        None
    }

    /// Generate summary from results
    fn generate_summary(&self) -> TestSummary {
        let mut summary = TestSummary::default();

        summary.total = self.results.len();
        summary.passed = self.results.iter().filter(|r| r.passed).count();
        summary.failed = self.results.iter().filter(|r| !r.passed).count();
        summary.total_duration = self
            .start_time
            .map(|s| s.elapsed())
            .unwrap_or(Duration::ZERO);

        // Group by tags
        for result in &self.results {
            summary
                .results_by_tag
                .entry("all".to_string())
                .or_default()
                .push(result.clone());
        }

        summary
    }

    /// Print a single result to console
    fn print_result(&self, result: &ScenarioResult) {
        let status = if result.passed {
            "✓ PASS"
        } else {
            "✗ FAIL"
        };
        let status_color = if result.passed {
            "\x1b[32m"
        } else {
            "\x1b[31m"
        };

        println!(
            "  {}{}\x1b[0m - {} ({:.2}ms)",
            status_color,
            status,
            result.name,
            result.duration.as_secs_f64() * 1000.0
        );

        if !result.passed {
            if let Some(ref reason) = result.failure_reason {
                println!("      └─ Reason: {}", reason);
            }
        }

        if self.config.verbose && result.stats.shell_commands > 0 {
            println!(
                "      └─ Commands: {} shell, {} settles, {} skipped steps",
                result.stats.shell_commands,
                result.stats.settle_requests,
                result.stats.skipped_steps
            );
        }
    }

    /// Print summary to console
    fn print_summary(&self, summary: &TestSummary) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                        TEST SUMMARY                          ║");
        println!("╠══════════════════════════════════════════════════════════════╣");
        println!(
            "║  Total:    {:>4}                                              ║",
            summary.total
        );
        println!(
            "║  Passed:   {:>4} \x1b[32m✓\x1b[0m                                             ║",
            summary.passed
        );
        println!(
            "║  Failed:   {:>4} \x1b[31m✗\x1b[0m                                             ║",
            summary.failed
        );
        println!(
            "║  Skipped:  {:>4}                                              ║",
            summary.skipped
        );
        println!("╠══════════════════════════════════════════════════════════════╣");
        println!(
            "║  Pass Rate: {:>5.1}%                                          ║",
            summary.pass_rate()
        );
        println!(
            "║  Duration:  {:>5.2}s                                          ║",
            summary.total_duration.as_secs_f64()
        );
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        if !summary.failed_scenarios().is_empty() {
            println!("Failed scenarios:");
            for name in summary.failed_scenarios() {
                println!("  • {}", name);
            }
            println!();
        }
    }

    /// Generate JSON report
    fn generate_json_report(&self, dir: &str, summary: &TestSummary) -> std::io::Result<()> {
        let path = Path::new(dir).join("test_report.json");
        let mut file = File::create(&path)?;

        let results: Vec<serde_json::Value> = self
            .results
            .iter()
            .map(|result| {
                serde_json::json!({
                    "name": result.name,
                    "passed": result.passed,
                    "duration_ms": result.duration.as_secs_f64() * 1000.0,
                    "shell_commands": result.stats.shell_commands,
                    "settle_requests": result.stats.settle_requests,
                    "skipped_steps": result.stats.skipped_steps,
                    "failure_reason": result.failure_reason,
                })
            })
            .collect();

        let report = serde_json::json!({
            "generated": chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            "summary": {
                "total": summary.total,
                "passed": summary.passed,
                "failed": summary.failed,
                "pass_rate": summary.pass_rate(),
                "duration_seconds": summary.total_duration.as_secs_f64(),
            },
            "results": results,
        });

        let body = serde_json::to_string_pretty(&report).map_err(std::io::Error::other)?;
        file.write_all(body.as_bytes())?;

        if self.config.verbose {
            println!("📄 JSON report generated: {}", path.display());
        }

        Ok(())
    }

    /// Get all results
    pub fn results(&self) -> &[ScenarioResult] {
        &self.results
    }
}

impl Default for TestRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Interaction counts from scenario execution
#[derive(Debug, Clone, Default)]
pub struct ExecutionStats {
    /// Shell commands issued
    pub shell_commands: usize,
    /// Settle waits requested
    pub settle_requests: usize,
    /// Log tags switched to verbose
    pub verbose_tags: usize,
    /// Appops permission grants
    pub appops_grants: usize,
    /// Flag override broadcasts
    pub flag_broadcasts: usize,
    /// Wi-Fi radio enables
    pub radio_enables: usize,
    /// Wi-Fi connect attempts
    pub wifi_connect_attempts: usize,
    /// Package installs
    pub installs: usize,
    /// Steps reported as skipped
    pub skipped_steps: usize,
}

/// Interactive test mode for manual testing
pub struct InteractiveTestMode {
    /// Current scenario index
    current_scenario: usize,
    /// Available scenarios
    scenarios: Vec<TestScenario>,
    /// Test runner
    runner: TestRunner,
}

impl InteractiveTestMode {
    /// Create new interactive mode
    pub fn new() -> Self {
        Self {
            current_scenario: 0,
            scenarios: ScenarioLibrary::all_scenarios(),
            runner: TestRunner::with_config(TestRunnerConfig {
                verbose: true,
                ..Default::default()
            }),
        }
    }

    /// List all available scenarios
    pub fn list_scenarios(&self) {
        println!("\n📋 Available Test Scenarios:\n");
        for (i, scenario) in self.scenarios.iter().enumerate() {
            let marker = if i == self.current_scenario {
                "▶"
            } else {
                " "
            };
            println!(
                "{} {:2}. {} - {}",
                marker,
                i + 1,
                scenario.name,
                scenario.description
            );
            if !scenario.tags.is_empty() {
                println!("      Tags: {}", scenario.tags.join(", "));
            }
        }
        println!();
    }

    /// Get scenario by name
    pub fn get_scenario(&self, name: &str) -> Option<&TestScenario> {
        self.scenarios.iter().find(|s| s.name == name)
    }

    /// Get scenario count
    pub fn scenario_count(&self) -> usize {
        self.scenarios.len()
    }

    /// Select a scenario by index
    pub fn select_scenario(&mut self, index: usize) -> bool {
        if index < self.scenarios.len() {
            self.current_scenario = index;
            true
        } else {
            false
        }
    }

    /// Get current scenario
    pub fn current_scenario(&self) -> Option<&TestScenario> {
        self.scenarios.get(self.current_scenario)
    }

    /// Run current scenario
    pub fn run_current(&mut self) -> Option<ScenarioResult> {
        if let Some(scenario) = self.scenarios.get(self.current_scenario).cloned() {
            let summary = self.runner.run_scenarios(vec![scenario]);
            summary
                .results_by_tag
                .get("all")
                .and_then(|r| r.first().cloned())
        } else {
            None
        }
    }
}

impl Default for InteractiveTestMode {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runner_creation() {
        let runner = TestRunner::new();
        assert!(runner.results.is_empty());
    }

    #[test]
    fn test_quick_scenarios_all_pass() {
        let mut runner = TestRunner::with_config(TestRunnerConfig {
            verbose: false,
            ..Default::default()
        });

        let summary = runner.run_quick();

        assert_eq!(summary.total, 5);
        assert_eq!(summary.failed, 0, "failed: {:?}", summary.failed_scenarios());
    }

    #[test]
    fn test_all_scenarios_pass() {
        let mut runner = TestRunner::new();

        let summary = runner.run_all();

        assert_eq!(summary.total, ScenarioLibrary::all_scenarios().len());
        assert_eq!(summary.failed, 0, "failed: {:?}", summary.failed_scenarios());
    }

    #[test]
    fn test_tag_filter_limits_run() {
        let mut runner = TestRunner::with_config(TestRunnerConfig {
            tag_filter: Some(vec!["wifi".to_string()]),
            ..Default::default()
        });

        let summary = runner.run_all();

        assert_eq!(summary.total, ScenarioLibrary::scenarios_by_tag("wifi").len());
    }

    #[test]
    fn test_mismatch_names_the_counter() {
        let mut wrong = ScenarioLibrary::rooted_pixel();
        wrong.expected.verbose_tags = 5; // wrong on purpose

        let mut runner = TestRunner::new();
        let summary = runner.run_scenarios(vec![wrong]);

        assert_eq!(summary.failed, 1);
        let reason = runner.results()[0].failure_reason.clone().unwrap_or_default();
        assert!(reason.contains("verbose tags"), "reason: {}", reason);
    }

    #[test]
    fn test_fail_fast_stops_after_first_failure() {
        let mut wrong = ScenarioLibrary::rooted_pixel();
        wrong.expected.appops_grants = 7; // wrong on purpose

        let mut runner = TestRunner::with_config(TestRunnerConfig {
            fail_fast: true,
            ..Default::default()
        });
        let summary = runner.run_scenarios(vec![wrong, ScenarioLibrary::unrooted_phone()]);

        assert_eq!(summary.total, 1);
        assert_eq!(summary.failed, 1);
    }

    #[test]
    fn test_json_report_written() {
        let dir = tempfile::tempdir().unwrap();
        let mut runner = TestRunner::with_config(TestRunnerConfig {
            report_dir: Some(dir.path().to_string_lossy().to_string()),
            json_report: true,
            ..Default::default()
        });

        runner.run_quick();

        let body = std::fs::read_to_string(dir.path().join("test_report.json")).unwrap();
        let report: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(report["summary"]["total"], 5);
        assert_eq!(report["results"].as_array().unwrap().len(), 5);
    }

    #[test]
    fn test_scenario_result() {
        let result = ScenarioResult::passed("test", Duration::from_millis(100));
        assert!(result.passed);
        assert_eq!(result.name, "test");

        let failed = ScenarioResult::failed("test2", Duration::from_millis(50), "some error");
        assert!(!failed.passed);
        assert_eq!(failed.failure_reason, Some("some error".to_string()));
    }

    #[test]
    fn test_summary_pass_rate() {
        let mut summary = TestSummary::default();
        summary.total = 10;
        summary.passed = 8;
        summary.failed = 2;

        assert!((summary.pass_rate() - 80.0).abs() < 0.001);
    }

    #[test]
    fn test_interactive_mode() {
        let mode = InteractiveTestMode::new();
        assert!(mode.scenario_count() > 0);
        assert!(mode.current_scenario().is_some());
    }
}
