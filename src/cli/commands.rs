//! Command handler implementations
//!
//! This module contains the implementation of all CLI commands.

use crate::cli::progress::{self, format_duration, StepProgress};
use crate::cli::{Args, Commands, TestCommands};
use crate::core::config::{get_config_path, init_config, open_config_in_editor, Config};
use crate::core::report::{ProvisionReport, StepOutcome};
use crate::core::setup::{self, SetupOutcome};
use crate::device::{self, AdbDevice, DeviceControl};
use crate::testdb::{self, InteractiveTestMode, ScenarioLibrary, TestRunner, TestRunnerConfig};
use anyhow::Result;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;
use log::{error, info, warn};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Run the appropriate command based on CLI arguments
///
/// Without a subcommand the tool runs the full provisioning pass, the same
/// as `provision` with default flags.
pub fn run_command(args: &Args, config: &Config, shutdown_flag: Arc<AtomicBool>) -> Result<()> {
    match &args.command {
        Some(Commands::Provision {
            apk,
            skip_wifi,
            report,
            yes,
        }) => {
            provision(config, apk.clone(), *skip_wifi, *report, *yes, shutdown_flag)?;
        }
        None => {
            provision(config, None, false, false, false, shutdown_flag)?;
        }
        Some(Commands::List { all }) => {
            list_devices(config, *all)?;
        }
        Some(Commands::Wifi { ssid, password }) => {
            wifi_connect(config, ssid, password.as_deref())?;
        }
        Some(Commands::CountryCode { code }) => {
            set_country_code(config, code)?;
        }
        Some(Commands::Airplane { state }) => {
            airplane_mode(config, state)?;
        }
        Some(Commands::EnableLogs) => {
            enable_logs(config)?;
        }
        Some(Commands::GrantStorage { package }) => {
            grant_storage(config, package.clone())?;
        }
        Some(Commands::EnableMultiplex) => {
            enable_multiplex(config)?;
        }
        Some(Commands::DumpGms) => {
            dump_gms(config)?;
        }
        Some(Commands::Install { apk }) => {
            install(config, apk)?;
        }
        Some(Commands::Config { path, reset }) => {
            handle_config_command(*path, *reset)?;
        }
        Some(Commands::GenerateConfig { output }) => {
            generate_config_file(output.clone())?;
        }
        Some(Commands::ShowConfig) => {
            show_config(config);
        }
        Some(Commands::Test { test_command }) => {
            handle_test_command(test_command)?;
        }
    }

    Ok(())
}

/// Open the device the command should act on
fn open_device(config: &Config) -> Result<AdbDevice> {
    let device = device::open_target(&config.device.adb_path, config.device.serial.as_deref())?;
    Ok(device)
}

/// Print the usual checklist for a device that does not show up
fn print_connect_help() {
    println!();
    println!("  Make sure your device is:");
    println!("    1. Connected via USB cable (or reachable over TCP)");
    println!("    2. Running with USB debugging enabled in developer options");
    println!("    3. Authorized for this computer (tap 'Allow' when prompted)");
    println!();
    println!("  Use 'list' to see the devices adb knows about");
    println!();
}

// =========================================================================
// PROVISIONING PASS
// =========================================================================

/// Run the full provisioning pass on a device
///
/// Steps are enabled through the `[provisioning]` config section; the pass
/// stops at the first failed step. A JSON report is written when requested
/// via `--report` or the `[report]` config section.
pub fn provision(
    config: &Config,
    apk_override: Option<PathBuf>,
    skip_wifi: bool,
    force_report: bool,
    assume_yes: bool,
    shutdown_flag: Arc<AtomicBool>,
) -> Result<()> {
    let provisioning = &config.provisioning;
    let apk = apk_override.or_else(|| provisioning.apk.clone());
    let wifi_ssid = if provisioning.connect_wifi && !skip_wifi {
        config.wifi.ssid.clone()
    } else {
        None
    };

    // Work out how many steps will actually run
    let mut total = 0;
    if provisioning.set_country_code {
        total += 1;
    }
    if provisioning.enable_verbose_logs {
        total += 1;
    }
    if provisioning.grant_storage_permission {
        total += 1;
    }
    if provisioning.enable_bluetooth_multiplex {
        total += 1;
    }
    if provisioning.dump_gms_version {
        total += 1;
    }
    if wifi_ssid.is_some() {
        total += 1;
    }
    if apk.is_some() {
        total += 1;
    }

    if total == 0 {
        progress::print_warning("All provisioning steps are disabled in the config, nothing to do");
        return Ok(());
    }

    let device = match open_device(config) {
        Ok(device) => device,
        Err(e) => {
            progress::print_error(&e.to_string());
            print_connect_help();
            return Err(e);
        }
    };

    progress::print_header("DEVICE SETUP");
    progress::print_info(&format!("Device:   {}", device.serial()));
    progress::print_info(&format!(
        "Rooted:   {}",
        if device.is_adb_root() { "yes" } else { "no" }
    ));
    progress::print_info(&format!(
        "API:      {}",
        device.build_info().version_sdk()
    ));
    if let Some(ref ssid) = wifi_ssid {
        progress::print_info(&format!("Wi-Fi:    {}", ssid));
    }
    if let Some(ref apk) = apk {
        progress::print_info(&format!("APK:      {}", apk.display()));
    }
    println!();

    if !assume_yes {
        let proceed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!(
                "Provision {} with {} step(s)?",
                device.serial(),
                total
            ))
            .default(true)
            .interact()?;
        if !proceed {
            println!();
            println!("  Cancelled.");
            return Ok(());
        }
        println!();
    }

    let mut report = ProvisionReport::new(device.serial());
    let step_progress = StepProgress::new(total);

    let pass_result = run_provision_steps(
        &device,
        config,
        wifi_ssid.as_deref(),
        apk.as_deref(),
        &mut report,
        &step_progress,
        &shutdown_flag,
    );

    report.finish();
    step_progress.finish_with_summary(
        report.completed_steps(),
        report.skipped_steps(),
        report.failed_steps(),
    );

    if force_report || config.report.enabled {
        match report.save(&config.report.directory) {
            Ok(path) => progress::print_info(&format!("Report written to {}", path.display())),
            Err(e) => warn!("Failed to write provisioning report: {}", e),
        }
    }

    pass_result
}

/// Execute the enabled setup steps in order, stopping at the first failure
fn run_provision_steps(
    device: &AdbDevice,
    config: &Config,
    wifi_ssid: Option<&str>,
    apk: Option<&Path>,
    report: &mut ProvisionReport,
    progress: &StepProgress,
    shutdown_flag: &AtomicBool,
) -> Result<()> {
    let provisioning = &config.provisioning;

    if provisioning.set_country_code {
        check_interrupted(shutdown_flag)?;
        run_step(
            progress,
            report,
            "set_country_code",
            "Setting Wi-Fi country code",
            format!("Wi-Fi country code set to {}", config.wifi.country_code),
            || setup::set_wifi_country_code(device, &config.wifi.country_code),
        )?;
    }

    if provisioning.enable_verbose_logs {
        check_interrupted(shutdown_flag)?;
        run_step(
            progress,
            report,
            "enable_verbose_logs",
            "Enabling verbose Nearby logs",
            format!("{} log tags set to VERBOSE", setup::LOG_TAGS.len()),
            || setup::enable_logs(device).map(|_| SetupOutcome::Done),
        )?;
    }

    if provisioning.grant_storage_permission {
        check_interrupted(shutdown_flag)?;
        let sdk = device.build_info().version_sdk();
        if sdk < 30 {
            // The grant only exists on API 30+, report it as a skip instead
            // of silently doing nothing
            progress.start_step("Granting storage permission");
            let reason = format!(
                "MANAGE_EXTERNAL_STORAGE needs API 30, device reports API {}",
                sdk
            );
            progress.step_skipped(&reason);
            report.record_step(
                "grant_storage_permission",
                StepOutcome::Skipped,
                Some(reason),
                Duration::ZERO,
            );
        } else {
            run_step(
                progress,
                report,
                "grant_storage_permission",
                "Granting storage permission",
                format!(
                    "Granted MANAGE_EXTERNAL_STORAGE to {}",
                    provisioning.storage_package
                ),
                || {
                    setup::grant_manage_external_storage_permission(
                        device,
                        &provisioning.storage_package,
                    )
                    .map(|_| SetupOutcome::Done)
                },
            )?;
        }
    }

    if provisioning.enable_bluetooth_multiplex {
        check_interrupted(shutdown_flag)?;
        run_step(
            progress,
            report,
            "enable_bluetooth_multiplex",
            "Enabling Bluetooth multiplex flag",
            "Bluetooth multiplex flag configured".to_string(),
            || setup::enable_bluetooth_multiplex(device).map(|_| SetupOutcome::Done),
        )?;
    }

    if provisioning.dump_gms_version {
        check_interrupted(shutdown_flag)?;
        progress.start_step("Reading GMS core version");
        let start = Instant::now();
        match setup::dump_gms_version(device) {
            Ok(properties) => {
                progress.step_done("GMS core version recorded");
                report.add_properties(properties);
                report.record_step(
                    "dump_gms_version",
                    StepOutcome::Completed,
                    None,
                    start.elapsed(),
                );
            }
            Err(e) => {
                let message = e.to_string();
                progress.step_failed(&message);
                report.record_step(
                    "dump_gms_version",
                    StepOutcome::Failed,
                    Some(message),
                    start.elapsed(),
                );
                return Err(e.into());
            }
        }
    }

    if let Some(ssid) = wifi_ssid {
        check_interrupted(shutdown_flag)?;
        progress.start_step(&format!("Connecting to Wi-Fi \"{}\"", ssid));
        let start = Instant::now();
        match setup::connect_to_wifi_wlan_till_success(device, ssid, &config.wifi.password) {
            Ok(connect_time) => {
                progress.step_done(&format!(
                    "Connected to \"{}\" in {}",
                    ssid,
                    format_duration(connect_time)
                ));
                report.record_step(
                    "connect_wifi",
                    StepOutcome::Completed,
                    Some(format!("connected in {:.1}s", connect_time.as_secs_f64())),
                    start.elapsed(),
                );
            }
            Err(e) => {
                let message = e.to_string();
                progress.step_failed(&message);
                report.record_step(
                    "connect_wifi",
                    StepOutcome::Failed,
                    Some(message),
                    start.elapsed(),
                );
                return Err(e.into());
            }
        }
    }

    if let Some(apk) = apk {
        check_interrupted(shutdown_flag)?;
        run_step(
            progress,
            report,
            "install_apk",
            "Installing APK",
            format!("Installed {}", apk.display()),
            || setup::install_apk(device, apk).map(|_| SetupOutcome::Done),
        )?;
    }

    Ok(())
}

/// Run one setup step, translating its outcome into progress output and a
/// report record. Failures propagate after being recorded.
fn run_step<F>(
    progress: &StepProgress,
    report: &mut ProvisionReport,
    name: &str,
    title: &str,
    done_message: String,
    step: F,
) -> Result<()>
where
    F: FnOnce() -> crate::core::error::Result<SetupOutcome>,
{
    progress.start_step(title);
    let start = Instant::now();

    match step() {
        Ok(SetupOutcome::Done) => {
            progress.step_done(&done_message);
            report.record_step(name, StepOutcome::Completed, None, start.elapsed());
            Ok(())
        }
        Ok(outcome) => {
            let reason = outcome.skip_reason().unwrap_or("skipped").to_string();
            progress.step_skipped(&reason);
            report.record_step(name, StepOutcome::Skipped, Some(reason), start.elapsed());
            Ok(())
        }
        Err(e) => {
            let message = e.to_string();
            progress.step_failed(&message);
            report.record_step(name, StepOutcome::Failed, Some(message), start.elapsed());
            Err(e.into())
        }
    }
}

/// Bail out between steps once Ctrl-C has been pressed
fn check_interrupted(shutdown_flag: &AtomicBool) -> Result<()> {
    if shutdown_flag.load(Ordering::SeqCst) {
        warn!("Shutdown requested, aborting setup");
        anyhow::bail!("Setup interrupted by user");
    }
    Ok(())
}

// =========================================================================
// SINGLE-STEP COMMANDS
// =========================================================================

/// List connected devices
pub fn list_devices(config: &Config, all: bool) -> Result<()> {
    info!("Scanning for connected devices...");

    let devices = device::list_devices(&config.device.adb_path)?;
    let devices: Vec<_> = if all {
        devices
    } else {
        devices.into_iter().filter(|d| d.is_usable()).collect()
    };

    if devices.is_empty() {
        info!("No devices found.");
        print_connect_help();
        if !all {
            info!("Tip: Use 'list --all' to include offline and unauthorized devices");
        }
        return Ok(());
    }

    info!("Found {} device(s):", devices.len());
    info!("");
    for (i, device) in devices.iter().enumerate() {
        info!("[{}] {} ({})", i + 1, device.serial, device.state.display_name());
        if !device.model.is_empty() {
            info!("    Model: {}", device.model);
        }
        if !device.product.is_empty() {
            info!("    Product: {}", device.product);
        }
        if device.state.is_unauthorized() {
            info!("    Accept the USB debugging prompt on the device screen");
        }
        info!("");
    }

    Ok(())
}

/// Connect the device to a Wi-Fi network
pub fn wifi_connect(config: &Config, ssid: &str, password: Option<&str>) -> Result<()> {
    let device = open_device(config)?;

    info!("Connecting {} to \"{}\"...", device.serial(), ssid);
    let connect_time =
        setup::connect_to_wifi_wlan_till_success(&device, ssid, password.unwrap_or(""))?;
    progress::print_success(&format!(
        "Connected to \"{}\" in {}",
        ssid,
        format_duration(connect_time)
    ));

    Ok(())
}

/// Set the Wi-Fi country code
pub fn set_country_code(config: &Config, code: &str) -> Result<()> {
    let device = open_device(config)?;

    match setup::set_wifi_country_code(&device, code)? {
        SetupOutcome::Done => {
            progress::print_success(&format!("Wi-Fi country code set to {}", code));
        }
        outcome => {
            progress::print_warning(outcome.skip_reason().unwrap_or("skipped"));
        }
    }

    Ok(())
}

/// Switch airplane mode on or off
pub fn airplane_mode(config: &Config, state: &str) -> Result<()> {
    let device = open_device(config)?;

    match state {
        "on" | "off" => {
            // The AIRPLANE_MODE broadcast is protected, the shell user can
            // only send it on rooted builds
            if !device.is_adb_root() {
                progress::print_warning(&format!(
                    "not switching airplane mode on unrooted device \"{}\"",
                    device.serial()
                ));
                return Ok(());
            }
            if state == "on" {
                setup::enable_airplane_mode(&device)?;
                progress::print_success("Airplane mode enabled");
            } else {
                setup::disable_airplane_mode(&device)?;
                progress::print_success("Airplane mode disabled");
            }
        }
        _ => match setup::toggle_airplane_mode(&device)? {
            SetupOutcome::Done => {
                progress::print_success("Airplane mode toggled on and off");
            }
            outcome => {
                progress::print_warning(outcome.skip_reason().unwrap_or("skipped"));
            }
        },
    }

    Ok(())
}

/// Raise the Nearby log tags to VERBOSE
pub fn enable_logs(config: &Config) -> Result<()> {
    let device = open_device(config)?;

    setup::enable_logs(&device)?;
    progress::print_success(&format!(
        "{} log tags set to VERBOSE",
        setup::LOG_TAGS.len()
    ));

    Ok(())
}

/// Grant MANAGE_EXTERNAL_STORAGE to a package
pub fn grant_storage(config: &Config, package: Option<String>) -> Result<()> {
    let device = open_device(config)?;
    let package = package.unwrap_or_else(|| config.provisioning.storage_package.clone());

    let sdk = device.build_info().version_sdk();
    if sdk < 30 {
        progress::print_warning(&format!(
            "MANAGE_EXTERNAL_STORAGE needs API 30, device reports API {}",
            sdk
        ));
        return Ok(());
    }

    setup::grant_manage_external_storage_permission(&device, &package)?;
    progress::print_success(&format!("Granted MANAGE_EXTERNAL_STORAGE to {}", package));

    Ok(())
}

/// Enable the Bluetooth multiplex feature flag
pub fn enable_multiplex(config: &Config) -> Result<()> {
    let device = open_device(config)?;

    setup::enable_bluetooth_multiplex(&device)?;
    progress::print_success("Bluetooth multiplex flag configured");

    Ok(())
}

/// Show the GMS core version of the connected device
pub fn dump_gms(config: &Config) -> Result<()> {
    let device = open_device(config)?;

    let properties = setup::dump_gms_version(&device)?;
    println!();
    for (key, value) in &properties {
        println!("  {}:", key);
        for line in value.lines() {
            println!("    {}", line.trim());
        }
    }
    println!();

    Ok(())
}

/// Install an APK on the connected device
pub fn install(config: &Config, apk: &Path) -> Result<()> {
    if !apk.exists() {
        anyhow::bail!("APK not found: {}", apk.display());
    }

    let device = open_device(config)?;

    setup::install_apk(&device, apk)?;
    progress::print_success(&format!("Installed {}", apk.display()));

    Ok(())
}

// =========================================================================
// CONFIG COMMANDS
// =========================================================================

/// Handle the `config` command - open, show path, or reset the config file
pub fn handle_config_command(show_path: bool, reset: bool) -> Result<()> {
    if reset {
        // Delete existing config and create a fresh one
        if let Some(config_path) = get_config_path() {
            if config_path.exists() {
                std::fs::remove_file(&config_path)?;
                info!("Removed existing config file");
            }
        }
        let path = init_config()?;
        info!("Created fresh config file at: {}", path.display());
        return Ok(());
    }

    if show_path {
        // Just show the path
        let path = Config::get_active_config_path();
        println!("{}", path.display());
        if path.exists() {
            info!("Config file exists at: {}", path.display());
        } else {
            info!("Config file would be created at: {}", path.display());
        }
        return Ok(());
    }

    // Open the config file in the default editor
    info!("Opening configuration file in default editor...");
    match open_config_in_editor() {
        Ok(path) => {
            info!("Config file: {}", path.display());
            info!("Save the file after editing to apply changes.");
            info!("Run 'device-setup show-config' to verify your settings.");
        }
        Err(e) => {
            error!("Failed to open config file: {}", e);
            // Fall back to showing the path
            if let Some(path) = get_config_path() {
                info!("You can manually edit the config at: {}", path.display());
            }
        }
    }

    Ok(())
}

/// Generate a configuration file at the specified or default location
pub fn generate_config_file(output: Option<PathBuf>) -> Result<()> {
    use std::fs;

    let custom_path = output.is_some();
    let output_path = match output {
        Some(path) => path,
        None => {
            // Use standard location
            init_config()?
        }
    };

    // If a specific path was given, write the config there
    if custom_path {
        let content = Config::generate_default_config();
        fs::write(&output_path, content)?;
    }

    info!("Configuration file: {}", output_path.display());
    info!("Edit this file to customize the provisioning settings.");
    info!("");
    info!("Quick tip: Run 'device-setup config' to open the config in your editor.");

    Ok(())
}

/// Show the current configuration settings
pub fn show_config(config: &Config) {
    let config_path = Config::get_active_config_path();
    info!("Configuration file: {}", config_path.display());
    if !config_path.exists() {
        info!("(Using default settings - no config file found)");
    }
    info!("");
    info!("Current Configuration:");
    info!("----------------------");
    info!("[device]");
    info!(
        "  serial = {:?}",
        config.device.serial.as_deref().unwrap_or("(auto)")
    );
    info!("  adb_path = \"{}\"", config.device.adb_path.display());
    info!("");
    info!("[wifi]");
    info!(
        "  ssid = {:?}",
        config.wifi.ssid.as_deref().unwrap_or("(none)")
    );
    info!(
        "  password = {}",
        if config.wifi.password.is_empty() {
            "(empty)"
        } else {
            "(hidden)"
        }
    );
    info!("  country_code = \"{}\"", config.wifi.country_code);
    info!("");
    info!("[provisioning]");
    info!(
        "  set_country_code = {}",
        config.provisioning.set_country_code
    );
    info!(
        "  enable_verbose_logs = {}",
        config.provisioning.enable_verbose_logs
    );
    info!(
        "  grant_storage_permission = {}",
        config.provisioning.grant_storage_permission
    );
    info!(
        "  enable_bluetooth_multiplex = {}",
        config.provisioning.enable_bluetooth_multiplex
    );
    info!(
        "  dump_gms_version = {}",
        config.provisioning.dump_gms_version
    );
    info!("  connect_wifi = {}", config.provisioning.connect_wifi);
    info!(
        "  storage_package = \"{}\"",
        config.provisioning.storage_package
    );
    match config.provisioning.apk {
        Some(ref apk) => info!("  apk = \"{}\"", apk.display()),
        None => info!("  apk = (none)"),
    }
    info!("");
    info!("[logging]");
    info!("  level = \"{}\"", config.logging.level);
    info!("  log_to_file = {}", config.logging.log_to_file);
    info!("  log_file = \"{}\"", config.logging.log_file.display());
    info!("");
    info!("[report]");
    info!("  enabled = {}", config.report.enabled);
    info!("  directory = \"{}\"", config.report.directory.display());
}

// =========================================================================
// TEST COMMAND IMPLEMENTATIONS
// =========================================================================

/// Handle test subcommands
pub fn handle_test_command(test_command: &TestCommands) -> Result<()> {
    match test_command {
        TestCommands::RunAll {
            json_report,
            output,
            fail_fast,
        } => {
            test_run_all(*json_report, output.clone(), *fail_fast)?;
        }
        TestCommands::RunQuick { verbose } => {
            test_run_quick(*verbose)?;
        }
        TestCommands::RunTag { tag, verbose } => {
            test_run_by_tag(tag, *verbose)?;
        }
        TestCommands::Run { scenarios, verbose } => {
            test_run_scenarios(scenarios, *verbose)?;
        }
        TestCommands::ListScenarios { tag, detailed } => {
            test_list_scenarios(tag.as_deref(), *detailed)?;
        }
        TestCommands::ListTags => {
            test_list_tags()?;
        }
        TestCommands::Interactive => {
            test_interactive()?;
        }
        TestCommands::Info { name } => {
            test_scenario_info(name)?;
        }
    }
    Ok(())
}

/// Run all test scenarios
fn test_run_all(json_report: bool, output: Option<PathBuf>, fail_fast: bool) -> Result<()> {
    let report_dir = output.map(|p| p.display().to_string());

    let config = TestRunnerConfig {
        verbose: true,
        fail_fast,
        json_report,
        report_dir,
        ..Default::default()
    };

    let mut runner = TestRunner::with_config(config);
    let summary = runner.run_all();

    if summary.failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

/// Run quick test scenarios
fn test_run_quick(verbose: bool) -> Result<()> {
    let config = TestRunnerConfig {
        verbose,
        ..Default::default()
    };

    let mut runner = TestRunner::with_config(config);
    let summary = runner.run_quick();

    println!(
        "\n✓ Quick tests complete: {}/{} passed",
        summary.passed, summary.total
    );

    if summary.failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

/// Run tests filtered by tag
fn test_run_by_tag(tag: &str, verbose: bool) -> Result<()> {
    let config = TestRunnerConfig {
        verbose,
        ..Default::default()
    };

    let mut runner = TestRunner::with_config(config);
    let summary = runner.run_by_tag(tag);

    println!(
        "\n✓ Tests with tag '{}' complete: {}/{} passed",
        tag, summary.passed, summary.total
    );

    if summary.failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

/// Run specific scenarios by name
fn test_run_scenarios(scenarios: &[String], verbose: bool) -> Result<()> {
    let config = TestRunnerConfig {
        verbose,
        ..Default::default()
    };

    let names: Vec<&str> = scenarios.iter().map(|s| s.as_str()).collect();

    let mut runner = TestRunner::with_config(config);
    let summary = runner.run_by_names(&names);

    println!(
        "\n✓ Selected tests complete: {}/{} passed",
        summary.passed, summary.total
    );

    if summary.failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

/// List all available test scenarios
fn test_list_scenarios(tag_filter: Option<&str>, detailed: bool) -> Result<()> {
    let scenarios = if let Some(tag) = tag_filter {
        ScenarioLibrary::scenarios_by_tag(tag)
    } else {
        ScenarioLibrary::all_scenarios()
    };

    if scenarios.is_empty() {
        if let Some(tag) = tag_filter {
            println!("No scenarios found with tag '{}'", tag);
        } else {
            println!("No scenarios available");
        }
        return Ok(());
    }

    progress::print_header("AVAILABLE TEST SCENARIOS");

    if detailed {
        for scenario in &scenarios {
            println!("  {}", scenario.name);
            println!("    Description: {}", scenario.description);
            println!("    Serial: {}", scenario.serial);
            println!("    Tags: {}", scenario.tags.join(", "));
            println!("    Should succeed: {}", scenario.expected.should_succeed);
            if let Some(ref err) = scenario.expected.expected_error {
                println!("    Expected error: {}", err);
            }
            println!();
        }
    } else {
        for scenario in &scenarios {
            let tags_str = if scenario.tags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", scenario.tags.join(", "))
            };
            println!(
                "  • {} - {}{}",
                scenario.name, scenario.description, tags_str
            );
        }
        println!();
    }

    println!("Total: {} scenarios", scenarios.len());
    Ok(())
}

/// List all available tags
fn test_list_tags() -> Result<()> {
    let tags = testdb::list_tags();

    println!("\nAvailable tags for filtering:\n");
    for tag in &tags {
        let count = ScenarioLibrary::scenarios_by_tag(tag).len();
        println!("  • {} ({} scenarios)", tag, count);
    }
    println!();
    println!("Use: device-setup test run-tag <TAG>");
    Ok(())
}

/// Run interactive test mode
fn test_interactive() -> Result<()> {
    let mut mode = InteractiveTestMode::new();

    progress::print_header("INTERACTIVE TEST MODE");

    loop {
        println!("\nOptions:");
        println!("  [l] List all scenarios");
        println!("  [q] Run quick tests");
        println!("  [r] Run specific scenario");
        println!("  [a] Run all tests");
        println!("  [i] Show scenario info");
        println!("  [x] Exit\n");

        print!("Enter choice: ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let choice = input.trim().to_lowercase();

        match choice.as_str() {
            "l" => {
                mode.list_scenarios();
            }
            "q" => {
                println!("\nRunning quick tests...\n");
                test_run_quick(true)?;
            }
            "r" => {
                print!("Enter scenario name or number: ");
                io::stdout().flush()?;
                let mut name = String::new();
                io::stdin().read_line(&mut name)?;
                let name = name.trim();

                // Try parsing as number first
                if let Ok(idx) = name.parse::<usize>() {
                    if mode.select_scenario(idx.saturating_sub(1)) {
                        if let Some(result) = mode.run_current() {
                            println!(
                                "\nResult: {} - {}",
                                if result.passed { "PASSED" } else { "FAILED" },
                                result.message
                            );
                        }
                    } else {
                        println!("Invalid scenario number");
                    }
                } else {
                    test_run_scenarios(&[name.to_string()], true)?;
                }
            }
            "a" => {
                println!("\nRunning all tests...\n");
                test_run_all(false, None, false)?;
            }
            "i" => {
                print!("Enter scenario name: ");
                io::stdout().flush()?;
                let mut name = String::new();
                io::stdin().read_line(&mut name)?;
                test_scenario_info(name.trim())?;
            }
            "x" | "exit" | "quit" => {
                println!("Exiting interactive mode.");
                break;
            }
            _ => {
                println!("Unknown option: {}", choice);
            }
        }
    }

    Ok(())
}

/// Show information about a specific scenario
fn test_scenario_info(name: &str) -> Result<()> {
    let scenarios = ScenarioLibrary::all_scenarios();
    let scenario = scenarios.iter().find(|s| s.name == name);

    match scenario {
        Some(s) => {
            progress::print_header(&format!("SCENARIO: {}", s.name));
            println!("Description: {}", s.description);
            println!("Tags: {}", s.tags.join(", "));
            println!("\nSimulated Device:");
            println!("  Serial: {}", s.serial);
            println!("  Rooted: {}", s.device_config.rooted);
            println!("  API level: {}", s.device_config.sdk_level);
            println!("  Wi-Fi enabled: {}", s.device_config.wifi_enabled);
            if !s.device_config.preset_flags.is_empty() {
                println!(
                    "  Preset flags: {}",
                    s.device_config.preset_flags.join(", ")
                );
            }
            if s.device_config.shell_failure_rate > 0 {
                println!(
                    "  Shell failure rate: {}%",
                    s.device_config.shell_failure_rate
                );
            }
            println!("\nInputs:");
            println!("  Country code: {:?}", s.inputs.country_code);
            println!("  Wi-Fi SSID: {:?}", s.inputs.wifi_ssid);
            println!("  Storage package: {}", s.inputs.storage_package);
            if let Some(ref apk) = s.inputs.apk {
                println!("  APK: {}", apk.display());
            }
            println!("\nExpected Results:");
            println!("  Verbose tags: {}", s.expected.verbose_tags);
            println!("  Storage grants: {}", s.expected.appops_grants);
            println!("  Flag broadcasts: {}", s.expected.flag_broadcasts);
            println!("  Radio enables: {}", s.expected.radio_enables);
            println!("  Wi-Fi connects: {}", s.expected.wifi_connect_attempts);
            println!("  Installs: {}", s.expected.installs);
            println!("  Skipped steps: {}", s.expected.skipped_steps);
            println!("  Should succeed: {}", s.expected.should_succeed);
            if let Some(ref err) = s.expected.expected_error {
                println!("  Expected error: {}", err);
            }
            println!();
        }
        None => {
            println!("Scenario '{}' not found.", name);
            println!("\nAvailable scenarios:");
            for s in &scenarios {
                println!("  • {}", s.name);
            }
        }
    }

    Ok(())
}
