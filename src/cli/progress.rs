//! Progress display utilities for CLI output
//!
//! This module provides progress tracking for the provisioning pass and
//! shared console output helpers.
//!
//! Key features:
//! - A step spinner that keeps ticking through the settle waits
//! - Progress display that suspends cleanly when logging
//! - Consistent visual styling across all commands

#![allow(dead_code)] // Some utilities here are for future use

use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

// ============================================================================
// Styles - Consistent visual appearance
// ============================================================================

/// Get the spinner style for setup steps
fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap()
        .tick_chars("⣾⣽⣻⢿⡿⣟⣯⣷")
}

// ============================================================================
// Console output helpers
// ============================================================================

/// Print a header section with a box
pub fn print_header(title: &str) {
    let width = 68;
    let title_padded = format!("{:^width$}", title, width = width - 4);
    println!();
    println!("╔{}╗", "═".repeat(width - 2));
    println!("║{}║", title_padded);
    println!("╚{}╝", "═".repeat(width - 2));
    println!();
}

/// Print a section divider
pub fn print_divider() {
    println!();
    println!("{}", "─".repeat(60));
    println!();
}

/// Print a success message with checkmark
pub fn print_success(msg: &str) {
    println!("  ✓ {}", msg);
}

/// Print an info message with bullet
pub fn print_info(msg: &str) {
    println!("  • {}", msg);
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("  ⚠ {}", msg);
}

/// Print an error message
pub fn print_error(msg: &str) {
    println!("  ✗ {}", msg);
}

/// Print a step in a process
pub fn print_step(step: usize, total: usize, msg: &str) {
    println!("  [{}/{}] {}", step, total, msg);
}

// ============================================================================
// Progress tracker for the provisioning pass
// ============================================================================

/// Progress tracker for the multi-step provisioning pass
///
/// Setup steps spend most of their time inside settle waits, so the
/// spinner runs on a steady tick to stay alive between shell calls.
pub struct StepProgress {
    spinner: ProgressBar,
    current: AtomicUsize,
    total: usize,
    start_time: Instant,
}

impl StepProgress {
    /// Create a new step progress tracker for `total` steps
    pub fn new(total: usize) -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(spinner_style());
        spinner.enable_steady_tick(Duration::from_millis(80));
        spinner.set_message("Starting...");

        Self {
            spinner,
            current: AtomicUsize::new(0),
            total,
            start_time: Instant::now(),
        }
    }

    /// Begin the next step and show its name
    pub fn start_step(&self, name: &str) {
        let step = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.spinner
            .set_message(format!("[{}/{}] {}", step, self.total, name));
    }

    /// Report the current step as done (suspends the spinner)
    pub fn step_done(&self, msg: &str) {
        self.spinner.suspend(|| {
            println!("  ✓ {}", msg);
        });
    }

    /// Report the current step as skipped
    pub fn step_skipped(&self, msg: &str) {
        self.spinner.suspend(|| {
            println!("  • {}", msg);
        });
    }

    /// Report the current step as failed
    pub fn step_failed(&self, msg: &str) {
        self.spinner.suspend(|| {
            println!("  ✗ {}", msg);
        });
    }

    /// Log an event message (suspends the spinner automatically)
    pub fn log_event(&self, msg: &str) {
        self.spinner.suspend(|| {
            println!("  → {}", msg);
        });
    }

    /// Number of steps started so far
    pub fn steps_started(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    /// Finish and clear the progress display
    pub fn finish(&self) {
        self.spinner.finish_and_clear();
    }

    /// Finish with a summary message
    pub fn finish_with_summary(&self, completed: usize, skipped: usize, failed: usize) {
        let elapsed = self.start_time.elapsed();
        if failed == 0 {
            self.spinner.finish_with_message(format!(
                "✓ Setup finished: {} completed, {} skipped in {}",
                completed,
                skipped,
                format_duration(elapsed)
            ));
        } else {
            self.spinner.finish_with_message(format!(
                "✗ Setup finished with {} failed step(s) ({} completed, {} skipped)",
                failed, completed, skipped
            ));
        }
    }

    /// Finish with an error message
    pub fn finish_with_error(&self, msg: &str) {
        self.spinner.abandon_with_message(format!("✗ {}", msg));
    }
}

// ============================================================================
// Utility functions
// ============================================================================

/// Format duration as human-readable string
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        format!("{}h {}m", hours, mins)
    } else if secs >= 60 {
        let mins = secs / 60;
        let secs = secs % 60;
        format!("{}m {}s", mins, secs)
    } else {
        format!("{:.1}s", duration.as_secs_f64())
    }
}

// ============================================================================
// Dual writer for file + console logging
// ============================================================================

/// A writer that writes to both console and file
///
/// Used for logging to both stderr and a log file simultaneously.
pub struct DualWriter {
    pub console: std::io::Stderr,
    pub file: std::fs::File,
}

impl Write for DualWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        // Write to console
        let _ = self.console.write(buf);
        // Write to file
        self.file.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let _ = self.console.flush();
        self.file.flush()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(30)), "30.0s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
        assert_eq!(format_duration(Duration::from_secs(3661)), "1h 1m");
    }

    #[test]
    fn test_step_progress_counts_started_steps() {
        let progress = StepProgress::new(7);
        assert_eq!(progress.steps_started(), 0);
        progress.start_step("Set Wi-Fi country code");
        progress.start_step("Enable verbose logs");
        assert_eq!(progress.steps_started(), 2);
        progress.finish();
    }
}
