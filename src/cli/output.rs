//! Output format types for CLI commands.

use clap::ValueEnum;
use serde::Serialize;

use crate::domain::{RunSummary, Severity};

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output for programmatic consumption
    Json,
}

/// Wrapper for serializable command output.
#[derive(Debug, Serialize)]
pub struct Output<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> Output<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Diagnostic counts alongside the diagnostics themselves.
#[derive(Debug, Serialize)]
pub struct CheckListing<'a> {
    pub pages: usize,
    pub errors: usize,
    pub warnings: usize,
    pub diagnostics: &'a RunSummary,
}

/// Prints diagnostics errors first, one per line, then a count line.
pub fn print_diagnostics(summary: &RunSummary) {
    for diagnostic in summary.by_severity() {
        let prefix = match diagnostic.severity() {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        println!("{prefix}: {diagnostic}");
    }
    println!(
        "\nFound {} issue(s): {} error(s), {} warning(s)",
        summary.total(),
        summary.error_count(),
        summary.warning_count()
    );
}
