//! Terminal rendering: report lines, run summary, validation findings and
//! tables.
//!
//! The run report goes to stdout through [`TerminalReport`]; tracing output
//! goes to stderr and never mixes with it.

use std::fmt::Write as _;
use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use nbsetup_core::document::Findings;
use nbsetup_core::{ReportLine, ReportSink, RunSummary};

use crate::cli::ColorMode;

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

// ── Report lines ─────────────────────────────────────────────────────

/// One report line with its status icon.
pub fn format_line(line: &ReportLine, color: bool) -> String {
    let text = line.to_string();
    match (line, color) {
        (ReportLine::Created { .. }, true) => format!("{} {text}", "✓".green()),
        (ReportLine::Exists { .. }, true) => format!("{} {}", "•".blue(), text.dimmed()),
        (ReportLine::Failed { .. }, true) => format!("{} {}", "✗".red(), text.red()),
        (ReportLine::Created { .. }, false) => format!("✓ {text}"),
        (ReportLine::Exists { .. }, false) => format!("• {text}"),
        (ReportLine::Failed { .. }, false) => format!("✗ {text}"),
    }
}

/// Prints report lines to stdout as the engine emits them. In quiet mode
/// only failures are printed.
#[derive(Debug)]
pub struct TerminalReport {
    color: bool,
    quiet: bool,
}

impl TerminalReport {
    pub fn new(color: bool, quiet: bool) -> Self {
        Self { color, quiet }
    }
}

impl ReportSink for TerminalReport {
    fn record(&mut self, line: ReportLine) {
        if self.quiet && !line.is_failure() {
            return;
        }
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{}", format_line(&line, self.color));
    }
}

/// Closing line of a run.
pub fn render_summary(summary: RunSummary, color: bool) -> String {
    let failures = format!("{} failed", summary.failures);
    let failures = if color && summary.failures > 0 {
        failures.red().to_string()
    } else {
        failures
    };
    format!(
        "Done: {} created, {} already existed, {failures}",
        summary.created, summary.existing
    )
}

// ── Validation findings ──────────────────────────────────────────────

/// Findings grouped under their stage heading.
pub fn render_findings(findings: &Findings, color: bool) -> String {
    let mut out = String::new();
    for (stage, messages) in findings.iter() {
        if color {
            let _ = writeln!(out, "{}", stage.title().bold());
        } else {
            let _ = writeln!(out, "{}", stage.title());
        }
        for message in messages {
            let _ = writeln!(out, "  - {message}");
        }
    }
    out
}

// ── Tables ───────────────────────────────────────────────────────────

pub fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}
