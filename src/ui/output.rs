//! ui::output
//!
//! Operator-facing output that bypasses the log formatter.
//!
//! # Design
//!
//! Progress messages go through `tracing`. This module holds what must look
//! a specific way regardless of log configuration: the colored failure
//! summary, verbatim blocks such as `git diff`, and list formatting.

use std::fmt::Display;
use std::path::Path;

use colored::Colorize;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Warnings and errors only
    Quiet,
    /// Standard progress output
    Normal,
    /// Debug output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags. Quiet wins over debug.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }

    /// Default console filter directive.
    pub fn filter_directive(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "warn",
            Verbosity::Normal => "info",
            Verbosity::Debug => "debug",
        }
    }
}

/// The two-line failure summary: `Error: <message>` and the log pointer.
pub fn error_summary(message: impl Display, log_file: Option<&Path>) -> String {
    let mut out = format!("{} {}", "Error:".red().bold(), message.to_string().yellow());
    if let Some(path) = log_file {
        out.push('\n');
        out.push_str(&format!(
            "See {} for detailed information.",
            path.display().to_string().cyan()
        ));
    }
    out
}

/// Print the failure summary to stderr.
pub fn print_error(message: impl Display, log_file: Option<&Path>) {
    eprintln!("{}", error_summary(message, log_file));
}

/// Print a block verbatim (status, diff) that a confirmation depends on.
///
/// Shown at every verbosity: `--quiet` only silences logging.
pub fn print_block(text: &str) {
    if let Some(block) = review_block(text) {
        println!("{}", block);
    }
}

fn review_block(text: &str) -> Option<&str> {
    let trimmed = text.trim_end();
    (!trimmed.trim_start().is_empty()).then_some(trimmed)
}

/// Format a list of items, one per line.
pub fn format_list<T: Display>(items: &[T], prefix: &str) -> String {
    items
        .iter()
        .map(|item| format!("{}{}", prefix, item))
        .collect::<Vec<_>>()
        .join("\n")
}
