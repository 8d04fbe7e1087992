// src/report.rs

//! Validation report and exit status
//!
//! Every check appends [`Diagnostic`] lines to a [`Report`]. The overall
//! outcome is the worst severity seen, a monotonic max-fold over the lines,
//! so no check can lower what an earlier check raised.

use colored::Colorize;
use regex::Regex;
use std::fmt;
use strum_macros::{Display, EnumString};

/// Exit status when any error-severity diagnostic was reported
pub const FAILURE_EXIT_CODE: i32 = 2;

/// Diagnostic severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// One report line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// Regex selecting the part of the line to colour; whole line if absent
    pub highlight: Option<String>,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            highlight: None,
        }
    }

    /// Colour only the text matching `pattern`
    pub fn with_highlight(mut self, pattern: impl Into<String>) -> Self {
        self.highlight = Some(pattern.into());
        self
    }

    fn is_heading(&self) -> bool {
        self.message.starts_with("### ") || self.message.starts_with("<!--")
    }

    /// Render with ANSI colours
    ///
    /// Colouring is switched off globally through `colored::control`.
    pub fn render(&self) -> String {
        let paint = |text: &str| -> String {
            match self.severity {
                Severity::Error => text.red().to_string(),
                Severity::Warning => text.yellow().to_string(),
                Severity::Info if self.is_heading() => text.green().to_string(),
                Severity::Info => text.to_string(),
            }
        };

        match self.highlight.as_deref().and_then(|p| Regex::new(p).ok()) {
            Some(re) => re
                .replace_all(&self.message, |caps: &regex::Captures| paint(&caps[0]))
                .into_owned(),
            None => paint(&self.message),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Ordered log of diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    diagnostics: Vec<Diagnostic>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a diagnostic
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Plain informational line
    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Diagnostic::new(Severity::Info, message));
    }

    /// Section heading such as `### Package ###`
    pub fn heading(&mut self, title: impl Into<String>) {
        self.info(title);
    }

    /// Warning line
    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(Diagnostic::new(Severity::Warning, message));
    }

    /// Failure line
    pub fn fail(&mut self, message: impl Into<String>) {
        self.push(Diagnostic::new(Severity::Error, message));
    }

    /// Append everything from another report
    pub fn extend(&mut self, other: Report) {
        self.diagnostics.extend(other.diagnostics);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Diagnostics of exactly the given severity
    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.severity == severity)
    }

    /// Number of diagnostics with the given severity
    pub fn count(&self, severity: Severity) -> usize {
        self.with_severity(severity).count()
    }

    /// Worst severity seen so far
    pub fn severity(&self) -> Severity {
        self.diagnostics
            .iter()
            .map(|d| d.severity)
            .fold(Severity::Info, Ord::max)
    }

    /// Whether any failure was reported
    pub fn failed(&self) -> bool {
        self.severity() == Severity::Error
    }

    /// Render every line, one per row
    pub fn render(&self) -> String {
        let mut out = String::new();
        for diagnostic in &self.diagnostics {
            out.push_str(&diagnostic.render());
            out.push('\n');
        }
        out
    }
}

/// Maps a report's worst severity onto a process exit status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExitPolicy {
    /// Exit status that counts as success, for self-testing
    pub expect_error: i32,
}

impl ExitPolicy {
    pub fn new(expect_error: i32) -> Self {
        Self { expect_error }
    }

    /// Raw status before the override: 2 on failure, else 0
    pub fn raw_status(report: &Report) -> i32 {
        if report.failed() { FAILURE_EXIT_CODE } else { 0 }
    }

    /// Final process exit status
    pub fn exit_code(&self, report: &Report) -> i32 {
        let code = Self::raw_status(report);
        if code == self.expect_error { 0 } else { code }
    }
}
