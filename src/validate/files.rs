// src/validate/files.rs

//! Per-file listing
//!
//! One line per staged file: directories and non-Lisp files are named,
//! descriptor files draw a warning, and Lisp files show their detected
//! license and the summary from their first line.

use crate::build::StagedPackage;
use crate::error::Result;
use crate::license::detect_license;
use crate::report::{Diagnostic, Report, Severity};
use crate::requirements::read_lossy;
use std::path::Path;

/// Summary from a `;;; name.el --- Summary -*- mode -*-` first line
///
/// ```
/// use melpazoid::validate::file_summary;
///
/// assert_eq!(
///     file_summary(";;; shx.el --- Enhance comint-mode -*- lexical-binding: t -*-").as_deref(),
///     Some("Enhance comint-mode")
/// );
/// assert_eq!(file_summary(";;; shx.el"), None);
/// ```
pub fn file_summary(first_line: &str) -> Option<String> {
    let before_mode_line = first_line.split("-*-").next().unwrap_or_default();
    before_mode_line
        .split(" --- ")
        .nth(1)
        .map(|summary| summary.trim().to_string())
}

/// Header summary and the license found below the first line
fn describe_elisp(path: &Path) -> Result<(Option<String>, Option<String>)> {
    let text = read_lossy(path)?;
    let (first_line, rest) = text.split_once('\n').unwrap_or((text.as_str(), ""));
    Ok((file_summary(first_line), detect_license(rest)))
}

/// Report every staged file
pub fn check_package_files(package: &StagedPackage, report: &mut Report) -> Result<()> {
    for file in package.files() {
        let path = package.path(file);
        if path.is_dir() {
            report.info(format!("- {file} -- directory"));
        } else if !file.ends_with(".el") {
            report.info(format!("- {file} -- not elisp"));
        } else if file.ends_with("-pkg.el") {
            report.warn(format!("- {file} -- consider excluding this; MELPA creates one"));
        } else {
            let (summary, license) = describe_elisp(&path)?;
            let license = license.unwrap_or_else(|| "unknown license".to_string());
            match summary {
                Some(summary) if summary.is_empty() => report.info(format!("- {file} ({license})")),
                Some(summary) => report.info(format!("- {file} ({license}) -- {summary}")),
                None => report.push(
                    Diagnostic::new(Severity::Error, format!("- {file} ({license}) -- (no header)"))
                        .with_highlight(r"\(no header\)"),
                ),
            }
        }
    }
    Ok(())
}
