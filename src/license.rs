// src/license.rs

//! License detection
//!
//! Three signals are weighed, first decisive one wins:
//!
//! 1. License metadata reported by the code host
//! 2. A `LICENSE*` or `COPYING*` file at the repository root
//! 3. Boilerplate or an SPDX tag in every source file

use crate::error::Result;
use crate::report::Report;
use crate::requirements::read_lossy;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

/// License names, as the GitHub API reports them, accepted without comment
pub const ACCEPTED_HOSTED_LICENSES: &[&str] = &[
    "Apache License 2.0",
    "GNU Affero General Public License v3.0",
    "GNU General Public License v2.0",
    "GNU General Public License v3.0",
    "GNU Lesser General Public License v3.0",
    "ISC License",
    "MIT License",
    "The Unlicense",
];

const LICENSEE_HINT: &str = "  See: https://github.com/licensee/licensee";
const SPDX_HINT: &str = "https://spdx.org/using-spdx-license-identifier";

static SPDX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"SPDX-License-Identifier:[ ]+(.*)").expect("valid SPDX regex"));

/// Boilerplate fingerprints, checked in order
static FINGERPRINTS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("GPL", r"GNU.* General Public License"),
        ("ISC", r"Permission to use, copy, modify, and/or"),
        ("MIT", r"Permission is hereby granted, free of charge, to any person"),
        ("Unlicense", r"This is free and unencumbered software released into"),
        ("Apache-2.0", r"Licensed under the Apache License, Version 2\.0"),
        ("BSD-3-Clause", r"Redistribution and use in source and binary forms"),
    ]
    .into_iter()
    .map(|(key, pattern)| (key, Regex::new(pattern).expect("valid fingerprint regex")))
    .collect()
});

/// Detect the license of a source text
///
/// ```
/// use melpazoid::license::detect_license;
///
/// assert_eq!(detect_license("SPDX-License-Identifier:  ISC ").as_deref(), Some("ISC"));
/// assert_eq!(detect_license("GNU General Public License").as_deref(), Some("GPL"));
/// assert_eq!(detect_license(";; no license here"), None);
/// ```
pub fn detect_license(text: &str) -> Option<String> {
    if let Some(caps) = SPDX_RE.captures(text) {
        return Some(caps[1].trim().to_string());
    }

    FINGERPRINTS
        .iter()
        .find(|(_, re)| re.is_match(text))
        .map(|(key, _)| key.to_string())
}

/// What the code host says about the license
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostedLicense {
    /// Not hosted, unreachable, or not checked
    Unavailable,
    /// The host knows the repository but found no license
    Missing,
    /// The host's license name
    Named(String),
}

/// A license file at the repository root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseFile {
    pub name: String,
    pub first_line: String,
}

/// Find a `LICENSE*` or `COPYING*` file directly in `dir`
pub fn find_license_file(dir: &Path) -> Result<Option<LicenseFile>> {
    let mut names: Vec<String> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.starts_with("LICENSE") || name.starts_with("COPYING"))
        .collect();
    names.sort();

    let Some(name) = names.into_iter().next() else {
        return Ok(None);
    };
    let text = read_lossy(&dir.join(&name))?;
    let first_line = text.lines().next().unwrap_or_default().trim().to_string();
    Ok(Some(LicenseFile { name, first_line }))
}

/// Whether a file should carry its own license boilerplate
pub fn needs_boilerplate(file: &str) -> bool {
    file.ends_with(".el") && !file.ends_with("-pkg.el")
}

/// All license evidence for a package
#[derive(Debug, Clone)]
pub struct LicenseEvidence {
    pub hosted: HostedLicense,
    pub repository_file: Option<LicenseFile>,
    /// Per source file: (file name, detected license)
    pub files: Vec<(String, Option<String>)>,
}

/// Decide whether the package is acceptably licensed
///
/// Returns true when the package passes.
pub fn check_license(evidence: &LicenseEvidence, report: &mut Report) -> bool {
    match &evidence.hosted {
        HostedLicense::Named(name) if ACCEPTED_HOSTED_LICENSES.contains(&name.as_str()) => {
            report.info(format!("- GitHub API found `{}`", name));
            return true;
        }
        HostedLicense::Named(name) => {
            report.warn(format!("- GitHub API found `{}`", name));
            report.warn("  - Try to use a standard format for your license file.");
            report.info(format!("  {}", LICENSEE_HINT));
            return true;
        }
        HostedLicense::Missing => {
            report.fail("- Add a LICENSE file that GitHub can detect (e.g. no markup) if possible");
            report.info(LICENSEE_HINT);
            return true;
        }
        HostedLicense::Unavailable => {}
    }

    if let Some(file) = &evidence.repository_file {
        report.info(format!("<!-- {} excerpt: `{}...` -->", file.name, file.first_line));
        return true;
    }

    report.info("- No LICENSE or COPYING file in the repository");

    let mut all_licensed = true;
    for (file, license) in &evidence.files {
        if license.is_none() {
            let basename = Path::new(file)
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or(file);
            report.fail(format!(
                "- Add license boilerplate or an [SPDX-License-Identifier]({}) to {}",
                SPDX_HINT, basename
            ));
            all_licensed = false;
        }
    }

    if !all_licensed {
        report.fail("- Use a GPL-compatible license.");
        report.info("  See: https://www.gnu.org/licenses/license-list.en.html#GPLCompatibleLicenses");
    }
    all_licensed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Severity;
    use tempfile::TempDir;

    fn evidence(hosted: HostedLicense) -> LicenseEvidence {
        LicenseEvidence {
            hosted,
            repository_file: None,
            files: vec![("foo.el".to_string(), None)],
        }
    }

    #[test]
    fn test_spdx_wins_over_fingerprints() {
        let text = ";; SPDX-License-Identifier: MIT\n;; GNU General Public License";
        assert_eq!(detect_license(text).as_deref(), Some("MIT"));
    }

    #[test]
    fn test_spdx_tag_is_case_sensitive() {
        assert_eq!(detect_license(";; spdx-license-identifier: MIT"), None);
    }

    #[test]
    fn test_fingerprint_order() {
        // GPL boilerplate that also happens to mention BSD-style wording
        let text = "GNU Lesser General Public License\nRedistribution and use in source and binary forms";
        assert_eq!(detect_license(text).as_deref(), Some("GPL"));

        let mit = "Permission is hereby granted, free of charge, to any person obtaining a copy";
        assert_eq!(detect_license(mit).as_deref(), Some("MIT"));

        let apache = "Licensed under the Apache License, Version 2.0 (the \"License\")";
        assert_eq!(detect_license(apache).as_deref(), Some("Apache-2.0"));
    }

    #[test]
    fn test_accepted_hosted_license_passes() {
        let mut report = Report::new();
        assert!(check_license(&evidence(HostedLicense::Named("MIT License".to_string())), &mut report));
        assert_eq!(report.severity(), Severity::Info);
    }

    #[test]
    fn test_other_hosted_license_warns() {
        let mut report = Report::new();
        assert!(check_license(&evidence(HostedLicense::Named("Other".to_string())), &mut report));
        assert_eq!(report.severity(), Severity::Warning);
        assert!(report.diagnostics().iter().any(|d| d.message.contains("standard format")));
    }

    #[test]
    fn test_named_hosted_license_outside_the_list_warns() {
        let mut report = Report::new();
        let hosted = HostedLicense::Named("Mozilla Public License 2.0".to_string());
        assert!(check_license(&evidence(hosted), &mut report));
        assert_eq!(report.severity(), Severity::Warning);
        let messages: Vec<&str> = report.diagnostics().iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages[0], "- GitHub API found `Mozilla Public License 2.0`");
        assert_eq!(messages[1], "  - Try to use a standard format for your license file.");
        assert!(messages[2].contains(LICENSEE_HINT));
    }

    #[test]
    fn test_hosted_without_license_fails() {
        let mut report = Report::new();
        check_license(&evidence(HostedLicense::Missing), &mut report);
        assert!(report.failed());
    }

    #[test]
    fn test_repository_file_passes() {
        let mut report = Report::new();
        let mut ev = evidence(HostedLicense::Unavailable);
        ev.repository_file = Some(LicenseFile {
            name: "LICENSE".to_string(),
            first_line: "GNU GENERAL PUBLIC LICENSE".to_string(),
        });
        assert!(check_license(&ev, &mut report));
        assert!(!report.failed());
    }

    #[test]
    fn test_per_file_boilerplate() {
        let mut report = Report::new();
        let mut ev = evidence(HostedLicense::Unavailable);
        ev.files = vec![("pkg/foo.el".to_string(), Some("MIT".to_string()))];
        assert!(check_license(&ev, &mut report));
        assert!(!report.failed());

        let mut report = Report::new();
        ev.files.push(("pkg/foo-utils.el".to_string(), None));
        assert!(!check_license(&ev, &mut report));
        assert_eq!(report.count(Severity::Error), 2);
        assert!(report.diagnostics().iter().any(|d| d.message.ends_with("to foo-utils.el")));
    }

    #[test]
    fn test_find_license_file() {
        let dir = TempDir::new().unwrap();
        assert!(find_license_file(dir.path()).unwrap().is_none());

        fs::write(dir.path().join("COPYING"), "  GNU GENERAL PUBLIC LICENSE\nVersion 3\n").unwrap();
        fs::write(dir.path().join("README"), "readme").unwrap();
        let found = find_license_file(dir.path()).unwrap().unwrap();
        assert_eq!(found.name, "COPYING");
        assert_eq!(found.first_line, "GNU GENERAL PUBLIC LICENSE");
    }

    #[test]
    fn test_needs_boilerplate() {
        assert!(needs_boilerplate("foo.el"));
        assert!(!needs_boilerplate("foo-pkg.el"));
        assert!(!needs_boilerplate("README.md"));
    }
}
