// src/build/container.rs

//! Containerized byte-compile and lint run
//!
//! The build itself lives in a Makefile next to the scratch directory:
//! `make test PACKAGE_MAIN=<file>` builds a container that installs the
//! package's dependencies from `_requirements.el`, then byte-compiles and
//! lints everything under `pkg/`. This module writes the setup script, runs
//! make with a timeout and classifies the output.

use super::stage::StagedPackage;
use crate::error::{Error, Result};
use crate::report::{Diagnostic, Report, Severity};
use crate::requirements::RequirementSet;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use tracing::{info, warn};
use wait_timeout::ChildExt;

/// Default timeout for the container build (20 minutes)
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20 * 60);

/// Setup script consumed by the container
pub const REQUIREMENTS_SCRIPT: &str = "_requirements.el";

/// Runs the package build and returns its combined output
pub trait BuildRunner {
    fn build(&self, package: &StagedPackage, main_file: Option<&str>) -> Result<String>;
}

/// `make test` in the build directory
#[derive(Debug, Clone)]
pub struct MakeBuildRunner {
    build_dir: PathBuf,
    timeout: Duration,
}

impl MakeBuildRunner {
    pub fn new(build_dir: impl Into<PathBuf>) -> Self {
        Self {
            build_dir: build_dir.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl BuildRunner for MakeBuildRunner {
    fn build(&self, package: &StagedPackage, main_file: Option<&str>) -> Result<String> {
        let make = which::which("make")
            .map_err(|e| Error::ExternalTool(format!("make not found: {}", e)))?;

        let main = package_main(package, main_file);

        info!("Running make test in {}", self.build_dir.display());
        let mut child = Command::new(make)
            .arg("test")
            .arg(format!("PACKAGE_MAIN={}", main))
            .current_dir(&self.build_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::ExternalTool(format!("Failed to run make: {}", e)))?;

        // Drain both pipes on their own threads so a chatty build cannot block
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let out_reader = std::thread::spawn(move || read_pipe(stdout));
        let err_reader = std::thread::spawn(move || read_pipe(stderr));

        let status = match child.wait_timeout(self.timeout)? {
            Some(status) => status,
            None => {
                warn!("Container build exceeded {:?}, killing it", self.timeout);
                child.kill()?;
                child.wait()?;
                return Err(Error::ExternalTool(format!(
                    "make test timed out after {} seconds",
                    self.timeout.as_secs()
                )));
            }
        };

        let mut output = out_reader.join().unwrap_or_default();
        output.push_str(&err_reader.join().unwrap_or_default());

        if !status.success() {
            // lint failures exit non-zero but their output is still the report
            warn!("make test exited with {}", status);
        }
        Ok(output)
    }
}

/// `PACKAGE_MAIN` value: the main file's name, only needed with several `.el` files
fn package_main(package: &StagedPackage, main_file: Option<&str>) -> String {
    if package.elisp_count() <= 1 {
        return String::new();
    }
    main_file
        .and_then(|f| Path::new(f).file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub(crate) fn read_pipe<R: Read>(pipe: Option<R>) -> String {
    let mut text = String::new();
    if let Some(mut pipe) = pipe {
        let mut bytes = Vec::new();
        if pipe.read_to_end(&mut bytes).is_ok() {
            text = String::from_utf8_lossy(&bytes).into_owned();
        }
    }
    text
}

/// Classify build output line by line
///
/// `byte-compile-file` writes `:Error:`/`:Warning:`, package-lint writes
/// `: error:`/`: warning:`, and section headers start with `### `.
pub fn classify_build_output(output: &str) -> Report {
    let mut report = Report::new();
    for line in output.trim().lines() {
        if line.contains(":Error: ") || line.contains(": error: ") {
            report.push(Diagnostic::new(Severity::Error, line).with_highlight(r" ?[Ee]rror:"));
        } else if line.contains(":Warning: ") || line.contains(": warning: ") {
            report.push(Diagnostic::new(Severity::Warning, line).with_highlight(r" ?[Ww]arning:"));
        } else if line.starts_with("### ") {
            report.heading(line);
        } else if !line.starts_with("make[1]: Leaving directory") {
            report.info(line);
        }
    }
    report
}

/// Write the container's dependency setup script
pub fn write_requirements_script(build_dir: &Path, requirements: &RequirementSet) -> Result<PathBuf> {
    let mut script = String::new();
    // emacs --script sets load-file-name, which confuses packages that read it
    script.push_str("(let ((load-file-name nil))\n");
    script.push_str(
        r#"  (require 'package)
  (package-initialize)
  (setq package-archives nil)
  (add-to-list 'package-archives '("gnu" . "https://elpa.gnu.org/packages/"))
  (add-to-list 'package-archives '("melpa" . "https://melpa.org/packages/"))
  (package-refresh-contents)
  (package-reinstall 'package-lint)
"#,
    );

    for name in requirements.names() {
        match name {
            "emacs" => {}
            "org" => script.push_str("  (package-install (cadr (assq 'org package-archive-contents)))\n"),
            _ => script.push_str(&format!("  (package-install '{})\n", name)),
        }
    }
    script.push_str(") ; end let\n");

    let path = build_dir.join(REQUIREMENTS_SCRIPT);
    fs::write(&path, script)
        .map_err(|e| Error::IoError(format!("Failed to write {}: {}", path.display(), e)))?;
    Ok(path)
}
