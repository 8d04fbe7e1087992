// src/repository/scm.rs

//! Fetching package sources
//!
//! Clones with git or hg according to the recipe's fetcher, or copies a
//! local working tree when one is configured.

use super::client::HttpClient;
use crate::build::{copy_tree, read_pipe};
use crate::error::{Error, Result};
use crate::recipe::Fetcher;
use crate::report::Report;
use std::fs;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::time::Duration;
use tracing::{debug, info, warn};
use wait_timeout::ChildExt;

/// Default timeout for a clone (10 minutes)
const CLONE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Clone command line for a fetcher, without the program name
///
/// ```
/// use melpazoid::recipe::Fetcher;
/// use melpazoid::repository::clone_args;
///
/// let (scm, args) = clone_args(&Fetcher::Hg, "https://hg.example.org/x", None, "/tmp/x");
/// assert_eq!(scm, "hg");
/// assert_eq!(args, ["clone", "--branch", "default", "https://hg.example.org/x", "/tmp/x"]);
/// ```
pub fn clone_args(
    fetcher: &Fetcher,
    address: &str,
    branch: Option<&str>,
    into: &str,
) -> (&'static str, Vec<String>) {
    let mut args = vec!["clone".to_string()];
    let scm = if fetcher.is_mercurial() {
        args.push("--branch".to_string());
        args.push(branch.unwrap_or("default").to_string());
        "hg"
    } else {
        if let Some(branch) = branch {
            args.push("--branch".to_string());
            args.push(branch.to_string());
        }
        args.push("--single-branch".to_string());
        if fetcher.is_hosted() {
            args.push("--depth".to_string());
            args.push("1".to_string());
        }
        "git"
    };
    args.push(address.to_string());
    args.push(into.to_string());
    (scm, args)
}

/// Clones upstream repositories
pub struct SourceFetcher {
    client: HttpClient,
    timeout: Duration,
}

impl SourceFetcher {
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            timeout: CLONE_TIMEOUT,
        }
    }

    /// Clone `address` into `into`
    ///
    /// Returns false, with a failure in `report`, when the address does not
    /// resolve or the clone fails.
    pub fn clone_into(
        &self,
        fetcher: &Fetcher,
        address: &str,
        branch: Option<&str>,
        into: &Path,
        report: &mut Report,
    ) -> Result<bool> {
        match branch {
            Some(branch) => report.info(format!("Checking out {address} ({branch} branch)")),
            None => report.info(format!("Checking out {address}")),
        }

        if !self.client.exists(address) {
            report.fail(format!("Unable to locate {address}"));
            return Ok(false);
        }

        if let Some(parent) = into.parent() {
            fs::create_dir_all(parent)?;
        }
        let (scm, args) = clone_args(fetcher, address, branch, &into.to_string_lossy());
        let program = which::which(scm)
            .map_err(|e| Error::ExternalTool(format!("{scm} not found: {e}")))?;

        info!("Running {} {}", scm, args.join(" "));
        let mut command = Command::new(program);
        command.args(&args);

        match run_bounded(command, self.timeout)? {
            Some((status, stderr)) => {
                for line in stderr.lines() {
                    debug!("[{}] {}", scm, line);
                }
                if status.success() {
                    Ok(true)
                } else {
                    report.fail(format!("Unable to clone:\n  {} {}", scm, args.join(" ")));
                    Ok(false)
                }
            }
            None => {
                report.fail(format!(
                    "Unable to clone {} within {} seconds",
                    address,
                    self.timeout.as_secs()
                ));
                Ok(false)
            }
        }
    }
}

/// Run `command` with no stdin or stdout, collecting its stderr
///
/// Returns `None` once the child has been killed and reaped after
/// `timeout`.
fn run_bounded(mut command: Command, timeout: Duration) -> Result<Option<(ExitStatus, String)>> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| Error::ExternalTool(format!("Failed to spawn {:?}: {e}", command.get_program())))?;

    let stderr = child.stderr.take();
    let err_reader = std::thread::spawn(move || read_pipe(stderr));

    match child.wait_timeout(timeout)? {
        Some(status) => Ok(Some((status, err_reader.join().unwrap_or_default()))),
        None => {
            warn!("{:?} exceeded {:?}, killing it", command.get_program(), timeout);
            child.kill()?;
            child.wait()?;
            Ok(None)
        }
    }
}

/// Copy a local working tree into `into`
pub fn copy_local_repo(local: &Path, into: &Path, report: &mut Report) -> Result<()> {
    if !local.is_dir() {
        return Err(Error::IoError(format!(
            "Local repository {} is not a directory",
            local.display()
        )));
    }
    report.info(format!("Using local repository at {}", local.display()));
    copy_tree(local, into)
}
