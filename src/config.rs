// src/config.rs

//! Runtime configuration from the environment
//!
//! | Variable              | Effect                                            |
//! |-----------------------|---------------------------------------------------|
//! | `LOCAL_REPO`          | check this working tree instead of cloning        |
//! | `NO_COLOR`            | plain report output                               |
//! | `EXIST_OK`            | `true` skips the similar-package check            |
//! | `EXPECT_ERROR`        | exit status to report as success                  |
//! | `GITHUB_TOKEN`        | token for GitHub API requests                     |
//! | `MELPAZOID_BUILD_DIR` | where `pkg/` and `_requirements.el` are written   |
//!
//! CI branch discovery reads `CI_BRANCH`, `GITHUB_REF`,
//! `TRAVIS_PULL_REQUEST_BRANCH` and `TRAVIS_BRANCH` (see [`ci_branch`]).

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Settings shared by every check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub local_repo: Option<PathBuf>,
    pub no_color: bool,
    pub exist_ok: bool,
    pub expect_error: i32,
    pub github_token: Option<String>,
    pub build_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            local_repo: None,
            no_color: false,
            exist_ok: false,
            expect_error: 0,
            github_token: None,
            build_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Read the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let local_repo = match non_empty("LOCAL_REPO") {
            Some(path) => {
                let path = expand_home(&path);
                if !path.is_dir() {
                    return Err(Error::IoError(format!(
                        "LOCAL_REPO {} is not a directory",
                        path.display()
                    )));
                }
                Some(path)
            }
            None => None,
        };

        let expect_error = match non_empty("EXPECT_ERROR") {
            Some(code) => code.trim().parse().map_err(|e| {
                Error::ParseError(format!("EXPECT_ERROR must be an integer, got '{code}': {e}"))
            })?,
            None => 0,
        };

        Ok(Self {
            local_repo,
            no_color: non_empty("NO_COLOR").is_some(),
            exist_ok: non_empty("EXIST_OK").is_some_and(|v| v.eq_ignore_ascii_case("true")),
            expect_error,
            github_token: non_empty("GITHUB_TOKEN"),
            build_dir: non_empty("MELPAZOID_BUILD_DIR")
                .map(|dir| expand_home(&dir))
                .unwrap_or_else(|| PathBuf::from(".")),
        })
    }
}

/// Branch under test in a CI job, if any
///
/// ```
/// use melpazoid::config::ci_branch;
///
/// let env = |key: &str| (key == "GITHUB_REF").then(|| "refs/heads/feature".to_string());
/// assert_eq!(ci_branch(env).as_deref(), Some("feature"));
/// ```
pub fn ci_branch<F>(lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |value: Option<String>| value.filter(|v| !v.is_empty());

    non_empty(lookup("CI_BRANCH"))
        .or_else(|| {
            lookup("GITHUB_REF")
                .and_then(|r| r.rsplit('/').next().map(str::to_string))
                .filter(|v| !v.is_empty())
        })
        .or_else(|| non_empty(lookup("TRAVIS_PULL_REQUEST_BRANCH")))
        .or_else(|| non_empty(lookup("TRAVIS_BRANCH")))
}

/// Expand a leading `~` to the home directory
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(path));
    }
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => Path::new(path).to_path_buf(),
    }
}
