// src/repository/github.rs

//! Hosted repository metadata from the GitHub API
//!
//! Lookups that fail for any reason (not on GitHub, rate limited, offline)
//! yield `None` so callers fall back to local evidence.

use super::client::HttpClient;
use crate::cache::{LookupCache, MemoCache};
use crate::license::HostedLicense;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

/// Base URL of the repositories API
pub const GITHUB_API: &str = "https://api.github.com/repos";

/// The subset of a GitHub repository document the checks read
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RepoInfo {
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub license: Option<RepoLicense>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub watchers_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepoLicense {
    pub name: String,
}

impl RepoInfo {
    /// License as the host reports it
    pub fn hosted_license(&self) -> HostedLicense {
        match &self.license {
            Some(license) => HostedLicense::Named(license.name.clone()),
            None => HostedLicense::Missing,
        }
    }
}

/// Source of hosted repository metadata
pub trait RepoMetadataSource {
    /// Metadata for the repository behind `clone_address`, if known
    fn repo_info(&self, clone_address: &str) -> Option<RepoInfo>;
}

/// Never knows anything; used for local checkouts and tests
#[derive(Debug, Default, Clone, Copy)]
pub struct NoMetadata;

impl RepoMetadataSource for NoMetadata {
    fn repo_info(&self, _clone_address: &str) -> Option<RepoInfo> {
        None
    }
}

/// GitHub API lookups memoized per clone address
pub struct GithubMetadata<C = MemoCache<Option<RepoInfo>>> {
    client: HttpClient,
    cache: C,
}

impl GithubMetadata {
    pub fn new(client: HttpClient) -> Self {
        Self::with_cache(client, MemoCache::new())
    }
}

impl<C: LookupCache<Option<RepoInfo>>> GithubMetadata<C> {
    pub fn with_cache(client: HttpClient, cache: C) -> Self {
        Self { client, cache }
    }

    fn fetch(&self, clone_address: &str) -> Option<RepoInfo> {
        let path = github_repo_path(clone_address)?;
        let api_url = format!("{GITHUB_API}/{path}");
        info!("Querying {}", api_url);
        match self.client.get_json::<RepoInfo>(&api_url) {
            Ok(info) => Some(info),
            Err(e) => {
                debug!("No repository metadata for {}: {}", clone_address, e);
                None
            }
        }
    }
}

impl<C: LookupCache<Option<RepoInfo>>> RepoMetadataSource for GithubMetadata<C> {
    fn repo_info(&self, clone_address: &str) -> Option<RepoInfo> {
        if let Some(cached) = self.cache.get(clone_address) {
            return cached;
        }
        let info = self.fetch(clone_address);
        self.cache.put(clone_address.to_string(), info.clone());
        info
    }
}

/// `owner/repo` of a github.com clone address
///
/// ```
/// use melpazoid::repository::github_repo_path;
///
/// assert_eq!(
///     github_repo_path("https://github.com/riscy/shx-for-emacs.git").as_deref(),
///     Some("riscy/shx-for-emacs")
/// );
/// assert_eq!(github_repo_path("https://gitlab.com/a/b.git"), None);
/// ```
pub fn github_repo_path(clone_address: &str) -> Option<String> {
    let url = Url::parse(clone_address).ok()?;
    let host = url.host_str()?.to_ascii_lowercase();
    if host != "github.com" && host != "www.github.com" {
        return None;
    }

    let path = url.path().trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    if path.is_empty() {
        None
    } else {
        Some(path.to_string())
    }
}
