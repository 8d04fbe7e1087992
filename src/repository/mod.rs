// src/repository/mod.rs

//! Upstream collaborators
//!
//! This module provides functionality for:
//! - Querying hosted repository metadata (license, archived flag, dates)
//! - Looking up already-published package names
//! - Cloning package sources with git or hg
//! - Reading recipe submissions out of MELPA pull requests

mod client;
mod github;
mod index;
mod pull_request;
mod scm;

pub use client::HttpClient;
pub use github::{
    github_repo_path, GithubMetadata, NoMetadata, RepoInfo, RepoLicense, RepoMetadataSource,
    GITHUB_API,
};
pub use index::{parse_gitmodules, search_keywords, PackageIndex, PackageListing, RemotePackageIndex};
pub use pull_request::{
    fetch_pull_request, fetch_recipe, find_pull_request, pr_footnotes, prettify_recipe,
    recipe_from_diff, PullRequest, PullRequestUser, MELPA_PR_PATTERN,
};
pub use scm::{clone_args, copy_local_repo, SourceFetcher};
