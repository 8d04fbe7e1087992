// src/repository/index.rs

//! Index of already-published package names
//!
//! Merges three sources into a name -> URL map: the emacsmirror epkgs
//! submodule list, MELPA's `archive.json`, and per-keyword probes of the
//! emacswiki.org mirror. Later sources win for names that appear twice.

use super::client::HttpClient;
use crate::cache::{LookupCache, MemoCache};
use crate::error::Result;
use std::collections::BTreeMap;
use tracing::{debug, info};

const MELPA_ARCHIVE: &str = "https://melpa.org/archive.json";
const EPKGS_GITMODULES: &str =
    "https://raw.githubusercontent.com/emacsmirror/epkgs/master/.gitmodules";
const EMACSWIKI_MIRROR: &str = "https://github.com/emacsmirror/emacswiki.org/blob/master";

/// Package name -> where it can be found
pub type PackageListing = BTreeMap<String, String>;

/// Lookup of existing packages
pub trait PackageIndex {
    /// Every known package plus any found specifically for `keywords`
    fn packages(&self, keywords: &[String]) -> Result<PackageListing>;
}

/// Names to search for when checking `name` for duplicates
///
/// ```
/// use melpazoid::repository::search_keywords;
///
/// assert_eq!(search_keywords("foo-mode"), ["foo-mode", "foo"]);
/// assert_eq!(search_keywords("ox-foo"), ["ox-foo", "org-foo"]);
/// assert_eq!(search_keywords("org-foo"), ["org-foo", "ox-foo"]);
/// ```
pub fn search_keywords(name: &str) -> Vec<String> {
    let mut keywords = vec![name.to_string()];
    if let Some(stem) = name.strip_suffix("-mode") {
        keywords.push(stem.to_string());
    }
    if let Some(rest) = name.strip_prefix("ox-") {
        keywords.push(format!("org-{rest}"));
    }
    if let Some(rest) = name.strip_prefix("org-") {
        keywords.push(format!("ox-{rest}"));
    }
    keywords
}

/// Parse the epkgs `.gitmodules` file into name -> https URL
pub fn parse_gitmodules(text: &str) -> PackageListing {
    let mut packages = PackageListing::new();
    let mut current: Option<String> = None;

    for line in text.lines().map(str::trim) {
        if line.starts_with("[submodule") {
            current = line.split('"').nth(1).map(str::to_string);
        } else if let (Some(name), Some(value)) = (&current, line.strip_prefix("url")) {
            let Some(address) = value.trim_start().strip_prefix('=') else {
                continue;
            };
            packages.insert(name.clone(), https_address(address.trim()));
        }
    }
    packages
}

/// `git@host:owner/repo.git` -> `https://host/owner/repo.git`
fn https_address(address: &str) -> String {
    match address.strip_prefix("git@") {
        Some(rest) => format!("https://{}", rest.replacen(':', "/", 1)),
        None => address.to_string(),
    }
}

/// The live MELPA, epkgs and emacswiki sources
pub struct RemotePackageIndex<C = MemoCache<PackageListing>> {
    client: HttpClient,
    known: C,
}

impl RemotePackageIndex {
    pub fn new(client: HttpClient) -> Self {
        Self::with_cache(client, MemoCache::new())
    }
}

impl<C: LookupCache<PackageListing>> RemotePackageIndex<C> {
    pub fn with_cache(client: HttpClient, cache: C) -> Self {
        Self { client, known: cache }
    }

    fn known_packages(&self) -> Result<PackageListing> {
        self.known.get_or_try_insert("known", || -> Result<PackageListing> {
            info!("Downloading package indexes");
            let mut packages = parse_gitmodules(&self.client.get_text(EPKGS_GITMODULES)?);

            let archive: serde_json::Map<String, serde_json::Value> =
                self.client.get_json(MELPA_ARCHIVE)?;
            for name in archive.keys() {
                packages.insert(name.clone(), format!("https://melpa.org/#/{name}"));
            }
            debug!("{} known packages", packages.len());
            Ok(packages)
        })
    }

    fn emacswiki_packages(&self, keywords: &[String]) -> PackageListing {
        let mut packages = PackageListing::new();
        for keyword in keywords {
            let file = if keyword.ends_with(".el") {
                keyword.clone()
            } else {
                format!("{keyword}.el")
            };
            let url = format!("{EMACSWIKI_MIRROR}/{file}");
            if self.client.exists(&url) {
                packages.insert(keyword.clone(), url);
            }
        }
        packages
    }
}

impl<C: LookupCache<PackageListing>> PackageIndex for RemotePackageIndex<C> {
    fn packages(&self, keywords: &[String]) -> Result<PackageListing> {
        let mut packages = self.known_packages()?;
        packages.extend(self.emacswiki_packages(keywords));
        Ok(packages)
    }
}
