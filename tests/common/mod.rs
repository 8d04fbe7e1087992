// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use melpazoid::build::{BuildRunner, StagedPackage};
use melpazoid::repository::{PackageIndex, PackageListing, RepoInfo, RepoLicense, RepoMetadataSource};
use melpazoid::{Report, Result, Severity};
use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use tempfile::TempDir;

pub const SHX_RECIPE: &str = r#"(shx :repo "riscy/shx-for-emacs" :fetcher github)"#;
pub const SHX_ADDRESS: &str = "https://github.com/riscy/shx-for-emacs.git";

pub const MIT_BOILERPLATE: &str = "\
;; Permission is hereby granted, free of charge, to any person obtaining a copy
;; of this software and associated documentation files (the \"Software\"), to deal
;; in the Software without restriction.
";

/// A `.el` file with a proper first line and the given body
pub fn elisp(name: &str, summary: &str, body: &str) -> String {
    format!(
        ";;; {name} --- {summary} -*- lexical-binding: t -*-\n\n{body}\n;;; {name} ends here\n"
    )
}

/// Create a checkout holding `files` (path, contents).
///
/// Returns the TempDir - keep it alive to prevent cleanup.
pub fn checkout(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (path, contents) in files {
        let path = dir.path().join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }
    dir
}

/// Checkout of a minimal, well-formed shx package
pub fn shx_checkout() -> TempDir {
    let shx = elisp("shx.el", "Enhance comint-mode", MIT_BOILERPLATE);
    checkout(&[("shx.el", shx.as_str()), ("README.org", "* shx\n")])
}

pub fn messages(report: &Report) -> Vec<String> {
    report.diagnostics().iter().map(|d| d.message.clone()).collect()
}

pub fn errors(report: &Report) -> Vec<String> {
    report
        .with_severity(Severity::Error)
        .map(|d| d.message.clone())
        .collect()
}

/// Hosted metadata that answers with a fixed document for every address
pub struct FakeMetadata(pub Option<RepoInfo>);

impl FakeMetadata {
    pub fn licensed(name: &str) -> Self {
        FakeMetadata(Some(RepoInfo {
            license: Some(RepoLicense {
                name: name.to_string(),
            }),
            created_at: Some("2018-06-09T21:37:56Z".to_string()),
            updated_at: Some("2020-05-01T00:00:00Z".to_string()),
            watchers_count: 12,
            ..RepoInfo::default()
        }))
    }
}

impl RepoMetadataSource for FakeMetadata {
    fn repo_info(&self, _clone_address: &str) -> Option<RepoInfo> {
        self.0.clone()
    }
}

/// Package index backed by a fixed listing
pub struct FakeIndex(pub PackageListing);

impl FakeIndex {
    pub fn with(names: &[&str]) -> Self {
        FakeIndex(
            names
                .iter()
                .map(|n| (n.to_string(), format!("https://melpa.org/#/{n}")))
                .collect(),
        )
    }
}

impl PackageIndex for FakeIndex {
    fn packages(&self, _keywords: &[String]) -> Result<PackageListing> {
        Ok(self.0.clone())
    }
}

/// Build runner that replays canned output and records the main file it got
pub struct FakeBuilder {
    pub output: String,
    pub seen_main: Rc<RefCell<Option<String>>>,
}

impl FakeBuilder {
    pub fn new(output: &str) -> Self {
        FakeBuilder {
            output: output.to_string(),
            seen_main: Rc::new(RefCell::new(None)),
        }
    }
}

impl BuildRunner for FakeBuilder {
    fn build(&self, package: &StagedPackage, main_file: Option<&str>) -> Result<String> {
        assert!(package.dir().ends_with("pkg"));
        *self.seen_main.borrow_mut() = main_file.map(str::to_string);
        Ok(self.output.clone())
    }
}

pub fn staged(build: &TempDir, file: &str) -> bool {
    Path::new(&build.path().join("pkg").join(file)).exists()
}
