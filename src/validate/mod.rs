// src/validate/mod.rs

//! Validation pipeline
//!
//! Runs every check for one recipe against one checkout and collects the
//! results into a [`Report`]. An unreadable recipe stops the run right
//! away; fatal collaborator errors ([`crate::Error::is_fatal`]) are
//! returned; everything else becomes a diagnostic and the run goes on.
//!
//! Order of checks:
//!
//! 1. Recipe well-formedness
//! 2. File expansion and staging into `<build_dir>/pkg`
//! 3. Containerized build (when a [`BuildRunner`] is configured)
//! 4. Similarly named packages (when a [`PackageIndex`] is configured)
//! 5. Archived repository, recipe conventions, license
//! 6. Package-Requires consistency
//! 7. Per-file listing
//! 8. Pull request footnotes (pull request submissions only)

mod checks;
mod files;

pub use checks::{
    check_archived, check_package_license, check_package_requires, check_recipe,
    check_similar_packages,
};
pub use files::{check_package_files, file_summary};

use crate::build::{
    classify_build_output, stage_files, write_requirements_script, BuildRunner, FileExpander,
    GlobExpander,
};
use crate::error::Result;
use crate::recipe::{main_file, validate_recipe, Recipe};
use crate::report::Report;
use crate::repository::{pr_footnotes, NoMetadata, PackageIndex, PullRequest, RepoMetadataSource};
use crate::requirements::{requirements, RequirementSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One recipe checked against one checkout
#[derive(Debug, Clone, Copy)]
pub struct Submission<'a> {
    pub recipe: &'a str,
    /// Local copy of the upstream repository
    pub checkout: &'a Path,
    /// Upstream address, when the checkout was cloned
    pub clone_address: Option<&'a str>,
    pub pull_request: Option<&'a PullRequest>,
}

impl<'a> Submission<'a> {
    pub fn new(recipe: &'a str, checkout: &'a Path) -> Self {
        Self {
            recipe,
            checkout,
            clone_address: None,
            pull_request: None,
        }
    }

    pub fn with_clone_address(mut self, clone_address: &'a str) -> Self {
        self.clone_address = Some(clone_address);
        self
    }

    pub fn with_pull_request(mut self, pull_request: &'a PullRequest) -> Self {
        self.pull_request = Some(pull_request);
        self
    }
}

/// Outcome of a run
#[derive(Debug, Clone)]
pub struct Validation {
    pub report: Report,
    /// Resolved main file, as staged
    pub main_file: Option<String>,
    /// Staged file list
    pub files: Vec<String>,
}

impl Validation {
    fn aborted(report: Report) -> Self {
        Self {
            report,
            main_file: None,
            files: Vec::new(),
        }
    }
}

/// Configured check sequence
pub struct Validator {
    build_dir: PathBuf,
    expander: Box<dyn FileExpander>,
    metadata: Box<dyn RepoMetadataSource>,
    index: Option<Box<dyn PackageIndex>>,
    builder: Option<Box<dyn BuildRunner>>,
}

impl Validator {
    /// Validator with native file expansion and no network collaborators
    pub fn new(build_dir: impl Into<PathBuf>) -> Self {
        Self {
            build_dir: build_dir.into(),
            expander: Box::new(GlobExpander),
            metadata: Box::new(NoMetadata),
            index: None,
            builder: None,
        }
    }

    pub fn with_expander(mut self, expander: impl FileExpander + 'static) -> Self {
        self.expander = Box::new(expander);
        self
    }

    pub fn with_metadata(mut self, metadata: impl RepoMetadataSource + 'static) -> Self {
        self.metadata = Box::new(metadata);
        self
    }

    /// Enable the similar-package check
    pub fn with_index(mut self, index: impl PackageIndex + 'static) -> Self {
        self.index = Some(Box::new(index));
        self
    }

    /// Enable the containerized build
    pub fn with_builder(mut self, builder: impl BuildRunner + 'static) -> Self {
        self.builder = Some(Box::new(builder));
        self
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Run every check for `submission`
    pub fn run(&self, submission: &Submission<'_>) -> Result<Validation> {
        let mut report = Report::new();
        if !validate_recipe(submission.recipe) {
            report.fail(format!("Recipe '{}' appears to be invalid", submission.recipe));
            return Ok(Validation::aborted(report));
        }

        let recipe = Recipe::parse(submission.recipe)?;
        let checkout = submission.checkout;
        info!("Checking {} in {}", recipe.name(), checkout.display());

        let files = self.expander.expand(&recipe, checkout)?;
        let default_files = match recipe.to_default_form() {
            Ok(default) => self.expander.expand(&default, checkout).unwrap_or_default(),
            Err(e) => {
                debug!("No default form: {}", e);
                Vec::new()
            }
        };
        let uses_default_files = files == default_files;

        let package = stage_files(checkout, &files, &self.build_dir)?;
        let main = main_file(package.files(), recipe.name()).map(str::to_string);

        let main_requirements = match requirements(package.dir(), package.files(), Some(recipe.name())) {
            Ok(set) => set,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                report.fail(format!("- Package-Requires: {e}"));
                RequirementSet::new()
            }
        };

        if let Some(builder) = &self.builder {
            report.info(format!("Building container for {}...", recipe.name()));
            write_requirements_script(&self.build_dir, &main_requirements)?;
            match builder.build(&package, main.as_deref()) {
                Ok(output) => report.extend(classify_build_output(&output)),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => report.fail(format!("- Build failed: {e}")),
            }
        }

        if let Some(index) = &self.index {
            check_similar_packages(recipe.name(), index.as_ref(), &mut report);
        }

        let repo_info = submission
            .clone_address
            .and_then(|address| self.metadata.repo_info(address));

        report.heading("### Package ###");
        check_archived(repo_info.as_ref(), &mut report);
        check_recipe(submission.recipe, &recipe, main.as_deref(), uses_default_files, &mut report);
        check_package_license(&package, checkout, repo_info.as_ref(), &mut report)?;
        check_package_requires(&package, main.as_deref(), &main_requirements, &mut report);
        check_package_files(&package, &mut report)?;

        if let (Some(address), Some(pull_request)) = (submission.clone_address, submission.pull_request) {
            pr_footnotes(&mut report, submission.recipe, address, pull_request, repo_info.as_ref());
        }

        Ok(Validation {
            report,
            main_file: main,
            files: package.files().to_vec(),
        })
    }
}
