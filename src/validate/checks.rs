// src/validate/checks.rs

//! Individual packaging checks
//!
//! Each check appends to the report and never aborts the run.

use crate::build::StagedPackage;
use crate::error::{Error, Result};
use crate::license::{
    check_license, detect_license, find_license_file, needs_boilerplate, HostedLicense,
    LicenseEvidence,
};
use crate::recipe::{default_recipe, Fetcher, Recipe};
use crate::report::{Diagnostic, Report, Severity};
use crate::repository::{search_keywords, PackageIndex, RepoInfo};
use crate::requirements::{read_lossy, requirements_of_file, RequirementSet};
use std::path::Path;
use tracing::warn;

/// Most similarly named packages listed
const MAX_SIMILAR: usize = 10;

/// Recipe-level conventions
///
/// `uses_default_files` is whether the default-form recipe selects exactly
/// the same files as this one.
pub fn check_recipe(
    recipe_text: &str,
    recipe: &Recipe,
    main_file: Option<&str>,
    uses_default_files: bool,
    report: &mut Report,
) {
    if recipe.contains(":branch") {
        report.warn("- Avoid specifying `:branch` except in unusual cases");
    }

    if matches!(recipe.fetcher(), Ok(Fetcher::Gitlab)) && (recipe.repo().is_none() || recipe.url().is_some()) {
        report.fail("- With the GitLab fetcher you MUST set :repo and you MUST NOT set :url");
    }

    if main_file.is_none() {
        report.fail(format!("- No .el file matches the name '{}'", recipe.name()));
    }

    if recipe.contains(":files") && !recipe.has_defaults() {
        report.warn("- Prefer the default recipe if possible.");
        if uses_default_files {
            match default_recipe(recipe_text) {
                Ok(minimal) => report.fail(format!("  It seems to be equivalent: `{minimal}`")),
                Err(e) => warn!("No default form for {}: {}", recipe.name(), e),
            }
        }
    }
}

/// Fail when the hosted repository is archived
pub fn check_archived(repo_info: Option<&RepoInfo>, report: &mut Report) {
    if repo_info.is_some_and(|info| info.archived) {
        report.fail("- GitHub repository is archived");
    }
}

/// Gather license evidence and apply the license policy
pub fn check_package_license(
    package: &StagedPackage,
    checkout: &Path,
    repo_info: Option<&RepoInfo>,
    report: &mut Report,
) -> Result<bool> {
    let hosted = repo_info
        .map(RepoInfo::hosted_license)
        .unwrap_or(HostedLicense::Unavailable);

    let mut files = Vec::new();
    for file in package.files().iter().filter(|f| needs_boilerplate(f)) {
        let text = read_lossy(&package.path(file))?;
        files.push((file.clone(), detect_license(&text)));
    }

    let evidence = LicenseEvidence {
        hosted,
        repository_file: find_license_file(checkout)?,
        files,
    };
    Ok(check_license(&evidence, report))
}

/// Report the main file's requirements and flag inconsistent declarations
pub fn check_package_requires(
    package: &StagedPackage,
    main_file: Option<&str>,
    main_requirements: &RequirementSet,
    report: &mut Report,
) {
    if main_requirements.is_empty() {
        report.info("- Package-Requires: n/a");
    } else {
        report.info(format!("- Package-Requires: {main_requirements}"));
    }

    for entry in main_requirements.repaired() {
        report.fail(format!("Version in '{entry}' must be a string!  Attempting patch"));
    }
    for problem in main_requirements.malformed() {
        report.fail(format!("- Package-Requires: {problem}"));
    }

    // without a main file every declaration is already in the main set
    let Some(main_name) = main_file else {
        return;
    };
    for file in package.files() {
        if file == main_name {
            continue;
        }
        let file_requirements = match requirements_of_file(&package.path(file)) {
            Ok(set) => set,
            Err(Error::MalformedDependency(e)) => {
                report.fail(format!("  - {file}: {e}"));
                continue;
            }
            Err(e) => {
                warn!("Could not read requirements of {}: {}", file, e);
                continue;
            }
        };
        for problem in file_requirements.malformed() {
            report.fail(format!("  - {file}: {problem}"));
        }
        if !file_requirements.is_empty() && file_requirements.is_strict_superset_of(main_requirements) {
            report.fail(format!(
                "  - Package-Requires mismatch between {} and {}!",
                basename(file),
                basename(main_name)
            ));
        }
    }
}

/// List similarly named packages and fail on an exact name clash
pub fn check_similar_packages(name: &str, index: &dyn PackageIndex, report: &mut Report) {
    let keywords = search_keywords(name);
    let packages = match index.packages(&keywords) {
        Ok(packages) => packages,
        Err(e) => {
            warn!("Package index unavailable: {}", e);
            return;
        }
    };

    let similar: Vec<(&String, &String)> = packages
        .iter()
        .filter(|(candidate, _)| keywords.iter().any(|k| candidate.contains(k.as_str())))
        .collect();
    if similar.is_empty() {
        return;
    }

    report.heading("### Similarly named ###");
    for (candidate, url) in similar.into_iter().take(MAX_SIMILAR) {
        report.info(format!("- {candidate}: {url}"));
    }
    if packages.contains_key(name) {
        report.push(
            Diagnostic::new(Severity::Error, format!("- Error: a package called '{name}' exists"))
                .with_highlight("Error:"),
        );
    }
}

fn basename(file: &str) -> &str {
    Path::new(file)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::stage_files;
    use crate::repository::PackageListing;
    use std::fs;
    use tempfile::TempDir;

    struct FixedIndex(PackageListing);

    impl PackageIndex for FixedIndex {
        fn packages(&self, _keywords: &[String]) -> Result<PackageListing> {
            Ok(self.0.clone())
        }
    }

    struct OfflineIndex;

    impl PackageIndex for OfflineIndex {
        fn packages(&self, _keywords: &[String]) -> Result<PackageListing> {
            Err(Error::NetworkUnavailable("offline".to_string()))
        }
    }

    fn messages(report: &Report) -> Vec<&str> {
        report.diagnostics().iter().map(|d| d.message.as_str()).collect()
    }

    #[test]
    fn test_branch_is_discouraged() {
        let text = r#"(foo :repo "a/foo" :fetcher github :branch "dev")"#;
        let recipe = Recipe::parse(text).unwrap();
        let mut report = Report::new();
        check_recipe(text, &recipe, Some("foo.el"), false, &mut report);
        assert_eq!(report.severity(), Severity::Warning);
    }

    #[test]
    fn test_gitlab_requires_repo() {
        let text = r#"(foo :url "https://gitlab.com/a/foo" :fetcher gitlab)"#;
        let recipe = Recipe::parse(text).unwrap();
        let mut report = Report::new();
        check_recipe(text, &recipe, Some("foo.el"), false, &mut report);
        assert!(messages(&report)[0].starts_with("- With the GitLab fetcher"));
        assert!(report.failed());
    }

    #[test]
    fn test_missing_main_file() {
        let text = r#"(foo :repo "a/foo" :fetcher github)"#;
        let recipe = Recipe::parse(text).unwrap();
        let mut report = Report::new();
        check_recipe(text, &recipe, None, true, &mut report);
        assert_eq!(messages(&report), ["- No .el file matches the name 'foo'"]);
    }

    #[test]
    fn test_redundant_files_escalates() {
        let text = r#"(foo :repo "a/foo" :fetcher github :files ("*.el"))"#;
        let recipe = Recipe::parse(text).unwrap();

        let mut report = Report::new();
        check_recipe(text, &recipe, Some("foo.el"), false, &mut report);
        assert_eq!(report.severity(), Severity::Warning);

        let mut report = Report::new();
        check_recipe(text, &recipe, Some("foo.el"), true, &mut report);
        assert_eq!(report.count(Severity::Error), 1);
        assert_eq!(
            report.with_severity(Severity::Error).next().unwrap().message,
            r#"  It seems to be equivalent: `(foo :repo "a/foo" :fetcher github)`"#
        );
    }

    #[test]
    fn test_files_with_defaults_is_fine() {
        let text = r#"(foo :repo "a/foo" :fetcher github :files (:defaults "snippets"))"#;
        let recipe = Recipe::parse(text).unwrap();
        let mut report = Report::new();
        check_recipe(text, &recipe, Some("foo.el"), true, &mut report);
        assert!(report.diagnostics().is_empty());
    }

    #[test]
    fn test_archived() {
        let mut report = Report::new();
        check_archived(None, &mut report);
        check_archived(Some(&RepoInfo::default()), &mut report);
        assert!(!report.failed());

        let archived = RepoInfo {
            archived: true,
            ..RepoInfo::default()
        };
        check_archived(Some(&archived), &mut report);
        assert!(report.failed());
    }

    #[test]
    fn test_package_requires_mismatch() {
        let checkout = TempDir::new().unwrap();
        let build = TempDir::new().unwrap();
        fs::write(
            checkout.path().join("foo.el"),
            ";;; foo.el --- Foo\n;; Package-Requires: ((emacs \"25.1\"))\n",
        )
        .unwrap();
        fs::write(
            checkout.path().join("foo-extra.el"),
            ";;; foo-extra.el --- Extra\n;; Package-Requires: ((emacs \"25.1\") (dash \"2.19\"))\n",
        )
        .unwrap();
        let files = vec!["foo-extra.el".to_string(), "foo.el".to_string()];
        let package = stage_files(checkout.path(), &files, build.path()).unwrap();

        let mut main = RequirementSet::new();
        main.add_declaration(r#"((emacs "25.1"))"#).unwrap();

        let mut report = Report::new();
        check_package_requires(&package, Some("foo.el"), &main, &mut report);
        assert_eq!(
            messages(&report),
            [
                r#"- Package-Requires: emacs "25.1""#,
                "  - Package-Requires mismatch between foo-extra.el and foo.el!",
            ]
        );
    }

    #[test]
    fn test_malformed_main_requirement_is_reported_once() {
        let checkout = TempDir::new().unwrap();
        let build = TempDir::new().unwrap();
        fs::write(
            checkout.path().join("foo.el"),
            ";;; foo.el --- Foo\n;; Package-Requires: ((emacs 25 1) (dash \"2.19\"))\n",
        )
        .unwrap();
        let package = stage_files(checkout.path(), &["foo.el".to_string()], build.path()).unwrap();
        let main = requirements_of_file(&package.path("foo.el")).unwrap();

        let mut report = Report::new();
        check_package_requires(&package, Some("foo.el"), &main, &mut report);
        assert_eq!(
            messages(&report),
            [
                r#"- Package-Requires: dash "2.19""#,
                r#"- Package-Requires: 'emacs 25 1' is not of the form (name "version")"#,
            ]
        );
        assert_eq!(report.count(Severity::Error), 1);
    }

    #[test]
    fn test_package_requires_none() {
        let checkout = TempDir::new().unwrap();
        let build = TempDir::new().unwrap();
        fs::write(checkout.path().join("foo.el"), ";;; foo.el --- Foo\n").unwrap();
        let package = stage_files(checkout.path(), &["foo.el".to_string()], build.path()).unwrap();

        let mut report = Report::new();
        check_package_requires(&package, Some("foo.el"), &RequirementSet::new(), &mut report);
        assert_eq!(messages(&report), ["- Package-Requires: n/a"]);
    }

    #[test]
    fn test_similar_packages() {
        let listing: PackageListing = [
            ("shx", "https://melpa.org/#/shx"),
            ("shx-extras", "https://melpa.org/#/shx-extras"),
            ("magit", "https://melpa.org/#/magit"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let mut report = Report::new();
        check_similar_packages("shx", &FixedIndex(listing.clone()), &mut report);
        assert_eq!(
            messages(&report),
            [
                "### Similarly named ###",
                "- shx: https://melpa.org/#/shx",
                "- shx-extras: https://melpa.org/#/shx-extras",
                "- Error: a package called 'shx' exists",
            ]
        );

        let mut report = Report::new();
        check_similar_packages("zzz", &FixedIndex(listing), &mut report);
        assert!(report.diagnostics().is_empty());
    }

    #[test]
    fn test_similar_packages_offline() {
        let mut report = Report::new();
        check_similar_packages("shx", &OfflineIndex, &mut report);
        assert!(report.diagnostics().is_empty());
    }
}
