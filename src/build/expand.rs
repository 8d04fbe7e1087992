// src/build/expand.rs

//! Recipe `:files` expansion
//!
//! Resolves a recipe's file spec against a checkout the way MELPA's
//! package-build does:
//!
//! - `"glob"` adds matching paths (a `*` never crosses a `/`)
//! - `:defaults` splices in [`DEFAULT_FILES`] minus [`DEFAULT_EXCLUDES`]
//! - `(:exclude "glob" ...)` removes matches collected so far
//! - `("target-dir" specs...)` expands `specs` from the checkout root
//!
//! A recipe without `:files` uses the defaults.

use crate::error::{Error, Result};
use crate::recipe::{Recipe, Sexp};
use glob::MatchOptions;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

/// Globs included by the default recipe
pub const DEFAULT_FILES: &[&str] = &[
    "*.el",
    "lisp/*.el",
    "dir",
    "*.info",
    "*.texi",
    "*.texinfo",
    "doc/dir",
    "doc/*.info",
    "doc/*.texi",
    "doc/*.texinfo",
    "docs/dir",
    "docs/*.info",
    "docs/*.texi",
    "docs/*.texinfo",
];

/// Globs excluded by the default recipe
pub const DEFAULT_EXCLUDES: &[&str] = &[
    ".dir-locals.el",
    "lisp/.dir-locals.el",
    "test.el",
    "tests.el",
    "*-test.el",
    "*-tests.el",
    "lisp/test.el",
    "lisp/tests.el",
    "lisp/*-test.el",
    "lisp/*-tests.el",
];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Resolves which checkout files a recipe selects
pub trait FileExpander {
    /// Sorted, existing, checkout-relative paths selected by `recipe`
    fn expand(&self, recipe: &Recipe, checkout: &Path) -> Result<Vec<String>>;
}

/// In-process implementation of package-build's file spec
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobExpander;

impl FileExpander for GlobExpander {
    fn expand(&self, recipe: &Recipe, checkout: &Path) -> Result<Vec<String>> {
        let mut selected = BTreeSet::new();
        match recipe.files() {
            Some(Sexp::List(specs)) => expand_specs(specs, checkout, &mut selected)?,
            Some(other) => {
                return Err(Error::MalformedRecipe(format!(
                    ":files of {} must be a list, found {}",
                    recipe.name(),
                    other
                )));
            }
            None => expand_defaults(checkout, &mut selected)?,
        }

        debug!("{} expands to {} files", recipe.name(), selected.len());
        Ok(selected.into_iter().collect())
    }
}

fn expand_specs(specs: &[Sexp], checkout: &Path, selected: &mut BTreeSet<String>) -> Result<()> {
    for spec in specs {
        match spec {
            Sexp::Str(pattern) => selected.extend(glob_relative(checkout, pattern)?),
            Sexp::Symbol(keyword) if keyword == ":defaults" => expand_defaults(checkout, selected)?,
            Sexp::List(items) => match items.split_first() {
                Some((Sexp::Symbol(keyword), excludes)) if keyword == ":exclude" => {
                    let mut removed = BTreeSet::new();
                    expand_specs(excludes, checkout, &mut removed)?;
                    selected.retain(|file| !removed.contains(file));
                }
                Some((Sexp::Str(_target_dir), sources)) => expand_specs(sources, checkout, selected)?,
                _ => {
                    return Err(Error::MalformedRecipe(format!("unsupported :files entry {}", spec)));
                }
            },
            _ => return Err(Error::MalformedRecipe(format!("unsupported :files entry {}", spec))),
        }
    }
    Ok(())
}

fn expand_defaults(checkout: &Path, selected: &mut BTreeSet<String>) -> Result<()> {
    let mut defaults = BTreeSet::new();
    for pattern in DEFAULT_FILES {
        defaults.extend(glob_relative(checkout, pattern)?);
    }
    for pattern in DEFAULT_EXCLUDES {
        for excluded in glob_relative(checkout, pattern)? {
            defaults.remove(&excluded);
        }
    }
    selected.extend(defaults);
    Ok(())
}

/// Match `pattern` under `root`, returning `/`-separated relative paths
fn glob_relative(root: &Path, pattern: &str) -> Result<Vec<String>> {
    let root_pattern = glob::Pattern::escape(&root.to_string_lossy());
    let full = format!("{}/{}", root_pattern.trim_end_matches('/'), pattern);

    let paths = glob::glob_with(&full, MATCH_OPTIONS)
        .map_err(|e| Error::ExternalTool(format!("bad file pattern '{}': {}", pattern, e)))?;

    let mut matches = Vec::new();
    for path in paths.filter_map(|p| p.ok()) {
        if let Ok(relative) = path.strip_prefix(root) {
            let relative: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            if relative.iter().any(|c| c == ".git" || c == ".hg") {
                continue;
            }
            matches.push(relative.join("/"));
        }
    }
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn checkout(files: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for file in files {
            let path = dir.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, ";; test\n").unwrap();
        }
        dir
    }

    fn expand(recipe: &str, dir: &TempDir) -> Vec<String> {
        GlobExpander.expand(&Recipe::parse(recipe).unwrap(), dir.path()).unwrap()
    }

    #[test]
    fn test_default_recipe() {
        let dir = checkout(&[
            "foo.el",
            "foo-utils.el",
            "foo-test.el",
            ".dir-locals.el",
            "lisp/foo-extra.el",
            "doc/foo.texi",
            "README.md",
            "test/foo-tests.el",
        ]);

        assert_eq!(
            expand(r#"(foo :repo "a/foo" :fetcher github)"#, &dir),
            ["doc/foo.texi", "foo-utils.el", "foo.el", "lisp/foo-extra.el"]
        );
    }

    #[test]
    fn test_custom_files() {
        let dir = checkout(&["foo.el", "extra/snippets/a.yasnippet", "foo-test.el"]);

        assert_eq!(
            expand(r#"(foo :repo "a/foo" :fetcher github :files ("*.el" "extra"))"#, &dir),
            ["extra", "foo-test.el", "foo.el"]
        );
        assert_eq!(
            expand(
                r#"(foo :repo "a/foo" :fetcher github :files (:defaults ("snippets" "extra/snippets/*")))"#,
                &dir
            ),
            ["extra/snippets/a.yasnippet", "foo.el"]
        );
    }

    #[test]
    fn test_exclude() {
        let dir = checkout(&["foo.el", "foo-demo.el"]);
        assert_eq!(
            expand(r#"(foo :repo "a/foo" :fetcher github :files ("*.el" (:exclude "*-demo.el")))"#, &dir),
            ["foo.el"]
        );
    }

    #[test]
    fn test_no_matches_is_empty() {
        let dir = checkout(&["README.md"]);
        assert!(expand(r#"(foo :repo "a/foo" :fetcher github :files ("*.el"))"#, &dir).is_empty());
    }

    #[test]
    fn test_bad_files_spec() {
        let dir = checkout(&["foo.el"]);
        let recipe = Recipe::parse(r#"(foo :repo "a/foo" :fetcher github :files "*.el")"#).unwrap();
        assert!(GlobExpander.expand(&recipe, dir.path()).is_err());

        let recipe = Recipe::parse(r#"(foo :repo "a/foo" :fetcher github :files ((:inputs "*.el")))"#).unwrap();
        assert!(GlobExpander.expand(&recipe, dir.path()).is_err());
    }
}
