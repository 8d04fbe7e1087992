// src/recipe/transform.rs

//! Derived recipe variants
//!
//! Both transformations work on the typed [`Recipe`] and re-serialize on
//! demand. Output whitespace is normalized.

use super::format::Recipe;
use super::reader::Sexp;
use crate::error::{Error, Result};

impl Recipe {
    /// Copy of this recipe with `:branch` set
    ///
    /// An existing `:branch` is overwritten where it stands, otherwise the
    /// property is appended.
    pub fn with_branch(&self, branch: &str) -> Recipe {
        let mut recipe = self.clone();
        recipe.set(":branch", Sexp::string(branch));
        recipe
    }

    /// Reduce the recipe to what the default file list would need
    ///
    /// Keeps the name, the `:repo` (or `:url`), `:fetcher` and `:branch` if
    /// present, in that order. Everything else, `:files` in particular, is
    /// dropped.
    pub fn to_default_form(&self) -> Result<Recipe> {
        let fetcher = self
            .get(":fetcher")
            .ok_or_else(|| Error::MissingField(":fetcher".to_string()))?;

        let (location_key, location) = [":repo", ":url"]
            .into_iter()
            .find_map(|key| self.get(key).map(|value| (key, value)))
            .ok_or_else(|| Error::MissingField(":repo or :url".to_string()))?;

        let mut default = Recipe::new(self.name());
        default.set(location_key, location.clone());
        default.set(":fetcher", fetcher.clone());
        if let Some(branch) = self.get(":branch") {
            default.set(":branch", branch.clone());
        }
        Ok(default)
    }
}

/// Set the branch on recipe text
///
/// ```
/// use melpazoid::recipe::set_branch;
///
/// assert_eq!(
///     set_branch(r#"(abcdef :fetcher hg :url "a/b")"#, "feature1").unwrap(),
///     r#"(abcdef :fetcher hg :url "a/b" :branch "feature1")"#
/// );
/// ```
pub fn set_branch(recipe: &str, branch: &str) -> Result<String> {
    Ok(Recipe::parse(recipe)?.with_branch(branch).to_string())
}

/// Simplify recipe text to its default form
///
/// ```
/// use melpazoid::recipe::default_recipe;
///
/// assert_eq!(
///     default_recipe(r#"(recipe :fetcher hg :url "a/b")"#).unwrap(),
///     r#"(recipe :url "a/b" :fetcher hg)"#
/// );
/// ```
pub fn default_recipe(recipe: &str) -> Result<String> {
    Ok(Recipe::parse(recipe)?.to_default_form()?.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_branch_overwrites_in_place() {
        let recipe = Recipe::parse(r#"(foo :branch "old" :fetcher github :repo "a/foo")"#).unwrap();
        assert_eq!(
            recipe.with_branch("new").to_string(),
            r#"(foo :branch "new" :fetcher github :repo "a/foo")"#
        );
    }

    #[test]
    fn test_with_branch_is_idempotent() {
        let recipe = Recipe::parse(r#"(foo :fetcher github :repo "a/foo")"#).unwrap();
        let once = recipe.with_branch("dev");
        let twice = once.with_branch("dev");
        assert_eq!(once, twice);
        assert_eq!(twice.branch(), Some("dev"));
    }

    #[test]
    fn test_default_form_drops_files() {
        let recipe = Recipe::parse(
            r#"(recipe :repo "a/b" :fetcher hg :branch "na" :files ("*.el") :old-names (x))"#,
        )
        .unwrap();
        assert_eq!(
            recipe.to_default_form().unwrap().to_string(),
            r#"(recipe :repo "a/b" :fetcher hg :branch "na")"#
        );
    }

    #[test]
    fn test_default_form_is_idempotent() {
        let recipe =
            Recipe::parse(r#"(foo :files (:defaults "x/*.el") :fetcher gitlab :repo "a/foo")"#).unwrap();
        let once = recipe.to_default_form().unwrap();
        let twice = once.to_default_form().unwrap();
        assert_eq!(once, twice);

        let already = Recipe::parse(r#"(foo :repo "a/foo" :fetcher gitlab)"#).unwrap();
        assert_eq!(already.to_default_form().unwrap(), already);
    }

    #[test]
    fn test_default_form_requires_fields() {
        let no_fetcher = Recipe::parse(r#"(foo :repo "a/foo")"#).unwrap();
        assert!(matches!(no_fetcher.to_default_form(), Err(Error::MissingField(_))));

        let no_location = Recipe::parse("(foo :fetcher github)").unwrap();
        assert!(matches!(no_location.to_default_form(), Err(Error::MissingField(_))));
    }

    #[test]
    fn test_text_helpers_reject_malformed() {
        assert!(set_branch("(foo :fetcher github", "x").is_err());
        assert!(default_recipe("(foo :files)").is_err());
    }
}
