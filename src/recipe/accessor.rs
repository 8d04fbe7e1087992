// src/recipe/accessor.rs

//! Field accessors over a tokenized recipe
//!
//! These work directly on the token list produced by
//! [`tokenize`](super::tokenize) and never re-read the text.

use super::tokenizer::tokenize;
use crate::error::{Error, Result};
use std::path::Path;

/// Check that the tokens look like one balanced list
///
/// True iff the first token is `(`, the last is `)` and the parenthesis
/// counts match. Nesting order is not verified, so `( ) ( )` passes; the
/// reader behind [`tokenize`] already rejects such inputs.
pub fn is_well_formed(tokens: &[String]) -> bool {
    let opens = tokens.iter().filter(|t| *t == "(").count();
    let closes = tokens.iter().filter(|t| *t == ")").count();
    tokens.first().is_some_and(|t| t == "(") && tokens.last().is_some_and(|t| t == ")") && opens == closes
}

/// Validate whether the recipe text looks correct
///
/// ```
/// use melpazoid::recipe::validate_recipe;
///
/// assert!(validate_recipe(r#"(abc :repo "xyz" :fetcher github) ; abc recipe!"#));
/// assert!(!validate_recipe("??"));
/// ```
pub fn validate_recipe(recipe: &str) -> bool {
    tokenize(recipe).is_ok_and(|tokens| is_well_formed(&tokens))
}

/// The package name: the token right after the opening parenthesis
pub fn package_name(tokens: &[String]) -> Result<&str> {
    if !is_well_formed(tokens) || tokens.len() < 3 {
        return Err(Error::MalformedRecipe(tokens.join(" ")));
    }
    Ok(&tokens[1])
}

/// The token following `:fetcher`
pub fn fetcher(tokens: &[String]) -> Result<&str> {
    value_after(tokens, ":fetcher").ok_or_else(|| Error::MissingField(":fetcher".to_string()))
}

/// The `:branch` value without quotes, or the empty string
pub fn branch(tokens: &[String]) -> String {
    value_after(tokens, ":branch")
        .map(|b| b.trim_matches('"').to_string())
        .unwrap_or_default()
}

fn value_after<'a>(tokens: &'a [String], keyword: &str) -> Option<&'a str> {
    let index = tokens.iter().position(|t| t == keyword)?;
    tokens.get(index + 1).map(String::as_str)
}

/// Figure out the main file of a package
///
/// Files are visited in sorted order and the first whose base name is
/// either `<name>-pkg.el` or `<name>.el` wins, so `a-pkg.el` beats `a.el`
/// only because it sorts first.
pub fn main_file<'a, S: AsRef<str>>(files: &'a [S], name: &str) -> Option<&'a str> {
    let pkg_el = format!("{}-pkg.el", name);
    let el = format!("{}.el", name);

    let mut sorted: Vec<&str> = files.iter().map(AsRef::as_ref).collect();
    sorted.sort_unstable();

    sorted.into_iter().find(|file| {
        Path::new(file)
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|base| base == pkg_el || base == el)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(text: &str) -> Vec<String> {
        tokenize(text).unwrap()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_is_well_formed() {
        assert!(is_well_formed(&toks(r#"(abc :repo "x" :fetcher github)"#)));
        assert!(!is_well_formed(&strings(&["(", "abc"])));
        assert!(!is_well_formed(&strings(&["abc", ")"])));
        assert!(!is_well_formed(&strings(&["(", "(", "abc", ")"])));
        assert!(!is_well_formed(&[]));
    }

    #[test]
    fn test_well_formed_does_not_check_nesting() {
        assert!(is_well_formed(&strings(&["(", ")", "(", ")"])));
    }

    #[test]
    fn test_validate_recipe_rejects_paren_mistakes() {
        assert!(validate_recipe(r#"(abc :repo "x" :fetcher github)"#));
        assert!(!validate_recipe(r#"(abc :repo "x" :fetcher github"#));
        assert!(!validate_recipe(r#"(abc :repo "x" :fetcher github))"#));
        assert!(!validate_recipe(r#"((abc :repo "x" :fetcher github)"#));
    }

    #[test]
    fn test_package_name() {
        assert_eq!(package_name(&toks(r#"(abc :repo "x" :fetcher github)"#)).unwrap(), "abc");
        assert!(package_name(&strings(&["abc"])).is_err());
    }

    #[test]
    fn test_fetcher() {
        assert_eq!(fetcher(&toks(r#"(abc :repo "x" :fetcher github)"#)).unwrap(), "github");
        assert!(matches!(
            fetcher(&toks(r#"(abc :repo "x")"#)),
            Err(Error::MissingField(_))
        ));
    }

    #[test]
    fn test_branch() {
        assert_eq!(branch(&toks(r#"(shx :branch "develop" :fetcher git)"#)), "develop");
        assert_eq!(branch(&toks("(shx :fetcher git)")), "");
    }

    #[test]
    fn test_main_file() {
        assert_eq!(main_file(&["pkg/a.el", "pkg/b.el"], "a"), Some("pkg/a.el"));
        assert_eq!(main_file(&["a.el", "b.el"], "b"), Some("b.el"));
        assert_eq!(main_file(&["a.el", "a-pkg.el"], "a"), Some("a-pkg.el"));
        assert_eq!(main_file(&["ab.el", "xa.el"], "a"), None);
    }

    #[test]
    fn test_main_file_takes_first_sorted_match() {
        // "lisp/a.el" sorts before "z/a-pkg.el"
        assert_eq!(main_file(&["z/a-pkg.el", "lisp/a.el"], "a"), Some("lisp/a.el"));
    }
}
