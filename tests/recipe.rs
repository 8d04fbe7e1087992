// tests/recipe.rs

//! Recipe, requirement and license behaviour through the public API

use melpazoid::license::detect_license;
use melpazoid::recipe::{
    branch, fetcher, is_well_formed, join_tokens, package_name, set_branch, tokenize,
    validate_recipe, Recipe,
};
use melpazoid::requirements::{declaration_from_header, RequirementSet};

const RECIPES: &[&str] = &[
    r#"(abc :repo "x" :fetcher github)"#,
    r#"(shx :repo "riscy/shx-for-emacs" :fetcher github :files (:defaults "snippets"))"#,
    r#"(pmdm :fetcher hg :url "https://hg.serna.eu/emacs/pmdm")"#,
    r#"(foo :fetcher git :url "https://example.org/foo.git" :branch "dev"
          :files ("*.el" (:exclude "foo-test.el") ("docs" "doc/*.texi")))"#,
];

#[test]
fn test_well_formed_recipes() {
    for recipe in RECIPES {
        assert!(validate_recipe(recipe), "{recipe}");
        assert!(is_well_formed(&tokenize(recipe).unwrap()));
    }
}

#[test]
fn test_unbalanced_recipes_are_rejected() {
    for recipe in RECIPES {
        assert!(!validate_recipe(&format!("{recipe})")), "extra paren: {recipe}");
        assert!(!validate_recipe(&recipe[..recipe.len() - 1]), "missing paren: {recipe}");
    }
    assert!(!validate_recipe(""));
    assert!(!validate_recipe("abc"));
}

#[test]
fn test_accessors() {
    let tokens = tokenize(r#"(abc :repo "x" :fetcher github)"#).unwrap();
    assert_eq!(package_name(&tokens).unwrap(), "abc");
    assert_eq!(fetcher(&tokens).unwrap(), "github");
    assert_eq!(branch(&tokens), "");

    let tokens = tokenize(r#"(shx :branch "develop" :fetcher github)"#).unwrap();
    assert_eq!(branch(&tokens), "develop");

    let tokens = tokenize(r#"(shx :repo "a/b")"#).unwrap();
    assert!(fetcher(&tokens).is_err());
}

#[test]
fn test_tokenize_is_stable_under_join() {
    for recipe in RECIPES {
        let tokens = tokenize(recipe).unwrap();
        assert_eq!(tokenize(&join_tokens(&tokens)).unwrap(), tokens);
    }
}

#[test]
fn test_with_branch_is_idempotent() {
    for recipe in RECIPES {
        let once = set_branch(recipe, "feature").unwrap();
        let twice = set_branch(&once, "feature").unwrap();
        assert_eq!(once, twice);
        assert_eq!(Recipe::parse(&twice).unwrap().branch(), Some("feature"));
    }
}

#[test]
fn test_default_form_is_a_projection() {
    for recipe in RECIPES {
        let once = Recipe::parse(recipe).unwrap().to_default_form().unwrap();
        let twice = once.to_default_form().unwrap();
        assert_eq!(once, twice);
        assert!(once.files().is_none());
    }

    let plain = Recipe::parse(RECIPES[0]).unwrap();
    assert_eq!(plain.to_default_form().unwrap(), plain);
}

#[test]
fn test_header_requirements() {
    let mut set = RequirementSet::new();
    set.add_declaration(&declaration_from_header(";; Package-Requires: ((emacs \"24.4\"))"))
        .unwrap();
    assert_eq!(set.names(), ["emacs"]);
    assert_eq!(set.to_string(), r#"emacs "24.4""#);
}

#[test]
fn test_license_detection() {
    assert_eq!(detect_license("SPDX-License-Identifier: ISC").as_deref(), Some("ISC"));
    assert_eq!(detect_license("GNU General Public License").as_deref(), Some("GPL"));
    assert_eq!(detect_license(";; Copyright (C) someone"), None);
}
