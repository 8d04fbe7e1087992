// src/recipe/format.rs

//! Typed recipe representation
//!
//! A recipe is a list whose head is the package name followed by keyword
//! properties:
//!
//! ```text
//! (name :fetcher github :repo "owner/repo" [:branch "b"] [:files (...)])
//! ```
//!
//! Properties are kept in their original order, including ones this crate
//! does not interpret (`:old-names`, `:version-regexp`, ...), so a recipe
//! re-serializes without losing anything.

use super::reader::{self, Sexp};
use crate::error::{Error, Result};
use std::fmt;
use strum_macros::{Display, EnumString};

/// Source-control backend named by `:fetcher`
#[derive(Debug, Clone, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Fetcher {
    Github,
    Gitlab,
    Bitbucket,
    Codeberg,
    Sourcehut,
    Git,
    Hg,
    #[strum(default)]
    Other(String),
}

impl Fetcher {
    /// Fetchers that take `:repo "owner/name"` on a hosted forge
    pub fn is_hosted(&self) -> bool {
        matches!(
            self,
            Fetcher::Github | Fetcher::Gitlab | Fetcher::Bitbucket | Fetcher::Codeberg | Fetcher::Sourcehut
        )
    }

    /// Whether checkouts use mercurial rather than git
    pub fn is_mercurial(&self) -> bool {
        matches!(self, Fetcher::Hg)
    }
}

/// One keyword property of a recipe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    /// Keyword including the leading colon
    pub key: String,
    /// Value, absent for bare flags
    pub value: Option<Sexp>,
}

/// A parsed package recipe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    name: String,
    properties: Vec<Property>,
}

impl Recipe {
    /// Create a recipe with no properties
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    /// Parse recipe text
    pub fn parse(text: &str) -> Result<Self> {
        Self::from_sexp(&reader::read(text)?)
    }

    /// Build a recipe from an already-read expression
    pub fn from_sexp(form: &Sexp) -> Result<Self> {
        let items = form
            .as_list()
            .ok_or_else(|| Error::MalformedRecipe(format!("expected a list, found {}", form)))?;

        let (head, rest) = items
            .split_first()
            .ok_or_else(|| Error::MalformedRecipe("empty recipe".to_string()))?;

        let name = match head.as_symbol() {
            Some(name) if !head.is_keyword() => name.to_string(),
            _ => {
                return Err(Error::MalformedRecipe(format!(
                    "recipe must start with a package name, found {}",
                    head
                )));
            }
        };

        let mut properties = Vec::new();
        let mut iter = rest.iter().peekable();
        while let Some(item) = iter.next() {
            let key = match item {
                Sexp::Symbol(key) if item.is_keyword() => key.clone(),
                _ => {
                    return Err(Error::MalformedRecipe(format!(
                        "expected a keyword in {}, found {}",
                        name, item
                    )));
                }
            };

            let value = match iter.peek() {
                Some(next) if !next.is_keyword() => iter.next().cloned(),
                _ => None,
            };
            properties.push(Property { key, value });
        }

        Ok(Self { name, properties })
    }

    /// The package name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All properties in recipe order
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Value of a property
    pub fn get(&self, key: &str) -> Option<&Sexp> {
        self.properties
            .iter()
            .find(|p| p.key == key)
            .and_then(|p| p.value.as_ref())
    }

    /// Whether a property is present, with or without a value
    pub fn contains(&self, key: &str) -> bool {
        self.properties.iter().any(|p| p.key == key)
    }

    /// Set a property, overwriting in place or appending at the end
    pub fn set(&mut self, key: &str, value: Sexp) {
        match self.properties.iter_mut().find(|p| p.key == key) {
            Some(property) => property.value = Some(value),
            None => self.properties.push(Property {
                key: key.to_string(),
                value: Some(value),
            }),
        }
    }

    /// The `:fetcher`
    pub fn fetcher(&self) -> Result<Fetcher> {
        let symbol = self
            .get(":fetcher")
            .and_then(Sexp::as_symbol)
            .ok_or_else(|| Error::MissingField(":fetcher".to_string()))?;
        // EnumString with a default variant never fails
        symbol
            .parse()
            .map_err(|_| Error::MalformedRecipe(format!("bad fetcher {}", symbol)))
    }

    /// The `:repo` value
    pub fn repo(&self) -> Option<&str> {
        self.get(":repo").and_then(Sexp::as_str)
    }

    /// The `:url` value
    pub fn url(&self) -> Option<&str> {
        self.get(":url").and_then(Sexp::as_str)
    }

    /// The `:branch` value
    pub fn branch(&self) -> Option<&str> {
        self.get(":branch").and_then(Sexp::as_str)
    }

    /// The `:files` spec
    pub fn files(&self) -> Option<&Sexp> {
        self.get(":files")
    }

    /// Whether `:defaults` appears anywhere in the recipe
    pub fn has_defaults(&self) -> bool {
        fn mentions(form: &Sexp) -> bool {
            match form {
                Sexp::Symbol(s) => s == ":defaults",
                Sexp::List(items) => items.iter().any(mentions),
                Sexp::Quote(inner) => mentions(inner),
                Sexp::Str(_) => false,
            }
        }

        self.properties
            .iter()
            .any(|p| p.key == ":defaults" || p.value.as_ref().is_some_and(mentions))
    }

    /// The upstream address to clone from
    ///
    /// ```
    /// use melpazoid::recipe::Recipe;
    ///
    /// let recipe = Recipe::parse(r#"(shx :repo "riscy/shx-for-emacs" :fetcher github)"#).unwrap();
    /// assert_eq!(recipe.clone_address().unwrap(), "https://github.com/riscy/shx-for-emacs.git");
    /// ```
    pub fn clone_address(&self) -> Result<String> {
        let fetcher = self.fetcher()?;
        let repo = || {
            self.repo()
                .ok_or_else(|| Error::MissingField(":repo".to_string()))
        };

        let address = match fetcher {
            Fetcher::Github => format!("https://github.com/{}.git", repo()?),
            Fetcher::Gitlab => format!("https://gitlab.com/{}.git", repo()?),
            Fetcher::Bitbucket => format!("https://bitbucket.org/{}.git", repo()?),
            Fetcher::Codeberg => format!("https://codeberg.org/{}.git", repo()?),
            Fetcher::Sourcehut => format!("https://git.sr.ht/~{}", repo()?),
            Fetcher::Git | Fetcher::Hg | Fetcher::Other(_) => self
                .url()
                .ok_or_else(|| Error::MissingField(":url".to_string()))?
                .to_string(),
        };
        Ok(address)
    }

    /// Convert back into an expression
    pub fn to_sexp(&self) -> Sexp {
        let mut items = vec![Sexp::symbol(&self.name)];
        for property in &self.properties {
            items.push(Sexp::symbol(&property.key));
            if let Some(value) = &property.value {
                items.push(value.clone());
            }
        }
        Sexp::List(items)
    }
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_sexp())
    }
}

impl std::str::FromStr for Recipe {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Recipe::parse(s)
    }
}
