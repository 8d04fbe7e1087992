// src/recipe/tokenizer.rs

//! Recipe tokenization
//!
//! The expression is read once, printed in canonical form and split into a
//! flat token list: `(` and `)` are always their own tokens, quoted strings
//! stay single tokens with their quotes, everything else is one token per
//! atom. Results are memoized by the exact input text.

use super::reader::{self, Sexp};
use crate::cache::{LookupCache, MemoCache};
use crate::error::Result;
use std::sync::LazyLock;

/// Process-wide token cache keyed by expression text
static TOKEN_CACHE: LazyLock<MemoCache<Vec<String>>> = LazyLock::new(MemoCache::new);

/// Turn an expression into its token list
///
/// ```
/// use melpazoid::recipe::tokenize;
///
/// let tokens = tokenize(r#"(shx :repo "riscy/xyz" :fetcher github) ; comment"#).unwrap();
/// assert_eq!(tokens, ["(", "shx", ":repo", "\"riscy/xyz\"", ":fetcher", "github", ")"]);
/// ```
pub fn tokenize(expression: &str) -> Result<Vec<String>> {
    TOKEN_CACHE.get_or_try_insert(expression, || {
        let form = reader::read(expression)?;
        Ok(tokens_of(&form))
    })
}

/// Tokens of an already-read expression
pub fn tokens_of(form: &Sexp) -> Vec<String> {
    let mut tokens = Vec::new();
    form.push_tokens(&mut tokens);
    tokens
}

/// Serialize tokens back into expression text
///
/// Whitespace is normalized to single spaces, so the output is equivalent
/// to, not byte-identical with, the original text.
pub fn join_tokens(tokens: &[String]) -> String {
    let mut text = String::new();
    let mut previous: Option<&str> = None;
    for token in tokens {
        let tight = matches!(previous, None | Some("(") | Some("'")) || token == ")";
        if !tight {
            text.push(' ');
        }
        text.push_str(token);
        previous = Some(token);
    }
    text
}
