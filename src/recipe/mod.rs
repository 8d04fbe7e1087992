// src/recipe/mod.rs

//! MELPA recipe handling
//!
//! A recipe is a small S-expression describing where a package lives and
//! which of its files belong to the package:
//!
//! ```text
//! (shx :repo "riscy/shx-for-emacs" :fetcher github :files ("*.el"))
//! ```
//!
//! - [`reader`] reads the grammar subset recipes use
//! - [`tokenize`] flattens an expression into tokens (memoized)
//! - The accessors ([`package_name`], [`fetcher`], [`branch`],
//!   [`main_file`]) pull facts out of a token list
//! - [`Recipe`] is the typed form used for transformations such as
//!   [`Recipe::with_branch`] and [`Recipe::to_default_form`]

mod accessor;
mod format;
pub mod reader;
mod tokenizer;
mod transform;

pub use accessor::{branch, fetcher, is_well_formed, main_file, package_name, validate_recipe};
pub use format::{Fetcher, Property, Recipe};
pub use reader::Sexp;
pub use tokenizer::{join_tokens, tokenize, tokens_of};
pub use transform::{default_recipe, set_branch};
