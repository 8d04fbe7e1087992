// src/lib.rs

//! melpazoid: MELPA recipe validator
//!
//! Checks a package recipe and the repository it points at against MELPA's
//! packaging conventions and reports pass, warning or failure lines.
//!
//! # Architecture
//!
//! - Recipes: a minimal reader, memoized tokenizer and a typed recipe
//! - Facts: Package-Requires extraction and license detection
//! - Collaborators behind traits: file expansion, hosted metadata, the
//!   package index and the containerized build
//! - Reports: severity-ranked diagnostics folded into one exit status

pub mod build;
pub mod cache;
pub mod config;
mod error;
pub mod license;
pub mod recipe;
pub mod report;
pub mod repository;
pub mod requirements;
pub mod validate;

pub use config::Config;
pub use error::{Error, Result};
pub use recipe::{Fetcher, Recipe};
pub use report::{Diagnostic, ExitPolicy, Report, Severity};
pub use validate::{Submission, Validation, Validator};
