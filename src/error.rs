// src/error.rs

//! Error types for melpazoid
//!
//! Only `MalformedRecipe` and `ExternalTool` abort a validation run. Every
//! other failure is reported as a diagnostic and the remaining checks go on.

use thiserror::Error;

/// Errors raised by the recipe, requirement and collaborator layers
#[derive(Error, Debug)]
pub enum Error {
    /// Unbalanced or otherwise unreadable recipe expression
    #[error("Malformed recipe: {0}")]
    MalformedRecipe(String),

    /// A required recipe keyword is absent
    #[error("Recipe is missing {0}")]
    MissingField(String),

    /// An external tool (git, hg, make, file expansion) failed
    #[error("External tool failed: {0}")]
    ExternalTool(String),

    /// A network lookup could not be completed
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    /// A Package-Requires entry could not be repaired
    #[error("Malformed dependency declaration: {0}")]
    MalformedDependency(String),

    /// Failure to parse an API payload or configuration value
    #[error("Parse error: {0}")]
    ParseError(String),

    /// I/O failure with context
    #[error("I/O error: {0}")]
    IoError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this error must abort the current check sequence
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::MalformedRecipe(_) | Error::ExternalTool(_))
    }
}
