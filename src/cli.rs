// src/cli.rs
//! CLI definitions for melpazoid
//!
//! This module contains the command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "melpazoid")]
#[command(author, version)]
#[command(about = "Check MELPA recipes and the packages they point at", long_about = None)]
pub struct Cli {
    /// Skip the containerized build
    #[arg(long, global = true)]
    pub no_build: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Check a recipe given as text
    Recipe {
        /// Recipe, e.g. (shx :repo "riscy/shx-for-emacs" :fetcher github)
        recipe: String,
    },

    /// Check a recipe stored in a file
    RecipeFile {
        /// Path to the recipe file
        path: PathBuf,
    },

    /// Check a MELPA pull request
    Pr {
        /// Pull request URL, e.g. https://github.com/melpa/melpa/pull/6712
        url: String,
    },

    /// Watch the clipboard for MELPA pull request URLs
    Watch,
}

impl Commands {
    /// Pick a command from the environment when none was given
    ///
    /// `MELPA_PR_URL`, then `RECIPE`, then `RECIPE_FILE`, else watch.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("MELPA_PR_URL") {
            Commands::Pr { url }
        } else if let Some(recipe) = lookup("RECIPE") {
            Commands::Recipe { recipe }
        } else if let Some(path) = lookup("RECIPE_FILE") {
            Commands::RecipeFile { path: PathBuf::from(path) }
        } else {
            Commands::Watch
        }
    }
}
