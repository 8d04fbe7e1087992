// src/build/mod.rs

//! Package staging and building
//!
//! Turns a checkout plus a recipe into the staged file set that every
//! later check reads, and optionally runs the containerized build.

mod container;
mod expand;
mod stage;

pub use container::{
    classify_build_output, write_requirements_script, BuildRunner, MakeBuildRunner,
    REQUIREMENTS_SCRIPT,
};
pub(crate) use container::read_pipe;
pub use expand::{FileExpander, GlobExpander, DEFAULT_EXCLUDES, DEFAULT_FILES};
pub use stage::{copy_tree, stage_files, staged_name, StagedPackage, PKG_SUBDIR};
