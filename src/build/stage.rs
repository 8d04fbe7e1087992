// src/build/stage.rs

//! Scratch copy of a package's files
//!
//! The selected files are copied into `<build_dir>/pkg`, which is wiped and
//! recreated on every run. Lisp files are flattened to their base name the
//! way MELPA packages them; other files and directories keep their path.

use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Name of the scratch directory inside the build directory
pub const PKG_SUBDIR: &str = "pkg";

/// Package files staged for checking and building
#[derive(Debug, Clone)]
pub struct StagedPackage {
    dir: PathBuf,
    files: Vec<String>,
}

impl StagedPackage {
    /// Directory holding the staged files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Staged paths relative to [`dir`](Self::dir), in recipe order
    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Absolute path of a staged file
    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// Number of staged `.el` files
    pub fn elisp_count(&self) -> usize {
        self.files.iter().filter(|f| f.ends_with(".el")).count()
    }
}

/// Where a checkout file lands inside the scratch directory
pub fn staged_name(file: &str) -> String {
    if file.ends_with(".el") {
        Path::new(file)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.to_string())
    } else {
        file.to_string()
    }
}

/// Copy `files` from `checkout` into a fresh `<build_dir>/pkg`
pub fn stage_files(checkout: &Path, files: &[String], build_dir: &Path) -> Result<StagedPackage> {
    let dir = build_dir.join(PKG_SUBDIR);
    if dir.exists() {
        fs::remove_dir_all(&dir)
            .map_err(|e| Error::IoError(format!("Failed to clear {}: {}", dir.display(), e)))?;
    }
    fs::create_dir_all(&dir)
        .map_err(|e| Error::IoError(format!("Failed to create {}: {}", dir.display(), e)))?;

    let mut staged = Vec::with_capacity(files.len());
    for file in files {
        let source = checkout.join(file);
        let target_name = staged_name(file);
        let target = dir.join(&target_name);

        if source.is_dir() {
            copy_tree(&source, &target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(&source, &target).map_err(|e| {
                Error::IoError(format!("Failed to copy {}: {}", source.display(), e))
            })?;
        }
        debug!("Staged {} as {}", file, target_name);
        staged.push(target_name);
    }

    Ok(StagedPackage { dir, files: staged })
}

/// Recursively copy a directory tree
pub fn copy_tree(source: &Path, target: &Path) -> Result<()> {
    for entry in WalkDir::new(source) {
        let entry = entry.map_err(|e| Error::IoError(format!("Failed to walk {}: {}", source.display(), e)))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| Error::IoError(e.to_string()))?;
        let destination = target.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&destination)?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &destination)?;
        }
    }
    Ok(())
}
