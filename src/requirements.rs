// src/requirements.rs

//! Package-Requires extraction
//!
//! Dependencies are declared in one of two places:
//!
//! - A `<name>-pkg.el` descriptor: `(define-package "x" "1.0" "Doc" '((emacs "25.1")))`
//! - The header of a `.el` file: `;; Package-Requires: ((emacs "25.1") (dash "2.19"))`
//!
//! Both produce a raw `((name "version") ...)` declaration which is
//! normalized into a [`RequirementSet`]. Names are lowercased and
//! deduplicated, versions are unquoted. A version written without quotes is
//! repaired when the entry is exactly `name version`; any other shape is a
//! [`Error::MalformedDependency`].

use crate::error::{Error, Result};
use crate::recipe::reader;
use crate::recipe::{join_tokens, main_file, tokens_of};
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

static PACKAGE_REQUIRES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[; ]*Package-Requires:(.*)$").expect("valid Package-Requires regex")
});

/// A single dependency
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Requirement {
    pub name: String,
    pub version: String,
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} \"{}\"", self.name, self.version)
    }
}

/// Normalized dependency declarations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementSet {
    entries: BTreeMap<String, String>,
    repaired: Vec<String>,
    malformed: Vec<String>,
}

impl RequirementSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw `((name "version") ...)` declaration into this set
    ///
    /// The first declaration of a name wins. Entries that cannot be repaired
    /// are recorded in [`malformed`](Self::malformed) and skipped; the
    /// others are still added before the error is returned.
    pub fn add_declaration(&mut self, declaration: &str) -> Result<()> {
        let mut problems = Vec::new();
        for entry in declaration.split('(').skip(1) {
            let entry = entry.replace(')', "");
            let entry = entry.trim().to_lowercase();
            if entry.is_empty() {
                continue;
            }

            let requirement = if entry.contains('"') {
                let mut parts = entry.split('"');
                let name = parts.next().unwrap_or_default().trim().to_string();
                let version = parts.next().unwrap_or_default().to_string();
                Requirement { name, version }
            } else {
                match repair_unquoted(&entry) {
                    Some(requirement) => {
                        self.repaired.push(entry.clone());
                        requirement
                    }
                    None => {
                        problems.push(format!("'{entry}' is not of the form (name \"version\")"));
                        continue;
                    }
                }
            };

            self.entries.entry(requirement.name).or_insert(requirement.version);
        }

        if problems.is_empty() {
            return Ok(());
        }
        let message = problems.join("; ");
        self.malformed.extend(problems);
        Err(Error::MalformedDependency(message))
    }

    /// Add every requirement from another set
    pub fn union(&mut self, other: RequirementSet) {
        for (name, version) in other.entries {
            self.entries.entry(name).or_insert(version);
        }
        self.repaired.extend(other.repaired);
        self.malformed.extend(other.malformed);
    }

    /// Dependency names only
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Dependencies with versions, sorted by name
    pub fn versioned(&self) -> Vec<Requirement> {
        self.entries
            .iter()
            .map(|(name, version)| Requirement {
                name: name.clone(),
                version: version.clone(),
            })
            .collect()
    }

    /// Entries whose version had to be re-quoted
    pub fn repaired(&self) -> &[String] {
        &self.repaired
    }

    /// Problems with entries that could not be repaired
    pub fn malformed(&self) -> &[String] {
        &self.malformed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if this set has every requirement of `other` and more
    pub fn is_strict_superset_of(&self, other: &RequirementSet) -> bool {
        self.entries.len() > other.entries.len()
            && other
                .entries
                .iter()
                .all(|(name, version)| self.entries.get(name) == Some(version))
    }
}

impl fmt::Display for RequirementSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.versioned().iter().map(ToString::to_string).collect();
        write!(f, "{}", rendered.join(", "))
    }
}

/// Re-quote an entry written as `name version`
fn repair_unquoted(entry: &str) -> Option<Requirement> {
    let parts: Vec<&str> = entry.split_whitespace().collect();
    match parts.as_slice() {
        [name, version] => Some(Requirement {
            name: name.to_string(),
            version: version.to_string(),
        }),
        _ => None,
    }
}

/// Pull the dependency list out of a `-pkg.el` descriptor
///
/// Only the first form of the file is read. Returns the token run from the
/// first `( (` to the following `) )`, or the empty string if there is none.
pub fn declaration_from_descriptor(text: &str) -> Result<String> {
    let form = reader::read_first(text).map_err(|e| match e {
        Error::MalformedRecipe(msg) => {
            Error::MalformedDependency(format!("unreadable package descriptor: {msg}"))
        }
        other => other,
    })?;
    let tokens = tokens_of(&form);

    let is_pair = |i: usize, token: &str| {
        tokens.get(i).is_some_and(|t| t == token) && tokens.get(i + 1).is_some_and(|t| t == token)
    };

    let Some(start) = (0..tokens.len()).find(|&i| is_pair(i, "(")) else {
        return Ok(String::new());
    };
    let Some(end) = (start..tokens.len()).find(|&i| is_pair(i, ")")) else {
        return Ok(String::new());
    };

    Ok(join_tokens(&tokens[start..end + 2]))
}

/// Pull the `Package-Requires:` value out of a `.el` file header
pub fn declaration_from_header(text: &str) -> String {
    text.lines()
        .find_map(|line| PACKAGE_REQUIRES_RE.captures(line))
        .map(|caps| caps[1].trim().to_string())
        .unwrap_or_default()
}

/// Requirements declared by one file
///
/// Files that are neither `.el` nor `-pkg.el`, or that do not exist as
/// regular files, declare nothing. Unrepairable entries end up in
/// [`RequirementSet::malformed`]; an unreadable descriptor is an
/// [`Error::MalformedDependency`].
pub fn requirements_of_file(path: &Path) -> Result<RequirementSet> {
    let mut set = RequirementSet::new();
    if !path.is_file() {
        return Ok(set);
    }

    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    let declaration = if name.ends_with("-pkg.el") {
        declaration_from_descriptor(&read_lossy(path)?)?
    } else if name.ends_with(".el") {
        declaration_from_header(&read_lossy(path)?)
    } else {
        return Ok(set);
    };

    debug!("{}: Package-Requires {:?}", path.display(), declaration);
    if let Err(e) = set.add_declaration(&declaration) {
        debug!("{}: {}", path.display(), e);
    }
    Ok(set)
}

/// Requirements of a package
///
/// Only the main file counts when one resolves for `package`; otherwise the
/// declarations of all files are merged.
pub fn requirements(dir: &Path, files: &[String], package: Option<&str>) -> Result<RequirementSet> {
    let main = package.and_then(|name| main_file(files, name));
    let selected: Vec<&str> = match main {
        Some(main) => vec![main],
        None => files.iter().map(String::as_str).collect(),
    };

    let mut set = RequirementSet::new();
    for file in selected {
        match requirements_of_file(&dir.join(file)) {
            Ok(file_set) => set.union(file_set),
            Err(Error::MalformedDependency(msg)) => set.malformed.push(msg),
            Err(e) => return Err(e),
        }
    }
    Ok(set)
}

pub(crate) fn read_lossy(path: &Path) -> Result<String> {
    let bytes = fs::read(path)
        .map_err(|e| Error::IoError(format!("Failed to read {}: {}", path.display(), e)))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
