//! Regex-driven bulk rename.
//!
//! Renaming runs in three phases so callers can preview before anything
//! moves: `plan` matches file names and expands the replacement
//! template, `check_conflicts` rejects plans that would collide, and
//! `apply` performs the renames. `run` ties the phases together and
//! honors dry-run mode.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors from planning or applying a bulk rename.
#[derive(Debug, Error)]
pub enum RenameError {
    /// The target pattern failed to compile.
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// The target pattern has no named capture groups to feed the template.
    #[error("Pattern contains no named capture groups")]
    NoNamedGroups,

    /// The replacement template is empty.
    #[error("Replacement template is empty")]
    EmptyTemplate,

    /// The template references a capture group the pattern does not define.
    #[error("Template references unknown capture group '{name}'")]
    UnknownGroup { name: String },

    /// Expansion produced a name that cannot be used as a filename.
    #[error("Template produced invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// A directory in the walk could not be read.
    #[error("Failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A rename target already exists on disk.
    #[error("Rename target already exists: {path}")]
    TargetExists { path: PathBuf },

    /// Two planned renames map to the same target path.
    #[error("Multiple files rename to the same target: {path}")]
    DuplicateTarget { path: PathBuf },

    /// A rename syscall failed.
    #[error("Failed to rename {from} to {to}: {source}")]
    Apply {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Options for a bulk rename run.
#[derive(Debug, Clone)]
pub struct RenameOptions {
    /// Directory whose files are considered.
    pub root: PathBuf,
    /// Pattern matched against file names; must contain at least one
    /// named capture group.
    pub pattern: Regex,
    /// Replacement template; references captures as `$name` or `${name}`.
    pub template: String,
    /// Also walk subdirectories. Directory names themselves are never
    /// renamed.
    pub recursive: bool,
    /// Compute the plan without touching the filesystem.
    pub dry_run: bool,
}

impl RenameOptions {
    /// Compile and validate rename options.
    ///
    /// The template may only reference groups the pattern defines; an
    /// unknown reference would otherwise expand to the empty string and
    /// silently mangle names.
    pub fn new(
        root: impl Into<PathBuf>,
        pattern: &str,
        template: impl Into<String>,
    ) -> Result<Self, RenameError> {
        let pattern = Regex::new(pattern)?;
        if pattern.capture_names().flatten().next().is_none() {
            return Err(RenameError::NoNamedGroups);
        }
        let template = template.into();
        if template.is_empty() {
            return Err(RenameError::EmptyTemplate);
        }
        validate_references(&pattern, &template)?;
        Ok(Self {
            root: root.into(),
            pattern,
            template,
            recursive: false,
            dry_run: false,
        })
    }
}

/// One planned rename.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameEntry {
    /// Directory containing the file.
    pub directory: PathBuf,
    /// Current file name.
    pub original: String,
    /// File name after expansion.
    pub renamed: String,
    /// Whether expansion actually changed the name.
    pub changed: bool,
}

impl RenameEntry {
    /// Full path of the file before renaming.
    pub fn original_path(&self) -> PathBuf {
        self.directory.join(&self.original)
    }

    /// Full path of the file after renaming.
    pub fn renamed_path(&self) -> PathBuf {
        self.directory.join(&self.renamed)
    }
}

/// Outcome of a bulk rename run.
#[derive(Debug)]
pub struct RenameOutcome {
    /// Every matched file, renamed or not.
    pub entries: Vec<RenameEntry>,
    /// Number of renames performed; zero in dry-run mode.
    pub applied: usize,
}

/// Plan, check, and apply a bulk rename.
///
/// In dry-run mode the plan is returned untouched and nothing is
/// renamed.
pub fn run(options: &RenameOptions) -> Result<RenameOutcome, RenameError> {
    let entries = plan(options)?;
    if options.dry_run {
        return Ok(RenameOutcome {
            entries,
            applied: 0,
        });
    }
    check_conflicts(&entries)?;
    let applied = apply(&entries)?;
    info!(planned = entries.len(), applied, "bulk rename complete");
    Ok(RenameOutcome { entries, applied })
}

/// Walk the root and compute the rename for every matching file name.
pub fn plan(options: &RenameOptions) -> Result<Vec<RenameEntry>, RenameError> {
    let mut entries = Vec::new();
    plan_directory(options, &options.root, &mut entries)?;
    Ok(entries)
}

fn plan_directory(
    options: &RenameOptions,
    directory: &Path,
    entries: &mut Vec<RenameEntry>,
) -> Result<(), RenameError> {
    let read_dir_error = |source| RenameError::ReadDir {
        path: directory.to_path_buf(),
        source,
    };
    let mut items: Vec<fs::DirEntry> = fs::read_dir(directory)
        .map_err(read_dir_error)?
        .collect::<Result<_, _>>()
        .map_err(read_dir_error)?;
    items.sort_by_key(fs::DirEntry::file_name);

    for item in items {
        let file_type = item.file_type().map_err(|source| RenameError::ReadDir {
            path: item.path(),
            source,
        })?;
        if file_type.is_dir() {
            if options.recursive {
                plan_directory(options, &item.path(), entries)?;
            }
            continue;
        }

        let file_name = item.file_name();
        let Some(name) = file_name.to_str() else {
            warn!(path = %item.path().display(), "skipping entry with non-UTF-8 name");
            continue;
        };
        if !options.pattern.is_match(name) {
            debug!(name, "name does not match pattern");
            continue;
        }

        let renamed = options
            .pattern
            .replace_all(name, options.template.as_str())
            .into_owned();
        let changed = renamed != name;
        if changed {
            validate_filename(&renamed).map_err(|reason| RenameError::InvalidName {
                name: renamed.clone(),
                reason,
            })?;
        }
        entries.push(RenameEntry {
            directory: directory.to_path_buf(),
            original: name.to_string(),
            renamed,
            changed,
        });
    }
    Ok(())
}

/// Reject plans with colliding targets.
///
/// Both duplicate targets within the plan and targets that already
/// exist on disk are errors; renames never overwrite.
pub fn check_conflicts(entries: &[RenameEntry]) -> Result<(), RenameError> {
    let mut targets = HashSet::new();
    for entry in entries.iter().filter(|entry| entry.changed) {
        let target = entry.renamed_path();
        if !targets.insert(target.clone()) {
            return Err(RenameError::DuplicateTarget { path: target });
        }
        // symlink_metadata also catches dangling symlinks at the target
        if target.symlink_metadata().is_ok() {
            return Err(RenameError::TargetExists { path: target });
        }
    }
    Ok(())
}

/// Perform the planned renames, skipping entries whose name did not
/// change. Stops at the first failure.
pub fn apply(entries: &[RenameEntry]) -> Result<usize, RenameError> {
    let mut applied = 0;
    for entry in entries.iter().filter(|entry| entry.changed) {
        let from = entry.original_path();
        let to = entry.renamed_path();
        fs::rename(&from, &to).map_err(|source| RenameError::Apply {
            from: from.clone(),
            to: to.clone(),
            source,
        })?;
        debug!(from = %from.display(), to = %to.display(), "renamed");
        applied += 1;
    }
    Ok(applied)
}

/// Validate a filename for cross-platform compatibility.
pub fn validate_filename(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Name cannot be empty".into());
    }
    if name.len() > 255 {
        return Err("Name is too long (max 255 characters)".into());
    }
    for c in ['/', '\0'] {
        if name.contains(c) {
            return Err(format!("Name cannot contain '{}'", c.escape_default()));
        }
    }
    if name.starts_with(' ') || name.ends_with(' ') {
        return Err("Name cannot start or end with spaces".into());
    }
    if name.ends_with('.') {
        return Err("Name cannot end with a dot".into());
    }
    if name == "." || name == ".." {
        return Err("'.' and '..' are reserved names".into());
    }
    Ok(())
}

fn validate_references(pattern: &Regex, template: &str) -> Result<(), RenameError> {
    let group_count = pattern.captures_len();
    let names: HashSet<&str> = pattern.capture_names().flatten().collect();
    for reference in template_references(template) {
        if let Ok(index) = reference.parse::<usize>() {
            if index < group_count {
                continue;
            }
        } else if names.contains(reference.as_str()) {
            continue;
        }
        return Err(RenameError::UnknownGroup { name: reference });
    }
    Ok(())
}

/// Capture-group references in a replacement template: `$name`,
/// `${name}`, or a numeric `$2`. `$$` escapes a literal dollar.
fn template_references(template: &str) -> Vec<String> {
    let bytes = template.as_bytes();
    let mut references = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'$' {
            i += 1;
            continue;
        }
        i += 1;
        if i >= bytes.len() {
            break;
        }
        if bytes[i] == b'$' {
            i += 1;
            continue;
        }
        let braced = bytes[i] == b'{';
        if braced {
            i += 1;
        }
        let start = i;
        while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
            i += 1;
        }
        if i > start {
            references.push(template[start..i].to_string());
        }
        if braced && i < bytes.len() && bytes[i] == b'}' {
            i += 1;
        }
    }
    references
}
