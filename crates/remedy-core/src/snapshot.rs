//! Per-file snapshots of a scanned repository.
//!
//! A snapshot pins the repo-relative path and the content of one source file
//! at scan time. Relative paths always use forward slashes and never carry a
//! leading `/`, so reports stay portable and diffable across host platforms.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSnapshot {
    /// Path relative to the scanned repo root. Unique key within a report.
    pub relative_path: String,
    /// Full text at scan time. Does not track later on-disk edits.
    pub content: String,
}

impl FileSnapshot {
    pub fn new(relative_path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            relative_path: relative_path.into(),
            content: content.into(),
        }
    }

    /// Build a snapshot by reducing an absolute path against the repo root.
    /// Fails when the file does not live under the root.
    pub fn from_path(file_path: &Path, repo_root: &Path, content: String) -> Result<Self> {
        let relative_path = reduce_file_path(file_path, repo_root)?;
        Ok(Self {
            relative_path,
            content,
        })
    }

    /// Rejoin the relative path onto a repo root.
    pub fn absolute_path(&self, repo_root: &Path) -> PathBuf {
        repo_root.join(&self.relative_path)
    }

    /// Dotted Python module identity, rooted at the repo directory name.
    /// `values.py` in repo `reactor` becomes `reactor.values`.
    pub fn module_name(&self, repo_name: &str) -> String {
        let without_ext = self
            .relative_path
            .strip_suffix(".py")
            .unwrap_or(&self.relative_path);
        format!("{}.{}", repo_name, without_ext.replace('/', "."))
    }
}

/// Reduce an absolute file path to a forward-slash repo-relative string.
pub fn reduce_file_path(file_path: &Path, repo_root: &Path) -> Result<String> {
    let relative = file_path.strip_prefix(repo_root).map_err(|_| {
        anyhow!(
            "File '{}' is not under repo root '{}'",
            file_path.display(),
            repo_root.display()
        )
    })?;

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            other => {
                return Err(anyhow!(
                    "Unexpected path component {:?} in '{}'",
                    other,
                    relative.display()
                ))
            }
        }
    }
    if parts.is_empty() {
        return Err(anyhow!(
            "Path '{}' reduces to the repo root itself",
            file_path.display()
        ));
    }
    Ok(parts.join("/"))
}
