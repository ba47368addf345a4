//! Deterministic discovery of Python files in a target repository.

use crate::snapshot::FileSnapshot;
use crate::summary::summarize_python;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// An ordered set of file snapshots taken from one walk of a repo tree.
///
/// Files are discovered depth-first with per-directory name sorting, so two
/// scans of an unchanged tree always produce the same order. The flattened
/// reports built from a scan inherit that order, which keeps them
/// reproducible across runs and operating systems.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoSnapshot {
    pub root: PathBuf,
    pub scanned_at: DateTime<Utc>,
    files: Vec<FileSnapshot>,
}

impl RepoSnapshot {
    /// Scan with full file content.
    pub fn scan(root: &Path) -> Result<Self> {
        Self::scan_inner(root, false)
    }

    /// Scan with content replaced by the docstring/signature summary.
    /// Nothing is executed; this is the compact repository map.
    pub fn scan_summary(root: &Path) -> Result<Self> {
        Self::scan_inner(root, true)
    }

    fn scan_inner(root: &Path, summary: bool) -> Result<Self> {
        let mut files = Vec::new();

        // A missing or empty root is a valid, reportable state: zero files.
        if root.is_dir() {
            // Depth 0 is the scan root itself; a dot-named root is still a
            // valid target, only entries inside it are filtered.
            for entry in WalkDir::new(root)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !is_ignored(e.path()))
                .filter_map(|e| e.ok())
            {
                let path = entry.path();
                if !path.is_file() || !is_python_file(path) {
                    continue;
                }

                let content = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read '{}'", path.display()))?;
                let content = if summary {
                    summarize_python(&content)
                } else {
                    content
                };
                files.push(FileSnapshot::from_path(path, root, content)?);
            }
        }

        Ok(Self {
            root: root.to_path_buf(),
            scanned_at: Utc::now(),
            files,
        })
    }

    pub fn files(&self) -> &[FileSnapshot] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Absolute paths of every scanned file, in scan order. This is the
    /// literal candidate set handed to the edit service.
    pub fn file_paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.absolute_path(&self.root)).collect()
    }

    /// The repo's package name: the name of the scanned directory. Scanned
    /// files import each other as `from <repo_name>.<module> import ...`.
    pub fn repo_name(&self) -> String {
        self.root
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "repo".to_string())
    }
}

fn is_python_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("py"))
        .unwrap_or(false)
}

/// Skip hidden entries and Python bytecode caches.
fn is_ignored(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| (name.starts_with('.') && name.len() > 1) || name == "__pycache__")
        .unwrap_or(false)
}
