//! The code-edit service seam and its LLM-backed implementation.
//!
//! The repair loop only ever observes an edit by re-scanning the tree, so
//! the trait returns nothing. Tests substitute deterministic stubs; the
//! shipped implementation prompts a model for whole-file replacements.

use crate::llm::client::LlmClient;
use crate::llm::parse::extract_json_payload;
use crate::llm::prompts::WHOLE_FILE_EDIT_SYSTEM;
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use remedy_core::util::{debug_stderr_enabled, resolve_repo_path_allow_new};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// How the caller would like edits expressed. This implementation
/// normalizes both hints to whole-file replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditFormat {
    WholeFile,
    UnifiedDiff,
}

/// The opaque mutation step: given an instruction and a candidate file
/// set, mutate the tree. Effects are observed only by re-scanning.
#[async_trait]
pub trait CodeEditService: Send + Sync {
    async fn edit(
        &self,
        instruction: &str,
        repo_root: &Path,
        files: &[PathBuf],
        format: EditFormat,
        model: &str,
    ) -> Result<()>;
}

/// One file in an edit response. `content: None` means the file must be
/// removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEdit {
    pub name: String,
    pub content: Option<String>,
}

/// The whole-file edit payload:
/// `{"files": [{"name": "...", "content": "..."}]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepoEdit {
    #[serde(default)]
    pub files: Vec<FileEdit>,
}

impl RepoEdit {
    /// Two edits for the same file are ambiguous; reject the response.
    pub fn validate_unique_names(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for file in &self.files {
            if !seen.insert(file.name.as_str()) {
                bail!("Edit response names '{}' twice", file.name);
            }
        }
        Ok(())
    }
}

/// Apply a parsed edit to the tree. File names are resolved against the
/// repo root and may not escape it; parent directories are created for new
/// files.
pub fn apply_repo_edit(repo_root: &Path, edit: &RepoEdit) -> Result<usize> {
    edit.validate_unique_names()?;

    let mut applied = 0;
    for file in &edit.files {
        let resolved = resolve_repo_path_allow_new(repo_root, Path::new(&file.name))
            .map_err(|e| anyhow!("Rejected edit for '{}': {}", file.name, e))?;

        match &file.content {
            Some(content) => {
                if let Some(parent) = resolved.absolute.parent() {
                    fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create directory for '{}'", file.name)
                    })?;
                }
                fs::write(&resolved.absolute, content)
                    .with_context(|| format!("Failed to write '{}'", file.name))?;
            }
            None => {
                if resolved.absolute.exists() {
                    fs::remove_file(&resolved.absolute)
                        .with_context(|| format!("Failed to remove '{}'", file.name))?;
                }
            }
        }
        applied += 1;
    }
    Ok(applied)
}

/// LLM-backed edit service speaking the whole-file JSON protocol.
pub struct LlmEditService {
    client: LlmClient,
}

impl LlmEditService {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }

    fn build_user_message(
        instruction: &str,
        repo_root: &Path,
        files: &[PathBuf],
        format: EditFormat,
    ) -> Result<String> {
        let mut message = String::from(instruction);
        message.push_str("\n\n## Current files:\n");
        for path in files {
            let relative = path
                .strip_prefix(repo_root)
                .unwrap_or(path)
                .to_string_lossy()
                .replace('\\', "/");
            let content = fs::read_to_string(path).unwrap_or_default();
            message.push_str(&format!("\n\n**{}**: \n{}", relative, content));
        }
        if format == EditFormat::UnifiedDiff {
            // Diff output is not applied here; ask for full files anyway.
            message.push_str(
                "\n\nEven if a diff was requested, respond with complete file contents.",
            );
        }
        Ok(message)
    }
}

#[async_trait]
impl CodeEditService for LlmEditService {
    async fn edit(
        &self,
        instruction: &str,
        repo_root: &Path,
        files: &[PathBuf],
        format: EditFormat,
        model: &str,
    ) -> Result<()> {
        if !repo_root.is_dir() {
            bail!("Repository path '{}' does not exist", repo_root.display());
        }
        // Scanned files import each other through the package name, so the
        // target must actually be a package.
        if !repo_root.join("__init__.py").exists() {
            bail!(
                "Repository '{}' has no __init__.py; refusing to edit a non-package",
                repo_root.display()
            );
        }

        let user = Self::build_user_message(instruction, repo_root, files, format)?;
        let response = self
            .client
            .complete(model, WHOLE_FILE_EDIT_SYSTEM, &user)
            .await?;

        let payload = extract_json_payload(&response)
            .ok_or_else(|| anyhow!("Edit response contained no JSON payload"))?;
        let edit: RepoEdit = serde_json::from_str(&payload)
            .with_context(|| "Failed to parse edit response JSON")?;

        let applied = apply_repo_edit(repo_root, &edit)?;
        if debug_stderr_enabled() {
            eprintln!("  applied {} file edit(s)", applied);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn apply_writes_creates_and_deletes() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("old.py"), "old = 1\n").unwrap();

        let edit = RepoEdit {
            files: vec![
                FileEdit {
                    name: "old.py".to_string(),
                    content: None,
                },
                FileEdit {
                    name: "pkg/new.py".to_string(),
                    content: Some("new = 2\n".to_string()),
                },
            ],
        };

        let applied = apply_repo_edit(dir.path(), &edit).unwrap();
        assert_eq!(applied, 2);
        assert!(!dir.path().join("old.py").exists());
        assert_eq!(
            fs::read_to_string(dir.path().join("pkg/new.py")).unwrap(),
            "new = 2\n"
        );
    }

    #[test]
    fn apply_rejects_escaping_paths() {
        let dir = tempdir().unwrap();
        let edit = RepoEdit {
            files: vec![FileEdit {
                name: "../outside.py".to_string(),
                content: Some("nope\n".to_string()),
            }],
        };
        assert!(apply_repo_edit(dir.path(), &edit).is_err());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let edit = RepoEdit {
            files: vec![
                FileEdit {
                    name: "a.py".to_string(),
                    content: Some("1\n".to_string()),
                },
                FileEdit {
                    name: "a.py".to_string(),
                    content: Some("2\n".to_string()),
                },
            ],
        };
        assert!(edit.validate_unique_names().is_err());
    }

    #[test]
    fn repo_edit_parses_null_content_and_empty_object() {
        let edit: RepoEdit =
            serde_json::from_str(r#"{"files": [{"name": "a.py", "content": null}]}"#).unwrap();
        assert!(edit.files[0].content.is_none());

        let empty: RepoEdit = serde_json::from_str(r#"{}"#).unwrap();
        assert!(empty.files.is_empty());
    }
}
