//! Execution outcomes and the filterable per-file repo report.
//!
//! The flattened text form of a report is a wire format: it is embedded
//! verbatim in the instructions sent to the edit service and asserted
//! byte-exactly by tests. Each included file renders as a
//! `**<relative_path>**: ` block, blocks separated by one blank line.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Structured description of one file's uncaught failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionError {
    /// Exception type (`ModuleNotFoundError`, `SyntaxError`, ...), or a
    /// synthetic kind such as `Timeout` / `NonZeroExit`.
    pub kind: String,
    pub message: String,
    /// Full traceback text as the interpreter printed it.
    pub traceback: String,
}

/// Outcome of executing one file in isolation. Stdout emitted before a
/// failure is retained; a crash never discards partial output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub stdout: String,
    pub error: Option<ExecutionError>,
}

impl ExecutionResult {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            error: None,
        }
    }

    pub fn failure(stdout: impl Into<String>, error: ExecutionError) -> Self {
        Self {
            stdout: stdout.into(),
            error: Some(error),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Which execution outcomes a report should include.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    pub with_errors: bool,
    pub with_outputs: bool,
}

impl ReportOptions {
    pub fn errors_only() -> Self {
        Self {
            with_errors: true,
            with_outputs: false,
        }
    }

    pub fn outputs_only() -> Self {
        Self {
            with_errors: false,
            with_outputs: true,
        }
    }

    pub fn errors_and_outputs() -> Self {
        Self {
            with_errors: true,
            with_outputs: true,
        }
    }
}

/// Payloads recorded for one file. A file that both printed and crashed
/// carries both fields on its single entry, one per category it matched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReportRecord {
    fn is_empty(&self) -> bool {
        self.content.is_none() && self.stdout.is_none() && self.error.is_none()
    }

    /// The block payload used in flattened text. An error payload already
    /// embeds any partial stdout under its `STDOUT:` section, so a file
    /// that printed and then crashed renders only the error; standalone
    /// stdout appears only for clean runs. Content is the content-map case.
    fn flat_payload(&self) -> String {
        let mut payload = String::new();
        if let Some(error) = &self.error {
            payload.push_str(error);
        } else if let Some(stdout) = &self.stdout {
            payload.push_str(stdout);
        }
        if let Some(content) = &self.content {
            payload.push_str(content);
        }
        payload
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub path: String,
    #[serde(flatten)]
    pub record: ReportRecord,
}

/// Ordered aggregation of per-file outcomes, keyed by repo-relative path.
/// Entry order matches scan order. A report is empty exactly when no file
/// matched any requested filter; the repair loop treats that as "done".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoReport {
    entries: Vec<ReportEntry>,
}

impl RepoReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one file's execution outcome, honoring the report filters.
    /// Files matching no requested category are omitted entirely.
    pub fn push_execution(&mut self, path: &str, result: &ExecutionResult, options: ReportOptions) {
        let mut record = ReportRecord::default();

        if options.with_outputs && !result.stdout.is_empty() {
            record.stdout = Some(result.stdout.clone());
        }
        if options.with_errors {
            if let Some(error) = &result.error {
                record.error = Some(render_error(error, &result.stdout));
            }
        }

        if !record.is_empty() {
            self.entries.push(ReportEntry {
                path: path.to_string(),
                record,
            });
        }
    }

    /// Record a file's content (content-map mode, no execution involved).
    pub fn push_content(&mut self, path: &str, content: &str) {
        self.entries.push(ReportEntry {
            path: path.to_string(),
            record: ReportRecord {
                content: Some(content.to_string()),
                ..ReportRecord::default()
            },
        });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    /// Flattened text digest. Format contract (byte-exact):
    /// `\n\n**<path>**: \n<payload>` per entry, concatenated in order.
    /// Callers strip outer whitespace; inter-entry spacing is significant.
    pub fn to_flat_text(&self) -> String {
        let mut message = String::new();
        for entry in &self.entries {
            message.push_str(&format!("\n\n**{}**: \n", entry.path));
            message.push_str(&entry.record.flat_payload());
        }
        message
    }

    /// Path -> record export for programmatic inspection. Key order is
    /// insertion order, which is traversal order.
    pub fn to_map(&self) -> IndexMap<String, ReportRecord> {
        self.entries
            .iter()
            .map(|e| (e.path.clone(), e.record.clone()))
            .collect()
    }
}

/// Error payload format, kept bit-compatible with the fix instructions the
/// edit service is prompted with: the traceback, then the partial stdout
/// when there was any.
fn render_error(error: &ExecutionError, stdout: &str) -> String {
    let mut rendered = format!("Error: {}\n", error.traceback);
    if !stdout.is_empty() {
        rendered.push_str(&format!("STDOUT:\n{}", stdout));
    }
    rendered
}
