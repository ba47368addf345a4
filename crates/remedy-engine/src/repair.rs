//! The bounded repair loop and the outer iterative engineering process.

use crate::edit::{CodeEditService, EditFormat};
use crate::exec::PythonExecutor;
use crate::inspect::{errors_and_outputs_text, execution_report};
use crate::llm::prompts;
use anyhow::{bail, Result};
use remedy_core::report::{RepoReport, ReportOptions};
use std::path::Path;

/// Terminal state of one repair run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixOutcome {
    /// The repo was already clean; no edit was dispatched.
    Clean,
    /// Errors were found and eliminated within the trial budget.
    Fixed { attempts: u32 },
    /// The trial budget ran out with errors still present.
    TrialsExhausted {
        attempts: u32,
        remaining: RepoReport,
    },
}

impl FixOutcome {
    pub fn is_clean(&self) -> bool {
        matches!(self, FixOutcome::Clean | FixOutcome::Fixed { .. })
    }
}

/// Run the verify-edit-verify loop until the repo is clean or `trials`
/// edit dispatches have been spent. Each dispatch receives the full
/// current file set plus a flattened errors-only report; whether the edit
/// helped is judged purely by the next scan-and-execute pass.
pub async fn fix_repository(
    executor: &PythonExecutor,
    service: &dyn CodeEditService,
    repo_root: &Path,
    model: &str,
    trials: u32,
) -> Result<FixOutcome> {
    if !repo_root.is_dir() {
        bail!("Repository path '{}' does not exist", repo_root.display());
    }

    let mut attempts: u32 = 0;
    loop {
        let (snapshot, report) =
            execution_report(executor, repo_root, ReportOptions::errors_only())?;

        if report.is_empty() {
            return Ok(if attempts == 0 {
                FixOutcome::Clean
            } else {
                FixOutcome::Fixed { attempts }
            });
        }

        if attempts >= trials {
            return Ok(FixOutcome::TrialsExhausted {
                attempts,
                remaining: report,
            });
        }

        attempts += 1;
        eprintln!("Attempt number {}", attempts);

        let instruction =
            prompts::fix_instruction(&snapshot.repo_name(), report.to_flat_text().trim_start());
        service
            .edit(
                &instruction,
                repo_root,
                &snapshot.file_paths(),
                EditFormat::WholeFile,
                model,
            )
            .await?;
    }
}

/// The outer engineering loop: alternate feature work and repair.
///
/// Each iteration first repairs the tree, then gathers the current
/// errors-and-outputs digest as feedback, and dispatches the feature
/// instruction wrapped in the repository-context preamble. The final
/// iteration ends with one more repair pass so the tree is left as clean
/// as the trial budget allows.
pub async fn iterative_engineering_process(
    executor: &PythonExecutor,
    service: &dyn CodeEditService,
    repo_root: &Path,
    task: &str,
    model: &str,
    iterations: u32,
    trials: u32,
) -> Result<FixOutcome> {
    if !repo_root.is_dir() {
        bail!("Repository path '{}' does not exist", repo_root.display());
    }

    for iteration in 1..=iterations {
        eprintln!("--- Running iteration number {} ---", iteration);

        fix_repository(executor, service, repo_root, model, trials).await?;

        let feedback = errors_and_outputs_text(executor, repo_root)?;
        let task_with_feedback = if feedback.is_empty() {
            task.to_string()
        } else {
            format!(
                "Latest run output from the repository:\n{}\n\n{}",
                feedback.trim_start(),
                task
            )
        };

        let snapshot = remedy_core::scan::RepoSnapshot::scan(repo_root)?;
        let instruction =
            prompts::repo_context_instruction(&snapshot.repo_name(), "", &task_with_feedback);
        service
            .edit(
                &instruction,
                repo_root,
                &snapshot.file_paths(),
                EditFormat::WholeFile,
                model,
            )
            .await?;
    }

    fix_repository(executor, service, repo_root, model, trials).await
}
