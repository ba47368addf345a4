//! Scan + execute + aggregate: building repo reports from a live tree.

use crate::exec::PythonExecutor;
use anyhow::Result;
use remedy_core::report::{ExecutionResult, RepoReport, ReportOptions};
use remedy_core::scan::RepoSnapshot;
use remedy_core::util::debug_stderr_enabled;
use std::path::Path;

/// Execute every file in scan order and pair each with its outcome.
/// One file's crash never blocks the rest of the scan.
pub fn run_repo(
    executor: &PythonExecutor,
    snapshot: &RepoSnapshot,
) -> Result<Vec<ExecutionResult>> {
    let mut results = Vec::with_capacity(snapshot.len());
    for file in snapshot.files() {
        let abs = file.absolute_path(&snapshot.root);
        let result = executor.run_file(&abs, &snapshot.root)?;
        if debug_stderr_enabled() {
            eprintln!(
                "  {} -> {}",
                file.relative_path,
                if result.succeeded() { "ok" } else { "error" }
            );
        }
        results.push(result);
    }
    Ok(results)
}

/// Scan a repo, execute every file, and build the filtered report.
/// Returns the snapshot too so callers can reuse the literal file set.
pub fn execution_report(
    executor: &PythonExecutor,
    repo_root: &Path,
    options: ReportOptions,
) -> Result<(RepoSnapshot, RepoReport)> {
    let snapshot = RepoSnapshot::scan(repo_root)?;
    let results = run_repo(executor, &snapshot)?;

    let mut report = RepoReport::new();
    for (file, result) in snapshot.files().iter().zip(results.iter()) {
        report.push_execution(&file.relative_path, result, options);
    }
    Ok((snapshot, report))
}

/// Flattened errors-and-outputs digest, or an empty string when the repo
/// runs clean and silent. This is the feedback channel for the outer
/// engineering loop.
pub fn errors_and_outputs_text(executor: &PythonExecutor, repo_root: &Path) -> Result<String> {
    let (_, report) = execution_report(executor, repo_root, ReportOptions::errors_and_outputs())?;
    if report.is_empty() {
        Ok(String::new())
    } else {
        Ok(report.to_flat_text())
    }
}

/// Content map of the repo without executing anything. With `summary`,
/// file content is reduced to docstrings and signatures.
pub fn repository_map(repo_root: &Path, summary: bool) -> Result<RepoReport> {
    let snapshot = if summary {
        RepoSnapshot::scan_summary(repo_root)?
    } else {
        RepoSnapshot::scan(repo_root)?
    };

    let mut report = RepoReport::new();
    for file in snapshot.files() {
        report.push_content(&file.relative_path, &file.content);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::python_available;
    use std::fs;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn two_file_scenario_reports_error_and_output() {
        if !python_available() {
            eprintln!("skipping: python3 not available");
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path().join("demo");
        fs::create_dir_all(&repo).unwrap();
        write(&repo, "a.py", "import a_typo_module\n");
        write(&repo, "b.py", "print(42)\n");

        let executor = PythonExecutor::default();
        let (_, report) =
            execution_report(&executor, &repo, ReportOptions::errors_and_outputs()).unwrap();

        assert_eq!(report.len(), 2);
        let map = report.to_map();
        assert!(map["a.py"]
            .error
            .as_deref()
            .unwrap()
            .contains("No module named"));
        assert_eq!(map["b.py"].stdout.as_deref(), Some("42\n"));
    }

    #[test]
    fn errors_only_report_excludes_healthy_printers() {
        if !python_available() {
            eprintln!("skipping: python3 not available");
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path().join("demo");
        fs::create_dir_all(&repo).unwrap();
        write(&repo, "a.py", "import a_typo_module\n");
        write(&repo, "b.py", "print(42)\n");

        let executor = PythonExecutor::default();
        let (_, report) =
            execution_report(&executor, &repo, ReportOptions::errors_only()).unwrap();

        assert_eq!(report.len(), 1);
        assert!(report.to_map().contains_key("a.py"));
    }

    #[test]
    fn clean_repo_reports_empty_twice_in_a_row() {
        if !python_available() {
            eprintln!("skipping: python3 not available");
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path().join("demo");
        fs::create_dir_all(&repo).unwrap();
        write(&repo, "quiet.py", "x = 1\n");

        let executor = PythonExecutor::default();
        let (_, first) =
            execution_report(&executor, &repo, ReportOptions::errors_only()).unwrap();
        let (_, second) =
            execution_report(&executor, &repo, ReportOptions::errors_only()).unwrap();
        assert!(first.is_empty());
        assert!(second.is_empty());
    }

    #[test]
    fn repository_map_needs_no_interpreter() {
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path().join("demo");
        fs::create_dir_all(&repo).unwrap();
        write(&repo, "values.py", "\"\"\"Doc.\"\"\"\nmass_kg = 10\n");

        let report = repository_map(&repo, false).unwrap();
        assert_eq!(report.len(), 1);
        assert!(report.to_map()["values.py"]
            .content
            .as_deref()
            .unwrap()
            .contains("mass_kg = 10"));

        let summary = repository_map(&repo, true).unwrap();
        let content = summary.to_map()["values.py"].content.clone().unwrap();
        assert!(content.contains("Module Description:\nDoc."));
    }
}
