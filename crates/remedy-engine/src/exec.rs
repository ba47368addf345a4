//! Isolated execution of one Python file per interpreter process.
//!
//! Every file runs in a fresh subprocess, so module caches, globals, and
//! monkey-patches from one file can never leak into the next - the isolation
//! the scan loop depends on. The interpreter's working directory and
//! `PYTHONPATH` point at the repo root's *parent*, which is what makes
//! `from <repo_name>.module import x` absolute imports resolve.

use anyhow::{anyhow, Result};
use regex::Regex;
use remedy_core::report::{ExecutionError, ExecutionResult};
use remedy_core::util::{debug_stderr_enabled, run_command_with_timeout, truncate};
use std::path::Path;
use std::process::Command;
use std::sync::OnceLock;
use std::time::Duration;

pub const DEFAULT_FILE_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs Python files in isolation, capturing stdout and uncaught exceptions.
#[derive(Debug, Clone)]
pub struct PythonExecutor {
    python_bin: String,
    timeout: Duration,
}

impl Default for PythonExecutor {
    fn default() -> Self {
        Self::new("python3", DEFAULT_FILE_TIMEOUT)
    }
}

impl PythonExecutor {
    pub fn new(python_bin: impl Into<String>, timeout: Duration) -> Self {
        Self {
            python_bin: python_bin.into(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Interpreter version string, for startup diagnostics. Failing here
    /// means the host is misconfigured, not that a scanned file is broken.
    pub fn interpreter_version(&self) -> Result<String> {
        let mut cmd = Command::new(&self.python_bin);
        cmd.arg("--version");
        let run = run_command_with_timeout(&mut cmd, Duration::from_secs(10))
            .map_err(|e| anyhow!("Failed to run '{} --version': {}", self.python_bin, e))?;
        let combined = format!("{}{}", run.stdout, run.stderr);
        Ok(combined.trim().to_string())
    }

    /// Execute one file as if run standalone. A file that crashes, hangs,
    /// or fails to import reports an `ExecutionResult` with the error
    /// captured; only a host-level failure to spawn the interpreter is a
    /// Rust error. Partial stdout always survives.
    pub fn run_file(&self, file_path: &Path, repo_root: &Path) -> Result<ExecutionResult> {
        // A relative root (the CLI default ".") has an empty parent();
        // resolve both paths before deriving the interpreter's cwd.
        let file_path = file_path
            .canonicalize()
            .map_err(|e| anyhow!("Failed to resolve '{}': {}", file_path.display(), e))?;
        let repo_root = repo_root
            .canonicalize()
            .map_err(|e| anyhow!("Failed to resolve '{}': {}", repo_root.display(), e))?;
        let workdir = repo_root.parent().unwrap_or(&repo_root);

        let mut cmd = Command::new(&self.python_bin);
        cmd.arg(&file_path)
            .current_dir(workdir)
            .env("PYTHONPATH", prepend_python_path(workdir))
            // Unbuffered, so output printed before a crash is not lost.
            .env("PYTHONUNBUFFERED", "1");

        let run = run_command_with_timeout(&mut cmd, self.timeout).map_err(|e| {
            anyhow!(
                "Failed to execute '{}' with '{}': {}",
                file_path.display(),
                self.python_bin,
                e
            )
        })?;

        if debug_stderr_enabled() {
            eprintln!(
                "  ran {} -> timed_out={} stderr={}",
                file_path.display(),
                run.timed_out,
                truncate(run.stderr.trim(), 120)
            );
        }

        if run.timed_out {
            return Ok(ExecutionResult::failure(
                run.stdout,
                ExecutionError {
                    kind: "Timeout".to_string(),
                    message: format!(
                        "execution exceeded {}s and was killed",
                        self.timeout.as_secs()
                    ),
                    traceback: format!(
                        "Timeout: execution exceeded {}s and was killed\n{}",
                        self.timeout.as_secs(),
                        run.stderr
                    ),
                },
            ));
        }

        let succeeded = run.status.map(|s| s.success()).unwrap_or(false);
        if succeeded {
            return Ok(ExecutionResult::success(run.stdout));
        }

        let error = parse_traceback(&run.stderr).unwrap_or_else(|| ExecutionError {
            kind: "NonZeroExit".to_string(),
            message: format!(
                "interpreter exited with {}",
                run.status
                    .and_then(|s| s.code())
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string())
            ),
            traceback: run.stderr.clone(),
        });

        Ok(ExecutionResult::failure(run.stdout, error))
    }
}

fn prepend_python_path(workdir: &Path) -> String {
    match std::env::var("PYTHONPATH") {
        Ok(existing) if !existing.is_empty() => {
            format!("{}:{}", workdir.display(), existing)
        }
        _ => workdir.display().to_string(),
    }
}

/// Parse the exception type and message out of the last line of a Python
/// traceback. `SyntaxError` and friends follow the same `Kind: message`
/// shape; anything unrecognized keeps the raw stderr as its traceback.
fn parse_traceback(stderr: &str) -> Option<ExecutionError> {
    static EXCEPTION_LINE: OnceLock<Regex> = OnceLock::new();
    let re = EXCEPTION_LINE.get_or_init(|| {
        Regex::new(r"^([A-Za-z_][A-Za-z0-9_.]*(?:Error|Exception|Interrupt|Exit|Warning)):?\s?(.*)$")
            .unwrap_or_else(|_| Regex::new("$^").unwrap())
    });

    let stderr = stderr.trim_end();
    if stderr.is_empty() {
        return None;
    }

    let last_line = stderr.lines().rev().find(|l| !l.trim().is_empty())?;
    let (kind, message) = match re.captures(last_line.trim()) {
        Some(caps) => (
            caps.get(1).map(|m| m.as_str().to_string())?,
            caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default(),
        ),
        None => match last_line.split_once(':') {
            Some((kind, message)) if !kind.trim().is_empty() && !kind.contains(' ') => {
                (kind.trim().to_string(), message.trim().to_string())
            }
            _ => return None,
        },
    };

    Some(ExecutionError {
        kind,
        message,
        traceback: stderr.to_string(),
    })
}

#[cfg(test)]
pub(crate) fn python_available() -> bool {
    PythonExecutor::default().interpreter_version().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write(root: &Path, rel: &str, content: &str) -> std::path::PathBuf {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn partial_output_survives_a_crash() {
        if !python_available() {
            eprintln!("skipping: python3 not available");
            return;
        }
        let dir = tempdir().unwrap();
        let repo = dir.path().join("demo");
        fs::create_dir_all(&repo).unwrap();
        let file = write(&repo, "boom.py", "print(\"X\")\nraise ValueError(\"bad\")\n");

        let result = PythonExecutor::default().run_file(&file, &repo).unwrap();
        assert_eq!(result.stdout, "X\n");
        let error = result.error.unwrap();
        assert_eq!(error.kind, "ValueError");
        assert!(error.traceback.contains("ValueError: bad"));
    }

    #[test]
    fn relative_repo_root_resolves_before_spawn() {
        if !python_available() {
            eprintln!("skipping: python3 not available");
            return;
        }
        let dir = tempdir().unwrap();
        let repo = dir.path().join("demo");
        fs::create_dir_all(&repo).unwrap();
        write(&repo, "ok.py", "print(1)\n");

        let prev = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir.path()).unwrap();
        let result = PythonExecutor::default().run_file(Path::new("demo/ok.py"), Path::new("demo"));
        std::env::set_current_dir(prev).unwrap();

        let result = result.unwrap();
        assert!(result.succeeded(), "stderr: {:?}", result.error);
        assert_eq!(result.stdout, "1\n");
    }

    #[test]
    fn import_failures_are_captured_not_fatal() {
        if !python_available() {
            eprintln!("skipping: python3 not available");
            return;
        }
        let dir = tempdir().unwrap();
        let repo = dir.path().join("demo");
        fs::create_dir_all(&repo).unwrap();
        let file = write(&repo, "broken.py", "import a_typo_module\n");

        let result = PythonExecutor::default().run_file(&file, &repo).unwrap();
        let error = result.error.unwrap();
        assert_eq!(error.kind, "ModuleNotFoundError");
        assert!(error.traceback.contains("No module named"));
    }

    #[test]
    fn executions_are_isolated_across_files() {
        if !python_available() {
            eprintln!("skipping: python3 not available");
            return;
        }
        let dir = tempdir().unwrap();
        let repo = dir.path().join("demo");
        fs::create_dir_all(&repo).unwrap();
        let mutator = write(&repo, "mutator.py", "import sys\nsys.mutated_flag = True\n");
        let observer = write(
            &repo,
            "observer.py",
            "import sys\nprint(hasattr(sys, \"mutated_flag\"))\n",
        );

        let executor = PythonExecutor::default();
        let first = executor.run_file(&mutator, &repo).unwrap();
        assert!(first.succeeded());

        let second = executor.run_file(&observer, &repo).unwrap();
        assert_eq!(second.stdout, "False\n");
    }

    #[test]
    fn absolute_package_imports_resolve_against_the_repo_parent() {
        if !python_available() {
            eprintln!("skipping: python3 not available");
            return;
        }
        let dir = tempdir().unwrap();
        let repo = dir.path().join("pkgdemo");
        fs::create_dir_all(&repo).unwrap();
        write(&repo, "__init__.py", "");
        write(&repo, "values.py", "x = 10\n");
        let user = write(&repo, "uses.py", "from pkgdemo.values import x\nprint(x)\n");

        let result = PythonExecutor::default().run_file(&user, &repo).unwrap();
        assert!(result.succeeded(), "stderr: {:?}", result.error);
        assert_eq!(result.stdout, "10\n");
    }

    #[test]
    fn runaway_files_are_killed_and_reported() {
        if !python_available() {
            eprintln!("skipping: python3 not available");
            return;
        }
        let dir = tempdir().unwrap();
        let repo = dir.path().join("demo");
        fs::create_dir_all(&repo).unwrap();
        let file = write(&repo, "spin.py", "while True:\n    pass\n");

        let executor = PythonExecutor::new("python3", Duration::from_millis(500));
        let result = executor.run_file(&file, &repo).unwrap();
        let error = result.error.unwrap();
        assert_eq!(error.kind, "Timeout");
    }

    #[test]
    fn missing_interpreter_is_a_host_error() {
        let dir = tempdir().unwrap();
        let repo = dir.path().join("demo");
        fs::create_dir_all(&repo).unwrap();
        let file = write(&repo, "ok.py", "print(1)\n");

        let executor = PythonExecutor::new("definitely-not-a-python", Duration::from_secs(5));
        assert!(executor.run_file(&file, &repo).is_err());
    }

    #[test]
    fn traceback_parsing_handles_common_shapes() {
        let tb = "Traceback (most recent call last):\n  File \"x.py\", line 1, in <module>\n    import nope\nModuleNotFoundError: No module named 'nope'";
        let error = parse_traceback(tb).unwrap();
        assert_eq!(error.kind, "ModuleNotFoundError");
        assert_eq!(error.message, "No module named 'nope'");

        let tb = "  File \"x.py\", line 2\n    def broken(:\n              ^\nSyntaxError: invalid syntax";
        let error = parse_traceback(tb).unwrap();
        assert_eq!(error.kind, "SyntaxError");

        assert!(parse_traceback("").is_none());
    }
}
