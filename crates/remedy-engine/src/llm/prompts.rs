//! Instruction templates sent to the edit service.
//!
//! The fix-instruction layout is a compatibility contract: downstream
//! agents parse its headings, so the literal structure must not drift.

/// System prompt for the whole-file JSON edit protocol. The response shape
/// mirrors what `edit::RepoEdit` deserializes.
pub const WHOLE_FILE_EDIT_SYSTEM: &str = r#"You edit Python repositories.

Respond with only a JSON object of this exact shape:
{
  "files": [
    {
      "name": "<filename.py>",
      "content": "<the revised file content>"
    }
  ]
}

Answer with only the modified files, where "name" is the repo-relative file name and "content" is the full updated content of that file. Setting "content" to null removes the file. If no modifications are needed, return {"files": []}.
Never use placeholders or elide code: every "content" value must be the complete file."#;

/// The fix instruction embedding a flattened error report. Literal
/// structure reproduced from the upstream contract.
pub fn fix_instruction(repo_name: &str, errors_to_fix: &str) -> String {
    format!(
        r#"
## Fix Python code in repository:

The code in the repository `{repo_name}` contains errors. Fix these issues with the following guidelines:

- **Absolute Imports:** Ensure all imports within the repository use absolute imports starting explicitly with `from {repo_name}.`
  ✗ Avoid: `import module`, `from .module import x`, etc.
  ✓ Correct: `from {repo_name}.module import x`

- **Common fixes needed:** Resolve import errors, `NameError`, `SyntaxError`, and other issues listed explicitly below.

- **Debugging statements:** Add clear and helpful `print()` statements as necessary to facilitate debugging in future iterations. Clearly indicate their purpose.

## Errors to fix:
{errors_to_fix}

"#,
        repo_name = repo_name,
        errors_to_fix = errors_to_fix
    )
}

/// Repository-context preamble wrapped around every feature instruction:
/// states the package identity and the absolute-import rule the executor's
/// isolation model depends on.
pub fn repo_context_instruction(repo_name: &str, system_context: &str, task: &str) -> String {
    format!(
        r#"
# Repository context  (read *before* writing code)
• You are working **inside a Python package named `{repo_name}`**.
• A file called `{repo_name}/__init__.py` already exists, so everything in this repo is import-able as `{repo_name}.<module>`.
• **Rule #1 (imports)** – Whenever one module imports another *within this repo*, use an **absolute package import** that starts explicitly with `{repo_name}.<submodule>`.
  ✗ Do **NOT** write `import a`, `from a import …`, `from .a import …`, or any relative import.
  ✓ Instead write `from {repo_name}.your_submodule import a` or `from {repo_name}.your_submodule.a import a`.
• Follow PEP 8 unless a rule above overrides it.

{system_context}

# Task

{task}
"#,
        repo_name = repo_name,
        system_context = system_context,
        task = task
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fix_instruction_keeps_the_literal_contract() {
        let instruction = fix_instruction("reactor", "**a.py**: \nError: boom");
        assert!(instruction.contains("## Fix Python code in repository:"));
        assert!(instruction
            .contains("The code in the repository `reactor` contains errors."));
        assert!(instruction.contains(
            "absolute imports starting explicitly with `from reactor.`"
        ));
        assert!(instruction.contains("## Errors to fix:\n**a.py**: \nError: boom"));
    }

    #[test]
    fn repo_context_names_the_package_and_task() {
        let instruction = repo_context_instruction("reactor", "", "Add a cooling loop.");
        assert!(instruction.contains("Python package named `reactor`"));
        assert!(instruction.contains("from {repo}.your_submodule".replace("{repo}", "reactor").as_str()));
        assert!(instruction.contains("# Task\n\nAdd a cooling loop."));
    }
}
