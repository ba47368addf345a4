//! Compact Python module summaries for LLM consumption.
//!
//! A summary keeps the module docstring, top-level `def`/`class` signatures
//! (with their docstrings) and top-level assignments, and drops every body.
//! This keeps repository maps small without executing any code.

use std::cell::RefCell;
use tree_sitter::{Node, Parser};

// Tree-sitter parsers are expensive to create but can be reused across
// files. Each thread keeps one pre-configured Python parser.
thread_local! {
    static PYTHON_PARSER: RefCell<Parser> = RefCell::new({
        let mut p = Parser::new();
        // Ignore error here - will be caught at parse time if language fails
        let _ = p.set_language(&tree_sitter_python::LANGUAGE.into());
        p
    });
}

/// Summarize a Python source file. Unparseable input yields an empty
/// summary rather than an error; the full content is still available on the
/// snapshot if a caller needs it.
pub fn summarize_python(content: &str) -> String {
    let tree = match PYTHON_PARSER.with(|p| p.borrow_mut().parse(content, None)) {
        Some(tree) => tree,
        None => return String::new(),
    };
    let root = tree.root_node();

    let mut header = String::new();
    let mut classes = Vec::new();
    let mut functions = Vec::new();
    let mut variables = Vec::new();

    let mut cursor = root.walk();
    for (index, child) in root.named_children(&mut cursor).enumerate() {
        let node = unwrap_decorated(child);
        match node.kind() {
            "expression_statement" => {
                if index == 0 {
                    if let Some(doc) = docstring_of_statement(&node, content) {
                        header = doc;
                        continue;
                    }
                }
                if let Some(inner) = node.named_child(0) {
                    if inner.kind() == "assignment" || inner.kind() == "augmented_assignment" {
                        variables.push(first_line(&node, content));
                    }
                }
            }
            "function_definition" => {
                functions.push(signature_with_docstring(&node, content));
            }
            "class_definition" => {
                classes.push(signature_with_docstring(&node, content));
            }
            _ => {}
        }
    }

    let mut sections = Vec::new();
    if !header.is_empty() {
        sections.push(format!("Module Description:\n{}\n", header));
    }
    if !classes.is_empty() {
        sections.push(format!("Classes:\n{}\n", classes.join("\n")));
    }
    if !functions.is_empty() {
        sections.push(format!("Functions:\n{}\n", functions.join("\n")));
    }
    if !variables.is_empty() {
        sections.push(format!("Variables:\n{}\n", variables.join("\n")));
    }
    sections.join("\n").trim().to_string()
}

/// Decorated definitions wrap the real `def`/`class` node.
fn unwrap_decorated(node: Node) -> Node {
    if node.kind() == "decorated_definition" {
        if let Some(def) = node.child_by_field_name("definition") {
            return def;
        }
    }
    node
}

/// Signature lines of a `def`/`class`, from its first line through the line
/// whose code part (comments stripped) ends with a colon.
fn signature(node: &Node, content: &str) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = node.start_position().row;
    let mut collected = Vec::new();
    for line in lines.iter().skip(start) {
        let code_part = line.split('#').next().unwrap_or("").trim_end();
        collected.push(*line);
        if code_part.ends_with(':') {
            break;
        }
    }
    collected.join("\n").trim().to_string()
}

fn signature_with_docstring(node: &Node, content: &str) -> String {
    let mut sig = signature(node, content);
    if let Some(doc) = docstring_of_definition(node, content) {
        sig.push_str(&format!("\n\"\"\"\n{}\n\"\"\"", doc));
    }
    sig
}

/// Docstring of a `def`/`class`: first statement of its body block, when
/// that statement is a bare string.
fn docstring_of_definition(node: &Node, content: &str) -> Option<String> {
    let body = node.child_by_field_name("body")?;
    let first = body.named_child(0)?;
    docstring_of_statement(&first, content)
}

/// Extract the text of a bare-string expression statement, with quote
/// delimiters and string prefixes stripped.
fn docstring_of_statement(node: &Node, content: &str) -> Option<String> {
    if node.kind() != "expression_statement" {
        return None;
    }
    let inner = node.named_child(0)?;
    if inner.kind() != "string" {
        return None;
    }
    let raw = inner.utf8_text(content.as_bytes()).ok()?;
    Some(strip_string_literal(raw).trim().to_string())
}

fn strip_string_literal(raw: &str) -> &str {
    let without_prefix = raw.trim_start_matches(|c: char| "rbfuRBFU".contains(c));
    for delim in ["\"\"\"", "'''"] {
        if without_prefix.starts_with(delim) && without_prefix.len() >= 6 {
            return without_prefix
                .strip_prefix(delim)
                .and_then(|s| s.strip_suffix(delim))
                .unwrap_or(without_prefix);
        }
    }
    for delim in ["\"", "'"] {
        if without_prefix.starts_with(delim) && without_prefix.len() >= 2 {
            return without_prefix
                .strip_prefix(delim)
                .and_then(|s| s.strip_suffix(delim))
                .unwrap_or(without_prefix);
        }
    }
    without_prefix
}

fn first_line(node: &Node, content: &str) -> String {
    content
        .lines()
        .nth(node.start_position().row)
        .unwrap_or("")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#""""Thermal storage sizing."""

import math

CAPACITY_MWH = 120.0


def stored_energy(mass_kg: float, delta_t: float) -> float:
    """Sensible heat stored in the salt inventory."""
    return mass_kg * 1.5 * delta_t


class Tank:
    """A single molten-salt tank."""

    def volume(self) -> float:
        return 42.0
"#;

    #[test]
    fn summary_keeps_docstring_and_signatures() {
        let summary = summarize_python(SAMPLE);
        assert!(summary.contains("Module Description:\nThermal storage sizing."));
        assert!(summary.contains("def stored_energy(mass_kg: float, delta_t: float) -> float:"));
        assert!(summary.contains("Sensible heat stored in the salt inventory."));
        assert!(summary.contains("class Tank:"));
        assert!(summary.contains("CAPACITY_MWH = 120.0"));
    }

    #[test]
    fn summary_drops_function_bodies() {
        let summary = summarize_python(SAMPLE);
        assert!(!summary.contains("return mass_kg"));
        assert!(!summary.contains("return 42.0"));
        assert!(!summary.contains("import math"));
    }

    #[test]
    fn multiline_signature_is_captured_through_colon() {
        let src = "def convert(\n    value: float,\n    factor: float,\n) -> float:\n    return value * factor\n";
        let summary = summarize_python(src);
        assert!(summary.contains("def convert("));
        assert!(summary.contains(") -> float:"));
        assert!(!summary.contains("return value"));
    }

    #[test]
    fn empty_and_unparseable_input_yield_empty_summary() {
        assert_eq!(summarize_python(""), "");
        // Broken syntax still parses to a tree with error nodes; we only
        // pick up what is recognizable.
        let summary = summarize_python("def broken(:\n");
        assert!(!summary.contains("Module Description"));
    }
}
