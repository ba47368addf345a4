//! Extracting JSON payloads from noisy model output.
//!
//! Models wrap answers in markdown fences, prepend prose, or trail with
//! commentary. The edit protocol only cares about the first balanced JSON
//! object, so we strip fences and scan for it.

pub fn strip_markdown_fences(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if !trimmed.starts_with("```") {
        return None;
    }
    let without_open = trimmed.strip_prefix("```")?;
    let after_header = if let Some(newline_idx) = without_open.find('\n') {
        &without_open[newline_idx + 1..]
    } else {
        without_open
    };
    let end_idx = after_header.rfind("```")?;
    Some(after_header[..end_idx].trim().to_string())
}

fn extract_balanced_json_from(content: &str, start: usize) -> Option<String> {
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in content[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
                continue;
            }
            if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                if stack.pop() != Some(ch) {
                    return None;
                }
                if stack.is_empty() {
                    let end = start + offset + ch.len_utf8();
                    return Some(content[start..end].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

/// Best-effort extraction of the first JSON object in a model response.
pub fn extract_json_payload(content: &str) -> Option<String> {
    let unfenced = strip_markdown_fences(content).unwrap_or_else(|| content.trim().to_string());

    if unfenced.starts_with('{') || unfenced.starts_with('[') {
        if let Some(payload) = extract_balanced_json_from(&unfenced, 0) {
            return Some(payload);
        }
    }

    let start = unfenced.find('{')?;
    extract_balanced_json_from(&unfenced, start)
}
