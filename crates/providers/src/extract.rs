use aarogya_common::{IntakeError, Result};
use serde_json::Value;

/// Pulls the first balanced top-level `{...}` out of free-form model
/// output and parses it.
///
/// Models wrap their JSON in prose and markdown fences, and the preamble
/// itself can contain braces (example snippets, `{placeholder}` text), so
/// a first-`{` / last-`}` slice is not reliable. This scans with a brace
/// depth counter, skipping string literals and escape sequences, and
/// tries each candidate object until one parses.
pub fn first_json_object(text: &str) -> Result<Value> {
    let mut search_from = 0;
    while let Some(offset) = text[search_from..].find('{') {
        let start = search_from + offset;
        if let Some(end) = balanced_end(&text[start..]) {
            let candidate = &text[start..start + end];
            if let Ok(value) = serde_json::from_str::<Value>(candidate) {
                if value.is_object() {
                    return Ok(value);
                }
            }
            // Not valid JSON; continue scanning after this opening brace.
        }
        search_from = start + 1;
    }
    Err(IntakeError::Adapter(
        "no valid JSON object found in model response".to_string(),
    ))
}

/// Byte offset one past the `}` matching the `{` at the start of `text`,
/// or None if the braces never balance.
fn balanced_end(text: &str) -> Option<usize> {
    debug_assert!(text.starts_with('{'));
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + ch.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}
