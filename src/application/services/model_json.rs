use serde_json::Value;

/// Extract a JSON object from raw model output.
///
/// Strict parse first; if that fails, scan for the first balanced top-level
/// `{...}` object, tracking brace depth while respecting quoted strings and
/// escape sequences. This covers answers wrapped in prose or fenced code
/// blocks. Fully non-JSON input yields `None`, never a panic.
pub fn extract_model_json(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if value.is_object() {
            return Some(value);
        }
    }

    let candidate = balanced_object(trimmed)?;
    serde_json::from_str::<Value>(candidate).ok()
}

fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
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
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}
