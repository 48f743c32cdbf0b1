//! Tool calls written as JSON inside plain-text completions.

use serde_json::Value;

use super::providers::Completion;

fn parse_object(text: &str) -> Option<Value> {
    serde_json::from_str::<Value>(text.trim())
        .ok()
        .filter(Value::is_object)
}

/// Finds a JSON object in `text`: the whole text, the first fenced block, or
/// the span between the first `{` and the last `}`.
pub fn extract_json(text: &str) -> Option<Value> {
    if let Some(value) = parse_object(text) {
        return Some(value);
    }

    if let Some(start) = text.find("```") {
        let rest = &text[start + 3..];
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        if let Some(end) = rest.find("```") {
            if let Some(value) = parse_object(&rest[..end]) {
                return Some(value);
            }
        }
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    parse_object(&text[start..=end])
}

/// Turns provider text into a completion. `{"tool": name, "arguments": {..}}`
/// becomes an action; anything else is a direct answer.
pub fn completion_from_text(text: &str) -> Completion {
    if let Some(value) = extract_json(text) {
        if let Some(name) = value.get("tool").and_then(Value::as_str) {
            let arguments = value.get("arguments").cloned().unwrap_or(Value::Null);
            return Completion::Action {
                name: name.to_string(),
                arguments,
            };
        }
    }

    Completion::Answer {
        text: text.trim().to_string(),
    }
}
