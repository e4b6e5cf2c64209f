//! Lenient JSON recovery from LLM answers.
//!
//! Models wrap JSON in markdown fences, add prose before or after it, or
//! both. These helpers find the first parseable JSON value and ignore the
//! rest.

use serde_json::Value;

/// Remove a surrounding markdown code fence, if any.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Skip the info string ("json", "JSON", ...) up to the first newline
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// First JSON object or array in the text.
pub fn first_json_value(text: &str) -> Option<Value> {
    find_json_value(text, |_| true)
}

/// First JSON object or array in the text that `accept` takes.
///
/// Tries the fence-stripped text as a whole, then every `{` or `[` in order.
/// Values that parse but are rejected are skipped, so a citation like `[1]`
/// ahead of the real answer does not hide it. Trailing text after the value
/// is ignored.
pub fn find_json_value(text: &str, accept: impl Fn(&Value) -> bool) -> Option<Value> {
    let is_wanted = |value: &Value| (value.is_object() || value.is_array()) && accept(value);

    let body = strip_code_fences(text);
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if is_wanted(&value) {
            return Some(value);
        }
    }

    body.char_indices()
        .filter(|(_, c)| *c == '{' || *c == '[')
        .find_map(|(i, _)| {
            serde_json::Deserializer::from_str(&body[i..])
                .into_iter::<Value>()
                .next()
                .and_then(|r| r.ok())
                .filter(|value| is_wanted(value))
        })
}
