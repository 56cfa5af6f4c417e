//! Pull a JSON value out of model text
//!
//! Models asked for JSON still wrap it in code fences or lead with a
//! sentence now and then. Try the whole text first, then the first
//! well-formed JSON value found in it.

use crate::error::AiError;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// Parse model text into `T`
pub fn parse_model_json<T: DeserializeOwned>(text: &str) -> Result<T, AiError> {
    let value = extract_json_value(text)?;
    serde_json::from_value(value).map_err(|err| AiError::malformed(format!("unexpected shape: {err}")))
}

/// Locate the JSON value in model text
pub fn extract_json_value(text: &str) -> Result<Value, AiError> {
    let cleaned = strip_code_fences(text);
    if cleaned.is_empty() {
        return Err(AiError::EmptyResponse);
    }
    match serde_json::from_str::<Value>(&cleaned) {
        Ok(value) => Ok(value),
        Err(err) => find_embedded_json(&cleaned)
            .ok_or_else(|| AiError::malformed(format!("no JSON value in response: {err}"))),
    }
}

fn strip_code_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    let mut lines: Vec<&str> = trimmed.lines().collect();
    if lines.first().is_some_and(|l| l.trim_start().starts_with("```")) {
        lines.remove(0);
    }
    if lines.last().is_some_and(|l| l.trim_start().starts_with("```")) {
        lines.pop();
    }
    lines.join("\n").trim().to_string()
}

fn find_embedded_json(raw: &str) -> Option<Value> {
    for (idx, ch) in raw.char_indices() {
        if ch != '{' && ch != '[' {
            continue;
        }
        let mut deserializer = serde_json::Deserializer::from_str(&raw[idx..]);
        if let Ok(value) = Value::deserialize(&mut deserializer) {
            return Some(value);
        }
    }
    None
}
