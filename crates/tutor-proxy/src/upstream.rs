//! Upstream model API
//!
//! The request arrives in the generation SDK's shape: `contents` plus a
//! flat `config`. The REST API wants `systemInstruction` at the top level and
//! the remaining settings under `generationConfig`.

use crate::error::UpstreamError;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::time::Duration;

/// Default model API base URL
pub const DEFAULT_UPSTREAM_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// A model API that turns contents into text
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn generate(
        &self,
        api_key: &str,
        model: &str,
        contents: Value,
        config: Option<Value>,
    ) -> Result<String, UpstreamError>;
}

/// `generateContent` over HTTP
#[derive(Debug, Clone)]
pub struct GeminiUpstream {
    http: reqwest::Client,
    base_url: String,
}

impl GeminiUpstream {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Endpoint for `model`
    #[must_use]
    pub fn endpoint(&self, model: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl Upstream for GeminiUpstream {
    async fn generate(
        &self,
        api_key: &str,
        model: &str,
        contents: Value,
        config: Option<Value>,
    ) -> Result<String, UpstreamError> {
        let body = build_body(contents, config);
        let response = self
            .http
            .post(self.endpoint(model))
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let reply: Value = response
            .json()
            .await
            .map_err(|e| UpstreamError::Malformed(e.to_string()))?;

        if !status.is_success() {
            let message = reply
                .pointer("/error/message")
                .and_then(Value::as_str)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("upstream error"))
                .to_string();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                message,
            });
        }
        response_text(&reply).ok_or(UpstreamError::EmptyResponse)
    }
}

/// REST request body from SDK-style contents and config
#[must_use]
pub fn build_body(contents: Value, config: Option<Value>) -> Value {
    let mut body = Map::new();
    body.insert("contents".into(), normalize_contents(contents));

    if let Some(Value::Object(mut config)) = config {
        if let Some(instruction) = config.remove("systemInstruction") {
            body.insert("systemInstruction".into(), as_content(instruction));
        }
        if !config.is_empty() {
            body.insert("generationConfig".into(), Value::Object(config));
        }
    }
    Value::Object(body)
}

fn normalize_contents(contents: Value) -> Value {
    match contents {
        Value::Array(_) => contents,
        Value::Object(_) => Value::Array(vec![contents]),
        Value::String(text) => json!([{ "role": "user", "parts": [{ "text": text }] }]),
        _ => Value::Array(Vec::new()),
    }
}

fn as_content(instruction: Value) -> Value {
    match instruction {
        Value::String(text) => json!({ "parts": [{ "text": text }] }),
        other => other,
    }
}

/// Concatenated text parts of the first candidate, if non-empty
#[must_use]
pub fn response_text(reply: &Value) -> Option<String> {
    let parts = reply.pointer("/candidates/0/content/parts")?.as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn config_is_split() {
        let body = build_body(
            json!([{ "role": "user", "parts": [{ "text": "hi" }] }]),
            Some(json!({
                "systemInstruction": "Be brief",
                "responseMimeType": "application/json",
                "temperature": 0.2
            })),
        );
        assert_eq!(
            body,
            json!({
                "contents": [{ "role": "user", "parts": [{ "text": "hi" }] }],
                "systemInstruction": { "parts": [{ "text": "Be brief" }] },
                "generationConfig": { "responseMimeType": "application/json", "temperature": 0.2 }
            })
        );
    }

    #[test]
    fn bare_string_contents_become_user_turn() {
        let body = build_body(json!("hello"), None);
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn text_parts_are_joined() {
        let reply = json!({
            "candidates": [
                { "content": { "parts": [{ "text": "{\"a\":" }, { "inlineData": {} }, { "text": "1}" }] } },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        });
        assert_eq!(response_text(&reply).as_deref(), Some("{\"a\":1}"));
        assert_eq!(response_text(&json!({ "candidates": [] })), None);
    }

    #[test]
    fn endpoint_accepts_prefixed_model() {
        let upstream = GeminiUpstream::new("https://api.example/v1beta/", Duration::from_secs(5)).unwrap();
        assert_eq!(
            upstream.endpoint("models/gemini-3-flash-preview"),
            "https://api.example/v1beta/models/gemini-3-flash-preview:generateContent"
        );
    }
}
