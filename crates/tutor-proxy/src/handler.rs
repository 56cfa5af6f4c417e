//! Request handling, independent of the HTTP server
//!
//! Every response is JSON and carries the CORS headers. `OPTIONS` is a
//! preflight; anything else but `POST` is refused.

use crate::upstream::Upstream;
use serde::Deserialize;
use serde_json::{json, Value};
use tutor_ai::CREDENTIAL_MISSING_CODE;
use warp::http::{Method, StatusCode};

/// Headers sent with every response
pub const CORS_HEADERS: [(&str, &str); 4] = [
    ("content-type", "application/json"),
    ("access-control-allow-origin", "*"),
    ("access-control-allow-headers", "Content-Type"),
    ("access-control-allow-methods", "POST, OPTIONS"),
];

/// Incoming generation request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProxyRequest {
    pub model: Option<String>,
    pub contents: Value,
    pub config: Option<Value>,
}

/// Status and body of a proxy response
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyResponse {
    pub status: StatusCode,
    /// `None` for an empty body
    pub body: Option<Value>,
}

impl ProxyResponse {
    pub(crate) fn json(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body: Some(body),
        }
    }

    /// Body as sent on the wire
    #[must_use]
    pub fn body_text(&self) -> String {
        self.body.as_ref().map(Value::to_string).unwrap_or_default()
    }
}

/// Settings the handler needs per request
#[derive(Debug, Clone, Copy)]
pub struct HandlerContext<'a> {
    pub api_key: Option<&'a str>,
    pub default_model: &'a str,
}

/// Handle one proxy request
pub async fn handle_request(
    method: &Method,
    body: &[u8],
    ctx: HandlerContext<'_>,
    upstream: &dyn Upstream,
) -> ProxyResponse {
    if method == Method::OPTIONS {
        return ProxyResponse {
            status: StatusCode::NO_CONTENT,
            body: None,
        };
    }
    if method != Method::POST {
        return ProxyResponse::json(
            StatusCode::METHOD_NOT_ALLOWED,
            json!({ "error": "Method Not Allowed" }),
        );
    }

    let request: ProxyRequest = if body.iter().all(u8::is_ascii_whitespace) {
        ProxyRequest::default()
    } else {
        match serde_json::from_slice(body) {
            Ok(request) => request,
            Err(err) => {
                tracing::error!("unreadable proxy request: {}", err);
                return generation_failed(&err.to_string());
            }
        }
    };

    let Some(api_key) = ctx.api_key.filter(|k| !k.is_empty()) else {
        tracing::error!("API_KEY is not set; refusing generation request");
        return ProxyResponse::json(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({
                "error": CREDENTIAL_MISSING_CODE,
                "message": "Set the API_KEY environment variable before starting tutor-proxy"
            }),
        );
    };

    let model = request
        .model
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| ctx.default_model.to_string());
    tracing::debug!(model = %model, bytes = body.len(), "forwarding generation request");

    match upstream
        .generate(api_key, &model, request.contents, request.config)
        .await
    {
        Ok(text) => ProxyResponse::json(StatusCode::OK, json!({ "text": text })),
        Err(err) => {
            tracing::error!(model = %model, "generation failed: {}", err);
            generation_failed(&err.to_string())
        }
    }
}

fn generation_failed(message: &str) -> ProxyResponse {
    let message = if message.is_empty() {
        "Unknown error during generation"
    } else {
        message
    };
    ProxyResponse::json(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "error": "GENERATION_FAILED", "message": message }),
    )
}
