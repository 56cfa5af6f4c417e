//! Proxy handler tests
//!
//! The handler is driven directly against a mocked upstream, then once
//! through the warp routes to check what reaches the wire.

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use tutor_proxy::{
    handle_request, routes, HandlerContext, ProxyConfig, ProxyState, Upstream, UpstreamError,
    DEFAULT_MAX_BODY_BYTES, DEFAULT_MODEL,
};
use tutor_ai::CREDENTIAL_MISSING_CODE;
use warp::http::{Method, StatusCode};

mockall::mock! {
    pub Model {}

    #[async_trait]
    impl Upstream for Model {
        async fn generate(
            &self,
            api_key: &str,
            model: &str,
            contents: Value,
            config: Option<Value>,
        ) -> Result<String, UpstreamError>;
    }
}

fn ctx(api_key: Option<&str>) -> HandlerContext<'_> {
    HandlerContext {
        api_key,
        default_model: DEFAULT_MODEL,
    }
}

fn untouched() -> MockModel {
    let mut upstream = MockModel::new();
    upstream.expect_generate().never();
    upstream
}

/// Tenet: preflight succeeds with an empty body
#[tokio::test]
async fn options_is_no_content() {
    let response = handle_request(&Method::OPTIONS, b"", ctx(Some("k")), &untouched()).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(response.body_text(), "");
}

#[tokio::test]
async fn get_is_refused() {
    let response = handle_request(&Method::GET, b"", ctx(Some("k")), &untouched()).await;
    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.body, Some(json!({ "error": "Method Not Allowed" })));
}

/// Tenet: without a credential nothing is forwarded
#[tokio::test]
async fn missing_key_is_reported() {
    let body = br#"{"contents":"hi"}"#;
    for key in [None, Some("")] {
        let response = handle_request(&Method::POST, body, ctx(key), &untouched()).await;
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.body.unwrap();
        assert_eq!(body["error"], CREDENTIAL_MISSING_CODE);
        assert_eq!(
            body["message"],
            "Set the API_KEY environment variable before starting tutor-proxy"
        );
    }
}

#[tokio::test]
async fn default_model_is_used() {
    let mut upstream = MockModel::new();
    upstream
        .expect_generate()
        .withf(|key, model, contents, config| {
            key == "k" && model == DEFAULT_MODEL && contents == &json!("hi") && config.is_none()
        })
        .times(1)
        .returning(|_, _, _, _| Ok("{\"ok\":true}".to_string()));

    let response =
        handle_request(&Method::POST, br#"{"contents":"hi"}"#, ctx(Some("k")), &upstream).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, Some(json!({ "text": "{\"ok\":true}" })));
}

#[tokio::test]
async fn requested_model_and_config_are_forwarded() {
    let mut upstream = MockModel::new();
    upstream
        .expect_generate()
        .withf(|key, model, contents, config| {
            key == "k"
                && model == "gemini-2.5-pro"
                && contents == &json!([{ "role": "user", "parts": [{ "text": "x" }] }])
                && config == &Some(json!({ "responseMimeType": "application/json" }))
        })
        .times(1)
        .returning(|_, _, _, _| Ok("[]".to_string()));

    let body = json!({
        "model": "gemini-2.5-pro",
        "contents": [{ "role": "user", "parts": [{ "text": "x" }] }],
        "config": { "responseMimeType": "application/json" }
    })
    .to_string();
    let response = handle_request(&Method::POST, body.as_bytes(), ctx(Some("k")), &upstream).await;
    assert_eq!(response.status, StatusCode::OK);
}

/// Tenet: upstream failures surface as GENERATION_FAILED with a message
#[tokio::test]
async fn upstream_failure_is_generation_failed() {
    let mut upstream = MockModel::new();
    upstream
        .expect_generate()
        .returning(|_, _, _, _| Err(UpstreamError::EmptyResponse));

    let response =
        handle_request(&Method::POST, br#"{"contents":"hi"}"#, ctx(Some("k")), &upstream).await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.body,
        Some(json!({ "error": "GENERATION_FAILED", "message": "Empty response from Gemini API" }))
    );
}

#[tokio::test]
async fn unreadable_body_is_generation_failed() {
    let response = handle_request(&Method::POST, b"{not json", ctx(Some("k")), &untouched()).await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.body.as_ref().and_then(|b| b["error"].as_str()),
        Some("GENERATION_FAILED")
    );
}

/// Tenet: every response on the wire carries the CORS headers
#[tokio::test]
async fn routes_attach_cors_headers() {
    let mut upstream = MockModel::new();
    upstream
        .expect_generate()
        .returning(|_, _, _, _| Ok("done".to_string()));
    let config = ProxyConfig {
        api_key: Some("k".to_string()),
        ..ProxyConfig::default()
    };
    let filter = routes(Arc::new(ProxyState::new(config, Arc::new(upstream))));

    let preflight = warp::test::request()
        .method("OPTIONS")
        .path("/gemini-proxy")
        .reply(&filter)
        .await;
    assert_eq!(preflight.status(), StatusCode::NO_CONTENT);
    assert_eq!(preflight.headers()["access-control-allow-origin"], "*");
    assert_eq!(
        preflight.headers()["access-control-allow-methods"],
        "POST, OPTIONS"
    );

    let post = warp::test::request()
        .method("POST")
        .path("/gemini-proxy")
        .body(r#"{"contents":"hi"}"#)
        .reply(&filter)
        .await;
    assert_eq!(post.status(), StatusCode::OK);
    assert_eq!(post.headers()["content-type"], "application/json");
    let body: Value = serde_json::from_slice(post.body()).unwrap();
    assert_eq!(body, json!({ "text": "done" }));
}

/// Tenet: bodies over the limit are refused before reaching the model
#[tokio::test]
async fn oversized_body_is_rejected() {
    let config = ProxyConfig {
        api_key: Some("k".to_string()),
        max_body_bytes: 1024,
        ..ProxyConfig::default()
    };
    let filter = routes(Arc::new(ProxyState::new(config, Arc::new(untouched()))));

    let response = warp::test::request()
        .method("POST")
        .path("/gemini-proxy")
        .body(vec![b' '; 2048])
        .reply(&filter)
        .await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    let body: Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body["error"], "PAYLOAD_TOO_LARGE");
}

#[test]
fn default_limit_fits_a_maximum_upload() {
    let encoded = 5_767_168u64.div_ceil(3) * 4;
    assert!(encoded < DEFAULT_MAX_BODY_BYTES);
}
