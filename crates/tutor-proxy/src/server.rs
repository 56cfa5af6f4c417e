//! warp routes for the proxy

use crate::config::ProxyConfig;
use crate::handler::{handle_request, HandlerContext, ProxyResponse, CORS_HEADERS};
use crate::upstream::Upstream;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::header::{HeaderName, HeaderValue};
use warp::http::{Method, Response, StatusCode};
use warp::hyper::body::Bytes;
use warp::{Filter, Rejection, Reply};

/// Proxy endpoint path
pub const PROXY_PATH: &str = "gemini-proxy";

/// Shared server state
pub struct ProxyState {
    pub config: ProxyConfig,
    pub upstream: Arc<dyn Upstream>,
}

impl ProxyState {
    #[must_use]
    pub fn new(config: ProxyConfig, upstream: Arc<dyn Upstream>) -> Self {
        Self { config, upstream }
    }
}

/// `/gemini-proxy` for every method
///
/// `POST` bodies must declare a length within the configured limit.
pub fn routes(
    state: Arc<ProxyState>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let limit = state.config.max_body_bytes;
    warp::path(PROXY_PATH)
        .and(warp::path::end())
        .and(request_body(limit))
        .and(with_state(state))
        .then(|method: Method, body: Bytes, state: Arc<ProxyState>| async move {
            let ctx = HandlerContext {
                api_key: state.config.api_key.as_deref(),
                default_model: &state.config.default_model,
            };
            let response = handle_request(&method, &body, ctx, state.upstream.as_ref()).await;
            tracing::info!(%method, status = response.status.as_u16(), "proxy request");
            into_reply(response)
        })
        .recover(move |err: Rejection| async move { recover_body(err, limit) })
}

/// Method plus body; only `POST` reads one
fn request_body(
    limit: u64,
) -> impl Filter<Extract = (Method, Bytes), Error = Rejection> + Clone {
    let post = warp::post()
        .and(warp::body::content_length_limit(limit))
        .and(warp::body::bytes())
        .map(|body: Bytes| (Method::POST, body));
    let other = warp::method().and_then(|method: Method| async move {
        if method == Method::POST {
            Err::<(Method, Bytes), Rejection>(warp::reject::not_found())
        } else {
            Ok((method, Bytes::new()))
        }
    });
    post.or(other).unify().untuple_one()
}

fn recover_body(err: Rejection, limit: u64) -> Result<Response<String>, Rejection> {
    let response = if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        tracing::warn!(limit, "request body too large");
        ProxyResponse::json(
            StatusCode::PAYLOAD_TOO_LARGE,
            json!({
                "error": "PAYLOAD_TOO_LARGE",
                "message": format!("Request body exceeds {limit} bytes")
            }),
        )
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        ProxyResponse::json(
            StatusCode::LENGTH_REQUIRED,
            json!({
                "error": "LENGTH_REQUIRED",
                "message": "Request body must declare a Content-Length"
            }),
        )
    } else {
        return Err(err);
    };
    Ok(into_reply(response))
}

fn with_state(
    state: Arc<ProxyState>,
) -> impl Filter<Extract = (Arc<ProxyState>,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn into_reply(response: ProxyResponse) -> Response<String> {
    let mut reply = Response::new(response.body_text());
    *reply.status_mut() = response.status;
    let headers = reply.headers_mut();
    for (name, value) in CORS_HEADERS {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
    reply
}
