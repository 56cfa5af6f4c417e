//! Tutor Proxy - generation proxy boundary
//!
//! A small HTTP service that holds the model API credential so clients
//! never see it:
//! - **handle_request**: method checks, credential check, forwarding
//! - **Upstream**: the model API port, with a `generateContent` client
//! - **routes**: the warp filter serving `/gemini-proxy`

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod handler;
pub mod server;
pub mod upstream;

pub use config::{ProxyConfig, DEFAULT_MAX_BODY_BYTES};
pub use error::{ConfigError, UpstreamError};
pub use handler::{
    handle_request, HandlerContext, ProxyRequest, ProxyResponse, CORS_HEADERS,
};
pub use tutor_ai::DEFAULT_MODEL;
pub use server::{routes, ProxyState, PROXY_PATH};
pub use upstream::{build_body, response_text, GeminiUpstream, Upstream, DEFAULT_UPSTREAM_URL};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
