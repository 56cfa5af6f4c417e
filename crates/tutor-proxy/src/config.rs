//! Proxy configuration
//!
//! TOML file first, then `PROXY_BIND`, `PROXY_UPSTREAM_URL`,
//! `PROXY_DEFAULT_MODEL`, `PROXY_TIMEOUT_SECS`, `PROXY_MAX_BODY_BYTES` and
//! `API_KEY` from the environment. The credential is only ever read from the environment.

use crate::error::ConfigError;
use crate::upstream::DEFAULT_UPSTREAM_URL;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use tutor_ai::DEFAULT_MODEL;

/// Largest accepted request body: a maximum-size upload after base64
/// encoding, plus room for the prompt
pub const DEFAULT_MAX_BODY_BYTES: u64 = 8 * 1024 * 1024;

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listen address
    pub bind: SocketAddr,
    /// Model API base URL
    pub upstream_url: String,
    /// Model used when a request names none
    pub default_model: String,
    /// Upstream request timeout in seconds
    pub timeout_secs: u64,
    /// Request body limit in bytes
    pub max_body_bytes: u64,
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8888)),
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            timeout_secs: 120,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            api_key: None,
        }
    }
}

// The credential never reaches logs.
impl std::fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("bind", &self.bind)
            .field("upstream_url", &self.upstream_url)
            .field("default_model", &self.default_model)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("api_key", &self.api_key.as_ref().map(|_| "<set>"))
            .finish()
    }
}

impl ProxyConfig {
    /// Load from an optional file and the process environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                toml::from_str(&text)?
            }
            None => Self::default(),
        };
        base.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides looked up by `var`
    pub fn with_overrides<F>(mut self, var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = var("PROXY_BIND") {
            self.bind = bind.parse().map_err(|_| ConfigError::Invalid {
                key: "PROXY_BIND",
                value: bind,
            })?;
        }
        if let Some(url) = var("PROXY_UPSTREAM_URL") {
            self.upstream_url = url;
        }
        if let Some(model) = var("PROXY_DEFAULT_MODEL") {
            self.default_model = model;
        }
        if let Some(raw) = var("PROXY_TIMEOUT_SECS") {
            self.timeout_secs = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "PROXY_TIMEOUT_SECS",
                value: raw,
            })?;
        }
        if let Some(raw) = var("PROXY_MAX_BODY_BYTES") {
            self.max_body_bytes = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "PROXY_MAX_BODY_BYTES",
                value: raw,
            })?;
        }
        self.api_key = var("API_KEY").filter(|k| !k.is_empty());
        Ok(self)
    }
}
