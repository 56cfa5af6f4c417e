//! Tutor configuration
//!
//! Loaded from an optional TOML file, then overridden by environment
//! variables. Missing keys take their defaults.

use crate::error::TutorError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tutor_ai::{ProxyClientConfig, DEFAULT_MODEL};
use tutor_store::DEFAULT_STATE_FILE;

/// Largest accepted upload: 5.5 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5_767_168;

/// Default proxy endpoint
pub const DEFAULT_PROXY_URL: &str = "http://127.0.0.1:8888/gemini-proxy";

pub const ENV_PROXY_URL: &str = "TUTOR_PROXY_URL";
pub const ENV_MODEL: &str = "TUTOR_MODEL";
pub const ENV_STATE_PATH: &str = "TUTOR_STATE_PATH";
pub const ENV_MAX_UPLOAD_BYTES: &str = "TUTOR_MAX_UPLOAD_BYTES";
pub const ENV_TIMEOUT_SECS: &str = "TUTOR_TIMEOUT_SECS";

/// Tutor configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TutorConfig {
    /// Generation proxy endpoint
    pub proxy_url: String,
    /// Model requested from the proxy
    pub model: String,
    /// Persisted state file
    pub state_path: PathBuf,
    /// Upload size limit in bytes
    pub max_upload_bytes: u64,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            proxy_url: DEFAULT_PROXY_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            state_path: PathBuf::from(DEFAULT_STATE_FILE),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            request_timeout_secs: 120,
        }
    }
}

impl TutorConfig {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With proxy URL
    #[inline]
    #[must_use]
    pub fn with_proxy_url(mut self, url: impl Into<String>) -> Self {
        self.proxy_url = url.into();
        self
    }

    /// With state path
    #[inline]
    #[must_use]
    pub fn with_state_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_path = path.into();
        self
    }

    /// With upload limit
    #[inline]
    #[must_use]
    pub fn with_max_upload_bytes(mut self, max: u64) -> Self {
        self.max_upload_bytes = max;
        self
    }

    /// Parse TOML text
    pub fn from_toml(text: &str) -> Result<Self, TutorError> {
        toml::from_str(text).map_err(|e| TutorError::Config(e.to_string()))
    }

    /// Read a TOML file, then apply the process environment
    ///
    /// A missing file is not an error when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, TutorError> {
        let base = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .map_err(|e| TutorError::io_error(path, e))?;
                Self::from_toml(&text)?
            }
            None => Self::default(),
        };
        base.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides looked up by `var`
    pub fn with_overrides<F>(mut self, var: F) -> Result<Self, TutorError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = var(ENV_PROXY_URL) {
            self.proxy_url = url;
        }
        if let Some(model) = var(ENV_MODEL) {
            self.model = model;
        }
        if let Some(path) = var(ENV_STATE_PATH) {
            self.state_path = PathBuf::from(path);
        }
        if let Some(raw) = var(ENV_MAX_UPLOAD_BYTES) {
            self.max_upload_bytes = parse_number(ENV_MAX_UPLOAD_BYTES, &raw)?;
        }
        if let Some(raw) = var(ENV_TIMEOUT_SECS) {
            self.request_timeout_secs = parse_number(ENV_TIMEOUT_SECS, &raw)?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), TutorError> {
        if self.proxy_url.trim().is_empty() {
            return Err(TutorError::Config("proxy_url must not be empty".into()));
        }
        if self.model.trim().is_empty() {
            return Err(TutorError::Config("model must not be empty".into()));
        }
        if self.max_upload_bytes == 0 {
            return Err(TutorError::Config("max_upload_bytes must be positive".into()));
        }
        Ok(())
    }

    /// Client settings for the proxy
    #[must_use]
    pub fn proxy_client(&self) -> ProxyClientConfig {
        ProxyClientConfig::new(self.proxy_url.clone())
            .with_model(self.model.clone())
            .with_timeout(Duration::from_secs(self.request_timeout_secs))
    }
}

fn parse_number(key: &str, raw: &str) -> Result<u64, TutorError> {
    raw.trim()
        .parse()
        .map_err(|_| TutorError::Config(format!("{key} must be a whole number, got {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = TutorConfig::from_toml(
            r#"
            proxy_url = "https://tutor.example.org/.netlify/functions/gemini-proxy"
            max_upload_bytes = 1024
            "#,
        )
        .unwrap();
        assert_eq!(config.max_upload_bytes, 1024);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.state_path, PathBuf::from(DEFAULT_STATE_FILE));
    }

    #[test]
    fn environment_wins_over_file() {
        let env: HashMap<&str, &str> = [
            (ENV_MODEL, "gemini-2.5-pro"),
            (ENV_STATE_PATH, "/tmp/state.json"),
            (ENV_MAX_UPLOAD_BYTES, " 2048 "),
        ]
        .into_iter()
        .collect();
        let config = TutorConfig::default()
            .with_overrides(|k| env.get(k).map(|v| (*v).to_string()))
            .unwrap();

        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.state_path, PathBuf::from("/tmp/state.json"));
        assert_eq!(config.max_upload_bytes, 2048);
        assert_eq!(config.proxy_url, DEFAULT_PROXY_URL);
    }

    #[test]
    fn bad_number_is_config_error() {
        let err = TutorConfig::default()
            .with_overrides(|k| (k == ENV_MAX_UPLOAD_BYTES).then(|| "lots".to_string()))
            .unwrap_err();
        assert!(matches!(err, TutorError::Config(msg) if msg.contains(ENV_MAX_UPLOAD_BYTES)));
    }

    #[test]
    fn unknown_file_is_io_error() {
        let err = TutorConfig::load(Some(Path::new("/nonexistent/tutor.toml"))).unwrap_err();
        assert!(matches!(err, TutorError::Io { .. }));
    }

    #[test]
    fn proxy_client_carries_model_and_timeout() {
        let client = TutorConfig::default().proxy_client();
        assert_eq!(client.endpoint, DEFAULT_PROXY_URL);
        assert_eq!(client.timeout, Duration::from_secs(120));
    }
}
