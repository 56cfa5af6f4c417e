//! Proxy errors

use std::path::PathBuf;

/// Upstream model API failures
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// Could not reach the model API
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The model API answered with an error status
    #[error("upstream returned {status}: {message}")]
    Status { status: u16, message: String },

    /// No text in the first candidate
    #[error("Empty response from Gemini API")]
    EmptyResponse,

    /// The reply was not the expected JSON
    #[error("unreadable upstream response: {0}")]
    Malformed(String),
}

/// Proxy configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid {key}: {value}")]
    Invalid { key: &'static str, value: String },
}
