//! Capability errors and their user-facing translation
//!
//! Every error raised while talking to the model goes through
//! [`user_message`] before it is shown. The raw detail stays in the logs.

/// Errors raised by an external AI capability
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AiError {
    /// Could not reach the proxy
    #[error("transport error: {0}")]
    Transport(String),

    /// The request did not complete in time
    #[error("request timed out")]
    Timeout,

    /// The proxy has no credential for the upstream model API
    #[error("proxy credential missing: {0}")]
    CredentialMissing(String),

    /// The proxy answered with a non-success status
    #[error("generation failed with status {status}: {message}")]
    Status {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// The model produced no text
    #[error("empty response from model")]
    EmptyResponse,

    /// The model's text is not the JSON shape that was asked for
    #[error("malformed model response: {0}")]
    MalformedResponse(String),
}

impl AiError {
    /// Whether retrying the same call may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            AiError::Transport(_) | AiError::Timeout | AiError::EmptyResponse => true,
            AiError::MalformedResponse(_) => true,
            AiError::Status { status, .. } => *status == 429 || *status >= 500,
            AiError::CredentialMissing(_) => false,
        }
    }

    /// Create a malformed-response error
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::MalformedResponse(detail.into())
    }
}

impl From<reqwest::Error> for AiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            AiError::Timeout
        } else if error.is_decode() {
            AiError::MalformedResponse(error.to_string())
        } else {
            AiError::Transport(error.to_string())
        }
    }
}

/// Short, user-presentable message for a capability error
#[must_use]
pub fn user_message(error: &AiError) -> String {
    let msg = match error {
        AiError::Transport(_) => {
            "Could not reach the AI service. Check your connection and try again."
        }
        AiError::Timeout => "The AI service took too long to respond. Please try again.",
        AiError::CredentialMissing(_) => {
            "The AI service is not configured on the server (missing API key)."
        }
        AiError::Status { status: 429, .. } => {
            "The AI service is busy right now. Wait a moment and try again."
        }
        AiError::Status { status: 413, .. } => {
            "The document is too large for the AI service. Try a smaller file."
        }
        AiError::Status { .. } => "The AI service failed to generate a response. Please try again.",
        AiError::EmptyResponse => "The AI service returned an empty response. Please try again.",
        AiError::MalformedResponse(_) => {
            "The AI service returned a response that could not be read. Please try again."
        }
    };
    msg.to_string()
}
