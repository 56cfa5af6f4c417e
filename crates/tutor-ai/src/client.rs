//! HTTP client for the generation proxy
//!
//! Each capability call is one POST of `{model, contents, config}` to the
//! proxy. The proxy holds the model API credential and answers `{text}` on
//! success or `{error, message}` on failure.

use crate::capability::TutorCapability;
use crate::error::AiError;
use crate::extract::parse_model_json;
use crate::prompts::{self, Prompt, SYSTEM_INSTRUCTION};
use crate::types::{CoreResult, LogicResult, RawResource, RawSection, RecallResult};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};
use tutor_model::{Attachment, CourseSection, DeepInsight, PracticeQuestion};

/// Default model requested from the proxy
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// Error code the proxy uses when it has no credential
pub const CREDENTIAL_MISSING_CODE: &str = "API_KEY_MISSING_ON_SERVER";

/// Proxy client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyClientConfig {
    /// Full URL of the proxy endpoint
    pub endpoint: String,
    /// Model identifier forwarded to the proxy
    pub model: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl ProxyClientConfig {
    /// Config for `endpoint` with default model and timeout
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    /// With model
    #[inline]
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// With timeout
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Request body sent to the proxy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub model: String,
    pub contents: Vec<Content>,
    pub config: GenerationConfig,
}

/// One conversation turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

/// Text or inline file data
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

impl Part {
    /// Text part
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    /// Inline attachment part
    #[must_use]
    pub fn attachment(attachment: &Attachment) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: attachment.mime_type.clone(),
                data: attachment.to_base64(),
            }),
        }
    }
}

/// Base64 file payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

/// Generation settings forwarded to the model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub system_instruction: String,
    pub response_mime_type: String,
    pub response_schema: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProxyReply {
    text: Option<String>,
    error: Option<String>,
    message: Option<String>,
}

/// [`TutorCapability`] backed by the generation proxy
#[derive(Debug, Clone)]
pub struct ProxyCapability {
    http: reqwest::Client,
    config: ProxyClientConfig,
}

impl ProxyCapability {
    /// Build a client for `config`
    pub fn new(config: ProxyClientConfig) -> Result<Self, AiError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    /// Client configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ProxyClientConfig {
        &self.config
    }

    /// Assemble the request body for one prompt
    #[must_use]
    pub fn build_request(&self, prompt: Prompt, attachment: Option<&Attachment>) -> GenerationRequest {
        let mut parts = Vec::with_capacity(2);
        if let Some(attachment) = attachment {
            parts.push(Part::attachment(attachment));
        }
        parts.push(Part::text(prompt.text));
        GenerationRequest {
            model: self.config.model.clone(),
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
            config: GenerationConfig {
                system_instruction: SYSTEM_INSTRUCTION.to_string(),
                response_mime_type: "application/json".to_string(),
                response_schema: prompt.schema,
            },
        }
    }

    async fn generate<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        prompt: Prompt,
        attachment: Option<&Attachment>,
    ) -> Result<T, AiError> {
        let request = self.build_request(prompt, attachment);
        let start = Instant::now();
        let text = self.send(&request).await.inspect_err(|err| {
            tracing::error!(operation, "proxy call failed: {}", err);
        })?;
        tracing::debug!(
            operation,
            elapsed_ms = start.elapsed().as_millis() as u64,
            bytes = text.len(),
            "proxy call completed"
        );
        parse_model_json(&text).inspect_err(|err| {
            tracing::error!(operation, "unreadable model response: {}", err);
        })
    }

    async fn send(&self, request: &GenerationRequest) -> Result<String, AiError> {
        let response = self
            .http
            .post(&self.config.endpoint)
            .json(request)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        let reply: ProxyReply = serde_json::from_str(&body).unwrap_or_else(|_| ProxyReply {
            message: Some(body.clone()),
            ..ProxyReply::default()
        });

        if !status.is_success() {
            let message = reply.message.unwrap_or_else(|| status.to_string());
            if reply.error.as_deref() == Some(CREDENTIAL_MISSING_CODE) {
                return Err(AiError::CredentialMissing(message));
            }
            return Err(AiError::Status {
                status: status.as_u16(),
                code: reply.error,
                message,
            });
        }

        match reply.text {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(AiError::EmptyResponse),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StructureReply {
    List(Vec<RawSection>),
    Wrapped { sections: Vec<RawSection> },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ResourcesReply {
    List(Vec<RawResource>),
    Wrapped { resources: Vec<RawResource> },
}

#[async_trait]
impl TutorCapability for ProxyCapability {
    async fn extract_structure(&self, attachment: &Attachment) -> Result<Vec<RawSection>, AiError> {
        let reply: StructureReply = self
            .generate("extract_structure", prompts::structure(), Some(attachment))
            .await?;
        Ok(match reply {
            StructureReply::List(sections) | StructureReply::Wrapped { sections } => sections,
        })
    }

    async fn generate_core(
        &self,
        section: &CourseSection,
        attachment: &Attachment,
    ) -> Result<CoreResult, AiError> {
        self.generate("generate_core", prompts::core(section), Some(attachment))
            .await
    }

    async fn generate_logic(
        &self,
        section: &CourseSection,
        attachment: &Attachment,
    ) -> Result<LogicResult, AiError> {
        self.generate("generate_logic", prompts::logic(section), Some(attachment))
            .await
    }

    async fn generate_recall(
        &self,
        section: &CourseSection,
        attachment: &Attachment,
    ) -> Result<RecallResult, AiError> {
        self.generate("generate_recall", prompts::recall(section), Some(attachment))
            .await
    }

    async fn generate_resources(&self, section: &CourseSection) -> Result<Vec<RawResource>, AiError> {
        let reply: ResourcesReply = self
            .generate("generate_resources", prompts::resources(section), None)
            .await?;
        Ok(match reply {
            ResourcesReply::List(resources) | ResourcesReply::Wrapped { resources } => resources,
        })
    }

    async fn evaluate_response(
        &self,
        question: &PracticeQuestion,
        chosen_index: usize,
        section: &CourseSection,
        attachment: &Attachment,
    ) -> Result<DeepInsight, AiError> {
        self.generate(
            "evaluate_response",
            prompts::evaluation(question, chosen_index, section),
            Some(attachment),
        )
        .await
    }
}
