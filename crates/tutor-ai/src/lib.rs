//! Tutor AI - generative capability interface
//!
//! Everything the tutor asks of a language model goes through here:
//! - **TutorCapability**: the async trait the orchestrator depends on
//! - **Typed results**: lenient boundary types with defaults
//! - **ProxyCapability**: HTTP client for the generation proxy
//! - **AiError**: error taxonomy plus user-facing messages
//! - **init_tracing**: subscriber setup shared by the binaries

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod capability;
pub mod client;
pub mod error;
pub mod extract;
pub mod logging;
pub mod prompts;
pub mod types;

pub use capability::TutorCapability;
pub use client::{
    GenerationRequest, ProxyCapability, ProxyClientConfig, CREDENTIAL_MISSING_CODE, DEFAULT_MODEL,
};
pub use error::{user_message, AiError};
pub use extract::{extract_json_value, parse_model_json};
pub use logging::init_tracing;
pub use types::{
    CoreResult, LogicResult, RawAxiom, RawDefinition, RawFlashcard, RawQuestion, RawResource,
    RawSection, RecallResult,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
