//! Tutor Core - study workspace orchestration
//!
//! Turns an uploaded document into a study workspace and fills it in:
//! - **Initializer**: one structure extraction call to a section skeleton
//! - **Orchestrator**: four enrichment stages per section, in order
//! - **Evaluator**: answer evaluation and flashcard review
//! - **StudySession**: the facade a front end drives
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tutor_ai::{ProxyCapability, ProxyClientConfig};
//! use tutor_core::{read_attachment, StudySession, TutorConfig};
//! use tutor_store::WorkspaceStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TutorConfig::load(None)?;
//! let capability = Arc::new(ProxyCapability::new(config.proxy_client())?);
//! let session = StudySession::new(Arc::new(WorkspaceStore::in_memory()), capability);
//!
//! let attachment = read_attachment("notes.pdf".as_ref(), config.max_upload_bytes).await?;
//! let report = session.ingest(attachment).await?;
//! println!("{} sections, first: {:?}", report.sections, report.enrichment.phase);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod evaluation;
pub mod init;
pub mod orchestrator;
pub mod reducer;
pub mod registry;
pub mod session;
pub mod state_machine;
pub mod upload;

pub use config::{TutorConfig, DEFAULT_MAX_UPLOAD_BYTES};
pub use error::{EvaluationError, StageGenerationError, StructureExtractionError, TutorError};
pub use evaluation::{AnswerOutcome, Evaluator};
pub use init::{build_workspace, Initializer};
pub use orchestrator::{EnrichmentReport, EnsureOutcome, Orchestrator};
pub use reducer::{apply_stage, StageOutput, DEFAULT_RESOURCE_SCORE};
pub use session::{IngestReport, StudySession};
pub use state_machine::{allowed_transitions, validate_transition, EnrichmentPhase, Stage};
pub use upload::read_attachment;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
