//! Error types for the tutor core
//!
//! Three failure kinds come from the model:
//! - Structure extraction: fatal to initialization, nothing is committed
//! - Stage generation: aborts the rest of one section's run, keeps earlier stages
//! - Evaluation: the question stays unanswered
//!
//! Everything shown to a user goes through [`TutorError::user_message`].

use crate::state_machine::{Stage, TransitionError};
use std::path::PathBuf;
use tutor_ai::{user_message, AiError};
use tutor_model::{CardId, QuestionId, WorkspaceId};

/// Initialization could not produce a skeleton
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StructureExtractionError {
    /// The model returned no sections
    #[error("document structure is empty")]
    Empty,

    /// The extraction call failed
    #[error("structure extraction failed: {0}")]
    Capability(#[from] AiError),
}

/// One enrichment stage's external call failed
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{stage} stage failed: {source}")]
pub struct StageGenerationError {
    pub stage: Stage,
    #[source]
    pub source: AiError,
}

/// Answer evaluation failed; the question is left unanswered
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("evaluation of question {question} failed: {source}")]
pub struct EvaluationError {
    pub question: QuestionId,
    #[source]
    pub source: AiError,
}

/// Main tutor error type
#[derive(Debug, thiserror::Error)]
pub enum TutorError {
    /// Initialization failed
    #[error(transparent)]
    StructureExtraction(#[from] StructureExtractionError),

    /// An enrichment stage failed
    #[error(transparent)]
    StageGeneration(#[from] StageGenerationError),

    /// Answer evaluation failed
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    /// No workspace with this id
    #[error("workspace not found: {0}")]
    WorkspaceNotFound(WorkspaceId),

    /// No workspace is selected
    #[error("no active workspace")]
    NoActiveWorkspace,

    /// Section index outside the workspace
    #[error("section {index} out of range (workspace has {len})")]
    SectionOutOfRange { index: usize, len: usize },

    /// No question with this id in the section
    #[error("question not found: {0}")]
    QuestionNotFound(QuestionId),

    /// No flashcard with this id in the section
    #[error("flashcard not found: {0}")]
    CardNotFound(CardId),

    /// Chosen option outside the question's options
    #[error("option {index} out of range (question has {len})")]
    OptionOutOfRange { index: usize, len: usize },

    /// A run for this section is already in flight
    #[error("section {index} of workspace {workspace} is already being enriched")]
    EnrichmentInProgress { workspace: WorkspaceId, index: usize },

    /// Enrichment moved along an edge the state machine forbids
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// Upload exceeds the size limit
    #[error("{name} is {size} bytes, over the {max} byte limit")]
    UploadTooLarge { name: String, size: u64, max: u64 },

    /// Filesystem failure
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl TutorError {
    /// Create IO error with path context
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// The underlying capability error, if any
    #[must_use]
    pub fn capability_error(&self) -> Option<&AiError> {
        match self {
            Self::StructureExtraction(StructureExtractionError::Capability(e)) => Some(e),
            Self::StageGeneration(e) => Some(&e.source),
            Self::Evaluation(e) => Some(&e.source),
            _ => None,
        }
    }

    /// Whether trying the same operation again may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::EnrichmentInProgress { .. } => true,
            other => other.capability_error().is_some_and(AiError::is_retryable),
        }
    }

    /// Short message suitable for showing to the user
    #[must_use]
    pub fn user_message(&self) -> String {
        if let Some(source) = self.capability_error() {
            return user_message(source);
        }
        match self {
            Self::StructureExtraction(_) => {
                "Could not find any study units in this document. Try another file.".to_string()
            }
            Self::UploadTooLarge { max, .. } => format!(
                "This file is too large. The limit is {:.1} MB.",
                *max as f64 / (1024.0 * 1024.0)
            ),
            Self::NoActiveWorkspace => "Open or upload a document first.".to_string(),
            Self::EnrichmentInProgress { .. } => {
                "This unit is still being prepared. Please wait.".to_string()
            }
            Self::Io { path, .. } => format!("Could not read {}.", path.display()),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_error_names_the_stage() {
        let err = StageGenerationError {
            stage: Stage::Logic,
            source: AiError::EmptyResponse,
        };
        assert_eq!(err.to_string(), "logic stage failed: empty response from model");
    }

    #[test]
    fn capability_errors_use_normalized_message() {
        let err = TutorError::from(StageGenerationError {
            stage: Stage::Core,
            source: AiError::Transport("connection refused 10.0.0.7:8888".into()),
        });
        let msg = err.user_message();
        assert!(!msg.contains("10.0.0.7"));
        assert!(err.is_retryable());
    }

    #[test]
    fn empty_structure_message() {
        let err = TutorError::from(StructureExtractionError::Empty);
        assert!(err.user_message().contains("study units"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn upload_limit_in_megabytes() {
        let err = TutorError::UploadTooLarge {
            name: "slides.pptx".into(),
            size: 9_000_000,
            max: 5_767_168,
        };
        assert_eq!(err.user_message(), "This file is too large. The limit is 5.5 MB.");
    }
}
