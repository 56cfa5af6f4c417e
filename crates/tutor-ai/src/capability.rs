//! External AI capability interface
//!
//! The tutor delegates document understanding, content generation and answer
//! evaluation to a model behind this trait. Implementations fill missing
//! fields with defaults (see [`crate::types`]) and report failures as
//! [`AiError`].

use crate::error::AiError;
use crate::types::{CoreResult, LogicResult, RawResource, RawSection, RecallResult};
use async_trait::async_trait;
use tutor_model::{Attachment, CourseSection, DeepInsight, PracticeQuestion};

/// Generative capabilities used by initialization, enrichment and evaluation
#[async_trait]
pub trait TutorCapability: Send + Sync {
    /// Split a document into an ordered list of curriculum units
    async fn extract_structure(&self, attachment: &Attachment) -> Result<Vec<RawSection>, AiError>;

    /// Explanatory content, summary, definitions and formulas for a section
    async fn generate_core(
        &self,
        section: &CourseSection,
        attachment: &Attachment,
    ) -> Result<CoreResult, AiError>;

    /// Mind map for a section
    async fn generate_logic(
        &self,
        section: &CourseSection,
        attachment: &Attachment,
    ) -> Result<LogicResult, AiError>;

    /// Flashcards and practice questions for a section
    async fn generate_recall(
        &self,
        section: &CourseSection,
        attachment: &Attachment,
    ) -> Result<RecallResult, AiError>;

    /// Further reading for a section; does not need the source document
    async fn generate_resources(&self, section: &CourseSection) -> Result<Vec<RawResource>, AiError>;

    /// Judge one multiple-choice answer
    async fn evaluate_response(
        &self,
        question: &PracticeQuestion,
        chosen_index: usize,
        section: &CourseSection,
        attachment: &Attachment,
    ) -> Result<DeepInsight, AiError>;
}
