//! Study session facade
//!
//! Ties the store, initializer, orchestrator and evaluator together behind
//! the operations a front end needs. Section-level operations act on the
//! active workspace.

use crate::error::TutorError;
use crate::evaluation::{AnswerOutcome, Evaluator};
use crate::init::Initializer;
use crate::orchestrator::{EnrichmentReport, EnsureOutcome, Orchestrator};
use std::sync::Arc;
use tutor_ai::TutorCapability;
use tutor_model::{Attachment, CardId, Flashcard, PracticeQuestion, QuestionId, Workspace, WorkspaceId};
use tutor_store::{WorkspaceStore, WorkspaceUpdate};

/// Result of [`StudySession::ingest`]
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    pub workspace: WorkspaceId,
    pub sections: usize,
    /// Enrichment of the first section
    pub enrichment: EnrichmentReport,
}

/// Front-end facing study session
#[derive(Debug)]
pub struct StudySession {
    store: Arc<WorkspaceStore>,
    initializer: Initializer,
    orchestrator: Orchestrator,
    evaluator: Evaluator,
}

impl StudySession {
    #[must_use]
    pub fn new(store: Arc<WorkspaceStore>, capability: Arc<dyn TutorCapability>) -> Self {
        Self {
            initializer: Initializer::new(capability.clone()),
            orchestrator: Orchestrator::new(store.clone(), capability.clone()),
            evaluator: Evaluator::new(store.clone(), capability),
            store,
        }
    }

    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<WorkspaceStore> {
        &self.store
    }

    #[inline]
    #[must_use]
    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Build a workspace from an upload, store it as active and enrich its
    /// first section
    ///
    /// A structure extraction failure leaves the store unchanged.
    pub async fn ingest(&self, attachment: Attachment) -> Result<IngestReport, TutorError> {
        let workspace = self.initializer.initialize(attachment).await?;
        let id = workspace.id();
        let sections = workspace.sections.len();
        self.store.add_workspace(workspace);

        let enrichment = self.orchestrator.enrich_section(id, 0).await?;
        Ok(IngestReport {
            workspace: id,
            sections,
            enrichment,
        })
    }

    /// The active workspace
    pub fn active(&self) -> Result<Workspace, TutorError> {
        self.store
            .get_active_workspace()
            .ok_or(TutorError::NoActiveWorkspace)
    }

    /// Select a section of the active workspace and enrich it if needed
    pub async fn select_section(&self, index: usize) -> Result<EnsureOutcome, TutorError> {
        let id = self.focus_section(index)?;
        self.orchestrator.ensure_enriched(id, index).await
    }

    /// Make `index` the active section without enriching it
    fn focus_section(&self, index: usize) -> Result<WorkspaceId, TutorError> {
        let ws = self.active()?;
        let id = ws.id();
        if index >= ws.sections.len() {
            return Err(TutorError::SectionOutOfRange {
                index,
                len: ws.sections.len(),
            });
        }
        self.store
            .update_workspace(id, WorkspaceUpdate::new().active_section_index(index));
        Ok(id)
    }

    /// Advance to the next section; `None` at the last one
    pub async fn next_section(&self) -> Result<Option<EnsureOutcome>, TutorError> {
        let ws = self.active()?;
        let next = ws.active_section_index + 1;
        if next >= ws.sections.len() {
            return Ok(None);
        }
        self.select_section(next).await.map(Some)
    }

    /// Select a section and re-run every stage once, content or not
    pub async fn refresh_section(&self, index: usize) -> Result<EnrichmentReport, TutorError> {
        let id = self.focus_section(index)?;
        self.orchestrator.enrich_section(id, index).await
    }

    /// Make an existing workspace active
    pub fn select_workspace(&self, id: WorkspaceId) -> Result<(), TutorError> {
        if self.store.workspace(id).is_none() {
            return Err(TutorError::WorkspaceNotFound(id));
        }
        self.store.set_active_workspace_id(Some(id));
        Ok(())
    }

    /// Clear the selection so a new file can be uploaded
    pub fn new_file(&self) {
        self.store.set_active_workspace_id(None);
    }

    /// Delete every workspace
    pub fn purge(&self) {
        self.store.purge();
    }

    /// Answer a practice question in the active workspace
    pub async fn answer_question(
        &self,
        section_index: usize,
        question: QuestionId,
        chosen_index: usize,
    ) -> Result<AnswerOutcome, TutorError> {
        let id = self.active()?.id();
        self.evaluator
            .answer_question(id, section_index, question, chosen_index)
            .await
    }

    /// Record a flashcard review in the active workspace
    pub fn review_flashcard(
        &self,
        section_index: usize,
        card: CardId,
        recalled: bool,
    ) -> Result<Flashcard, TutorError> {
        let id = self.active()?.id();
        self.evaluator
            .review_flashcard(id, section_index, card, recalled)
    }

    /// Incorrectly answered questions of a section in the active workspace
    pub fn review_queue(&self, section_index: usize) -> Result<Vec<PracticeQuestion>, TutorError> {
        let id = self.active()?.id();
        self.evaluator.review_queue(id, section_index)
    }
}
