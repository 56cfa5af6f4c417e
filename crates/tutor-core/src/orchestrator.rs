//! Enrichment orchestrator
//!
//! Runs the four stages for one section strictly in order. Around each
//! external call the stage's loading flag is raised and cleared through the
//! store, and each result is merged against the section's current value.
//!
//! # Failure
//! A failed stage stops the run. All loading flags are cleared and fields
//! from earlier stages stay in place. Nothing is retried automatically.
//!
//! # Re-entry
//! At most one run per `(workspace, section)` is in flight.
//! [`Orchestrator::ensure_enriched`] starts a run only for a section with no
//! content that is not already loading.

use crate::error::{StageGenerationError, TutorError};
use crate::reducer::{apply_stage, StageOutput};
use crate::registry::InFlight;
use crate::state_machine::{validate_transition, EnrichmentPhase, Stage};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tutor_ai::{AiError, TutorCapability};
use tutor_model::{Attachment, CourseSection, WorkspaceId};
use tutor_store::WorkspaceStore;

/// How far one run got
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichmentReport {
    pub workspace: WorkspaceId,
    pub section_index: usize,
    /// `Done` or `Failed`
    pub phase: EnrichmentPhase,
    /// Stages merged into the section, in order
    pub completed_stages: Vec<Stage>,
    /// The failure that stopped the run
    #[serde(skip)]
    pub error: Option<StageGenerationError>,
}

impl EnrichmentReport {
    /// Whether all four stages completed
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == EnrichmentPhase::Done
    }
}

/// Result of [`Orchestrator::ensure_enriched`]
#[derive(Debug, Clone, PartialEq)]
pub enum EnsureOutcome {
    /// A run was started and has finished
    Started(EnrichmentReport),
    /// The section already has content
    AlreadyEnriched,
    /// A run for the section is in flight
    AlreadyLoading,
}

type SectionKey = (WorkspaceId, usize);

/// Drives section enrichment
pub struct Orchestrator {
    store: Arc<WorkspaceStore>,
    capability: Arc<dyn TutorCapability>,
    in_flight: InFlight<SectionKey>,
    /// Runs in progress, for the store's enriching flag
    running: Mutex<usize>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("in_flight", &self.in_flight.len())
            .field("running", &*self.running.lock())
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    #[must_use]
    pub fn new(store: Arc<WorkspaceStore>, capability: Arc<dyn TutorCapability>) -> Self {
        Self {
            store,
            capability,
            in_flight: InFlight::new(),
            running: Mutex::new(0),
        }
    }

    /// Whether a run for this section is in flight
    #[must_use]
    pub fn is_enriching(&self, workspace: WorkspaceId, index: usize) -> bool {
        self.in_flight.contains(&(workspace, index))
    }

    /// Start a run if the section has no content and is not loading
    pub async fn ensure_enriched(
        &self,
        workspace: WorkspaceId,
        index: usize,
    ) -> Result<EnsureOutcome, TutorError> {
        let section = self.lookup(workspace, index)?.1;
        if section.has_content() {
            return Ok(EnsureOutcome::AlreadyEnriched);
        }
        if section.loading.core || self.is_enriching(workspace, index) {
            return Ok(EnsureOutcome::AlreadyLoading);
        }
        match self.enrich_section(workspace, index).await {
            Ok(report) => Ok(EnsureOutcome::Started(report)),
            Err(TutorError::EnrichmentInProgress { .. }) => Ok(EnsureOutcome::AlreadyLoading),
            Err(err) => Err(err),
        }
    }

    /// Run all four stages for a section, overwriting earlier results
    ///
    /// A stage failure is reported in the returned [`EnrichmentReport`]; an
    /// `Err` means the run could not start or the section disappeared.
    pub async fn enrich_section(
        &self,
        workspace: WorkspaceId,
        index: usize,
    ) -> Result<EnrichmentReport, TutorError> {
        let attachment = self.lookup(workspace, index)?.0;
        let Some(_claim) = self.in_flight.try_claim((workspace, index)) else {
            return Err(TutorError::EnrichmentInProgress { workspace, index });
        };
        let _running = RunningGuard::enter(self);

        let started = Instant::now();
        tracing::info!(%workspace, section = index, "enrichment started");
        let report = self.run_stages(workspace, index, &attachment).await;
        if let Ok(report) = &report {
            tracing::info!(
                %workspace,
                section = index,
                phase = ?report.phase,
                stages = report.completed_stages.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "enrichment finished"
            );
        }
        report
    }

    async fn run_stages(
        &self,
        workspace: WorkspaceId,
        index: usize,
        attachment: &Attachment,
    ) -> Result<EnrichmentReport, TutorError> {
        let mut phase = EnrichmentPhase::Unstarted;
        let mut completed_stages = Vec::with_capacity(Stage::ALL.len());
        let mut loading = LoadingGuard::new(&self.store, workspace, index);

        for stage in Stage::ALL {
            validate_transition(phase, stage.phase())?;
            phase = stage.phase();

            let section = self
                .store
                .update_section(workspace, index, |s| *stage.flag(&mut s.loading) = true)
                .ok_or(TutorError::WorkspaceNotFound(workspace))?;

            match self.call_stage(stage, &section, attachment).await {
                Ok(output) => {
                    self.store
                        .update_section(workspace, index, |s| {
                            *s = apply_stage(std::mem::take(s), output);
                        })
                        .ok_or(TutorError::WorkspaceNotFound(workspace))?;
                    completed_stages.push(stage);
                    tracing::debug!(%workspace, section = index, %stage, "stage merged");
                }
                Err(source) => {
                    tracing::error!(%workspace, section = index, %stage, "stage failed: {}", source);
                    validate_transition(phase, EnrichmentPhase::Failed)?;
                    loading.release();
                    return Ok(EnrichmentReport {
                        workspace,
                        section_index: index,
                        phase: EnrichmentPhase::Failed,
                        completed_stages,
                        error: Some(StageGenerationError { stage, source }),
                    });
                }
            }
        }

        validate_transition(phase, EnrichmentPhase::Done)?;
        loading.disarm();
        Ok(EnrichmentReport {
            workspace,
            section_index: index,
            phase: EnrichmentPhase::Done,
            completed_stages,
            error: None,
        })
    }

    async fn call_stage(
        &self,
        stage: Stage,
        section: &CourseSection,
        attachment: &Attachment,
    ) -> Result<StageOutput, AiError> {
        let capability = &self.capability;
        Ok(match stage {
            Stage::Core => StageOutput::Core(capability.generate_core(section, attachment).await?),
            Stage::Logic => {
                StageOutput::Logic(capability.generate_logic(section, attachment).await?)
            }
            Stage::Recall => {
                StageOutput::Recall(capability.generate_recall(section, attachment).await?)
            }
            Stage::Resources => {
                StageOutput::Resources(capability.generate_resources(section).await?)
            }
        })
    }

    fn lookup(
        &self,
        workspace: WorkspaceId,
        index: usize,
    ) -> Result<(Attachment, CourseSection), TutorError> {
        let ws = self
            .store
            .workspace(workspace)
            .ok_or(TutorError::WorkspaceNotFound(workspace))?;
        let len = ws.sections.len();
        let section = ws
            .sections
            .into_iter()
            .nth(index)
            .ok_or(TutorError::SectionOutOfRange { index, len })?;
        Ok((ws.attachment, section))
    }
}

/// Keeps the store's enriching flag up while any run is active
struct RunningGuard<'a> {
    orchestrator: &'a Orchestrator,
}

impl<'a> RunningGuard<'a> {
    fn enter(orchestrator: &'a Orchestrator) -> Self {
        let mut running = orchestrator.running.lock();
        *running += 1;
        if *running == 1 {
            orchestrator.store.set_is_enriching(true);
        }
        Self { orchestrator }
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        let mut running = self.orchestrator.running.lock();
        *running = running.saturating_sub(1);
        if *running == 0 {
            self.orchestrator.store.set_is_enriching(false);
        }
    }
}

/// Clears a section's loading flags unless the run finished normally
///
/// Covers early returns and a run future dropped mid-stage.
struct LoadingGuard<'a> {
    store: &'a WorkspaceStore,
    workspace: WorkspaceId,
    index: usize,
    armed: bool,
}

impl<'a> LoadingGuard<'a> {
    fn new(store: &'a WorkspaceStore, workspace: WorkspaceId, index: usize) -> Self {
        Self {
            store,
            workspace,
            index,
            armed: true,
        }
    }

    /// Clear the flags now
    fn release(&mut self) {
        self.armed = false;
        self.store
            .update_section(self.workspace, self.index, |s| s.loading.clear());
    }

    /// Every stage merged; each merge already cleared its own flag
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::debug!(
                workspace = %self.workspace,
                section = self.index,
                "enrichment interrupted, clearing loading flags"
            );
            self.release();
        }
    }
}
