//! Initialization flow
//!
//! One structure extraction call, then a pure mapping from descriptors to a
//! workspace skeleton. Either the whole workspace is produced or nothing is.

use crate::error::StructureExtractionError;
use std::sync::Arc;
use tutor_ai::{RawSection, TutorCapability};
use tutor_model::{Attachment, CourseSection, SectionStatus, Workspace};

/// Turns an upload into a workspace skeleton
#[derive(Clone)]
pub struct Initializer {
    capability: Arc<dyn TutorCapability>,
}

impl std::fmt::Debug for Initializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Initializer").finish_non_exhaustive()
    }
}

impl Initializer {
    #[must_use]
    pub fn new(capability: Arc<dyn TutorCapability>) -> Self {
        Self { capability }
    }

    /// Extract the document structure and build the workspace
    ///
    /// The workspace is returned, not stored; the caller commits it.
    pub async fn initialize(
        &self,
        attachment: Attachment,
    ) -> Result<Workspace, StructureExtractionError> {
        tracing::info!(
            file = %attachment.name,
            bytes = attachment.size(),
            "extracting document structure"
        );
        let raw = self
            .capability
            .extract_structure(&attachment)
            .await
            .inspect_err(|err| tracing::error!("structure extraction failed: {}", err))?;
        let workspace = build_workspace(attachment, raw)?;
        tracing::info!(
            workspace = %workspace.id(),
            sections = workspace.sections.len(),
            "workspace skeleton built"
        );
        Ok(workspace)
    }
}

/// Map extracted descriptors to a workspace skeleton
///
/// The first section starts in progress, the rest locked. Fails on an empty
/// descriptor list.
pub fn build_workspace(
    attachment: Attachment,
    raw: Vec<RawSection>,
) -> Result<Workspace, StructureExtractionError> {
    if raw.is_empty() {
        return Err(StructureExtractionError::Empty);
    }
    let sections = raw
        .into_iter()
        .enumerate()
        .map(|(i, r)| skeleton(i, r))
        .collect();
    Ok(Workspace::new(attachment, sections))
}

fn skeleton(index: usize, raw: RawSection) -> CourseSection {
    let status = if index == 0 {
        SectionStatus::InProgress
    } else {
        SectionStatus::Locked
    };
    CourseSection::skeleton(raw.title.unwrap_or_default(), status)
        .with_summary(raw.summary.unwrap_or_default())
        .with_source_reference(raw.source_range.unwrap_or_default())
        .with_dependencies(raw.dependencies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutor_model::UNTITLED_SECTION;
    use tutor_test_utils::{sample_attachment, sample_raw_sections};

    #[test]
    fn three_sections_first_in_progress() {
        let ws = build_workspace(sample_attachment(), sample_raw_sections(3)).unwrap();

        assert_eq!(ws.active_section_index, 0);
        assert_eq!(ws.sections[0].status, SectionStatus::InProgress);
        assert_eq!(ws.sections[1].status, SectionStatus::Locked);
        assert_eq!(ws.sections[2].status, SectionStatus::Locked);
        assert!(ws.sections.iter().all(|s| s.mastery == 0.0 && !s.has_content()));
        assert_eq!(ws.sections[1].source_reference, "p. 5-8");
        assert_eq!(ws.sections[1].dependencies, vec!["Unit 1".to_string()]);
    }

    #[test]
    fn missing_title_uses_placeholder() {
        let ws = build_workspace(sample_attachment(), vec![RawSection::default()]).unwrap();
        assert_eq!(ws.sections[0].title, UNTITLED_SECTION);
        assert_eq!(ws.sections[0].summary, "");
    }

    #[test]
    fn empty_structure_fails() {
        let err = build_workspace(sample_attachment(), Vec::new()).unwrap_err();
        assert_eq!(err, StructureExtractionError::Empty);
    }

    #[test]
    fn subject_and_kind_come_from_file_name() {
        let ws = build_workspace(sample_attachment(), sample_raw_sections(1)).unwrap();
        assert_eq!(ws.subject, "Cell Biology");
        assert_eq!(ws.file_info.kind.as_str(), "pdf");
    }
}
