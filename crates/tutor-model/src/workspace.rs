//! Workspaces: one uploaded document's full study session

use crate::attachment::{Attachment, FileKind};
use crate::ids::WorkspaceId;
use crate::section::CourseSection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of the uploaded file. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub id: WorkspaceId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
    pub upload_date: DateTime<Utc>,
}

impl FileInfo {
    /// Identity for a freshly uploaded attachment
    #[must_use]
    pub fn for_attachment(attachment: &Attachment) -> Self {
        Self {
            id: WorkspaceId::new(),
            name: attachment.name.clone(),
            kind: attachment.kind(),
            upload_date: Utc::now(),
        }
    }
}

/// Aggregate progress percentages, each an integer in `[0, 100]`
///
/// Derived from the section list; callers never set it directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CoverageStats {
    /// Sections with content
    pub ingested: u8,
    /// Flashcards mastered
    pub retained: u8,
    /// Practice questions answered correctly
    pub validated: u8,
}

/// One document's study session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub file_info: FileInfo,
    pub subject: String,
    pub sections: Vec<CourseSection>,
    pub active_section_index: usize,
    pub attachment: Attachment,
    #[serde(default)]
    pub coverage_stats: CoverageStats,
}

impl Workspace {
    /// Assemble a workspace around an attachment and its section skeleton
    #[must_use]
    pub fn new(attachment: Attachment, sections: Vec<CourseSection>) -> Self {
        Self {
            file_info: FileInfo::for_attachment(&attachment),
            subject: attachment.subject(),
            sections,
            active_section_index: 0,
            attachment,
            coverage_stats: CoverageStats::default(),
        }
    }

    /// Workspace identity
    #[inline]
    #[must_use]
    pub fn id(&self) -> WorkspaceId {
        self.file_info.id
    }

    /// Section at `index`
    #[inline]
    #[must_use]
    pub fn section(&self, index: usize) -> Option<&CourseSection> {
        self.sections.get(index)
    }

    /// Currently selected section
    #[inline]
    #[must_use]
    pub fn active_section(&self) -> Option<&CourseSection> {
        self.sections.get(self.active_section_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::SectionStatus;

    #[test]
    fn new_workspace_uses_file_identity() {
        let att = Attachment::new("Organic Chemistry.pptx", "application/octet-stream", vec![1]);
        let ws = Workspace::new(
            att,
            vec![CourseSection::skeleton("Alkanes", SectionStatus::InProgress)],
        );
        assert_eq!(ws.subject, "Organic Chemistry");
        assert_eq!(ws.file_info.kind, FileKind::Ppt);
        assert_eq!(ws.active_section_index, 0);
        assert_eq!(ws.active_section().unwrap().title, "Alkanes");
        assert_eq!(ws.coverage_stats, CoverageStats::default());
    }

    #[test]
    fn file_kind_serialized_as_type() {
        let att = Attachment::new("a.pdf", "application/pdf", vec![]);
        let json = serde_json::to_value(FileInfo::for_attachment(&att)).unwrap();
        assert_eq!(json["type"], "pdf");
        assert!(json["uploadDate"].is_string());
    }
}
