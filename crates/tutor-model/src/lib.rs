//! Tutor Model - study workspace data types
//!
//! The records shared by every other crate:
//! - Workspaces and their file identity
//! - Curriculum sections and their enrichment fields
//! - Flashcards, practice questions and answer verdicts
//! - The uploaded attachment

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod attachment;
pub mod ids;
pub mod section;
pub mod study;
pub mod workspace;

pub use attachment::{guess_mime, Attachment, FileKind};
pub use ids::{CardId, QuestionId, SectionId, WorkspaceId};
pub use section::{
    ChatRole, ChatTurn, CourseSection, Formula, KeyTerm, Resource, SectionStatus, StageLoading,
    UNTITLED_SECTION,
};
pub use study::{
    DeepInsight, Difficulty, Flashcard, MasteryStatus, PracticeQuestion, DEFAULT_DIFFICULTY_LEVEL,
};
pub use workspace::{CoverageStats, FileInfo, Workspace};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
