//! Curriculum sections
//!
//! A section starts as a skeleton (title, optional summary) and is filled in
//! place by the enrichment stages.

use crate::ids::{CardId, QuestionId, SectionId};
use crate::study::{Flashcard, PracticeQuestion};
use serde::{Deserialize, Serialize};

/// Progress status of a section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionStatus {
    /// Not yet open for study
    #[default]
    Locked,
    /// Currently being studied
    InProgress,
    /// Finished
    Completed,
}

impl SectionStatus {
    /// Label used in listings
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionStatus::Locked => "locked",
            SectionStatus::InProgress => "in-progress",
            SectionStatus::Completed => "completed",
        }
    }
}

/// Term and its definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyTerm {
    pub term: String,
    pub definition: String,
}

/// Formula or axiom with a short label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Formula {
    pub expression: String,
    pub label: String,
}

/// External reading or media suggested for a section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Relevance score in `[0, 1]`
    pub score: f64,
}

/// Who said a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Tutor,
}

/// One turn of the per-section tutoring conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

/// Loading flags for the four enrichment stages
///
/// Each flag is true only while its stage's external call is outstanding.
/// Never persisted: nothing is in flight after a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StageLoading {
    pub core: bool,
    pub logic: bool,
    pub recall: bool,
    pub resources: bool,
}

impl StageLoading {
    /// Whether any stage is loading
    #[inline]
    #[must_use]
    pub fn any(&self) -> bool {
        self.core || self.logic || self.recall || self.resources
    }

    /// Reset all flags
    #[inline]
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// One curriculum unit
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CourseSection {
    pub id: SectionId,
    pub title: String,
    pub status: SectionStatus,
    /// Sections that logically gate this one. Informational only.
    pub dependencies: Vec<String>,
    pub mastery: f64,
    /// Page or slide range in the source document
    pub source_reference: String,

    pub content: String,
    pub summary: String,
    pub detailed_summary: String,
    pub key_terms: Vec<KeyTerm>,
    pub formulas: Vec<Formula>,
    pub mindmap: String,
    pub flashcards: Vec<Flashcard>,
    pub practice_questions: Vec<PracticeQuestion>,
    pub resources: Vec<Resource>,
    pub chat_history: Vec<ChatTurn>,

    #[serde(skip)]
    pub loading: StageLoading,
}

/// Title used when the structure extraction omits one
pub const UNTITLED_SECTION: &str = "Untitled Unit";

impl CourseSection {
    /// Create an empty skeleton section
    #[must_use]
    pub fn skeleton(title: impl Into<String>, status: SectionStatus) -> Self {
        let title = title.into();
        Self {
            title: if title.trim().is_empty() {
                UNTITLED_SECTION.to_string()
            } else {
                title
            },
            status,
            ..Self::default()
        }
    }

    /// With summary
    #[inline]
    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// With source reference
    #[inline]
    #[must_use]
    pub fn with_source_reference(mut self, reference: impl Into<String>) -> Self {
        self.source_reference = reference.into();
        self
    }

    /// With dependencies
    #[inline]
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Whether the core stage has produced content
    #[inline]
    #[must_use]
    pub fn has_content(&self) -> bool {
        !self.content.is_empty()
    }

    /// Look up a flashcard
    #[must_use]
    pub fn flashcard(&self, id: CardId) -> Option<&Flashcard> {
        self.flashcards.iter().find(|c| c.id == id)
    }

    /// Look up a flashcard mutably
    pub fn flashcard_mut(&mut self, id: CardId) -> Option<&mut Flashcard> {
        self.flashcards.iter_mut().find(|c| c.id == id)
    }

    /// Look up a practice question
    #[must_use]
    pub fn question(&self, id: QuestionId) -> Option<&PracticeQuestion> {
        self.practice_questions.iter().find(|q| q.id == id)
    }

    /// Look up a practice question mutably
    pub fn question_mut(&mut self, id: QuestionId) -> Option<&mut PracticeQuestion> {
        self.practice_questions.iter_mut().find(|q| q.id == id)
    }

    /// Questions answered incorrectly, for review
    pub fn review_queue(&self) -> impl Iterator<Item = &PracticeQuestion> {
        self.practice_questions
            .iter()
            .filter(|q| q.has_been_answered && q.was_correct == Some(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::study::PracticeQuestion;

    #[test]
    fn skeleton_defaults_title() {
        let s = CourseSection::skeleton("  ", SectionStatus::Locked);
        assert_eq!(s.title, UNTITLED_SECTION);
        assert!(!s.has_content());
        assert_eq!(s.mastery, 0.0);
    }

    #[test]
    fn status_serializes_kebab_case() {
        let json = serde_json::to_string(&SectionStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
    }

    #[test]
    fn loading_flags_are_not_persisted() {
        let mut s = CourseSection::skeleton("Cells", SectionStatus::InProgress);
        s.loading.core = true;
        s.loading.resources = true;

        let json = serde_json::to_string(&s).unwrap();
        assert!(!json.contains("loading"));

        let back: CourseSection = serde_json::from_str(&json).unwrap();
        assert!(!back.loading.any());
        assert_eq!(back.id, s.id);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let back: CourseSection = serde_json::from_str(r#"{"title":"Only a title"}"#).unwrap();
        assert_eq!(back.title, "Only a title");
        assert_eq!(back.status, SectionStatus::Locked);
        assert!(back.flashcards.is_empty());
    }

    #[test]
    fn review_queue_lists_wrong_answers() {
        let mut s = CourseSection::skeleton("Cells", SectionStatus::InProgress);
        let mut right = PracticeQuestion::new("q1", vec!["a".into(), "b".into()], 0);
        right.has_been_answered = true;
        right.was_correct = Some(true);
        let mut wrong = PracticeQuestion::new("q2", vec!["a".into(), "b".into()], 1);
        wrong.has_been_answered = true;
        wrong.was_correct = Some(false);
        let open = PracticeQuestion::new("q3", vec!["a".into(), "b".into()], 1);
        s.practice_questions = vec![right, wrong.clone(), open];

        let queue: Vec<_> = s.review_queue().collect();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].id, wrong.id);
    }
}
